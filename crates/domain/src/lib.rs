//! # mailbox-domain
//!
//! Pure domain model for the smart-mailbox telemetry publisher.
//!
//! ## Responsibilities
//! - Foundational types: error conventions, timestamps
//! - Define **samples** (one proximity + one lux reading, either may be absent)
//! - Define the **threshold policy** that classifies readings into mail/open
//! - Define the **state machine** that debounces classifications into edges
//! - Define the **payloads** published for each tick (combined or discrete)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod time;

pub mod payload;
pub mod sample;
pub mod state;
pub mod threshold;
