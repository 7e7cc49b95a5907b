//! # mailbox-app
//!
//! Application layer — the poll loop use-case and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `SensorReader` — read one proximity and one lux value
//!   - `Publisher` — send one message to the broker, disconnect on shutdown
//! - Define the **driving** use-case:
//!   - `PollLoop` — sample, evaluate, build, publish, sleep, repeat
//! - Decide once how failures degrade: read errors become absent values,
//!   publish errors are logged and retried on the next tick
//!
//! ## Dependency rule
//! Depends on `mailbox-domain` only (plus `tokio` for timers).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod poll_loop;
pub mod ports;
