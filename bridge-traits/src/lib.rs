//! # Host Bridge Traits
//!
//! Capabilities the record store needs from its host but must not hard-wire.
//!
//! ## Overview
//!
//! The lending ledger stamps loans and returns with the current date. Reading
//! the system clock directly would make every date-dependent rule untestable,
//! so the core asks a [`Clock`](time::Clock) instead. Production hosts inject
//! [`SystemClock`](time::SystemClock); tests inject a
//! [`FixedClock`](time::FixedClock) or a mock.
//!
//! ## Thread Safety
//!
//! Bridge traits require `Send + Sync` so a single implementation can be
//! shared across async tasks behind an `Arc`.

pub mod time;

pub use time::{Clock, FixedClock, LogLevel, SystemClock};
