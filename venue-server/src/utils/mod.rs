//! Utilities: logging setup, clocks, input length limits

pub mod logger;
pub mod time;
pub mod validation;

pub use time::{ManualClock, SharedClock};
