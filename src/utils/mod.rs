//! Shared utilities

pub mod regex_guard;
pub mod xmltv;

pub use regex_guard::{RegexGuard, RegexGuardConfig};
