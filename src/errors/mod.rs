//! Centralized error handling for the EPG enrichment application
//!
//! This module provides the error types used across the library and the
//! CLI, split into a small hierarchy: pattern-file load failures (the
//! only errors the library surfaces to callers) and application-level
//! errors wrapping them for the binary.
//!
//! # Usage
//!
//! ```rust
//! use epg_enrich::errors::{AppError, AppResult};
//!
//! fn example_function() -> AppResult<String> {
//!     // Function can return any error type that converts to AppError
//!     Ok("success".to_string())
//! }
//! ```

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for pattern-file load Results
pub type PatternFileResult<T> = Result<T, PatternFileError>;
