//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (endpoints, paths, discovery window, fight filters)
//! - The library `Config` and the clap-derived `Opt`

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, LogFormat, LogLevel, Opt};
