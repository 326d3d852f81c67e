//! Application initialization and resource setup.
//!
//! This module provides functions to initialize the shared resources of a run:
//! - HTTP client (timeout, User-Agent)
//! - Logger
//! - Bearer token for the API

mod auth;
mod client;
mod logger;

// Re-export public API
pub use auth::{request_token, resolve_token, store_token};
pub use client::init_client;
pub use logger::init_logger_with;
