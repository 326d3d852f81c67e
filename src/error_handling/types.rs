//! Error type definitions.
//!
//! This module defines the error enums raised by the fetch, storage and
//! initialization layers, plus the failure and warning categories counted
//! during a run.

use std::path::PathBuf;

use log::SetLoggerError;
use reqwest::Error as ReqwestError;
use strum_macros::EnumIter as EnumIterMacro;
use thiserror::Error;

/// Error types for initialization failures.
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)] // All variants end with "Error" by convention
pub enum InitializationError {
    /// Error initializing the logger.
    #[error("Logger initialization error: {0}")]
    LoggerError(#[from] SetLoggerError),

    /// Error initializing the HTTP client.
    #[error("HTTP client initialization error: {0}")]
    HttpClientError(#[from] ReqwestError),

    /// No token and no client credentials to obtain one.
    #[error("No access token found and no client credentials configured ({0})")]
    MissingCredentialsError(String),

    /// The token endpoint refused or returned no token.
    #[error("Token request failed: {0}")]
    TokenRequestError(String),

    /// The token could not be written back to the env file.
    #[error("Failed to store token in {}: {source}", .path.display())]
    TokenStoreError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Errors raised while requesting a facet from the API or extracting it from
/// the response envelope.
#[derive(Error, Debug)]
pub enum FetchError {
    /// Network or protocol failure (connect, timeout, body read).
    #[error("API request failed: {0}")]
    Transport(#[from] ReqwestError),

    /// The endpoint answered with a non-2xx status.
    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body was not valid JSON.
    #[error("Malformed API response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The GraphQL envelope carried an `errors` array.
    #[error("API reported errors: {0}")]
    Api(String),

    /// An expected nested path is absent (or null) in the envelope.
    #[error("Response is missing `{path}`")]
    MissingPath { path: String },

    /// The value at a path does not have the expected record shape.
    #[error("Unexpected shape at `{path}`: {source}")]
    Shape {
        path: String,
        source: serde_json::Error,
    },
}

/// Errors raised by the ledger, staging area and dataset.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Unexpected dataset layout in {}: {reason}", .path.display())]
    Layout { path: PathBuf, reason: String },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StorageError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Categories of report-level failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum FailureKind {
    Transport,
    Timeout,
    HttpStatus,
    Unauthorized,
    Decode,
    Api,
    MissingPath,
    Shape,
    Storage,
    Other,
}

/// Data-quality warnings that do not fail a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum WarningType {
    /// Actor present in only one of the damage and healing tables
    IncompleteActor,
    /// Death entry that matches no roster actor
    UnmatchedDeath,
    /// Fight without a zone name
    MissingDungeonName,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Transport => "API transport error",
            FailureKind::Timeout => "API timeout",
            FailureKind::HttpStatus => "API HTTP status error",
            FailureKind::Unauthorized => "Unauthorized (401/403)",
            FailureKind::Decode => "Malformed API response",
            FailureKind::Api => "GraphQL error",
            FailureKind::MissingPath => "Missing response path",
            FailureKind::Shape => "Unexpected response shape",
            FailureKind::Storage => "Storage error",
            FailureKind::Other => "Other error",
        }
    }
}

impl WarningType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningType::IncompleteActor => "Actor missing from damage or healing",
            WarningType::UnmatchedDeath => "Death without roster actor",
            WarningType::MissingDungeonName => "Missing dungeon name",
        }
    }
}
