//! Failure categorization.
//!
//! Maps an error chain onto a `FailureKind` so run statistics can be grouped.

use anyhow::Error;
use reqwest::Error as ReqwestError;

use super::types::{FailureKind, FetchError, StorageError};

/// Categorizes a `reqwest::Error` into a `FailureKind`.
pub fn categorize_reqwest_error(error: &ReqwestError) -> FailureKind {
    if error.is_timeout() {
        return FailureKind::Timeout;
    }
    if let Some(status) = error.status() {
        return categorize_status(status.as_u16());
    }
    if error.is_decode() {
        return FailureKind::Decode;
    }
    FailureKind::Transport
}

fn categorize_status(status: u16) -> FailureKind {
    match status {
        401 | 403 => FailureKind::Unauthorized,
        _ => FailureKind::HttpStatus,
    }
}

/// Extracts the failure kind from an error chain.
///
/// The first recognised error in the chain wins; anything unrecognised is `Other`.
pub fn categorize_error(error: &Error) -> FailureKind {
    for cause in error.chain() {
        if let Some(fetch_err) = cause.downcast_ref::<FetchError>() {
            return match fetch_err {
                FetchError::Transport(e) => categorize_reqwest_error(e),
                FetchError::Status { status, .. } => categorize_status(*status),
                FetchError::Decode(_) => FailureKind::Decode,
                FetchError::Api(_) => FailureKind::Api,
                FetchError::MissingPath { .. } => FailureKind::MissingPath,
                FetchError::Shape { .. } => FailureKind::Shape,
            };
        }
        if let Some(reqwest_err) = cause.downcast_ref::<ReqwestError>() {
            return categorize_reqwest_error(reqwest_err);
        }
        if cause.downcast_ref::<StorageError>().is_some()
            || cause.downcast_ref::<std::io::Error>().is_some()
        {
            return FailureKind::Storage;
        }
    }
    FailureKind::Other
}
