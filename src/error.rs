//! Error taxonomy for the cloning workflow
//!
//! Splits failures into the classes the retry layer cares about: transport
//! problems (retryable) versus API validation rejections, missing source
//! entities, and unmappable source data (all permanent).

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Network, timeout or 5xx-class failure. The only retryable class.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The API rejected the request with a 4xx status. Retrying would
    /// reproduce the same rejection, so this escalates immediately.
    #[error("API rejected request (HTTP {status}): {body}")]
    Validation { status: u16, body: String },

    /// The requested source standard does not exist on the tenant.
    #[error("standard '{0}' not found")]
    NotFound(String),

    /// Source data that cannot be mapped to a valid target value, e.g. an
    /// unrecognized severity token. Never silently defaulted.
    #[error("cannot map source value: {0}")]
    Mapping(String),
}

impl Error {
    /// Whether the retry policy should attempt this operation again.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Transport(_))
    }

    /// Classify an HTTP status into the taxonomy. 408 and 429 behave like
    /// server-side transients; other 4xx are permanent rejections.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            408 | 429 | 500..=599 => Error::Transport(format!("HTTP {status}: {body}")),
            _ => Error::Validation { status, body },
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Error::from_status(status.as_u16(), err.to_string())
        } else {
            // Connect failures, DNS errors and client-side timeouts all
            // land here and are worth another attempt.
            Error::Transport(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
