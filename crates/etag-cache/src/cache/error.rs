//! Cache error types.

use std::io;
use std::path::PathBuf;

/// Errors surfaced by a [`Fetcher`](super::Fetcher).
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// URL does not start with `http:` or `https:`
    #[error("URL '{0}' must start with 'http:' or 'https:'")]
    InvalidScheme(String),

    /// Network or protocol failure with no usable fallback
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Payload is not valid JSON
    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Cache directory or output file unusable
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl FetchError {
    /// Whether this error enters the fallback tiers.
    ///
    /// Only transport faults and storage faults qualify. HTTP error statuses and
    /// malformed fresh payloads are surfaced as-is.
    pub fn is_fault(&self) -> bool {
        match self {
            FetchError::Transport(e) => e.is_fault(),
            FetchError::Storage(_) => true,
            FetchError::InvalidScheme(_) | FetchError::Decode(_) => false,
        }
    }

    /// The value that was resolved before the output file write failed.
    pub fn resolved_value(&self) -> Option<&serde_json::Value> {
        match self {
            FetchError::Storage(StorageError::Output { resolved, .. }) => Some(resolved.as_ref()),
            _ => None,
        }
    }
}

/// Errors produced by a [`Transport`](super::Transport).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Server answered with a status that is neither 2xx nor a usable 304
    #[error("HTTP status {0}")]
    Status(u16),

    /// Server answered 304 but there is no cached body to serve
    #[error("HTTP status 304 Not Modified with no cached body")]
    NotModifiedWithoutCache,

    /// Request exceeded the configured timeout
    #[error("request timed out")]
    Timeout,

    /// Caller cancelled the request
    #[error("request cancelled")]
    Cancelled,

    /// Connection, DNS, TLS or body read failure
    #[error("connection failed: {0}")]
    Connection(String),
}

impl TransportError {
    /// Whether this error is a network fault rather than a server answer.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout | TransportError::Cancelled | TransportError::Connection(_)
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Connection(err.to_string())
        }
    }
}

/// Errors produced while touching the cache directory or the output file.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// IO error on a cache artifact or the cache directory
    #[error("{path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Cached body record exists but is not valid JSON
    #[error("corrupt cache record {path:?}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Writing the output file failed after the value was resolved
    #[error("failed to write output file {path:?}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
        resolved: Box<serde_json::Value>,
    },
}

impl StorageError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StorageError::Io {
            path: path.into(),
            source,
        }
    }
}
