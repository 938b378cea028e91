//! Error types for the xeoservices library.
//!
//! Every fallible operation returns `Result<T, XeoError>`. The variants are
//! specific enough to tell *which* remote call failed (upload link, byte
//! transfer, metadata, conversion, status, health), while
//! [`XeoError::kind`] folds them into the small closed [`ErrorKind`]
//! enumeration callers match on when they only care about the category.
//!
//! HTTP-level failures carry an [`HttpFailure`]: the status code and response
//! text when the server answered, or the transport error when it did not.

use crate::client::Service;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Coarse error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid configuration; detected before any request.
    Config,
    /// A local input file does not exist.
    NotFound,
    /// A remote call failed: unexpected status, transport error or
    /// malformed response body.
    Protocol,
    /// Local file-system I/O failed.
    Io,
}

/// What went wrong on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpFailure {
    /// HTTP status, `None` when no response was received.
    pub status: Option<u16>,
    /// Response text or transport error message.
    pub detail: String,
}

impl HttpFailure {
    pub fn status(status: u16, detail: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            detail: detail.into(),
        }
    }

    pub fn transport(err: &reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            detail: err.to_string(),
        }
    }
}

impl fmt::Display for HttpFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.status, self.detail.is_empty()) {
            (Some(code), true) => write!(f, "HTTP {code}"),
            (Some(code), false) => write!(f, "HTTP {code} - {}", self.detail),
            (None, _) => write!(f, "request failed: {}", self.detail),
        }
    }
}

/// All errors returned by the xeoservices library.
#[derive(Debug, Error)]
pub enum XeoError {
    // ── Config errors ─────────────────────────────────────────────────────
    /// The bearer token is not set (or is empty).
    #[error("{var} environment variable is not set.\nExport it with: export {var}=<token>")]
    MissingAccessToken { var: &'static str },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("File not found: '{path}'")]
    FileNotFound { path: PathBuf },

    /// The input file exists but could not be read.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Remote call errors ────────────────────────────────────────────────
    /// `POST file` did not answer 201.
    #[error("Failed to create upload link: {0}")]
    UploadLinkFailed(HttpFailure),

    /// The PUT to the pre-signed upload URL failed.
    #[error("Upload failed: {0}")]
    UploadFailed(HttpFailure),

    /// `GET file/{id}` did not answer 200.
    #[error("Failed to fetch file entry metadata for '{file_id}': {failure}")]
    MetadataFetchFailed { file_id: String, failure: HttpFailure },

    /// `POST process` did not answer 201.
    #[error("Failed to start conversion: {0}")]
    ConversionStartFailed(HttpFailure),

    /// `GET process/{id}` did not answer 200.
    #[error("Failed to check process status for '{process_id}': {failure}")]
    StatusFetchFailed {
        process_id: String,
        failure: HttpFailure,
    },

    /// `GET health` on one of the services did not answer 200.
    #[error("{service} health check failed: {failure}")]
    HealthCheckFailed {
        service: Service,
        failure: HttpFailure,
    },

    /// A response body could not be decoded into the expected shape.
    #[error("Invalid response from {operation}: {detail}")]
    InvalidResponse {
        operation: &'static str,
        detail: String,
    },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write a log file.
    #[error("Failed to write log file '{path}': {source}")]
    LogWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl XeoError {
    /// Category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            XeoError::MissingAccessToken { .. } | XeoError::InvalidConfig(_) => ErrorKind::Config,
            XeoError::FileNotFound { .. } => ErrorKind::NotFound,
            XeoError::UploadLinkFailed(_)
            | XeoError::UploadFailed(_)
            | XeoError::MetadataFetchFailed { .. }
            | XeoError::ConversionStartFailed(_)
            | XeoError::StatusFetchFailed { .. }
            | XeoError::HealthCheckFailed { .. }
            | XeoError::InvalidResponse { .. } => ErrorKind::Protocol,
            XeoError::ReadFailed { .. } | XeoError::LogWriteFailed { .. } => ErrorKind::Io,
        }
    }

    /// The HTTP failure behind a remote-call error, if any.
    pub fn http_failure(&self) -> Option<&HttpFailure> {
        match self {
            XeoError::UploadLinkFailed(f)
            | XeoError::UploadFailed(f)
            | XeoError::ConversionStartFailed(f) => Some(f),
            XeoError::MetadataFetchFailed { failure, .. }
            | XeoError::StatusFetchFailed { failure, .. }
            | XeoError::HealthCheckFailed { failure, .. } => Some(failure),
            _ => None,
        }
    }
}
