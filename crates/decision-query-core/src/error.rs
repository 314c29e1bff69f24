// crates/decision-query-core/src/error.rs
// ============================================================================
// Module: Decision Query Errors
// Description: Error taxonomy for the query pipeline.
// Purpose: Carry enough context to diagnose a failed query without re-running.
// Dependencies: thiserror
// ============================================================================

//! ## Overview
//! Every pipeline stage fails with [`QueryError`]. The first failure aborts
//! the pipeline and is surfaced unchanged to the process boundary.
//!
//! The request for a non-zero exit code is not an error; it is reported through
//! [`crate::ExitDecision`] on the success path.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use thiserror::Error;

// ============================================================================
// SECTION: Error Kinds
// ============================================================================

/// Coarse error classification shared by all pipeline stages.
///
/// # Invariants
/// - Variants are stable for programmatic handling and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad URL, format, header or metadata shape.
    InvalidConfiguration,
    /// The composed payload could not be serialized.
    InvalidInput,
    /// Network failure, cancellation or non-200 status.
    RequestFailed,
    /// Malformed or unreadable response envelope, or result-shape mismatch.
    UnexpectedResponse,
    /// File open, read or write failure.
    Io,
    /// Input stream did not decode in the configured format.
    Decode,
}

impl ErrorKind {
    /// Returns a stable label for the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidConfiguration => "invalid configuration",
            Self::InvalidInput => "invalid input",
            Self::RequestFailed => "request to decision service failed",
            Self::UnexpectedResponse => "unexpected response from decision service",
            Self::Io => "io failure",
            Self::Decode => "decode failure",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// SECTION: Request Failures
// ============================================================================

/// Reasons a request to the decision service failed.
///
/// # Invariants
/// - All variants classify as [`ErrorKind::RequestFailed`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestFailure {
    /// The transport could not complete the exchange.
    #[error("transport error: {0}")]
    Transport(String),
    /// The service answered with a status other than 200.
    #[error("status code is not OK: {code}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Raw response body (best effort).
        body: String,
    },
    /// The invocation was canceled before a response arrived.
    #[error("request canceled")]
    Canceled,
    /// The invocation deadline elapsed before a response arrived.
    #[error("request deadline exceeded")]
    DeadlineExceeded,
}

// ============================================================================
// SECTION: Query Errors
// ============================================================================

/// Errors produced by the query pipeline.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Configuration rejected before any I/O.
    #[error("invalid configuration ({target}): {reason}")]
    InvalidConfiguration {
        /// Offending flag, e.g. `--url`.
        target: String,
        /// Human-readable reason.
        reason: String,
    },
    /// The payload could not be serialized into the request envelope.
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Human-readable reason.
        reason: String,
        /// Debug rendering of the offending payload.
        payload: String,
    },
    /// The request did not produce a 200 response.
    #[error("request to decision service failed: {0}")]
    RequestFailed(#[from] RequestFailure),
    /// The response could not be read or decoded.
    #[error("unexpected response from decision service: {reason}")]
    UnexpectedResponse {
        /// Human-readable reason.
        reason: String,
        /// Raw response body obtained so far.
        body: String,
    },
    /// A file could not be opened, read or written.
    #[error("io failure on {path}: {reason}")]
    Io {
        /// Path involved, `-` for a standard stream.
        path: String,
        /// Underlying error message.
        reason: String,
    },
    /// The input stream did not decode.
    #[error("failed to decode {format} input from {path}: {reason}")]
    Decode {
        /// Input path, `-` for stdin.
        path: String,
        /// Input format label.
        format: &'static str,
        /// Decoder error message.
        reason: String,
    },
}

impl QueryError {
    /// Builds an [`QueryError::InvalidConfiguration`] for the given flag.
    pub fn invalid_configuration(target: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Builds an [`QueryError::Io`] from an I/O error.
    pub fn io(path: impl Into<String>, error: &std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            reason: error.to_string(),
        }
    }

    /// Returns the error classification.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidConfiguration {
                ..
            } => ErrorKind::InvalidConfiguration,
            Self::InvalidInput {
                ..
            } => ErrorKind::InvalidInput,
            Self::RequestFailed(_) => ErrorKind::RequestFailed,
            Self::UnexpectedResponse {
                ..
            } => ErrorKind::UnexpectedResponse,
            Self::Io {
                ..
            } => ErrorKind::Io,
            Self::Decode {
                ..
            } => ErrorKind::Decode,
        }
    }

    /// Returns the HTTP status code for non-200 failures.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::RequestFailed(RequestFailure::Status {
                code, ..
            }) => Some(*code),
            _ => None,
        }
    }

    /// Returns the diagnostic context as ordered key/value pairs.
    ///
    /// The message itself is not repeated; these are the extra fields an
    /// operator needs (flag, path, status code, raw body).
    #[must_use]
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::InvalidConfiguration {
                target, ..
            } => {
                let mut fields = vec![("target", target.clone())];
                if let Some(note) = expected_format(target) {
                    fields.push(("expected_format", note.to_string()));
                }
                fields
            }
            Self::InvalidInput {
                payload, ..
            } => vec![("payload", payload.clone())],
            Self::RequestFailed(RequestFailure::Status {
                code,
                body,
            }) => vec![("code", code.to_string()), ("body", body.clone())],
            Self::RequestFailed(_) => Vec::new(),
            Self::UnexpectedResponse {
                body, ..
            } => vec![("body", body.clone())],
            Self::Io {
                path, ..
            }
            | Self::Decode {
                path, ..
            } => vec![("path", path.clone())],
        }
    }
}

/// Returns the expected value shape for flags with a fixed syntax.
fn expected_format(target: &str) -> Option<&'static str> {
    match target {
        "--http-header" => Some("HeaderName: Value"),
        "--metadata" => Some("Key=Value"),
        _ => None,
    }
}

/// Result alias for pipeline operations.
pub type QueryResult<T> = Result<T, QueryError>;
