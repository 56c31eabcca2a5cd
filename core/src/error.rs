//! Error types for the SSG API client core.
//!
//! # Design
//! Failures are split by where they are detected:
//! - `ValidationError`: argument problems caught before any request exists.
//! - `TransportError`: the secure channel could not complete a round-trip.
//! - `ConfigError`: settings or certificate material could not be loaded.
//!
//! `ApiError` aggregates them together with envelope-level failures. A remote
//! rejection (HTTP 4xx/5xx with an error envelope) is *not* an `ApiError`; it
//! is a failed `CanonicalResult` so callers can inspect the remote status.

use std::path::PathBuf;

use thiserror::Error;

use crate::catalog::AuthChannel;

/// An argument set violated an operation's parameter schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("`{param}` must be at least {min} characters (got {actual})")]
    KeywordTooShort {
        param: &'static str,
        min: usize,
        actual: usize,
    },

    #[error("unknown parameter `{param}`")]
    UnknownParameter { param: String },

    #[error("`{param}` must be {expected}")]
    InvalidParameterType {
        param: &'static str,
        expected: &'static str,
    },

    /// Two mutually exclusive parameter groups were both populated.
    #[error("parameter groups `{first}` and `{second}` cannot be combined")]
    ConflictingParameters {
        first: &'static str,
        second: &'static str,
    },

    #[error("missing required parameter `{param}`")]
    MissingParameter { param: &'static str },

    #[error("`{param}` is required when `{trigger}` is `{trigger_value}`")]
    MissingConditionalParameter {
        param: &'static str,
        trigger: &'static str,
        trigger_value: &'static str,
    },

    #[error("`{value}` is not a valid `{param}`; allowed: {allowed}")]
    InvalidEnumValue {
        param: &'static str,
        value: String,
        allowed: String,
    },

    #[error("`{param}` must be a YYYYMMDD date (got `{value}`)")]
    InvalidDateFormat { param: &'static str, value: String },

    #[error("`{param}` must be between {min} and {max} (got {value})")]
    OutOfRange {
        param: &'static str,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("path placeholder `{{{placeholder}}}` has no argument")]
    UnresolvedPathParameter { placeholder: &'static str },
}

impl ValidationError {
    /// Name of the offending parameter, path placeholder, or first group.
    pub fn field(&self) -> &str {
        match self {
            Self::KeywordTooShort { param, .. }
            | Self::InvalidParameterType { param, .. }
            | Self::MissingParameter { param }
            | Self::MissingConditionalParameter { param, .. }
            | Self::InvalidEnumValue { param, .. }
            | Self::InvalidDateFormat { param, .. }
            | Self::OutOfRange { param, .. } => param,
            Self::UnknownParameter { param } => param,
            Self::ConflictingParameters { first, .. } => first,
            Self::UnresolvedPathParameter { placeholder } => placeholder,
        }
    }
}

/// The transport could not complete the round-trip. Carries no HTTP status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("TLS failure: {0}")]
    Tls(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("transport error: {0}")]
    Other(String),
}

/// Settings or certificate material could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable `{0}` is not set")]
    MissingVar(&'static str),

    #[error("invalid base URL `{value}`: {source}")]
    InvalidUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid timeout `{0}`: expected whole seconds")]
    InvalidTimeout(String),

    #[error("failed to read `{path}`: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid PEM material in `{path}`: {reason}")]
    InvalidPem { path: PathBuf, reason: String },

    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Top-level error for a logical call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A success response whose body does not match the declared envelope.
    #[error("malformed envelope for `{operation}`: {reason}")]
    MalformedEnvelope {
        operation: &'static str,
        reason: String,
    },

    #[error("`{operation}` requires the {required} channel but the transport provides {available}")]
    ChannelMismatch {
        operation: &'static str,
        required: AuthChannel,
        available: AuthChannel,
    },

    #[error("unknown operation `{0}`")]
    UnknownOperation(String),
}

impl ApiError {
    /// `true` when the failure happened before any network work.
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::ChannelMismatch { .. } | Self::UnknownOperation(_) | Self::Config(_)
        )
    }
}
