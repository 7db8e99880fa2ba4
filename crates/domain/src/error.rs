//! Error types shared across the workspace.
//!
//! The taxonomy mirrors how failures are scoped during a run:
//! - `ConfigError`: bad configuration (file, field, pattern, identifier)
//! - `TransportError`: a platform call failed (fetch or append)
//! - `FilterError`: what ends up on a single filter's outcome
//! - `RunAbortError`: the run stopped early because `continue_on_error` is off

use thiserror::Error;

/// Errors raised while loading or interpreting configuration.
///
/// Every variant that concerns a single filter carries the filter label so
/// that the message is actionable without further context.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Config file could not be found
    #[error("Config file not found: {path}")]
    FileNotFound { path: String },

    /// Config file exists but could not be read
    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    /// The document is not valid TOML or has the wrong shape
    #[error("Failed to parse config: {0}")]
    Parse(String),

    /// The config declares no filters at all
    #[error("Config must contain at least one filter configuration")]
    NoFilters,

    /// A required field is absent or blank
    #[error("{filter}: missing required field '{field}'")]
    MissingField { filter: String, field: &'static str },

    /// A field is present but its value is not acceptable
    #[error("{filter}: invalid value for '{field}': {value}")]
    InvalidValue {
        filter: String,
        field: &'static str,
        value: String,
    },

    /// A regular expression failed to compile
    #[error("{filter}: invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern {
        filter: String,
        pattern: String,
        reason: String,
    },

    /// A show or playlist reference is neither a bare id, a URI nor a URL
    #[error("{filter}: cannot resolve {field} from '{value}'")]
    UnresolvableIdentifier {
        filter: String,
        field: &'static str,
        value: String,
    },
}

/// Failure of a call to the streaming platform.
///
/// The core never retries; these are surfaced verbatim on the outcome.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The request never produced a response (network, timeout, TLS)
    #[error("Request failed: {0}")]
    Request(String),

    /// The platform answered with a non-success status
    #[error("Platform returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body did not have the expected shape
    #[error("Invalid response from platform: {0}")]
    Decode(String),

    /// No usable credential could be obtained
    #[error("Authentication failed: {0}")]
    Auth(String),
}

/// Terminal failure of one filter configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

/// Raised when a filter fails and the run is configured to stop on errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Run aborted after filter '{filter}' failed: {reason}")]
pub struct RunAbortError {
    pub filter: String,
    pub reason: String,
}

/// Convenience type alias for configuration Results
pub type Result<T> = std::result::Result<T, ConfigError>;
