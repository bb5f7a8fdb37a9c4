//! Error types for the automation engine

use thiserror::Error;

/// Result type alias using [`HarnessError`]
pub type Result<T> = std::result::Result<T, HarnessError>;

/// Errors surfaced by the automation engine and the scenario library built
/// on top of it. Scenario-library errors propagate to the orchestrator
/// uncaught; only teardown failures are logged and suppressed.
#[derive(Error, Debug)]
pub enum HarnessError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status {status} fetching {url}")]
    UnexpectedStatus { url: String, status: u16 },

    #[error("authentication rejected: {0}")]
    Authentication(String),

    #[error("resolution failed in {operation}: {detail}")]
    Resolution { operation: String, detail: String },

    #[error("no form matched in {operation}: {detail}")]
    FormNotFound { operation: String, detail: String },

    #[error("form {action:?} has no field named {field:?}")]
    UnknownField { action: String, field: String },

    #[error("invalid selector: {0}")]
    Selector(String),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("check failed: {0}")]
    Check(String),
}
