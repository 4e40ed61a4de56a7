use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::engine::SourceKind;

/**
 * Error taxonomy for every call that touches the native engine.
 *
 * Native status codes never leave `engine::boundary`; by the time a
 * failure reaches a caller it has been turned into one of these.
 */
#[derive(Error, Debug)]
pub enum NluError {
    #[error("Invalid engine configuration: {details}")]
    Configuration { details: String },
    #[error("Failed to create engine from {source_kind}: {reason}")]
    Construction { source_kind: SourceKind, reason: String },
    #[error("Engine failed to process {query:?}: {reason}")]
    Parse { query: String, reason: String },
    #[error("Native call {call} failed: {reason}")]
    Native { call: &'static str, reason: String },
    #[error("Malformed engine output: {0}")]
    Decoding(#[from] DecodingError),
    #[error("Engine is not loaded or has been disposed")]
    EngineNotLoaded,
    #[error("Invalid input parameters: {details}")]
    InvalidInput { details: String },
    #[error("Engine lock poisoned by a panicking caller")]
    Poisoned,
    #[error("Parse did not finish within {0:?}")]
    Timeout(Duration),
    #[error("Background parse task failed: {0}")]
    Task(String),
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config file: {0}")]
    ConfigFormat(#[from] toml::de::Error),
}

/// The engine answered with success but its payload could not be read.
/// Usually means the engine and this binding were built from different versions.
#[derive(Error, Debug)]
pub enum DecodingError {
    #[error("engine reported success but returned no output")]
    NullOutput,
    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("output is not a valid document: {0}")]
    Json(#[from] serde_json::Error),
}

impl NluError {
    pub(crate) fn configuration(details: impl Into<String>) -> Self {
        NluError::Configuration {
            details: details.into(),
        }
    }

    pub(crate) fn invalid_input(details: impl Into<String>) -> Self {
        NluError::InvalidInput {
            details: details.into(),
        }
    }

    /// True for failures that leave the engine usable for the next query.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            NluError::Parse { .. } | NluError::InvalidInput { .. } | NluError::Timeout(_)
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for NluError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        NluError::Poisoned
    }
}

impl From<serde_json::Error> for NluError {
    fn from(err: serde_json::Error) -> Self {
        NluError::Decoding(DecodingError::Json(err))
    }
}

pub type Result<T> = std::result::Result<T, NluError>;
