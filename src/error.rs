//! Error types for the geocognition library.
//!
//! Errors are split by *when* they can happen:
//!
//! * [`ConfigurationError`] — returned while building the config, a
//!   transport, or the [`crate::orchestrator::Orchestrator`]. A missing API
//!   key is caught here, before any image is analysed.
//!
//! * [`AnalysisError`] — the complete error contract of
//!   [`crate::orchestrator::Orchestrator::run_analysis`]. It has exactly four
//!   variants so that a UI can map every failure to a message with an
//!   exhaustive `match`.
//!
//! * [`InvalidCoordinates`] — a trusted-location hint that cannot be used
//!   (half a coordinate pair, NaN, out of range).
//!
//! Transport- and invoker-level errors ([`crate::transport::TransportError`],
//! [`crate::pipeline::invoke::InvokeError`]) are internal seams; they are
//! converted into [`AnalysisError`] before leaving the orchestrator.

use crate::pipeline::invoke::InvokeError;
use std::path::PathBuf;
use thiserror::Error;

/// All failures surfaced by a pipeline run.
#[derive(Debug, Clone, Error, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum AnalysisError {
    /// The remote service kept rate-limiting us until the attempt budget ran out.
    #[error("API quota exceeded after all retry attempts.\nWait a few minutes and try again.")]
    QuotaExceeded,

    /// The configured API key was rejected. Retrying will not help.
    #[error("The API key was rejected by the inference service.\nCheck GEMINI_API_KEY.")]
    InvalidCredential,

    /// The service answered, but not with a usable report.
    #[error("Invalid response format from the inference service: {detail}")]
    InvalidResponseFormat { detail: String },

    /// Anything else: network faults, unclassified service errors, task panics.
    #[error("Analysis failed: {detail}")]
    GenericFailure { detail: String },
}

impl AnalysisError {
    /// Stable symbolic code for the caller's error-display switch.
    pub fn code(&self) -> &'static str {
        match self {
            AnalysisError::QuotaExceeded => "QUOTA_EXCEEDED",
            AnalysisError::InvalidCredential => "INVALID_API_KEY",
            AnalysisError::InvalidResponseFormat { .. } => "INVALID_RESPONSE_FORMAT",
            AnalysisError::GenericFailure { .. } => "GENERIC_ERROR",
        }
    }

    pub(crate) fn invalid_format(detail: impl Into<String>) -> Self {
        AnalysisError::InvalidResponseFormat {
            detail: detail.into(),
        }
    }

    pub(crate) fn generic(detail: impl Into<String>) -> Self {
        AnalysisError::GenericFailure {
            detail: detail.into(),
        }
    }
}

impl From<InvokeError> for AnalysisError {
    fn from(e: InvokeError) -> Self {
        match e {
            InvokeError::QuotaExceeded { .. } => AnalysisError::QuotaExceeded,
            InvokeError::InvalidCredential => AnalysisError::InvalidCredential,
            InvokeError::Transport(inner) => AnalysisError::generic(inner.to_string()),
        }
    }
}

/// Construction-time configuration problems.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigurationError {
    /// A required field (API key, model, …) was not supplied.
    #[error("Missing required configuration field '{field}'.\n{hint}")]
    MissingField { field: &'static str, hint: String },

    /// A field was supplied but its value is unusable.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// The named provider could not be created.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },
}

/// A trusted-location hint that was rejected.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidCoordinates {
    /// Latitude and longitude must be supplied together.
    #[error("latitude and longitude must be supplied together")]
    Incomplete,

    /// Latitude outside −90…90 or not a finite number.
    #[error("latitude {0} is outside -90..=90")]
    Latitude(f64),

    /// Longitude outside −180…180 or not a finite number.
    #[error("longitude {0} is outside -180..=180")]
    Longitude(f64),
}

/// Failures while loading an image for analysis (CLI / convenience API).
#[derive(Debug, Error)]
pub enum InputError {
    /// Input file was not found at the given path.
    #[error("Image file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// HTTP URL was syntactically valid but download failed.
    #[error("Failed to download '{url}': {reason}\nCheck your internet connection.")]
    DownloadFailed { url: String, reason: String },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    /// The bytes are not a recognised image format.
    #[error("'{source_name}' is not a supported image (first bytes: {magic:02X?})")]
    NotAnImage { source_name: String, magic: Vec<u8> },

    /// The file is empty.
    #[error("'{source_name}' is empty")]
    Empty { source_name: String },

    #[error("Failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{TransportError, TransportErrorKind};

    #[test]
    fn codes_are_stable() {
        assert_eq!(AnalysisError::QuotaExceeded.code(), "QUOTA_EXCEEDED");
        assert_eq!(AnalysisError::InvalidCredential.code(), "INVALID_API_KEY");
        assert_eq!(
            AnalysisError::invalid_format("x").code(),
            "INVALID_RESPONSE_FORMAT"
        );
        assert_eq!(AnalysisError::generic("x").code(), "GENERIC_ERROR");
    }

    #[test]
    fn invoke_errors_map_onto_public_contract() {
        assert_eq!(
            AnalysisError::from(InvokeError::QuotaExceeded { attempts: 5 }),
            AnalysisError::QuotaExceeded
        );
        assert_eq!(
            AnalysisError::from(InvokeError::InvalidCredential),
            AnalysisError::InvalidCredential
        );

        let other = TransportError::new(TransportErrorKind::Other, Some(503), "backend overloaded");
        match AnalysisError::from(InvokeError::Transport(other)) {
            AnalysisError::GenericFailure { detail } => {
                assert!(detail.contains("backend overloaded"), "got: {detail}");
                assert!(detail.contains("503"), "got: {detail}");
            }
            e => panic!("expected GenericFailure, got {e:?}"),
        }
    }

    #[test]
    fn missing_field_display() {
        let e = ConfigurationError::MissingField {
            field: "api_key",
            hint: "Set GEMINI_API_KEY.".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("api_key"), "got: {msg}");
        assert!(msg.contains("GEMINI_API_KEY"), "got: {msg}");
    }

    #[test]
    fn coordinate_errors_display() {
        assert!(InvalidCoordinates::Latitude(91.0).to_string().contains("91"));
        assert!(InvalidCoordinates::Longitude(-200.5)
            .to_string()
            .contains("-200.5"));
    }
}
