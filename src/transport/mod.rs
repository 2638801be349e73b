//! The remote-inference capability boundary.
//!
//! The pipeline never talks HTTP itself. It hands a [`RemoteRequest`] to an
//! [`InferenceTransport`] and gets back either a [`RemoteResponse`] or a
//! typed [`TransportError`]. Classification of failures (rate limit, bad
//! credential, anything else) happens *inside* the transport, where the
//! status code and structured error body are available, so the retry logic
//! in [`crate::pipeline::invoke`] only ever switches on
//! [`TransportErrorKind`].
//!
//! Two implementations ship with the crate:
//!
//! * [`gemini::GeminiTransport`] — direct `generateContent` calls, with
//!   native `responseSchema` and Google Search grounding.
//! * [`llm_provider::LlmProviderTransport`] — any `edgequake_llm` provider
//!   (OpenAI, Anthropic, Ollama, …). No grounding.

pub mod gemini;
pub mod llm_provider;

use crate::request::{ImagePayload, PipelinePhase};
use futures::future::BoxFuture;
use std::fmt;
use thiserror::Error;

/// One remote inference call.
#[derive(Debug, Clone)]
pub struct RemoteRequest {
    /// The phase this call belongs to. Transports may log it; tests assert on it.
    pub phase: PipelinePhase,
    pub model: String,
    pub image: Option<ImagePayload>,
    pub prompt: String,
    /// JSON schema the response must conform to, if any.
    pub schema: Option<serde_json::Value>,
    /// Ask the service to ground the answer with live web search.
    pub search_grounding: bool,
    pub temperature: f32,
}

/// A raw citation chunk, exactly as the service returned it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CitationChunk {
    pub uri: Option<String>,
    pub title: Option<String>,
}

/// Raw text plus grounding metadata.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteResponse {
    pub text: String,
    pub citations: Vec<CitationChunk>,
}

impl RemoteResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            citations: Vec::new(),
        }
    }
}

/// The three failure classes the retry policy understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    /// 429 / quota exhausted. Retried with backoff.
    RateLimited,
    /// Rejected credential. Never retried.
    InvalidCredential,
    /// Everything else. Never retried; propagated unchanged.
    Other,
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportErrorKind::RateLimited => "rate limited",
            TransportErrorKind::InvalidCredential => "invalid credential",
            TransportErrorKind::Other => "error",
        })
    }
}

/// A classified transport failure.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{kind}{}: {message}", .status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn rate_limited(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::RateLimited, status, message)
    }

    pub fn invalid_credential(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::InvalidCredential, status, message)
    }

    pub fn other(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Other, status, message)
    }
}

/// A multimodal inference backend.
///
/// Implementations must be `Send + Sync`: one transport is shared by every
/// concurrent pipeline run through an `Arc`.
pub trait InferenceTransport: Send + Sync {
    /// Short provider name for logs, e.g. `"gemini"`.
    fn name(&self) -> &str;

    /// Perform a single call. No retrying here; that is the invoker's job.
    fn generate<'a>(
        &'a self,
        request: &'a RemoteRequest,
    ) -> BoxFuture<'a, Result<RemoteResponse, TransportError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transport_error_display_includes_status() {
        let e = TransportError::rate_limited(Some(429), "RESOURCE_EXHAUSTED");
        assert_eq!(e.to_string(), "rate limited (HTTP 429): RESOURCE_EXHAUSTED");

        let e = TransportError::other(None, "connection reset");
        assert_eq!(e.to_string(), "error: connection reset");
    }
}
