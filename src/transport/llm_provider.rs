//! Adapter from any `edgequake_llm` provider to [`InferenceTransport`].
//!
//! Lets the pipeline run against OpenAI, Anthropic, Ollama, etc. Two
//! differences from the Gemini transport:
//!
//! * No web-search grounding. Requests that ask for it are sent without it
//!   and come back with no citations.
//! * No native response schema. The schema is appended to the prompt as an
//!   instruction; the validator still enforces it.
//!
//! `edgequake_llm` errors carry no structured status, so they are classified
//! from their message text here and nowhere else.

use super::{InferenceTransport, RemoteRequest, RemoteResponse, TransportError};
use crate::error::ConfigurationError;
use crate::pipeline::encode::to_image_data;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

const SYSTEM_PROMPT: &str = "You are a geospatial intelligence analyst. \
Follow the user's instructions exactly and answer in the requested language.";

/// Wraps an `Arc<dyn LLMProvider>`.
pub struct LlmProviderTransport {
    provider: Arc<dyn LLMProvider>,
    name: String,
}

impl LlmProviderTransport {
    /// Wrap a provider the caller already built. `name` is only used in logs.
    pub fn new(name: impl Into<String>, provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            name: name.into(),
        }
    }

    /// Build a provider by name via [`ProviderFactory::create_llm_provider`].
    ///
    /// The provider reads its own API key (`OPENAI_API_KEY`, …) from the
    /// environment.
    pub fn from_name(provider_name: &str, model: &str) -> Result<Self, ConfigurationError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
            ConfigurationError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            }
        })?;
        Ok(Self {
            provider,
            name: provider_name.to_string(),
        })
    }

    async fn call(&self, request: &RemoteRequest) -> Result<RemoteResponse, TransportError> {
        if request.search_grounding {
            warn!(
                "{}: web-search grounding is not supported; [{}] runs ungrounded",
                self.name, request.phase
            );
        }

        let messages = build_messages(request);
        let options = CompletionOptions {
            temperature: Some(request.temperature),
            ..Default::default()
        };

        let start = Instant::now();
        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| classify_message(&format!("{e}")))?;

        debug!(
            "{} [{}]: {} input tokens, {} output tokens, {:?}",
            self.name,
            request.phase,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(RemoteResponse::text(response.content))
    }
}

impl InferenceTransport for LlmProviderTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn generate<'a>(
        &'a self,
        request: &'a RemoteRequest,
    ) -> BoxFuture<'a, Result<RemoteResponse, TransportError>> {
        Box::pin(self.call(request))
    }
}

fn build_messages(request: &RemoteRequest) -> Vec<ChatMessage> {
    let images = request.image.iter().map(to_image_data).collect();
    vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user_with_images(user_prompt(request), images),
    ]
}

fn user_prompt(request: &RemoteRequest) -> String {
    match &request.schema {
        Some(schema) => format!(
            "{}\n\nRespond with a single JSON object (no markdown fences) matching this schema:\n{}",
            request.prompt, schema
        ),
        None => request.prompt.clone(),
    }
}

/// Classify an error from its rendered message.
fn classify_message(message: &str) -> TransportError {
    let lower = message.to_lowercase();
    let status = extract_status(&lower);

    let rate_limited = status == Some(429)
        || ["rate limit", "rate_limit", "resource exhausted", "resource_exhausted", "quota"]
            .iter()
            .any(|p| lower.contains(p));
    let bad_key = status == Some(401)
        || ["api key not valid", "invalid api key", "invalid_api_key", "unauthorized"]
            .iter()
            .any(|p| lower.contains(p));

    if rate_limited {
        TransportError::rate_limited(status, message)
    } else if bad_key {
        TransportError::invalid_credential(status, message)
    } else {
        TransportError::other(status, message)
    }
}

/// First standalone three-digit 4xx/5xx number in the message, if any.
fn extract_status(lower: &str) -> Option<u16> {
    lower
        .split(|c: char| !c.is_ascii_digit())
        .filter(|t| t.len() == 3)
        .filter_map(|t| t.parse::<u16>().ok())
        .find(|n| (400..600).contains(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{ImagePayload, PipelinePhase};
    use crate::transport::TransportErrorKind;
    use serde_json::json;

    #[test]
    fn classifies_rate_limits_from_text() {
        for msg in [
            "HTTP 429 Too Many Requests",
            "Rate limit reached for gpt-4.1 in organization",
            "RESOURCE_EXHAUSTED: quota",
            "You exceeded your current quota",
        ] {
            assert_eq!(
                classify_message(msg).kind,
                TransportErrorKind::RateLimited,
                "{msg}"
            );
        }
        assert_eq!(classify_message("status 429").status, Some(429));
    }

    #[test]
    fn classifies_bad_keys_from_text() {
        for msg in [
            "API error 401: Incorrect API key provided",
            "Invalid API key",
            "Unauthorized",
            "API key not valid. Please pass a valid API key.",
        ] {
            assert_eq!(
                classify_message(msg).kind,
                TransportErrorKind::InvalidCredential,
                "{msg}"
            );
        }
    }

    #[test]
    fn everything_else_is_other_and_unchanged() {
        let err = classify_message("connection refused (os error 111)");
        assert_eq!(err.kind, TransportErrorKind::Other);
        assert_eq!(err.message, "connection refused (os error 111)");
        assert_eq!(err.status, None);
        assert_eq!(classify_message("HTTP 500 internal").status, Some(500));
    }

    #[test]
    fn schema_is_appended_as_instruction() {
        let request = RemoteRequest {
            phase: PipelinePhase::Synthesis,
            model: "gpt-4.1".into(),
            image: Some(ImagePayload::new(vec![1u8, 2, 3], "image/png")),
            prompt: "Describe.".into(),
            schema: Some(json!({"type": "OBJECT"})),
            search_grounding: false,
            temperature: 0.2,
        };
        let prompt = user_prompt(&request);
        assert!(prompt.starts_with("Describe."));
        assert!(prompt.contains("\"type\":\"OBJECT\""));
        assert_eq!(build_messages(&request).len(), 2);

        let plain = RemoteRequest {
            schema: None,
            ..request
        };
        assert_eq!(user_prompt(&plain), "Describe.");
    }
}
