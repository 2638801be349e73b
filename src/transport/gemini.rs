//! Direct Gemini `generateContent` transport.
//!
//! ```text
//! POST {base}/v1beta/models/{model}:generateContent
//! x-goog-api-key: …
//! ```
//!
//! This is the only transport that supports both a native `responseSchema`
//! and Google Search grounding. Failures are classified here from the HTTP
//! status and the structured `{"error": {...}}` body.

use super::{CitationChunk, InferenceTransport, RemoteRequest, RemoteResponse, TransportError};
use crate::config::AnalysisConfig;
use crate::error::ConfigurationError;
use crate::pipeline::encode::to_base64;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Calls the Gemini REST API with an API key.
pub struct GeminiTransport {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiTransport {
    /// Build from config. Fails if no API key is configured.
    pub fn new(config: &AnalysisConfig) -> Result<Self, ConfigurationError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ConfigurationError::MissingField {
                field: "api_key",
                hint: "Set GEMINI_API_KEY or pass an API key to the config builder.".into(),
            })?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ConfigurationError::Invalid(format!("HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, model)
    }

    async fn call(&self, request: &RemoteRequest) -> Result<RemoteResponse, TransportError> {
        let body = build_body(request);
        debug!(
            "gemini {} [{}]: grounding={}, schema={}, image={}",
            request.model,
            request.phase,
            request.search_grounding,
            request.schema.is_some(),
            request.image.is_some()
        );

        let response = self
            .client
            .post(self.endpoint(&request.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransportError::other(None, format!("request failed: {e}")))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| TransportError::other(Some(status), format!("reading body: {e}")))?;

        if !(200..300).contains(&status) {
            let err = classify(status, &text);
            warn!("gemini [{}]: {}", request.phase, err);
            return Err(err);
        }

        parse_response(&text)
    }
}

impl InferenceTransport for GeminiTransport {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate<'a>(
        &'a self,
        request: &'a RemoteRequest,
    ) -> BoxFuture<'a, Result<RemoteResponse, TransportError>> {
        Box::pin(self.call(request))
    }
}

// ── Wire types ───────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentBody {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<Tool>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Inline { inline_data: Blob },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebSource>,
}

#[derive(Debug, Deserialize)]
struct WebSource {
    uri: Option<String>,
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    reason: Option<String>,
}

// ── Request / response mapping ───────────────────────────────────────────

fn build_body(request: &RemoteRequest) -> GenerateContentBody {
    let mut parts = Vec::with_capacity(2);
    if let Some(image) = &request.image {
        parts.push(Part::Inline {
            inline_data: Blob {
                mime_type: image.mime_type.clone(),
                data: to_base64(image),
            },
        });
    }
    parts.push(Part::Text {
        text: request.prompt.clone(),
    });

    let tools = request.search_grounding.then(|| {
        vec![Tool {
            google_search: GoogleSearch {},
        }]
    });

    GenerateContentBody {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        tools,
        generation_config: GenerationConfig {
            temperature: request.temperature,
            response_mime_type: request.schema.as_ref().map(|_| "application/json"),
            response_schema: request.schema.clone(),
        },
    }
}

fn parse_response(body: &str) -> Result<RemoteResponse, TransportError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body)
        .map_err(|e| TransportError::other(None, format!("unreadable response body: {e}")))?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        let reason = parsed
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates".to_string());
        return Err(TransportError::other(None, format!("empty response: {reason}")));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        debug!(
            "gemini candidate carried no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        );
    }

    let citations = candidate
        .grounding_metadata
        .map(|m| {
            m.grounding_chunks
                .into_iter()
                .map(|chunk| match chunk.web {
                    Some(web) => CitationChunk {
                        uri: web.uri,
                        title: web.title,
                    },
                    None => CitationChunk::default(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(RemoteResponse { text, citations })
}

/// Map a non-2xx status and body onto the three transport error kinds.
fn classify(status: u16, body: &str) -> TransportError {
    let parsed = serde_json::from_str::<ErrorEnvelope>(body).ok().map(|e| e.error);
    let message = match &parsed {
        Some(e) if !e.message.is_empty() => e.message.clone(),
        _ => body.trim().chars().take(300).collect(),
    };
    let api_status = parsed.as_ref().and_then(|e| e.status.as_deref());
    let key_invalid_reason = parsed.as_ref().is_some_and(|e| {
        e.details
            .iter()
            .any(|d| d.reason.as_deref() == Some("API_KEY_INVALID"))
    });
    let lower = message.to_lowercase();

    if status == 429 || api_status == Some("RESOURCE_EXHAUSTED") {
        TransportError::rate_limited(Some(status), message)
    } else if status == 401
        || (status == 400
            && (key_invalid_reason
                || lower.contains("api key not valid")
                || lower.contains("invalid api key")))
    {
        TransportError::invalid_credential(Some(status), message)
    } else {
        TransportError::other(Some(status), message)
    }
}
