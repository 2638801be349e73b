//! Configuration for the analysis pipeline.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. The config is created once at startup, handed
//! to [`crate::orchestrator::Orchestrator::new`], and is read-only from then
//! on — there is no module-level global holding the API key.

use crate::error::ConfigurationError;
use crate::request::Language;
use crate::transport::InferenceTransport;
use std::fmt;
use std::sync::Arc;

/// Default Gemini model.
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini REST endpoint.
pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for an [`crate::orchestrator::Orchestrator`].
///
/// # Example
/// ```rust
/// use geocognition::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .api_key("AIza...")
///     .model("gemini-2.5-pro")
///     .build()
///     .unwrap();
/// assert_eq!(config.max_attempts, 5);
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// API key for the Gemini transport. Required unless `transport` or
    /// `provider_name` is set.
    pub api_key: Option<String>,

    /// Model identifier sent with every remote call. Default: `gemini-2.5-flash`.
    pub model: String,

    /// Base URL of the Gemini REST API. Overridable for proxies and tests.
    pub api_base_url: String,

    /// Use an `edgequake_llm` provider (`"openai"`, `"anthropic"`, `"ollama"`, …)
    /// instead of Gemini. Web-search grounding is unavailable on this path.
    pub provider_name: Option<String>,

    /// Pre-constructed transport. Takes precedence over everything else.
    pub transport: Option<Arc<dyn InferenceTransport>>,

    /// Total attempts per remote call, including the first. Default: 5.
    pub max_attempts: u32,

    /// Initial backoff after a rate-limit error, in ms. Default: 3000.
    ///
    /// The delay before attempt `n + 1` is `initial_backoff_ms * 2^n`, so the
    /// default schedule is 3 s → 6 s → 12 s → 24 s.
    pub initial_backoff_ms: u64,

    /// Sampling temperature for every phase. Default: 0.2.
    pub temperature: f32,

    /// Per-call HTTP timeout in seconds. Default: 120.
    pub request_timeout_secs: u64,

    /// Pause after each phase notification, in ms. Default: 0.
    ///
    /// Gives progress UIs a chance to render a phase that completes instantly
    /// (e.g. the skipped phases of a trusted-location run).
    pub phase_pacing_ms: u64,

    /// Language of requests built with [`crate::Orchestrator::request`].
    /// Default: English.
    pub default_language: Language,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            provider_name: None,
            transport: None,
            max_attempts: 5,
            initial_backoff_ms: 3000,
            temperature: 0.2,
            request_timeout_secs: 120,
            phase_pacing_ms: 0,
            default_language: Language::En,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("api_base_url", &self.api_base_url)
            .field("provider_name", &self.provider_name)
            .field(
                "transport",
                &self.transport.as_ref().map(|t| t.name().to_string()),
            )
            .field("max_attempts", &self.max_attempts)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("temperature", &self.temperature)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("phase_pacing_ms", &self.phase_pacing_ms)
            .field("default_language", &self.default_language)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from the process environment.
    ///
    /// Reads `GEMINI_API_KEY` (falling back to `API_KEY`), `GEOCOG_MODEL` and
    /// `GEOCOG_LANG` (a locale tag; unsupported tags mean English).
    /// A missing key is not an error here; it surfaces when the Gemini
    /// transport is constructed.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut builder = Self::builder();
        if let Some(key) = non_empty_env("GEMINI_API_KEY").or_else(|| non_empty_env("API_KEY")) {
            builder = builder.api_key(key);
        }
        if let Some(model) = non_empty_env("GEOCOG_MODEL") {
            builder = builder.model(model);
        }
        if let Some(lang) = non_empty_env("GEOCOG_LANG") {
            builder = builder.default_language(Language::from_locale(&lang));
        }
        builder.build()
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn transport(mut self, transport: Arc<dyn InferenceTransport>) -> Self {
        self.config.transport = Some(transport);
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n;
        self
    }

    pub fn initial_backoff_ms(mut self, ms: u64) -> Self {
        self.config.initial_backoff_ms = ms;
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = secs;
        self
    }

    pub fn phase_pacing_ms(mut self, ms: u64) -> Self {
        self.config.phase_pacing_ms = ms;
        self
    }

    pub fn default_language(mut self, lang: Language) -> Self {
        self.config.default_language = lang;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, ConfigurationError> {
        let c = &self.config;
        if c.max_attempts == 0 {
            return Err(ConfigurationError::Invalid(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        if c.model.trim().is_empty() {
            return Err(ConfigurationError::MissingField {
                field: "model",
                hint: "Pass --model or set GEOCOG_MODEL.".into(),
            });
        }
        if c.request_timeout_secs == 0 {
            return Err(ConfigurationError::Invalid(
                "request_timeout_secs must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
