//! Inbound data model: what a caller hands to the orchestrator.
//!
//! An [`AnalysisRequest`] is transient — built by the caller, consumed by one
//! pipeline run, then dropped. The image payload is shared behind an `Arc` so
//! the feature-extraction and synthesis phases can both attach it without
//! copying the bytes.

use crate::error::InvalidCoordinates;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

// ── Language ─────────────────────────────────────────────────────────────

/// Report language. Prompts are localised for every variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Es,
    Zh,
    Hi,
    Fr,
    Ru,
    Pt,
}

impl Language {
    /// Every supported language, in a stable order.
    pub const ALL: [Language; 7] = [
        Language::En,
        Language::Es,
        Language::Zh,
        Language::Hi,
        Language::Fr,
        Language::Ru,
        Language::Pt,
    ];

    /// ISO 639-1 code.
    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Es => "es",
            Language::Zh => "zh",
            Language::Hi => "hi",
            Language::Fr => "fr",
            Language::Ru => "ru",
            Language::Pt => "pt",
        }
    }

    /// Resolve a locale tag such as `"pt-BR"` or `"ES"`.
    ///
    /// Unknown locales fall back to [`Language::En`].
    pub fn from_locale(tag: &str) -> Language {
        let primary = tag
            .trim()
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        Language::ALL
            .into_iter()
            .find(|l| l.code() == primary)
            .unwrap_or_default()
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Language::from_locale(s))
    }
}

// ── Trusted location ─────────────────────────────────────────────────────

/// Caller-supplied coordinates treated as ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustedLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Optional human-readable address, e.g. from reverse geocoding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl TrustedLocation {
    /// Validate and build a coordinate pair.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinates::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinates::Longitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
            label: None,
        })
    }

    /// Build a hint from optional halves. Both or neither must be present.
    pub fn from_parts(
        latitude: Option<f64>,
        longitude: Option<f64>,
    ) -> Result<Option<Self>, InvalidCoordinates> {
        match (latitude, longitude) {
            (Some(lat), Some(lon)) => Self::new(lat, lon).map(Some),
            (None, None) => Ok(None),
            _ => Err(InvalidCoordinates::Incomplete),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        let label = label.into();
        self.label = if label.trim().is_empty() {
            None
        } else {
            Some(label)
        };
        self
    }

    /// Coordinates formatted to six decimals (≈ 0.1 m).
    pub fn coordinates(&self) -> String {
        format!("{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

// ── Image payload ────────────────────────────────────────────────────────

/// Opaque image bytes plus their MIME type. Never decoded by this crate.
#[derive(Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: Arc<[u8]>,
}

impl ImagePayload {
    pub fn new(data: impl Into<Arc<[u8]>>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for ImagePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImagePayload")
            .field("mime_type", &self.mime_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

// ── Request ──────────────────────────────────────────────────────────────

/// Everything one pipeline run needs.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub image: ImagePayload,
    pub language: Language,
    pub trusted_location: Option<TrustedLocation>,
}

impl AnalysisRequest {
    pub fn new(image: ImagePayload, language: Language) -> Self {
        Self {
            image,
            language,
            trusted_location: None,
        }
    }

    pub fn with_trusted_location(mut self, location: TrustedLocation) -> Self {
        self.trusted_location = Some(location);
        self
    }
}

// ── Phases ───────────────────────────────────────────────────────────────

/// Named pipeline stages, in execution order.
///
/// `Ord` follows the declaration order, so progress can be checked with `<`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelinePhase {
    Initialization,
    FeatureExtraction,
    HypothesisGeneration,
    Synthesis,
}

impl PipelinePhase {
    pub const ALL: [PipelinePhase; 4] = [
        PipelinePhase::Initialization,
        PipelinePhase::FeatureExtraction,
        PipelinePhase::HypothesisGeneration,
        PipelinePhase::Synthesis,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PipelinePhase::Initialization => "initialization",
            PipelinePhase::FeatureExtraction => "feature-extraction",
            PipelinePhase::HypothesisGeneration => "hypothesis-generation",
            PipelinePhase::Synthesis => "synthesis",
        }
    }

    /// 1-based position, handy for "step 2/4" progress labels.
    pub fn ordinal(self) -> usize {
        self as usize + 1
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
