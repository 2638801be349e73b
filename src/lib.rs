//! # geocognition
//!
//! Staged image geolocation and forensics with multimodal LLMs.
//!
//! An image goes in; a structured report comes out with the most likely
//! location, a description, a confidence score, an authenticity assessment,
//! an indoor/outdoor classification and the web sources that backed the
//! location hypothesis.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image bytes + language [+ trusted coordinates]
//!  │
//!  ├─ 1. initialization
//!  ├─ 2. feature-extraction     vision call: list identifying features
//!  ├─ 3. hypothesis-generation  web-search-grounded call: candidate location + citations
//!  └─ 4. synthesis              vision call with a fixed JSON schema → AnalysisReport
//! ```
//!
//! With trusted coordinates, phases 2 and 3 make no remote call (they are
//! still reported) and synthesis is told to treat the coordinates as ground
//! truth. Every remote call is retried with exponential backoff on rate
//! limits; a rejected API key fails immediately.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geocognition::{AnalysisConfig, AnalysisRequest, ImagePayload, Language, Orchestrator, PipelinePhase};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Reads GEMINI_API_KEY
//!     let orchestrator = Orchestrator::new(AnalysisConfig::from_env()?)?;
//!     let image = ImagePayload::new(std::fs::read("photo.jpg")?, "image/jpeg");
//!     let request = AnalysisRequest::new(image, Language::En);
//!
//!     let report = orchestrator
//!         .run_analysis(&request, &|phase: PipelinePhase| eprintln!("→ {phase}"))
//!         .await?;
//!     println!("{} ({:.0}%)", report.location_name, report.confidence_score);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `geocog` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! geocognition = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod geocode;
pub mod orchestrator;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod request;
pub mod schema;
pub mod stream;
pub mod transport;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{AnalysisConfig, AnalysisConfigBuilder};
pub use error::{AnalysisError, ConfigurationError, InputError, InvalidCoordinates};
pub use geocode::{GeocodeError, Geocoder, Place};
pub use orchestrator::{Orchestrator, PipelinePlan};
pub use output::{
    AnalysisReport, Citation, EnvironmentAssessment, EnvironmentKind, ForensicAssessment,
    Hypothesis,
};
pub use pipeline::gps::exif_gps_location;
pub use pipeline::input::resolve_input;
pub use progress::{NoopPhaseObserver, PhaseObserver};
pub use prompts::{compose_prompts, compose_prompts_for_locale, ComposedPrompts};
pub use request::{AnalysisRequest, ImagePayload, Language, PipelinePhase, TrustedLocation};
pub use stream::{spawn_analysis, AnalysisHandle, PhaseStream};
pub use transport::{
    InferenceTransport, RemoteRequest, RemoteResponse, TransportError, TransportErrorKind,
};
