//! Pipeline orchestration: phases in order, one remote call per phase.
//!
//! ## Phase plans
//!
//! ```text
//! Full:            initialization → feature-extraction → hypothesis-generation → synthesis
//!                                   (image, remote)      (text + web search)     (image + schema)
//!
//! TrustedLocation: initialization → feature-extraction → hypothesis-generation → synthesis
//!                                   (no call)            (no call)               (image + schema)
//! ```
//!
//! Both plans report all four phases so a progress indicator advances the
//! same way either way. In the trusted plan the hypothesis is the caller's
//! coordinates (plus label); the synthesis prompt states them as ground
//! truth instead of offering them as a lead to verify.
//!
//! Any failure aborts the run. There is no partial report and no phase-level
//! retry beyond what [`ResilientInvoker`] does per call.

use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, ConfigurationError};
use crate::output::{AnalysisReport, Hypothesis};
use crate::pipeline::invoke::{tokio_sleeper, ResilientInvoker, RetryPolicy, Sleeper};
use crate::pipeline::validate::{complete_citations, parse_and_validate};
use crate::progress::PhaseObserver;
use crate::prompts::compose_prompts;
use crate::request::{AnalysisRequest, ImagePayload, Language, PipelinePhase, TrustedLocation};
use crate::schema::analysis_schema;
use crate::transport::gemini::GeminiTransport;
use crate::transport::llm_provider::LlmProviderTransport;
use crate::transport::{InferenceTransport, RemoteRequest};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// How a request is processed.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelinePlan {
    /// Infer the location from the image: extract features, search, synthesise.
    Full,
    /// Take the caller's coordinates as ground truth; only synthesis is remote.
    TrustedLocation(TrustedLocation),
}

impl PipelinePlan {
    pub fn for_request(request: &AnalysisRequest) -> Self {
        match &request.trusted_location {
            Some(loc) => PipelinePlan::TrustedLocation(loc.clone()),
            None => PipelinePlan::Full,
        }
    }

    /// Phases reported to the observer, in order. Identical for both plans;
    /// [`Orchestrator::run_analysis`] walks this list.
    pub fn phases(&self) -> [PipelinePhase; 4] {
        PipelinePhase::ALL
    }

    /// Whether `phase` is backed by a remote call under this plan. Phases
    /// that are not are still reported, then skipped.
    pub fn is_remote(&self, phase: PipelinePhase) -> bool {
        match (self, phase) {
            (_, PipelinePhase::Initialization) => false,
            (_, PipelinePhase::Synthesis) => true,
            (PipelinePlan::Full, _) => true,
            (PipelinePlan::TrustedLocation(_), _) => false,
        }
    }

    /// The trusted location, if this plan has one.
    pub fn trusted(&self) -> Option<&TrustedLocation> {
        match self {
            PipelinePlan::TrustedLocation(loc) => Some(loc),
            PipelinePlan::Full => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            PipelinePlan::Full => "full",
            PipelinePlan::TrustedLocation(_) => "trusted-location",
        }
    }
}

/// Runs analysis requests against one transport.
///
/// Cheap to share: wrap in an `Arc` and call [`Orchestrator::run_analysis`]
/// from as many tasks as needed. Runs share nothing but the config and the
/// transport; backoff state is local to each call.
pub struct Orchestrator {
    config: AnalysisConfig,
    invoker: ResilientInvoker,
    pacing: Option<(Duration, Sleeper)>,
}

impl Orchestrator {
    /// Build an orchestrator, resolving the transport from most to least
    /// specific:
    ///
    /// 1. `config.transport`, used as-is;
    /// 2. `config.provider_name`, via `edgequake_llm::ProviderFactory`;
    /// 3. the Gemini REST transport, which requires `config.api_key`.
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigurationError> {
        let transport = resolve_transport(&config)?;
        info!(
            "Using transport '{}' with model {}",
            transport.name(),
            config.model
        );
        let invoker = ResilientInvoker::new(transport, RetryPolicy::from_config(&config));
        let pacing = (config.phase_pacing_ms > 0)
            .then(|| (Duration::from_millis(config.phase_pacing_ms), tokio_sleeper()));
        Ok(Self {
            config,
            invoker,
            pacing,
        })
    }

    /// Replace the sleep used for backoff and phase pacing.
    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.invoker = self.invoker.with_sleeper(Arc::clone(&sleeper));
        if let Some((_, s)) = self.pacing.as_mut() {
            *s = sleeper;
        }
        self
    }

    /// A request for `image` in the configured default language.
    pub fn request(&self, image: ImagePayload) -> AnalysisRequest {
        AnalysisRequest::new(image, self.config.default_language)
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn transport_name(&self) -> &str {
        self.invoker.transport_name()
    }

    /// Run the full pipeline for one request.
    ///
    /// `observer` is told about each phase as it begins. On success the
    /// report carries every complete citation gathered while forming the
    /// hypothesis.
    pub async fn run_analysis(
        &self,
        request: &AnalysisRequest,
        observer: &dyn PhaseObserver,
    ) -> Result<AnalysisReport, AnalysisError> {
        let plan = PipelinePlan::for_request(request);
        let language = request.language;
        let start = Instant::now();
        info!(
            "Starting analysis: {} plan, {} image ({} bytes), language {}",
            plan.label(),
            request.image.mime_type,
            request.image.len(),
            language
        );

        let mut features = String::new();
        let mut hypothesis = match &plan {
            PipelinePlan::TrustedLocation(loc) => Hypothesis {
                text: trusted_hypothesis(loc),
                citations: Vec::new(),
            },
            PipelinePlan::Full => Hypothesis::default(),
        };
        let mut report = None;

        for phase in plan.phases() {
            self.enter(observer, phase).await;
            if !plan.is_remote(phase) {
                continue;
            }
            match phase {
                PipelinePhase::FeatureExtraction => {
                    features = self.extract_features(&request.image, language).await?;
                }
                PipelinePhase::HypothesisGeneration => {
                    hypothesis = self.generate_hypothesis(language, &features).await?;
                }
                PipelinePhase::Synthesis => {
                    report = Some(
                        self.synthesize(&request.image, language, &hypothesis.text, plan.trusted())
                            .await?,
                    );
                }
                PipelinePhase::Initialization => {}
            }
        }

        let mut report = report.ok_or_else(|| AnalysisError::GenericFailure {
            detail: format!("{} plan finished without a synthesis phase", plan.label()),
        })?;
        report.citations = hypothesis.citations;

        info!(
            "Analysis complete in {:?}: '{}' ({:.0}% confidence, {} citation(s))",
            start.elapsed(),
            report.location_name,
            report.confidence_score,
            report.citations.len()
        );
        Ok(report)
    }

    async fn enter(&self, observer: &dyn PhaseObserver, phase: PipelinePhase) {
        debug!("Phase {}/4: {}", phase.ordinal(), phase);
        observer.on_phase(phase);
        if let Some((delay, sleeper)) = &self.pacing {
            (sleeper)(*delay).await;
        }
    }

    async fn extract_features(
        &self,
        image: &ImagePayload,
        language: Language,
    ) -> Result<String, AnalysisError> {
        let prompts = compose_prompts(language, None, None, None);
        let response = self
            .invoker
            .invoke(&self.remote_request(
                PipelinePhase::FeatureExtraction,
                Some(image),
                prompts.feature_extraction,
            ))
            .await?;
        if response.text.trim().is_empty() {
            warn!("Feature extraction returned no text; continuing without features");
        }
        Ok(response.text)
    }

    async fn generate_hypothesis(
        &self,
        language: Language,
        features: &str,
    ) -> Result<Hypothesis, AnalysisError> {
        let prompts = compose_prompts(language, Some(features), None, None);
        let mut request =
            self.remote_request(PipelinePhase::HypothesisGeneration, None, prompts.hypothesis);
        request.search_grounding = true;

        let response = self.invoker.invoke(&request).await?;
        let citations = complete_citations(&response.citations);
        let text = response.text.trim().to_string();
        debug!(
            "Hypothesis: '{}' with {} citation(s)",
            text,
            citations.len()
        );
        Ok(Hypothesis { text, citations })
    }

    async fn synthesize(
        &self,
        image: &ImagePayload,
        language: Language,
        hypothesis: &str,
        trusted: Option<&TrustedLocation>,
    ) -> Result<AnalysisReport, AnalysisError> {
        let prompts = compose_prompts(language, None, Some(hypothesis), trusted);
        let mut request =
            self.remote_request(PipelinePhase::Synthesis, Some(image), prompts.synthesis);
        request.schema = Some(analysis_schema().clone());

        let response = self.invoker.invoke(&request).await?;
        parse_and_validate(&response.text)
    }

    fn remote_request(
        &self,
        phase: PipelinePhase,
        image: Option<&ImagePayload>,
        prompt: String,
    ) -> RemoteRequest {
        RemoteRequest {
            phase,
            model: self.config.model.clone(),
            image: image.cloned(),
            prompt,
            schema: None,
            search_grounding: false,
            temperature: self.config.temperature,
        }
    }
}

fn resolve_transport(
    config: &AnalysisConfig,
) -> Result<Arc<dyn InferenceTransport>, ConfigurationError> {
    if let Some(transport) = &config.transport {
        return Ok(Arc::clone(transport));
    }
    if let Some(name) = &config.provider_name {
        return Ok(Arc::new(LlmProviderTransport::from_name(
            name,
            &config.model,
        )?));
    }
    Ok(Arc::new(GeminiTransport::new(config)?))
}

/// Hypothesis text for a trusted location: the label, if any, then the
/// coordinates.
fn trusted_hypothesis(loc: &TrustedLocation) -> String {
    match &loc.label {
        Some(label) => format!("{label} ({})", loc.coordinates()),
        None => loc.coordinates(),
    }
}
