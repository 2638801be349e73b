//! Streaming API: run an analysis on a task and watch its phases.
//!
//! [`crate::orchestrator::Orchestrator::run_analysis`] reports phases to a
//! borrowed observer. [`spawn_analysis`] instead moves the run onto a Tokio
//! task and hands back a [`PhaseStream`] plus a join handle for the report,
//! which fits UIs that poll a stream rather than register callbacks.
//!
//! The stream ends when the run finishes, successfully or not. A failed run
//! simply stops emitting; the error comes from [`AnalysisHandle::report`].

use crate::error::AnalysisError;
use crate::orchestrator::Orchestrator;
use crate::output::AnalysisReport;
use crate::request::{AnalysisRequest, PipelinePhase};
use std::pin::Pin;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tracing::warn;

/// A boxed stream of phase notifications.
pub type PhaseStream = Pin<Box<dyn Stream<Item = PipelinePhase> + Send>>;

/// A running analysis.
pub struct AnalysisHandle {
    /// Phases in the order they begin.
    pub phases: PhaseStream,
    /// The pipeline task.
    pub result: JoinHandle<Result<AnalysisReport, AnalysisError>>,
}

impl AnalysisHandle {
    /// Wait for the report. Any phases not yet read are discarded.
    ///
    /// A panicked or cancelled task becomes [`AnalysisError::GenericFailure`].
    pub async fn report(self) -> Result<AnalysisReport, AnalysisError> {
        match self.result.await {
            Ok(result) => result,
            Err(e) => {
                warn!("Analysis task did not complete: {}", e);
                Err(AnalysisError::generic(format!("analysis task failed: {e}")))
            }
        }
    }
}

/// Spawn `request` on the current Tokio runtime.
///
/// # Example
/// ```rust,no_run
/// use geocognition::{spawn_analysis, AnalysisConfig, AnalysisRequest, ImagePayload, Language, Orchestrator};
/// use futures::StreamExt;
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let orchestrator = Arc::new(Orchestrator::new(AnalysisConfig::from_env()?)?);
/// let image = ImagePayload::new(std::fs::read("photo.jpg")?, "image/jpeg");
/// let mut handle = spawn_analysis(orchestrator, AnalysisRequest::new(image, Language::En));
/// while let Some(phase) = handle.phases.next().await {
///     eprintln!("→ {phase}");
/// }
/// let report = handle.report().await?;
/// println!("{}", report.location_name);
/// # Ok(())
/// # }
/// ```
pub fn spawn_analysis(orchestrator: Arc<Orchestrator>, request: AnalysisRequest) -> AnalysisHandle {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<PipelinePhase>();
    let result = tokio::spawn(async move {
        // `tx` is dropped when the run returns, which closes the stream.
        orchestrator.run_analysis(&request, &tx).await
    });
    AnalysisHandle {
        phases: Box::pin(UnboundedReceiverStream::new(rx)),
        result,
    }
}
