//! Phase observer for pipeline progress events.
//!
//! Pass any [`PhaseObserver`] to
//! [`crate::orchestrator::Orchestrator::run_analysis`] to be told when each
//! [`PipelinePhase`] begins. Three implementations are built in:
//!
//! * a closure `Fn(PipelinePhase) + Send + Sync`,
//! * a `tokio::sync::mpsc::UnboundedSender<PipelinePhase>` (this is what
//!   [`crate::stream::spawn_analysis`] uses),
//! * [`NoopPhaseObserver`].
//!
//! Phases are reported in order, each exactly once, and only as the pipeline
//! reaches them: a run that fails during hypothesis generation never reports
//! synthesis.
//!
//! # Example
//!
//! ```rust
//! use geocognition::{PhaseObserver, PipelinePhase};
//! use std::sync::Mutex;
//!
//! let seen = Mutex::new(Vec::new());
//! let observer = |phase: PipelinePhase| seen.lock().unwrap().push(phase);
//! observer.on_phase(PipelinePhase::Initialization);
//! assert_eq!(seen.lock().unwrap().as_slice(), &[PipelinePhase::Initialization]);
//! ```

use crate::request::PipelinePhase;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;

/// Receives phase-change notifications from the pipeline.
///
/// Implementations must be `Send + Sync`; the observer is borrowed across
/// `.await` points.
pub trait PhaseObserver: Send + Sync {
    /// Called when `phase` begins.
    fn on_phase(&self, phase: PipelinePhase) {
        let _ = phase;
    }
}

/// Ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPhaseObserver;

impl PhaseObserver for NoopPhaseObserver {}

impl<F> PhaseObserver for F
where
    F: Fn(PipelinePhase) + Send + Sync,
{
    fn on_phase(&self, phase: PipelinePhase) {
        self(phase)
    }
}

impl PhaseObserver for UnboundedSender<PipelinePhase> {
    fn on_phase(&self, phase: PipelinePhase) {
        // A dropped receiver just means nobody is watching any more.
        if self.send(phase).is_err() {
            trace!("phase receiver dropped; {} not delivered", phase);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[test]
    fn noop_observer_does_not_panic() {
        let observer = NoopPhaseObserver;
        for phase in PipelinePhase::ALL {
            observer.on_phase(phase);
        }
    }

    #[test]
    fn closure_observer_receives_events_in_order() {
        let seen = Mutex::new(Vec::new());
        let observer = |p: PipelinePhase| seen.lock().unwrap().push(p);
        for phase in PipelinePhase::ALL {
            observer.on_phase(phase);
        }
        assert_eq!(seen.into_inner().unwrap(), PipelinePhase::ALL.to_vec());
    }

    #[test]
    fn arc_dyn_observer_works() {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let observer: Arc<dyn PhaseObserver> = Arc::new(move |_p: PipelinePhase| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        observer.on_phase(PipelinePhase::Synthesis);
        observer.on_phase(PipelinePhase::Synthesis);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn channel_observer_forwards_and_tolerates_closed_receiver() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        tx.on_phase(PipelinePhase::FeatureExtraction);
        assert_eq!(rx.recv().await, Some(PipelinePhase::FeatureExtraction));

        drop(rx);
        tx.on_phase(PipelinePhase::Synthesis);
    }
}
