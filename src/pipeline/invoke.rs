//! Resilient invocation of a single remote call.
//!
//! ## Retry Strategy
//!
//! Only rate-limit errors are retried. The delay before attempt `n + 1` is
//! `initial_backoff * 2^n`; with the defaults (3 s base, 5 attempts) the wait
//! sequence is 3 s → 6 s → 12 s → 24 s, after which the call fails with
//! [`InvokeError::QuotaExceeded`] without sleeping again.
//!
//! A rejected credential fails immediately. Any other transport error is
//! returned unchanged so its diagnostic detail survives.
//!
//! The backoff is local to one call: concurrent invocations do not share a
//! throttle, and a sleeping call never blocks another one.

use crate::config::AnalysisConfig;
use crate::transport::{
    InferenceTransport, RemoteRequest, RemoteResponse, TransportError, TransportErrorKind,
};
use futures::future::BoxFuture;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Outcome of an invocation that did not produce a response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvokeError {
    /// Rate-limited on every one of `attempts` tries.
    #[error("quota exceeded after {attempts} attempts")]
    QuotaExceeded { attempts: u32 },

    /// The credential was rejected on the first try.
    #[error("invalid API credential")]
    InvalidCredential,

    /// Any other failure, unchanged.
    #[error(transparent)]
    Transport(TransportError),
}

/// Attempt budget and backoff base.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Always ≥ 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(3000),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
        }
    }

    /// Delay after the failed attempt with 0-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(2u32.saturating_pow(attempt))
    }
}

/// Async sleep used between attempts. Swappable so tests can record delays.
pub type Sleeper = Arc<dyn Fn(Duration) -> BoxFuture<'static, ()> + Send + Sync>;

pub(crate) fn tokio_sleeper() -> Sleeper {
    Arc::new(|d| Box::pin(tokio::time::sleep(d)))
}

/// Wraps a transport with bounded exponential-backoff retry.
#[derive(Clone)]
pub struct ResilientInvoker {
    transport: Arc<dyn InferenceTransport>,
    policy: RetryPolicy,
    sleeper: Sleeper,
}

impl ResilientInvoker {
    pub fn new(transport: Arc<dyn InferenceTransport>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            policy,
            sleeper: tokio_sleeper(),
        }
    }

    /// Replace the sleep implementation.
    pub fn with_sleeper(mut self, sleeper: Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    pub fn transport_name(&self) -> &str {
        self.transport.name()
    }

    /// Run `request`, retrying on rate limits.
    pub async fn invoke(&self, request: &RemoteRequest) -> Result<RemoteResponse, InvokeError> {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt: u32 = 0;

        loop {
            debug!(
                "{} [{}]: attempt {}/{}",
                self.transport.name(),
                request.phase,
                attempt + 1,
                max_attempts
            );

            let err = match self.transport.generate(request).await {
                Ok(response) => return Ok(response),
                Err(e) => e,
            };

            match err.kind {
                TransportErrorKind::RateLimited => {
                    if attempt + 1 >= max_attempts {
                        warn!(
                            "{} [{}]: still rate-limited after {} attempts, giving up",
                            self.transport.name(),
                            request.phase,
                            max_attempts
                        );
                        return Err(InvokeError::QuotaExceeded {
                            attempts: max_attempts,
                        });
                    }
                    let delay = self.policy.delay_for(attempt);
                    warn!(
                        "{} [{}]: rate-limited (attempt {}/{}), retrying in {}ms — {}",
                        self.transport.name(),
                        request.phase,
                        attempt + 1,
                        max_attempts,
                        delay.as_millis(),
                        err
                    );
                    (self.sleeper)(delay).await;
                    attempt += 1;
                }
                TransportErrorKind::InvalidCredential => {
                    warn!(
                        "{} [{}]: credential rejected — {}",
                        self.transport.name(),
                        request.phase,
                        err
                    );
                    return Err(InvokeError::InvalidCredential);
                }
                TransportErrorKind::Other => {
                    warn!(
                        "{} [{}]: call failed — {}",
                        self.transport.name(),
                        request.phase,
                        err
                    );
                    return Err(InvokeError::Transport(err));
                }
            }
        }
    }
}
