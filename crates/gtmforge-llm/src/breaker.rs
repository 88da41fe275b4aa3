//! Per-provider circuit breaker.
//!
//! Tracks consecutive failures and trips after a configured threshold. An
//! open breaker rejects calls until a recovery timeout elapses, then admits
//! exactly one trial (half-open). The breaker never moves from open back to
//! closed without a successful trial call.

use chrono::{DateTime, Utc};
use gtmforge_config::BreakerSettings;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    /// Normal operation; calls flow through.
    Closed,
    /// Threshold reached; calls are rejected until the recovery timeout.
    Open,
    /// Recovery timeout elapsed; a trial call is in flight.
    HalfOpen,
}

impl std::fmt::Display for BreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BreakerState::Closed => write!(f, "closed"),
            BreakerState::Open => write!(f, "open"),
            BreakerState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Observability snapshot of a breaker.
#[derive(Debug, Clone)]
pub struct BreakerStatus {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub failure_threshold: u32,
    pub recovery_timeout_secs: u64,
}

struct BreakerInner {
    state: BreakerState,
    consecutive_failures: u32,
    last_failure_at: Option<DateTime<Utc>>,
}

/// Circuit breaker guarding one provider.
///
/// All state lives behind a single async mutex, held only for the
/// check-and-update, never across a backend call. Mutation happens solely
/// through the orchestrating client's success/failure hooks.
pub struct CircuitBreaker {
    provider: String,
    settings: BreakerSettings,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    #[must_use]
    pub fn new(provider: impl Into<String>, settings: BreakerSettings) -> Self {
        Self {
            provider: provider.into(),
            settings,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                last_failure_at: None,
            }),
        }
    }

    /// Whether a call may proceed right now.
    ///
    /// An open breaker whose recovery timeout has elapsed transitions to
    /// half-open here and admits the caller as the trial.
    pub async fn can_execute(&self) -> bool {
        if self.settings.disable {
            return true;
        }

        let mut inner = self.inner.lock().await;
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => true,
            BreakerState::Open => {
                let elapsed_ok = inner.last_failure_at.is_some_and(|t| {
                    (Utc::now() - t).num_seconds() >= self.settings.recovery_timeout_secs as i64
                });
                if elapsed_ok {
                    inner.state = BreakerState::HalfOpen;
                    info!(
                        provider = %self.provider,
                        "Circuit breaker half-open, admitting trial call"
                    );
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Record a successful call: resets the failure count and closes the
    /// breaker from any state.
    pub async fn record_success(&self) {
        if self.settings.disable {
            return;
        }

        let mut inner = self.inner.lock().await;
        if inner.state != BreakerState::Closed {
            info!(provider = %self.provider, "Circuit breaker closed after successful call");
        }
        inner.state = BreakerState::Closed;
        inner.consecutive_failures = 0;
    }

    /// Record a failed call.
    ///
    /// In the closed state the consecutive count grows and trips the breaker
    /// at the threshold. A half-open failure re-opens immediately, refreshing
    /// the failure timestamp and pinning the count at the threshold so the
    /// next recovery window starts from now.
    pub async fn record_failure(&self) {
        if self.settings.disable {
            return;
        }

        let mut inner = self.inner.lock().await;
        inner.last_failure_at = Some(Utc::now());
        match inner.state {
            BreakerState::Closed => {
                inner.consecutive_failures += 1;
                if inner.consecutive_failures >= self.settings.failure_threshold {
                    inner.state = BreakerState::Open;
                    warn!(
                        provider = %self.provider,
                        failures = inner.consecutive_failures,
                        "Circuit breaker opened"
                    );
                }
            }
            BreakerState::HalfOpen => {
                inner.state = BreakerState::Open;
                inner.consecutive_failures = self.settings.failure_threshold;
                warn!(provider = %self.provider, "Circuit breaker re-opened after failed trial");
            }
            BreakerState::Open => {
                inner.consecutive_failures =
                    inner.consecutive_failures.max(self.settings.failure_threshold);
            }
        }
    }

    /// Current state and counters.
    pub async fn status(&self) -> BreakerStatus {
        let inner = self.inner.lock().await;
        BreakerStatus {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
            last_failure_at: inner.last_failure_at,
            failure_threshold: self.settings.failure_threshold,
            recovery_timeout_secs: self.settings.recovery_timeout_secs,
        }
    }
}
