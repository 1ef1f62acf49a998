//! Explicit circuit-breaker state machine.
//!
//! Closed passes calls through and counts consecutive failures. Open
//! short-circuits every call until the open duration elapses. HalfOpen
//! admits a bounded number of trial calls: enough successes close the
//! circuit, any failure reopens it.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use thiserror::Error;

/// Observable state of a circuit breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation; calls pass through.
    Closed,
    /// Failure threshold tripped; calls short-circuit to the fallback.
    Open,
    /// Probing recovery with a limited number of trial calls.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half-open",
        };
        f.write_str(s)
    }
}

/// Thresholds driving the breaker's transition function.
///
/// These are configuration, not logic: the api crate populates them
/// from the environment.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip the circuit open.
    pub failure_threshold: u32,
    /// How long the circuit stays open before probing recovery.
    pub open_duration: Duration,
    /// Trial calls admitted while half-open; further calls short-circuit.
    pub half_open_max_calls: u32,
    /// Successes required while half-open to close the circuit.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            half_open_max_calls: 3,
            success_threshold: 2,
        }
    }
}

struct BreakerState {
    state: CircuitState,
    failure_count: u32,
    success_count: u32,
    half_open_in_flight: u32,
    opened_at: Option<Instant>,
}

/// Error returned by [`CircuitBreaker::call`].
#[derive(Debug, Error)]
pub enum CircuitBreakerError<E> {
    /// The circuit is open; the operation was not attempted.
    #[error("circuit breaker is open")]
    CircuitOpen,
    /// The operation ran and failed.
    #[error("operation failed: {0}")]
    OperationFailed(E),
}

/// Circuit breaker with explicit Closed/Open/HalfOpen states.
///
/// Cloning shares the underlying state; the lock is held only for
/// bookkeeping, never across the wrapped operation.
#[derive(Clone)]
pub struct CircuitBreaker {
    state: Arc<Mutex<BreakerState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Creates a breaker in the Closed state.
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(BreakerState {
                state: CircuitState::Closed,
                failure_count: 0,
                success_count: 0,
                half_open_in_flight: 0,
                opened_at: None,
            })),
            config,
        }
    }

    /// Runs the operation under breaker protection.
    ///
    /// When the circuit is open (or half-open with its trial budget
    /// exhausted) the operation future is never polled and
    /// `CircuitOpen` is returned immediately, with no side effects.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: Future<Output = Result<T, E>>,
    {
        if !self.try_acquire() {
            metrics::counter!("circuit_breaker_short_circuits_total").increment(1);
            return Err(CircuitBreakerError::CircuitOpen);
        }

        match operation.await {
            Ok(value) => {
                self.record_success();
                Ok(value)
            }
            Err(err) => {
                self.record_failure();
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    /// Returns the current state, advancing Open to HalfOpen when the
    /// open duration has elapsed.
    pub fn state(&self) -> CircuitState {
        let mut state = self.state.lock().unwrap();
        Self::advance_if_due(&mut state, &self.config);
        state.state
    }

    /// Consecutive failure count observed in the Closed state.
    pub fn failure_count(&self) -> u32 {
        self.state.lock().unwrap().failure_count
    }

    /// Forces the breaker back to Closed and clears all counters.
    pub fn reset(&self) {
        let mut state = self.state.lock().unwrap();
        tracing::info!("circuit breaker manually reset");
        state.state = CircuitState::Closed;
        state.failure_count = 0;
        state.success_count = 0;
        state.half_open_in_flight = 0;
        state.opened_at = None;
    }

    fn advance_if_due(state: &mut BreakerState, config: &CircuitBreakerConfig) {
        if state.state == CircuitState::Open
            && let Some(opened_at) = state.opened_at
            && opened_at.elapsed() >= config.open_duration
        {
            tracing::info!("circuit breaker transitioning to half-open");
            state.state = CircuitState::HalfOpen;
            state.success_count = 0;
            state.half_open_in_flight = 0;
        }
    }

    fn try_acquire(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        Self::advance_if_due(&mut state, &self.config);

        match state.state {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if state.half_open_in_flight >= self.config.half_open_max_calls {
                    return false;
                }
                state.half_open_in_flight += 1;
                true
            }
        }
    }

    fn record_success(&self) {
        let mut state = self.state.lock().unwrap();

        match state.state {
            CircuitState::Closed => {
                state.failure_count = 0;
            }
            CircuitState::HalfOpen => {
                state.half_open_in_flight = state.half_open_in_flight.saturating_sub(1);
                state.success_count += 1;
                if state.success_count >= self.config.success_threshold {
                    tracing::info!(
                        successes = state.success_count,
                        "circuit breaker closing after successful probes"
                    );
                    state.state = CircuitState::Closed;
                    state.failure_count = 0;
                    state.success_count = 0;
                    state.half_open_in_flight = 0;
                    state.opened_at = None;
                }
            }
            // A call admitted before the circuit opened may complete
            // afterwards; its success carries no information.
            CircuitState::Open => {}
        }
    }

    fn record_failure(&self) {
        let mut state = self.state.lock().unwrap();

        match state.state {
            CircuitState::Closed => {
                state.failure_count += 1;
                if state.failure_count >= self.config.failure_threshold {
                    tracing::warn!(
                        failures = state.failure_count,
                        "circuit breaker opening"
                    );
                    metrics::counter!("circuit_breaker_opened_total").increment(1);
                    state.state = CircuitState::Open;
                    state.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                tracing::warn!("probe failed while half-open, reopening circuit");
                metrics::counter!("circuit_breaker_opened_total").increment(1);
                state.state = CircuitState::Open;
                state.opened_at = Some(Instant::now());
                state.success_count = 0;
                state.half_open_in_flight = 0;
            }
            CircuitState::Open => {
                state.opened_at = Some(Instant::now());
            }
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 3,
            open_duration: Duration::from_millis(50),
            half_open_max_calls: 2,
            success_threshold: 2,
        }
    }

    #[tokio::test]
    async fn opens_after_consecutive_failures() {
        let breaker = CircuitBreaker::new(quick_config());

        for _ in 0..3 {
            let result = breaker.call(async { Err::<(), _>("boom") }).await;
            assert!(matches!(
                result,
                Err(CircuitBreakerError::OperationFailed(_))
            ));
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        // Short-circuits without polling the operation.
        let result = breaker.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen)));
    }

    #[tokio::test]
    async fn success_resets_the_failure_streak() {
        let breaker = CircuitBreaker::new(quick_config());

        for _ in 0..2 {
            let _ = breaker.call(async { Err::<(), _>("boom") }).await;
        }
        breaker.call(async { Ok::<_, &str>(()) }).await.unwrap();
        assert_eq!(breaker.failure_count(), 0);

        for _ in 0..2 {
            let _ = breaker.call(async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn closes_again_after_successful_probes() {
        let breaker = CircuitBreaker::new(quick_config());

        for _ in 0..3 {
            let _ = breaker.call(async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        breaker.call(async { Ok::<_, &str>(()) }).await.unwrap();
        breaker.call(async { Ok::<_, &str>(()) }).await.unwrap();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn probe_failure_reopens() {
        let breaker = CircuitBreaker::new(quick_config());

        for _ in 0..3 {
            let _ = breaker.call(async { Err::<(), _>("boom") }).await;
        }
        tokio::time::sleep(Duration::from_millis(60)).await;

        let _ = breaker.call(async { Err::<(), _>("still down") }).await;
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn half_open_bounds_in_flight_trial_calls() {
        let config = CircuitBreakerConfig {
            half_open_max_calls: 1,
            success_threshold: 2,
            ..quick_config()
        };
        let breaker = CircuitBreaker::new(config);

        for _ in 0..3 {
            let _ = breaker.call(async { Err::<(), _>("boom") }).await;
        }
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        // Hold one trial slot open while a second call arrives.
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();
        let probe_breaker = breaker.clone();
        let probe = tokio::spawn(async move {
            probe_breaker
                .call(async {
                    release_rx.await.unwrap();
                    Ok::<_, &str>(())
                })
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;

        // Trial budget exhausted: the second call short-circuits.
        let result = breaker.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen)));

        release_tx.send(()).unwrap();
        probe.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn reset_returns_to_closed() {
        let breaker = CircuitBreaker::new(quick_config());

        for _ in 0..3 {
            let _ = breaker.call(async { Err::<(), _>("boom") }).await;
        }
        assert_eq!(breaker.state(), CircuitState::Open);

        breaker.reset();
        assert_eq!(breaker.state(), CircuitState::Closed);
        breaker.call(async { Ok::<_, &str>(()) }).await.unwrap();
    }
}
