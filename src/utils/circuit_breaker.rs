use std::sync::Arc;
use tokio::sync::Mutex;
use std::time::{Duration, Instant};

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Guards a flaky downstream (the notification sink). After enough
// consecutive failures calls are refused outright for a cool-down period,
// then a few trial calls decide whether to close again.
//
//   Closed --failures >= threshold--> Open
//   Open   --cool-down elapsed------> HalfOpen
//   HalfOpen --successes >= threshold--> Closed
//   HalfOpen --any failure-----------> Open
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Numeric encoding used by the state gauge
    pub fn as_gauge(&self) -> u8 {
        match self {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    /// How long an open circuit refuses calls
    pub open_duration: Duration,
    /// Trial successes needed to close from half-open
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            success_threshold: 1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed { failures: u32 },
    Open { since: Instant },
    HalfOpen { successes: u32 },
}

#[derive(Clone)]
pub struct CircuitBreaker {
    name: &'static str,
    phase: Arc<Mutex<Phase>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(name: &'static str, config: CircuitBreakerConfig) -> Self {
        Self {
            name,
            phase: Arc::new(Mutex::new(Phase::Closed { failures: 0 })),
            config,
        }
    }

    /// Run `operation` unless the circuit is open
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        self.admit().await?;

        match operation.await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(err) => {
                self.on_failure().await;
                Err(CircuitBreakerError::OperationFailed(err))
            }
        }
    }

    async fn admit<E>(&self) -> Result<(), CircuitBreakerError<E>> {
        let mut phase = self.phase.lock().await;
        if let Phase::Open { since } = *phase {
            if since.elapsed() < self.config.open_duration {
                return Err(CircuitBreakerError::CircuitOpen);
            }
            tracing::info!(breaker = self.name, "Circuit half-open, allowing trial call");
            *phase = Phase::HalfOpen { successes: 0 };
        }
        Ok(())
    }

    async fn on_success(&self) {
        let mut phase = self.phase.lock().await;
        *phase = match *phase {
            Phase::HalfOpen { successes } if successes + 1 >= self.config.success_threshold => {
                tracing::info!(breaker = self.name, "Circuit closed");
                Phase::Closed { failures: 0 }
            }
            Phase::HalfOpen { successes } => Phase::HalfOpen { successes: successes + 1 },
            Phase::Closed { .. } => Phase::Closed { failures: 0 },
            open @ Phase::Open { .. } => open,
        };
    }

    async fn on_failure(&self) {
        let mut phase = self.phase.lock().await;
        *phase = match *phase {
            Phase::Closed { failures } if failures + 1 >= self.config.failure_threshold => {
                tracing::warn!(breaker = self.name, failures = failures + 1, "Circuit opened");
                Phase::Open { since: Instant::now() }
            }
            Phase::Closed { failures } => Phase::Closed { failures: failures + 1 },
            Phase::HalfOpen { .. } => {
                tracing::warn!(breaker = self.name, "Trial call failed, circuit reopened");
                Phase::Open { since: Instant::now() }
            }
            open @ Phase::Open { .. } => open,
        };
    }

    pub async fn get_state(&self) -> CircuitState {
        match *self.phase.lock().await {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }

    pub async fn reset(&self) {
        *self.phase.lock().await = Phase::Closed { failures: 0 };
        tracing::info!(breaker = self.name, "Circuit manually reset");
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    #[error("Circuit breaker is open")]
    CircuitOpen,
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}
