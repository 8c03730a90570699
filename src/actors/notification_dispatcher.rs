use actix::prelude::*;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::domain::ports::{CollaboratorError, Notification, NotificationSink};
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};

// ============================================================================
// Notification Dispatcher Actor
// ============================================================================
//
// Takes notification delivery off the request path. The order handler hands
// a message to the mailbox and returns; the actor pushes it to the real sink
// behind a circuit breaker.
//
// Delivery is at-most-once. A failed or refused notification is counted and
// logged, never retried.
//
// ============================================================================

#[derive(Default)]
struct DispatchCounters {
    delivered: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: u64,
    pub failed: u64,
    /// Refused without a call because the circuit was open
    pub dropped: u64,
}

pub struct NotificationDispatcher {
    sink: Arc<dyn NotificationSink>,
    breaker: CircuitBreaker,
    counters: Arc<DispatchCounters>,
    metrics: Option<Arc<Metrics>>,
}

impl NotificationDispatcher {
    pub fn new(sink: Arc<dyn NotificationSink>, breaker_config: CircuitBreakerConfig) -> Self {
        Self {
            sink,
            breaker: CircuitBreaker::new("notifications", breaker_config),
            counters: Arc::new(DispatchCounters::default()),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

impl Actor for NotificationDispatcher {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("NotificationDispatcher started");
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(
            delivered = self.counters.delivered.load(Ordering::Relaxed),
            failed = self.counters.failed.load(Ordering::Relaxed),
            dropped = self.counters.dropped.load(Ordering::Relaxed),
            "NotificationDispatcher stopped"
        );
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message, Debug, Clone)]
#[rtype(result = "()")]
pub struct Dispatch(pub Notification);

#[derive(Message)]
#[rtype(result = "DispatchStats")]
pub struct GetDispatchStats;

// ============================================================================
// Handlers
// ============================================================================

impl Handler<Dispatch> for NotificationDispatcher {
    type Result = ResponseFuture<()>;

    fn handle(&mut self, msg: Dispatch, _: &mut Self::Context) -> Self::Result {
        let sink = self.sink.clone();
        let breaker = self.breaker.clone();
        let counters = self.counters.clone();
        let metrics = self.metrics.clone();

        Box::pin(async move {
            let notification = msg.0;
            let kind = notification.kind.as_str();
            let user_id = notification.user_id;

            match breaker.call(sink.notify(notification)).await {
                Ok(()) => {
                    counters.delivered.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(kind = kind, user_id = %user_id, "Notification delivered");
                }
                Err(CircuitBreakerError::CircuitOpen) => {
                    counters.dropped.fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(kind = kind, user_id = %user_id, "Notification dropped, circuit open");
                    if let Some(metrics) = &metrics {
                        metrics.record_notification_failure(kind);
                    }
                }
                Err(CircuitBreakerError::OperationFailed(e)) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    tracing::warn!(kind = kind, user_id = %user_id, error = %e, "Notification failed");
                    if let Some(metrics) = &metrics {
                        metrics.record_notification_failure(kind);
                    }
                }
            }

            if let Some(metrics) = &metrics {
                metrics.update_notification_circuit_state(breaker.get_state().await.as_gauge());
            }
        })
    }
}

impl Handler<GetDispatchStats> for NotificationDispatcher {
    type Result = MessageResult<GetDispatchStats>;

    fn handle(&mut self, _: GetDispatchStats, _: &mut Self::Context) -> Self::Result {
        MessageResult(DispatchStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        })
    }
}

// ============================================================================
// Sink adapter
// ============================================================================

/// `NotificationSink` that enqueues onto the dispatcher's mailbox
#[derive(Clone)]
pub struct DispatcherSink {
    addr: Addr<NotificationDispatcher>,
}

impl DispatcherSink {
    pub fn new(addr: Addr<NotificationDispatcher>) -> Self {
        Self { addr }
    }
}

#[async_trait]
impl NotificationSink for DispatcherSink {
    async fn notify(&self, notification: Notification) -> Result<(), CollaboratorError> {
        self.addr
            .try_send(Dispatch(notification))
            .map_err(|e| CollaboratorError::unavailable("notification dispatcher", e.to_string()))
    }
}
