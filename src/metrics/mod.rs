// Private module declaration
mod server;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec,
    IntGauge, Opts, Registry,
};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for the order lifecycle
// ============================================================================
//
// - Placements and pricing latency
// - Transitions by target status
// - Failed commands by error kind
// - Lost assignment races
// - Notification delivery failures and breaker state
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Order lifecycle
    pub orders_placed: IntCounter,
    pub order_transitions: IntCounterVec,
    pub order_rejections: IntCounterVec,
    pub assignment_conflicts: IntCounter,

    // Pricing
    pub pricing_duration: Histogram,

    // Notifications
    pub notifications_failed: IntCounterVec,
    pub notification_circuit_state: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let orders_placed = IntCounter::new("orders_placed_total", "Total orders placed")?;
        registry.register(Box::new(orders_placed.clone()))?;

        let order_transitions = IntCounterVec::new(
            Opts::new("order_transitions_total", "Committed order status transitions"),
            &["to"],
        )?;
        registry.register(Box::new(order_transitions.clone()))?;

        let order_rejections = IntCounterVec::new(
            Opts::new("order_rejections_total", "Order commands refused, by error kind"),
            &["kind"],
        )?;
        registry.register(Box::new(order_rejections.clone()))?;

        let assignment_conflicts = IntCounter::new(
            "assignment_conflicts_total",
            "Delivery assignments lost to a concurrent claim or a busy partner",
        )?;
        registry.register(Box::new(assignment_conflicts.clone()))?;

        let pricing_duration = Histogram::with_opts(
            HistogramOpts::new("pricing_duration_seconds", "Time spent pricing an order")
                .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(pricing_duration.clone()))?;

        let notifications_failed = IntCounterVec::new(
            Opts::new("notifications_failed_total", "Notifications that could not be delivered"),
            &["kind"],
        )?;
        registry.register(Box::new(notifications_failed.clone()))?;

        let notification_circuit_state = IntGauge::new(
            "notification_circuit_state",
            "Notification circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(notification_circuit_state.clone()))?;

        Ok(Self {
            registry,
            orders_placed,
            order_transitions,
            order_rejections,
            assignment_conflicts,
            pricing_duration,
            notifications_failed,
            notification_circuit_state,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_transition(&self, to: &str) {
        self.order_transitions.with_label_values(&[to]).inc();
    }

    pub fn record_rejection(&self, kind: &str) {
        self.order_rejections.with_label_values(&[kind]).inc();
    }

    pub fn record_notification_failure(&self, kind: &str) {
        self.notifications_failed.with_label_values(&[kind]).inc();
    }

    pub fn update_notification_circuit_state(&self, state: u8) {
        self.notification_circuit_state.set(state as i64);
    }
}
