// ============================================================================
// delivery_orders - Order lifecycle and settlement for food delivery
// ============================================================================
//
// - domain:         pricing, the order state machine, settlement
// - event_sourcing: generic aggregate + versioned in-process event store
// - actors:         notification dispatch off the request path
// - metrics:        Prometheus registry and /metrics server
// - config:         environment-driven startup configuration
// - utils:          circuit breaker
//
// ============================================================================

pub mod actors;
pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod metrics;
pub mod utils;
