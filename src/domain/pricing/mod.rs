// ============================================================================
// Pricing Domain - Frozen Monetary Breakdown
// ============================================================================
//
// - Value objects (PlatformRates, LineRequest, LineItem, Breakdown, Quote)
// - Errors (PricingError)
// - Engine (price, compute_breakdown)
//
// Pricing has no side effects: the same menu prices, rates, commission and
// distance always produce the same Breakdown.
//
// ============================================================================

pub mod value_objects;
pub mod errors;
pub mod engine;

pub use value_objects::*;
pub use errors::*;
pub use engine::*;
