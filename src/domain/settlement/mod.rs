// ============================================================================
// Settlement - Read-side money aggregation over orders
// ============================================================================
//
// Holds no state of its own. Every figure is recomputed from the order
// aggregates each time it is asked for.
//
// ============================================================================

pub mod ledger;

pub use ledger::*;
