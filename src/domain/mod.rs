// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// - pricing:    quote computation over the live menu and platform rates
// - order:      the order aggregate, its state machine and command handler
// - settlement: read-side sums over orders
// - ports:      collaborator contracts and in-memory implementations
//
// This layer is completely separate from the event sourcing infrastructure.
//
// ============================================================================

pub mod errors;
pub mod ports;
pub mod pricing;
pub mod order;
pub mod settlement;

pub use errors::ErrorKind;
