// ============================================================================
// Order Domain - Order lifecycle from placement to settlement
// ============================================================================
//
// - Value objects (OrderStatus edge table, Actor, StatusEntry)
// - Events (OrderPlaced, OrderStatusChanged, OrderPartnerAssigned, OrderRated)
// - Commands (PlaceOrder, Transition, AssignPartner, Rate)
// - Errors (OrderError and its stable kind)
// - Aggregate (OrderAggregate and every transition guard)
// - Arbiter (per-partner claim serialization)
// - Notifications (which party hears about which event)
// - Command Handler (OrderCommandHandler)
//
// ============================================================================

pub mod value_objects;
pub mod events;
pub mod commands;
pub mod errors;
pub mod aggregate;
pub mod arbiter;
pub mod notifications;
pub mod command_handler;

// Re-export for convenience
pub use value_objects::*;
pub use events::*;
pub use commands::*;
pub use errors::*;
pub use aggregate::*;
pub use arbiter::*;
pub use notifications::*;
pub use command_handler::*;
