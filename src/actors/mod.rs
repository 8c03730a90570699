// ============================================================================
// Actors Module
// ============================================================================
//
// Actor-based infrastructure for asynchronous side effects.
//
// Note: Order logic uses the command handler, NOT actors.
//       Actors are reserved for infrastructure concerns only.
//
// ============================================================================

mod notification_dispatcher;

pub use notification_dispatcher::{
    Dispatch, DispatchStats, DispatcherSink, GetDispatchStats, NotificationDispatcher,
};
