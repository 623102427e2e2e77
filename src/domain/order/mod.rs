// ============================================================================
// Order Domain - Lifecycle, Cancellation and Placement
// ============================================================================
//
// - Value objects (OrderStatus, CancelDecision, OrderLineItem, policies)
// - Commands and the events they produce
// - Errors with a closed kind taxonomy
// - Order aggregate (state machine + cancellation workflow)
// - OrderCommandHandler (load → decide → compare-and-swap)
// - OrderAggregator (checkout → new order)
// - OrderQueries (customer history, admin tabs, dashboard)
//
// ============================================================================

pub mod aggregate;
pub mod command_handler;
pub mod commands;
pub mod errors;
pub mod events;
pub mod placement;
pub mod queries;
pub mod value_objects;

// Re-export for convenience
pub use aggregate::*;
pub use command_handler::*;
pub use commands::*;
pub use errors::*;
pub use events::*;
pub use placement::*;
pub use queries::*;
pub use value_objects::*;
