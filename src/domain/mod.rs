// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each area has its own subdirectory:
// - catalog - products, offers, effective prices
// - pricing - cart, line totals, tax
// - order   - lifecycle state machine, cancellation, placement, read models
//
// Persistence is reached only through the DocumentStore port.
//
// ============================================================================

use std::sync::Arc;

use mockable::Clock;

pub mod actor;
pub mod catalog;
pub mod order;
pub mod pricing;

pub use actor::{ActorContext, Role};

/// Clock shared by every service; tests inject a fixture.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;
