// ============================================================================
// Pricing Domain - Cart and Order Totals
// ============================================================================
//
// Prices are frozen into cart lines when a product is added. Totals are
// always computed from those frozen prices, never from the live catalog.
//
// ============================================================================

pub mod cart;
pub mod engine;
pub mod errors;

pub use cart::*;
pub use engine::*;
pub use errors::*;
