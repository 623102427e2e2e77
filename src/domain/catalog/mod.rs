// ============================================================================
// Catalog Domain - Products, Offers and Effective Prices
// ============================================================================
//
// - Value objects (Product, Offer, OfferDraft)
// - Offer rules (is_active, effective_price, featured_deals)
// - EffectivePriceCache, bounded by the next offer boundary
// - CatalogService, the admin-facing offer operations
//
// ============================================================================

pub mod errors;
pub mod offers;
pub mod price_cache;
pub mod service;
pub mod value_objects;

pub use errors::*;
pub use offers::*;
pub use price_cache::*;
pub use service::*;
pub use value_objects::*;
