// ============================================================================
// Document Store Core - Generic Abstractions
// ============================================================================
//
// No domain-specific code lives here (no Order, Product, ...).
//
// ============================================================================

pub mod aggregate;
pub mod document;

pub use aggregate::Aggregate;
pub use document::{decode_document, encode_document, Document, StoreError, Versioned};
