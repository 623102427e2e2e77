// ============================================================================
// Document Store Infrastructure
// ============================================================================
//
// Generic, versioned document persistence.
// Domain-specific code is in src/domain/
//
// Every document carries a version that is bumped on each write, so a
// read-modify-write cycle can be committed with a compare-and-swap.
//
// ============================================================================

mod core;
mod store;

pub use self::core::*;
pub use self::store::*;
