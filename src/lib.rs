//! Order lifecycle and promotional pricing core for a storefront.
//!
//! - [`domain::catalog`]: offers and effective prices
//! - [`domain::pricing`]: cart and totals
//! - [`domain::order`]: lifecycle state machine, cancellation, placement
//! - [`document_store`]: versioned persistence with compare-and-swap

pub mod config;
pub mod document_store;
pub mod domain;
pub mod metrics;
pub mod utils;

#[cfg(test)]
mod test_support;
