use crate::document_store::StoreError;

// ============================================================================
// Catalog Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("product {0} not found")]
    NotFound(String),

    #[error("invalid offer: {0}")]
    InvalidOffer(String),

    #[error("invalid product: {0}")]
    InvalidProduct(String),

    #[error("{0} requires an admin")]
    Forbidden(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}
