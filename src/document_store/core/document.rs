use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::utils::IsTransient;

// ============================================================================
// Document - Typed Record With Boundary Validation
// ============================================================================

/// A record kept in the document store.
///
/// `validate` runs on every load, so a malformed document is rejected at the
/// store boundary instead of leaking half-populated values into the domain.
pub trait Document: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the document lives in, e.g. `"orders"`.
    fn collection() -> &'static str
    where
        Self: Sized;

    /// Key of this document inside its collection.
    fn key(&self) -> String;

    /// Check invariants that the type system cannot express.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// A document together with its store metadata.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Versioned<D> {
    pub id: String,
    /// Starts at 1 on insert, incremented by every successful write.
    pub version: i64,
    pub stored_at: DateTime<Utc>,
    pub data: D,
}

// ============================================================================
// Store Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("{collection}/{id} already exists")]
    AlreadyExists { collection: &'static str, id: String },

    #[error("version conflict on {collection}/{id}: expected {expected}, found {actual:?}")]
    VersionConflict {
        collection: &'static str,
        id: String,
        expected: i64,
        actual: Option<i64>,
    },

    #[error("malformed document {collection}/{id}: {reason}")]
    Malformed {
        collection: &'static str,
        id: String,
        reason: String,
    },

    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl IsTransient for StoreError {
    fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}

// ============================================================================
// Serialization Helpers
// ============================================================================

pub fn encode_document<D: Document>(document: &D) -> Result<String, StoreError> {
    Ok(serde_json::to_string(document)?)
}

/// Parse a stored body and run the document's own validation.
pub fn decode_document<D: Document>(id: &str, body: &str) -> Result<D, StoreError> {
    let malformed = |reason: String| StoreError::Malformed {
        collection: D::collection(),
        id: id.to_string(),
        reason,
    };

    let document: D = serde_json::from_str(body).map_err(|e| malformed(e.to_string()))?;
    document.validate().map_err(malformed)?;
    Ok(document)
}
