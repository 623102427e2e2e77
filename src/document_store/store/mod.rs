// ============================================================================
// Document Store - Persistence Port and Adapters
// ============================================================================
//
// `DocumentStore` is the only persistence surface the domain sees.
// Adapters:
// - InMemoryDocumentStore - process-local, used by tests and the demo
// - ScyllaDocumentStore   - ScyllaDB with lightweight transactions
//
// ============================================================================

pub mod memory;
pub mod scylla_store;

use async_trait::async_trait;

use super::core::{Document, StoreError, Versioned};

pub use memory::InMemoryDocumentStore;
pub use scylla_store::ScyllaDocumentStore;

/// Read/write-by-key access to one collection of documents.
///
/// No multi-document transactions are assumed. Writes to an existing document
/// go through `compare_and_swap`, which only succeeds if nobody else wrote the
/// document since it was loaded.
#[async_trait]
pub trait DocumentStore<D: Document>: Send + Sync {
    /// Fetch a document, or `None` if the key is unknown.
    async fn load(&self, id: &str) -> Result<Option<Versioned<D>>, StoreError>;

    /// Create a new document at version 1. Fails with `AlreadyExists` if the key is taken.
    async fn insert(&self, document: &D) -> Result<Versioned<D>, StoreError>;

    /// Replace a document if its stored version still equals `expected_version`.
    /// Returns the new version.
    async fn compare_and_swap(
        &self,
        id: &str,
        expected_version: i64,
        document: &D,
    ) -> Result<i64, StoreError>;

    /// Every document in the collection, ordered by key.
    async fn scan(&self) -> Result<Vec<Versioned<D>>, StoreError>;
}
