use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::DocumentStore;
use crate::document_store::core::{decode_document, encode_document, Document, StoreError, Versioned};

// ============================================================================
// In-Memory Document Store
// ============================================================================
//
// Bodies are kept as JSON text, exactly as a remote store would hand them
// back, so the decode + validate path is the same one production uses.
// Keys are ordered (collection, id), which gives `scan` a stable order.
//
// ============================================================================

#[derive(Debug, Clone)]
struct StoredDocument {
    version: i64,
    body: String,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct InMemoryDocumentStore {
    documents: RwLock<BTreeMap<(String, String), StoredDocument>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents across all collections.
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.documents.read().await.is_empty()
    }

    /// Write a raw body, bypassing encoding. Lets tests plant malformed documents.
    #[cfg(test)]
    pub(crate) async fn put_raw(&self, collection: &str, id: &str, body: &str) {
        self.documents.write().await.insert(
            (collection.to_string(), id.to_string()),
            StoredDocument {
                version: 1,
                body: body.to_string(),
                stored_at: Utc::now(),
            },
        );
    }

    fn versioned<D: Document>(id: &str, stored: &StoredDocument) -> Result<Versioned<D>, StoreError> {
        Ok(Versioned {
            id: id.to_string(),
            version: stored.version,
            stored_at: stored.stored_at,
            data: decode_document(id, &stored.body)?,
        })
    }
}

#[async_trait]
impl<D: Document> DocumentStore<D> for InMemoryDocumentStore {
    async fn load(&self, id: &str) -> Result<Option<Versioned<D>>, StoreError> {
        let documents = self.documents.read().await;
        let key = (D::collection().to_string(), id.to_string());

        match documents.get(&key) {
            Some(stored) => {
                tracing::debug!(collection = D::collection(), id, version = stored.version, "Loaded document");
                Ok(Some(Self::versioned(id, stored)?))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, document: &D) -> Result<Versioned<D>, StoreError> {
        let id = document.key();
        let body = encode_document(document)?;
        let mut documents = self.documents.write().await;
        let key = (D::collection().to_string(), id.clone());

        if documents.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                collection: D::collection(),
                id,
            });
        }

        let stored = StoredDocument {
            version: 1,
            body,
            stored_at: Utc::now(),
        };
        documents.insert(key, stored.clone());

        tracing::debug!(collection = D::collection(), id = %id, "Inserted document");

        Ok(Versioned {
            id,
            version: stored.version,
            stored_at: stored.stored_at,
            data: document.clone(),
        })
    }

    async fn compare_and_swap(
        &self,
        id: &str,
        expected_version: i64,
        document: &D,
    ) -> Result<i64, StoreError> {
        let body = encode_document(document)?;
        let mut documents = self.documents.write().await;
        let key = (D::collection().to_string(), id.to_string());

        let stored = documents.get_mut(&key).ok_or_else(|| StoreError::NotFound {
            collection: D::collection(),
            id: id.to_string(),
        })?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                collection: D::collection(),
                id: id.to_string(),
                expected: expected_version,
                actual: Some(stored.version),
            });
        }

        stored.version += 1;
        stored.body = body;
        stored.stored_at = Utc::now();

        tracing::debug!(collection = D::collection(), id, version = stored.version, "Swapped document");

        Ok(stored.version)
    }

    async fn scan(&self) -> Result<Vec<Versioned<D>>, StoreError> {
        let documents = self.documents.read().await;

        documents
            .iter()
            .filter(|((collection, _), _)| collection == D::collection())
            .map(|((_, id), stored)| Self::versioned(id, stored))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
    struct Widget {
        id: String,
        size: u32,
    }

    impl Document for Widget {
        fn collection() -> &'static str {
            "widgets"
        }

        fn key(&self) -> String {
            self.id.clone()
        }
    }

    fn widget(id: &str, size: u32) -> Widget {
        Widget { id: id.to_string(), size }
    }

    #[tokio::test]
    async fn test_insert_then_load() {
        let store = InMemoryDocumentStore::new();
        let inserted = store.insert(&widget("w1", 3)).await.unwrap();
        assert_eq!(inserted.version, 1);

        let loaded: Versioned<Widget> = store.load("w1").await.unwrap().unwrap();
        assert_eq!(loaded.data, widget("w1", 3));
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn test_insert_duplicate_fails() {
        let store = InMemoryDocumentStore::new();
        store.insert(&widget("w1", 3)).await.unwrap();

        let err = store.insert(&widget("w1", 4)).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists { .. }));
    }

    #[tokio::test]
    async fn test_load_unknown_is_none() {
        let store = InMemoryDocumentStore::new();
        let loaded: Option<Versioned<Widget>> = store.load("missing").await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_compare_and_swap_bumps_version() {
        let store = InMemoryDocumentStore::new();
        store.insert(&widget("w1", 3)).await.unwrap();

        let version = store.compare_and_swap("w1", 1, &widget("w1", 5)).await.unwrap();
        assert_eq!(version, 2);

        let loaded: Versioned<Widget> = store.load("w1").await.unwrap().unwrap();
        assert_eq!(loaded.data.size, 5);
    }

    #[tokio::test]
    async fn test_stale_compare_and_swap_is_rejected() {
        let store = InMemoryDocumentStore::new();
        store.insert(&widget("w1", 3)).await.unwrap();
        store.compare_and_swap("w1", 1, &widget("w1", 5)).await.unwrap();

        // A second writer still holding version 1 loses.
        let err = store.compare_and_swap("w1", 1, &widget("w1", 9)).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::VersionConflict { expected: 1, actual: Some(2), .. }
        ));

        let loaded: Versioned<Widget> = store.load("w1").await.unwrap().unwrap();
        assert_eq!(loaded.data.size, 5);
    }

    #[tokio::test]
    async fn test_compare_and_swap_unknown_is_not_found() {
        let store = InMemoryDocumentStore::new();
        let err = store.compare_and_swap("nope", 1, &widget("nope", 1)).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_scan_is_ordered_by_key_and_scoped_to_collection() {
        let store = InMemoryDocumentStore::new();
        store.insert(&widget("b", 2)).await.unwrap();
        store.insert(&widget("a", 1)).await.unwrap();
        store.put_raw("gadgets", "z", "{}").await;

        let all: Vec<Versioned<Widget>> = store.scan().await.unwrap();
        let ids: Vec<_> = all.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_malformed_body_is_rejected_on_load() {
        let store = InMemoryDocumentStore::new();
        store.put_raw("widgets", "w1", r#"{"id":"w1"}"#).await;

        let err = DocumentStore::<Widget>::load(&store, "w1").await.unwrap_err();
        assert!(matches!(err, StoreError::Malformed { .. }));
    }
}
