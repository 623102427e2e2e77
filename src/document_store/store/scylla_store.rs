use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scylla::client::session::Session;
use scylla::client::session_builder::SessionBuilder;
use scylla::response::query_result::QueryResult;
use scylla::value::{CqlValue, Row};

use super::DocumentStore;
use crate::document_store::core::{decode_document, encode_document, Document, StoreError, Versioned};
use crate::metrics::Metrics;
use crate::utils::{retry_on_transient, RetryConfig};

// ============================================================================
// ScyllaDB Document Store
// ============================================================================
//
// One table holds every collection:
//
//   documents ((collection), id) -> version, body, updated_at
//
// Inserts use `IF NOT EXISTS` and updates use `IF version = ?`, so every write
// is a lightweight transaction and two admins racing on the same order cannot
// overwrite each other. Reads are retried on transient failures; writes are
// not, because a timed-out LWT may or may not have been applied.
//
// ============================================================================

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection text,
    id text,
    version bigint,
    body text,
    updated_at timestamp,
    PRIMARY KEY ((collection), id)
) WITH CLUSTERING ORDER BY (id ASC)";

pub struct ScyllaDocumentStore {
    session: Arc<Session>,
    retry: RetryConfig,
    metrics: Option<Arc<Metrics>>,
}

impl ScyllaDocumentStore {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            retry: RetryConfig::default(),
            metrics: None,
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Connect, create the keyspace and table if needed, and switch to the keyspace.
    pub async fn connect(known_node: &str, keyspace: &str) -> anyhow::Result<Self> {
        tracing::info!(known_node, keyspace, "Connecting to ScyllaDB");

        let session: Session = SessionBuilder::new().known_node(known_node).build().await?;

        session
            .query_unpaged(
                format!(
                    "CREATE KEYSPACE IF NOT EXISTS {keyspace} WITH REPLICATION = \
                     {{'class': 'SimpleStrategy', 'replication_factor': 1}}"
                ),
                &[],
            )
            .await?;
        session.use_keyspace(keyspace, false).await?;
        session.query_unpaged(CREATE_TABLE, &[]).await?;

        Ok(Self::new(Arc::new(session)))
    }

    fn observe(&self, operation: &str, started: Instant) {
        if let Some(metrics) = &self.metrics {
            metrics.record_store_operation(operation, started.elapsed().as_secs_f64());
        }
    }

    async fn select_one(
        &self,
        collection: &'static str,
        id: &str,
    ) -> Result<Option<(i64, String, DateTime<Utc>)>, StoreError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT version, body, updated_at FROM documents WHERE collection = ? AND id = ?",
                (collection, id),
            )
            .await
            .map_err(unavailable)?;

        let rows = result.into_rows_result().map_err(unavailable)?;
        rows.maybe_first_row::<(i64, String, DateTime<Utc>)>()
            .map_err(unavailable)
    }

    async fn select_all(
        &self,
        collection: &'static str,
    ) -> Result<Vec<(String, i64, String, DateTime<Utc>)>, StoreError> {
        let result = self
            .session
            .query_unpaged(
                "SELECT id, version, body, updated_at FROM documents WHERE collection = ?",
                (collection,),
            )
            .await
            .map_err(unavailable)?;

        let rows = result.into_rows_result().map_err(unavailable)?;
        let mut documents = Vec::new();
        for row in rows
            .rows::<(String, i64, String, DateTime<Utc>)>()
            .map_err(unavailable)?
        {
            documents.push(row.map_err(unavailable)?);
        }
        Ok(documents)
    }

    async fn with_read_retry<T, F, Fut>(&self, operation: &'static str, mut read: F) -> Result<T, StoreError>
    where
        F: FnMut(u32) -> Fut,
        Fut: std::future::Future<Output = Result<T, StoreError>>,
    {
        let metrics = self.metrics.clone();
        retry_on_transient(self.retry.clone(), move |attempt| {
            if attempt > 1 {
                if let Some(metrics) = &metrics {
                    metrics.record_store_retry(operation);
                }
            }
            read(attempt)
        })
        .await
        .into_result()
    }
}

/// Outcome of a lightweight transaction: whether it applied, and the
/// `version` column Scylla echoes back when it did not.
fn lwt_outcome(result: QueryResult) -> Result<(bool, Option<i64>), StoreError> {
    let rows = result.into_rows_result().map_err(unavailable)?;
    let row = rows
        .maybe_first_row::<Row>()
        .map_err(unavailable)?
        .ok_or_else(|| StoreError::Unavailable("LWT returned no rows".to_string()))?;

    let applied = match row.columns.first() {
        Some(Some(CqlValue::Boolean(applied))) => *applied,
        _ => return Err(StoreError::Unavailable("LWT result missing [applied]".to_string())),
    };
    let current_version = row.columns.iter().skip(1).find_map(|column| match column {
        Some(CqlValue::BigInt(version)) => Some(*version),
        _ => None,
    });

    Ok((applied, current_version))
}

fn unavailable<E: std::fmt::Display>(error: E) -> StoreError {
    StoreError::Unavailable(error.to_string())
}

#[async_trait]
impl<D: Document> DocumentStore<D> for ScyllaDocumentStore {
    async fn load(&self, id: &str) -> Result<Option<Versioned<D>>, StoreError> {
        let started = Instant::now();
        let row = self
            .with_read_retry("load", |_| self.select_one(D::collection(), id))
            .await?;
        self.observe("load", started);

        match row {
            Some((version, body, stored_at)) => {
                tracing::debug!(collection = D::collection(), id, version, "Loaded document");
                Ok(Some(Versioned {
                    id: id.to_string(),
                    version,
                    stored_at,
                    data: decode_document(id, &body)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn insert(&self, document: &D) -> Result<Versioned<D>, StoreError> {
        let started = Instant::now();
        let id = document.key();
        let body = encode_document(document)?;
        let stored_at = Utc::now();

        let result = self
            .session
            .query_unpaged(
                "INSERT INTO documents (collection, id, version, body, updated_at) \
                 VALUES (?, ?, 1, ?, ?) IF NOT EXISTS",
                (D::collection(), id.as_str(), body.as_str(), stored_at),
            )
            .await
            .map_err(unavailable)?;
        self.observe("insert", started);

        let (applied, _) = lwt_outcome(result)?;
        if !applied {
            return Err(StoreError::AlreadyExists {
                collection: D::collection(),
                id,
            });
        }

        tracing::debug!(collection = D::collection(), id = %id, "Inserted document");

        Ok(Versioned {
            id,
            version: 1,
            stored_at,
            data: document.clone(),
        })
    }

    async fn compare_and_swap(
        &self,
        id: &str,
        expected_version: i64,
        document: &D,
    ) -> Result<i64, StoreError> {
        let started = Instant::now();
        let body = encode_document(document)?;
        let new_version = expected_version + 1;

        let result = self
            .session
            .query_unpaged(
                "UPDATE documents SET version = ?, body = ?, updated_at = ? \
                 WHERE collection = ? AND id = ? IF version = ?",
                (new_version, body.as_str(), Utc::now(), D::collection(), id, expected_version),
            )
            .await
            .map_err(unavailable)?;
        self.observe("compare_and_swap", started);

        match lwt_outcome(result)? {
            (true, _) => {
                tracing::debug!(collection = D::collection(), id, version = new_version, "Swapped document");
                Ok(new_version)
            }
            // A conditional update on a missing row echoes no version column.
            (false, None) => Err(StoreError::NotFound {
                collection: D::collection(),
                id: id.to_string(),
            }),
            (false, actual) => Err(StoreError::VersionConflict {
                collection: D::collection(),
                id: id.to_string(),
                expected: expected_version,
                actual,
            }),
        }
    }

    async fn scan(&self) -> Result<Vec<Versioned<D>>, StoreError> {
        let started = Instant::now();
        let rows = self
            .with_read_retry("scan", |_| self.select_all(D::collection()))
            .await?;
        self.observe("scan", started);

        rows.into_iter()
            .map(|(id, version, body, stored_at)| {
                let data = decode_document(&id, &body)?;
                Ok(Versioned {
                    id,
                    version,
                    stored_at,
                    data,
                })
            })
            .collect()
    }
}
