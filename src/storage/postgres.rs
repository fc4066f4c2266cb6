use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::{debug, instrument, warn};

use super::{RemoteDocumentStore, SetOptions, StoreError};

const CREATE_DOCUMENTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body JSONB NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (collection, id)
)";

/// PostgreSQL-backed document store. Merges use JSONB `||`, which replaces
/// top-level keys and leaves the rest of the document alone.
pub struct PostgresDocumentStore {
    pool: PgPool,
}

impl PostgresDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| StoreError::Remote(e.to_string()))?;
        Ok(Self::new(pool))
    }

    #[instrument(skip(self))]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_DOCUMENTS_TABLE)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to create documents table");
                StoreError::Remote(e.to_string())
            })?;
        debug!("Documents table ready");
        Ok(())
    }
}

#[async_trait]
impl RemoteDocumentStore for PostgresDocumentStore {
    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let row = sqlx::query("SELECT body FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to fetch document");
                StoreError::Remote(e.to_string())
            })?;

        match row {
            Some(row) => {
                let Json(body): Json<Value> = row
                    .try_get("body")
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                debug!("Document found");
                Ok(Some(body))
            }
            None => {
                debug!("Document not found");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, document))]
    async fn set(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        let statement = if options.merge {
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id)
             DO UPDATE SET body = documents.body || EXCLUDED.body, updated_at = now()"
        } else {
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3)
             ON CONFLICT (collection, id)
             DO UPDATE SET body = EXCLUDED.body, updated_at = now()"
        };

        sqlx::query(statement)
            .bind(collection)
            .bind(id)
            .bind(Json(document))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to write document");
                StoreError::Remote(e.to_string())
            })?;

        debug!(merge = options.merge, "Document written");
        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE documents SET body = body || $3, updated_at = now()
             WHERE collection = $1 AND id = $2",
        )
        .bind(collection)
        .bind(id)
        .bind(Json(Value::Object(fields)))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to update document");
            StoreError::Remote(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            warn!("Document not found for update");
            return Err(StoreError::Remote(format!(
                "No document {collection}/{id} to update"
            )));
        }

        debug!("Document updated");
        Ok(())
    }
}
