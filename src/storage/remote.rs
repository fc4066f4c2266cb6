use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::StoreError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Shallow-merge top-level fields into an existing document instead of replacing it
    pub merge: bool,
}

impl SetOptions {
    pub fn merge() -> Self {
        Self { merge: true }
    }

    pub fn replace() -> Self {
        Self { merge: false }
    }
}

/// Document store keyed by `(collection, id)` holding JSON objects
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError>;

    async fn set(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        options: SetOptions,
    ) -> Result<(), StoreError>;

    /// Partial update of an existing document; fails when the document is absent
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError>;
}

type DocumentKey = (String, String);

#[derive(Debug, Default, Clone)]
pub struct InMemoryDocumentStore {
    documents: Arc<RwLock<HashMap<DocumentKey, Value>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with pre-populated documents
    pub fn with_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = (DocumentKey, Value)>,
    {
        Self {
            documents: Arc::new(RwLock::new(documents.into_iter().collect())),
        }
    }

    pub async fn document(&self, collection: &str, id: &str) -> Option<Value> {
        let documents = self.documents.read().await;
        documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

/// Top-level merge of `incoming` into `existing`, falling back to replacement
/// when either side is not an object
pub(crate) fn shallow_merge(existing: &mut Value, incoming: Value) {
    match (existing.as_object_mut(), incoming) {
        (Some(target), Value::Object(fields)) => {
            for (key, value) in fields {
                target.insert(key, value);
            }
        }
        (_, incoming) => *existing = incoming,
    }
}

#[async_trait]
impl RemoteDocumentStore for InMemoryDocumentStore {
    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        let documents = self.documents.read().await;
        let found = documents
            .get(&(collection.to_string(), id.to_string()))
            .cloned();
        debug!(found = found.is_some(), "Fetched document");
        Ok(found)
    }

    #[instrument(skip(self, document))]
    async fn set(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let key = (collection.to_string(), id.to_string());

        match documents.get_mut(&key) {
            Some(existing) if options.merge => shallow_merge(existing, document),
            _ => {
                documents.insert(key, document);
            }
        }
        Ok(())
    }

    #[instrument(skip(self, fields))]
    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        let mut documents = self.documents.write().await;
        let existing = documents
            .get_mut(&(collection.to_string(), id.to_string()))
            .ok_or_else(|| StoreError::Remote(format!("No document {collection}/{id} to update")))?;

        shallow_merge(existing, Value::Object(fields));
        Ok(())
    }
}
