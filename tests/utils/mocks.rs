use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use geoprogress::storage::{InMemoryDocumentStore, RemoteDocumentStore, SetOptions, StoreError};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Every operation fails, as if the remote store were unreachable
pub struct FailingDocumentStore;

#[async_trait]
impl RemoteDocumentStore for FailingDocumentStore {
    async fn get(&self, _collection: &str, _id: &str) -> Result<Option<Value>, StoreError> {
        Err(StoreError::Remote("connection refused".to_string()))
    }

    async fn set(
        &self,
        _collection: &str,
        _id: &str,
        _document: Value,
        _options: SetOptions,
    ) -> Result<(), StoreError> {
        Err(StoreError::Remote("connection refused".to_string()))
    }

    async fn update(
        &self,
        _collection: &str,
        _id: &str,
        _fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        Err(StoreError::Remote("connection refused".to_string()))
    }
}

/// Reads succeed against the wrapped store; writes are rejected
pub struct FailingWriteStore {
    pub inner: InMemoryDocumentStore,
}

impl FailingWriteStore {
    pub fn new(inner: InMemoryDocumentStore) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl RemoteDocumentStore for FailingWriteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn set(
        &self,
        _collection: &str,
        _id: &str,
        _document: Value,
        _options: SetOptions,
    ) -> Result<(), StoreError> {
        Err(StoreError::Remote("write quota exceeded".to_string()))
    }

    async fn update(
        &self,
        _collection: &str,
        _id: &str,
        _fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        Err(StoreError::Remote("write quota exceeded".to_string()))
    }
}

/// Reads always succeed; only the first `allowed_writes` writes go through
pub struct FlakyWriteStore {
    pub inner: InMemoryDocumentStore,
    remaining_writes: AtomicUsize,
}

impl FlakyWriteStore {
    pub fn new(inner: InMemoryDocumentStore, allowed_writes: usize) -> Self {
        Self {
            inner,
            remaining_writes: AtomicUsize::new(allowed_writes),
        }
    }

    fn take_write(&self) -> Result<(), StoreError> {
        self.remaining_writes
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .map(|_| ())
            .map_err(|_| StoreError::Remote("service unavailable".to_string()))
    }
}

#[async_trait]
impl RemoteDocumentStore for FlakyWriteStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        self.take_write()?;
        self.inner.set(collection, id, document, options).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.take_write()?;
        self.inner.update(collection, id, fields).await
    }
}

/// Delays every fetch before delegating to the wrapped store
pub struct SlowDocumentStore {
    pub inner: InMemoryDocumentStore,
    delay: Duration,
}

impl SlowDocumentStore {
    pub fn new(inner: InMemoryDocumentStore, delay: Duration) -> Self {
        Self { inner, delay }
    }
}

#[async_trait]
impl RemoteDocumentStore for SlowDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(collection, id).await
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        self.inner.set(collection, id, document, options).await
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.inner.update(collection, id, fields).await
    }
}

/// Delegates to the wrapped store and records the point total of every
/// completed snapshot write, in completion order
#[derive(Clone)]
pub struct RecordingDocumentStore {
    pub inner: InMemoryDocumentStore,
    completed_points: Arc<RwLock<Vec<u64>>>,
    write_delay: Duration,
}

impl RecordingDocumentStore {
    pub fn new(inner: InMemoryDocumentStore, write_delay: Duration) -> Self {
        Self {
            inner,
            completed_points: Arc::new(RwLock::new(Vec::new())),
            write_delay,
        }
    }

    pub async fn completed_points(&self) -> Vec<u64> {
        self.completed_points.read().await.clone()
    }
}

#[async_trait]
impl RemoteDocumentStore for RecordingDocumentStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Value>, StoreError> {
        self.inner.get(collection, id).await
    }

    async fn set(
        &self,
        collection: &str,
        id: &str,
        document: Value,
        options: SetOptions,
    ) -> Result<(), StoreError> {
        tokio::time::sleep(self.write_delay).await;
        let points = document["loyaltyPoints"].as_u64().unwrap_or(0);
        self.inner.set(collection, id, document, options).await?;
        self.completed_points.write().await.push(points);
        Ok(())
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        fields: Map<String, Value>,
    ) -> Result<(), StoreError> {
        self.inner.update(collection, id, fields).await
    }
}
