use chrono::Duration as TokenLifetime;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use geoprogress::{
    config::ProgressConfig,
    identity::{Identity, IdentityTokenConfig},
    storage::{InMemoryDocumentStore, InMemoryLocalCache, LocalCache, RemoteDocumentStore},
    ProgressController, StaticRegionLookup,
};

pub const TOKEN_SECRET: &str = "integration-test-secret";

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub struct TestSetup {
    pub controller: Arc<ProgressController>,
    pub documents: InMemoryDocumentStore,
    pub local: Arc<InMemoryLocalCache>,
}

impl TestSetup {
    pub async fn remote_document(&self, id: &str) -> Option<Value> {
        self.documents.document("users", id).await
    }
}

pub struct TestSetupBuilder {
    documents: InMemoryDocumentStore,
    remote: Option<Arc<dyn RemoteDocumentStore>>,
    local: Arc<InMemoryLocalCache>,
    config: ProgressConfig,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            documents: InMemoryDocumentStore::new(),
            remote: None,
            local: Arc::new(InMemoryLocalCache::new()),
            config: ProgressConfig::default(),
        }
    }

    /// Seeds the device cache with a raw guest record
    pub fn with_guest_record(self, record: Value) -> Self {
        self.local
            .set("guest_profile", &record.to_string())
            .expect("in-memory cache never fails");
        self
    }

    /// Seeds the backing document store with a raw user document
    pub fn with_remote_profile(self, id: &str, document: Value) -> Self {
        let documents = InMemoryDocumentStore::with_documents([(
            ("users".to_string(), id.to_string()),
            document,
        )]);
        Self { documents, ..self }
    }

    /// Shares an existing backing store and device cache, e.g. to simulate a restart
    pub fn with_shared(mut self, documents: InMemoryDocumentStore, local: Arc<InMemoryLocalCache>) -> Self {
        self.documents = documents;
        self.local = local;
        self
    }

    /// Routes the controller through a wrapper store instead of the backing store
    pub fn with_remote<F>(mut self, wrap: F) -> Self
    where
        F: FnOnce(InMemoryDocumentStore) -> Arc<dyn RemoteDocumentStore>,
    {
        self.remote = Some(wrap(self.documents.clone()));
        self
    }

    pub fn with_config(mut self, config: ProgressConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> TestSetup {
        let remote = self
            .remote
            .unwrap_or_else(|| Arc::new(self.documents.clone()));
        let regions = StaticRegionLookup::from_pairs([
            ("1", "Europe"),
            ("2", "Europe"),
            ("3", "Asia"),
            ("12", "Africa"),
        ]);

        let controller = ProgressController::builder(remote, self.local.clone())
            .with_region_lookup(Arc::new(regions))
            .with_config(self.config)
            .build();

        TestSetup {
            controller: Arc::new(controller),
            documents: self.documents,
            local: self.local,
        }
    }
}

impl Default for TestSetupBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls `check` until it holds or two seconds pass
pub async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..200 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

pub fn identity_token(identity: &Identity) -> String {
    IdentityTokenConfig::new(TOKEN_SECRET)
        .create_token(identity, TokenLifetime::hours(1))
        .expect("token encoding succeeds")
}
