use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error, instrument, warn};

use super::WriteDiscipline;
use crate::profile::UserProfile;
use crate::storage::{RemoteDocumentStore, SetOptions};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingWrite {
    /// Full profile, written with `merge: true`
    Snapshot { id: String, document: Value },
    /// Partial field update of an existing document
    Patch {
        id: String,
        fields: Map<String, Value>,
    },
}

impl PendingWrite {
    fn id(&self) -> &str {
        match self {
            PendingWrite::Snapshot { id, .. } | PendingWrite::Patch { id, .. } => id,
        }
    }
}

/// Issues remote writes for local mutations without blocking the caller
pub struct RemoteWriter {
    store: Arc<dyn RemoteDocumentStore>,
    collection: String,
    discipline: WriteDiscipline,
    queue: mpsc::UnboundedSender<PendingWrite>,
    idle_receiver: Mutex<Option<mpsc::UnboundedReceiver<PendingWrite>>>,
}

impl RemoteWriter {
    pub fn new(
        store: Arc<dyn RemoteDocumentStore>,
        collection: impl Into<String>,
        discipline: WriteDiscipline,
    ) -> Self {
        let (queue, receiver) = mpsc::unbounded_channel();
        Self {
            store,
            collection: collection.into(),
            discipline,
            queue,
            idle_receiver: Mutex::new(Some(receiver)),
        }
    }

    pub fn discipline(&self) -> WriteDiscipline {
        self.discipline
    }

    #[instrument(skip(self, profile), fields(profile_id = %profile.id))]
    pub fn save_profile(&self, profile: &UserProfile) {
        match serde_json::to_value(profile) {
            Ok(document) => self.submit(PendingWrite::Snapshot {
                id: profile.id.clone(),
                document,
            }),
            Err(e) => error!(error = %e, "Failed to serialize profile for remote write"),
        }
    }

    #[instrument(skip(self, fields))]
    pub fn patch(&self, id: &str, fields: Map<String, Value>) {
        self.submit(PendingWrite::Patch {
            id: id.to_string(),
            fields,
        });
    }

    fn submit(&self, write: PendingWrite) {
        let Ok(runtime) = Handle::try_current() else {
            warn!(profile_id = %write.id(), "No async runtime available, dropping remote write");
            return;
        };

        match self.discipline {
            WriteDiscipline::FireAndForget => {
                let store = self.store.clone();
                let collection = self.collection.clone();
                runtime.spawn(async move {
                    apply(store.as_ref(), &collection, write).await;
                });
            }
            WriteDiscipline::Serialized => {
                self.ensure_writer_task(&runtime);
                if self.queue.send(write).is_err() {
                    error!("Remote writer task has stopped, write dropped");
                }
            }
        }
    }

    fn ensure_writer_task(&self, runtime: &Handle) {
        let receiver = self
            .idle_receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(receiver) = receiver {
            debug!(collection = %self.collection, "Starting serialized remote writer");
            runtime.spawn(run_serialized(
                self.store.clone(),
                self.collection.clone(),
                receiver,
            ));
        }
    }
}

async fn run_serialized(
    store: Arc<dyn RemoteDocumentStore>,
    collection: String,
    mut receiver: mpsc::UnboundedReceiver<PendingWrite>,
) {
    while let Some(first) = receiver.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = receiver.try_recv() {
            batch.push(next);
        }

        let queued = batch.len();
        let batch = coalesce(batch);
        if batch.len() < queued {
            debug!(queued, writing = batch.len(), "Coalesced superseded remote writes");
        }

        for write in batch {
            apply(store.as_ref(), &collection, write).await;
        }
    }
    debug!("Serialized remote writer stopped");
}

/// Drops every write for an id that a later snapshot of the same id makes redundant.
/// Relative order of the surviving writes is preserved.
pub(crate) fn coalesce(batch: Vec<PendingWrite>) -> Vec<PendingWrite> {
    let mut kept: Vec<PendingWrite> = Vec::with_capacity(batch.len());
    for write in batch {
        if let PendingWrite::Snapshot { id, .. } = &write {
            kept.retain(|earlier| earlier.id() != id.as_str());
        }
        kept.push(write);
    }
    kept
}

async fn apply(store: &dyn RemoteDocumentStore, collection: &str, write: PendingWrite) {
    let result = match write {
        PendingWrite::Snapshot { id, document } => {
            store.set(collection, &id, document, SetOptions::merge()).await
        }
        PendingWrite::Patch { id, fields } => store.update(collection, &id, fields).await,
    };

    match result {
        Ok(()) => debug!(collection, "Remote write completed"),
        Err(e) => error!(error = %e, collection, "Remote write failed"),
    }
}
