// Library crate for the geography progress engine
// This file exposes the public API for the binary and integration tests

pub mod config;
pub mod gamification;
pub mod identity;
pub mod profile;
pub mod shared;
pub mod stats;
pub mod storage;
pub mod sync;

// Re-export commonly used types for easier access in tests
pub use config::{ProgressConfig, ServerConfig};
pub use gamification::{AchievementRules, RegionLookup, StaticRegionLookup, TierTable};
pub use identity::{Identity, IdentityTokenConfig};
pub use profile::{Achievement, UserProfile};
pub use shared::{router, AppError, AppState};
pub use stats::{GameResultPayload, ProgressEngine, RecordOutcome, UserStats};
pub use storage::{
    FileLocalCache, InMemoryDocumentStore, InMemoryLocalCache, LocalCache,
    PostgresDocumentStore, RemoteDocumentStore, StoreError,
};
pub use sync::{ProgressController, SyncPhase, SyncStatus, WriteDiscipline};
