mod errors;
pub mod guest;
pub mod local;
pub mod postgres;
pub mod remote;

pub use errors::StoreError;
pub use guest::GuestStore;
pub use local::{FileLocalCache, InMemoryLocalCache, LocalCache};
pub use postgres::PostgresDocumentStore;
pub use remote::{InMemoryDocumentStore, RemoteDocumentStore, SetOptions};
