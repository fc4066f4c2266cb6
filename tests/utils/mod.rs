pub mod mocks;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use mocks::{
    FailingDocumentStore, FailingWriteStore, FlakyWriteStore, RecordingDocumentStore,
    SlowDocumentStore,
};
#[allow(unused_imports)]
pub use setup::{eventually, identity_token, TestSetup, TestSetupBuilder, TOKEN_SECRET};
