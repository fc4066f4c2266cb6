pub mod controller;
pub mod reconcile;
mod types;
mod writer;

pub use controller::{ProgressController, ProgressControllerBuilder};
pub use reconcile::{merge_guest_into, seed_from_guest, ReconcileOutcome, Reconciler};
pub use types::{SyncPhase, SyncStatus, WriteDiscipline};
pub use writer::RemoteWriter;
