use serde::Serialize;
use strum_macros::{Display, EnumString};

/// Where the controller is in the identity lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "snake_case")]
pub enum SyncPhase {
    GuestActive,
    Syncing,
    AuthenticatedActive,
}

/// How remote writes triggered by local mutations are issued
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WriteDiscipline {
    /// One detached task per write; completions may land out of order
    #[default]
    FireAndForget,
    /// A single writer task that always sends the newest snapshot and skips superseded ones
    Serialized,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub phase: SyncPhase,
    pub identity_id: Option<String>,
}
