use serde::{Deserialize, Serialize};

use super::{Achievement, UserProfile};
use crate::stats::RecordOutcome;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DisplayNameRequest {
    pub name: String,
}

/// Response for a submitted game result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameResultResponse {
    pub profile: UserProfile,
    pub points_awarded: u64,
    pub unlocked: Vec<Achievement>,
    pub duplicate: bool,
}

impl From<RecordOutcome> for GameResultResponse {
    fn from(outcome: RecordOutcome) -> Self {
        Self {
            profile: outcome.profile,
            points_awarded: outcome.points_awarded,
            unlocked: outcome.unlocked,
            duplicate: outcome.duplicate,
        }
    }
}
