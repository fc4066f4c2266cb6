use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::gamification::TierTable;
use crate::stats::UserStats;

/// Identifier of the anonymous, device-local profile
pub const GUEST_ID: &str = "guest";

pub const GUEST_DISPLAY_NAME: &str = "Guest Explorer";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
    pub earned_at: DateTime<Utc>,
    pub icon: String,
}

/// Identity-scoped root record, stored locally for guests and remotely otherwise
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "photoURL", default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub last_session_at: DateTime<Utc>,
    pub loyalty_points: u64,
    pub tier: String,
    pub stats: UserStats,
    pub achievements: Vec<Achievement>,
    pub streak_days: u32,
    #[serde(default, skip_serializing_if = "VecDeque::is_empty")]
    pub recent_event_ids: VecDeque<String>,
}

impl UserProfile {
    /// Empty profile for `id`, ranked at the lowest tier
    pub fn new(id: &str, name: &str, tiers: &TierTable, now: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            email: None,
            photo_url: None,
            joined_at: now,
            last_session_at: now,
            loyalty_points: 0,
            tier: tiers.lowest().name.clone(),
            stats: UserStats::default(),
            achievements: Vec::new(),
            streak_days: 1,
            recent_event_ids: VecDeque::new(),
        }
    }

    pub fn guest(tiers: &TierTable, now: DateTime<Utc>) -> Self {
        Self::new(GUEST_ID, GUEST_DISPLAY_NAME, tiers, now)
    }

    pub fn is_guest(&self) -> bool {
        self.id == GUEST_ID
    }

    pub fn has_achievement(&self, id: &str) -> bool {
        self.achievements.iter().any(|a| a.id == id)
    }

    /// Sets the point total and re-derives the tier from it
    pub fn set_loyalty_points(&mut self, points: u64, tiers: &TierTable) {
        self.loyalty_points = points;
        self.tier = tiers.tier_for(points).name.clone();
    }

    /// Whether a guest record carries anything worth merging
    pub fn has_progress(&self) -> bool {
        self.loyalty_points > 0 || !self.achievements.is_empty()
    }

    pub fn has_seen_event(&self, event_id: &str) -> bool {
        self.recent_event_ids.iter().any(|id| id == event_id)
    }

    pub fn remember_event(&mut self, event_id: String, window: usize) {
        if window == 0 {
            return;
        }
        self.recent_event_ids.push_back(event_id);
        while self.recent_event_ids.len() > window {
            self.recent_event_ids.pop_front();
        }
    }
}
