use chrono::{DateTime, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{LocalCache, StoreError};
use crate::config::ProgressConfig;
use crate::gamification::TierTable;
use crate::profile::{normalize_profile, UserProfile, GUEST_DISPLAY_NAME, GUEST_ID};

/// Device-local persistence of the anonymous profile
#[derive(Clone)]
pub struct GuestStore {
    cache: Arc<dyn LocalCache>,
    config: ProgressConfig,
    tiers: Arc<TierTable>,
}

impl GuestStore {
    pub fn new(cache: Arc<dyn LocalCache>, config: ProgressConfig, tiers: Arc<TierTable>) -> Self {
        Self {
            cache,
            config,
            tiers,
        }
    }

    /// The cached guest profile, or a fresh default when nothing usable is stored
    #[instrument(skip(self))]
    pub fn load(&self, now: DateTime<Utc>) -> UserProfile {
        self.pending_record(now)
            .unwrap_or_else(|| UserProfile::guest(&self.tiers, now))
    }

    /// The cached guest profile if one exists and parses; never a default
    pub fn pending_record(&self, now: DateTime<Utc>) -> Option<UserProfile> {
        let key = &self.config.guest_cache_key;
        let raw = match self.cache.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key = %key, "No cached guest profile");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Failed to read guest profile from cache");
                return None;
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "Discarding unparseable guest profile");
                return None;
            }
        };

        let profile = normalize_profile(
            &value,
            GUEST_ID,
            GUEST_DISPLAY_NAME,
            &self.config,
            &self.tiers,
            now,
        );
        if profile.is_none() {
            warn!("Discarding guest profile that is not a JSON object");
        }
        profile
    }

    /// Writes the profile to the cache. Non-guest profiles are never stored locally.
    #[instrument(skip(self, profile), fields(profile_id = %profile.id))]
    pub fn persist(&self, profile: &UserProfile) -> Result<(), StoreError> {
        if !profile.is_guest() {
            debug!("Skipping local persist for authenticated profile");
            return Ok(());
        }

        let serialized = serde_json::to_string(profile)?;
        self.cache.set(&self.config.guest_cache_key, &serialized)?;
        debug!(loyalty_points = profile.loyalty_points, "Guest profile persisted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub fn clear(&self) -> Result<(), StoreError> {
        self.cache.remove(&self.config.guest_cache_key)?;
        debug!("Guest profile removed from cache");
        Ok(())
    }
}
