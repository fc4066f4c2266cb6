use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::config::ProgressConfig;
use crate::gamification::TierTable;
use crate::identity::{display_name_for, DisplayNameGenerator, Identity};
use crate::profile::{normalize_profile, UserProfile};
use crate::storage::{RemoteDocumentStore, SetOptions, StoreError};

/// Folds guest progress into an existing authenticated profile.
///
/// Points and play time are capped; correct/wrong totals are added as-is and
/// guest achievements are appended unless the id is already present. Per-game
/// and per-region breakdowns are not carried over.
pub fn merge_guest_into(
    remote: &UserProfile,
    guest: &UserProfile,
    config: &ProgressConfig,
    tiers: &TierTable,
) -> UserProfile {
    let mut merged = remote.clone();

    let carried_points = guest.loyalty_points.min(config.guest_merge_point_cap);
    merged.set_loyalty_points(remote.loyalty_points.saturating_add(carried_points), tiers);

    merged.stats.total_correct = merged
        .stats
        .total_correct
        .saturating_add(guest.stats.total_correct);
    merged.stats.total_wrong = merged
        .stats
        .total_wrong
        .saturating_add(guest.stats.total_wrong);
    merged.stats.total_time_seconds = merged.stats.total_time_seconds.saturating_add(
        guest
            .stats
            .total_time_seconds
            .min(config.guest_merge_time_cap_seconds),
    );

    for achievement in &guest.achievements {
        if !merged.has_achievement(&achievement.id) {
            merged.achievements.push(achievement.clone());
        }
    }

    merged
}

/// Fresh authenticated profile, seeded from the guest record when it has points
pub fn seed_from_guest(
    identity: &Identity,
    name: &str,
    guest: Option<&UserProfile>,
    config: &ProgressConfig,
    tiers: &TierTable,
    now: DateTime<Utc>,
) -> UserProfile {
    let fresh = fresh_profile(identity, name, tiers, now);
    match guest {
        Some(guest) => adopt_guest(&fresh, guest, config, tiers),
        None => fresh,
    }
}

fn fresh_profile(identity: &Identity, name: &str, tiers: &TierTable, now: DateTime<Utc>) -> UserProfile {
    let mut profile = UserProfile::new(&identity.id, name, tiers, now);
    profile.email = identity.email.clone();
    profile.photo_url = identity.photo_url.clone();
    profile
}

fn adopt_guest(
    fresh: &UserProfile,
    guest: &UserProfile,
    config: &ProgressConfig,
    tiers: &TierTable,
) -> UserProfile {
    let mut profile = fresh.clone();
    if guest.loyalty_points > 0 {
        profile.stats = guest.stats.clone();
        profile.achievements = guest.achievements.clone();
        profile.streak_days = guest.streak_days.max(1);
        profile.recent_event_ids = guest.recent_event_ids.clone();
        profile.set_loyalty_points(guest.loyalty_points.min(config.guest_merge_point_cap), tiers);
    }
    profile
}

#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub profile: UserProfile,
    /// Authenticated profile before any guest progress was folded in
    pub base: UserProfile,
    /// No remote document existed and one was created
    pub created: bool,
    /// A guest record was folded into the result
    pub merged_guest: bool,
    /// The guest record was taken into account and should leave the device
    pub consumed_guest: bool,
}

impl ReconcileOutcome {
    /// Folds `guest` into the base profile the same way the sign-in did.
    ///
    /// Used when the guest kept playing while the sync was in flight, so the
    /// snapshot that was merged is already out of date.
    pub fn refold(&self, guest: &UserProfile, config: &ProgressConfig, tiers: &TierTable) -> UserProfile {
        if self.created {
            adopt_guest(&self.base, guest, config, tiers)
        } else if guest.has_progress() {
            merge_guest_into(&self.base, guest, config, tiers)
        } else {
            self.base.clone()
        }
    }
}

/// Guest to authenticated reconciliation, run once per sign-in.
///
/// The remote document is fetched, the guest snapshot handed in by the caller
/// is folded in (capped) and the result is written back. Deleting the local
/// guest record is left to the caller, and only happens after the write
/// succeeded.
pub struct Reconciler {
    remote: Arc<dyn RemoteDocumentStore>,
    names: Arc<dyn DisplayNameGenerator>,
    config: ProgressConfig,
    tiers: Arc<TierTable>,
}

impl Reconciler {
    pub fn new(
        remote: Arc<dyn RemoteDocumentStore>,
        names: Arc<dyn DisplayNameGenerator>,
        config: ProgressConfig,
        tiers: Arc<TierTable>,
    ) -> Self {
        Self {
            remote,
            names,
            config,
            tiers,
        }
    }

    /// Resolves the canonical profile for `identity`, given the guest record
    /// that was on the device when the sign-in started
    #[instrument(skip(self, identity, guest, now), fields(identity_id = %identity.id))]
    pub async fn run(
        &self,
        identity: &Identity,
        guest: Option<UserProfile>,
        now: DateTime<Utc>,
    ) -> Result<ReconcileOutcome, StoreError> {
        let collection = &self.config.users_collection;
        let name = display_name_for(identity, self.names.as_ref()).await;

        let stored = self.remote.get(collection, &identity.id).await?;
        let existing = stored.and_then(|document| {
            let profile =
                normalize_profile(&document, &identity.id, &name, &self.config, &self.tiers, now);
            if profile.is_none() {
                warn!("Remote document is not an object, recreating it");
            }
            profile
        });

        match existing {
            Some(mut profile) => {
                if profile.email.is_none() {
                    profile.email = identity.email.clone();
                }
                if profile.photo_url.is_none() {
                    profile.photo_url = identity.photo_url.clone();
                }

                let Some(guest) = guest.filter(UserProfile::has_progress) else {
                    debug!(loyalty_points = profile.loyalty_points, "Loaded remote profile");
                    return Ok(ReconcileOutcome {
                        base: profile.clone(),
                        profile,
                        created: false,
                        merged_guest: false,
                        consumed_guest: false,
                    });
                };

                let merged = merge_guest_into(&profile, &guest, &self.config, &self.tiers);
                self.write(&merged).await?;

                info!(
                    guest_points = guest.loyalty_points,
                    loyalty_points = merged.loyalty_points,
                    tier = %merged.tier,
                    "Merged guest progress into remote profile"
                );
                Ok(ReconcileOutcome {
                    profile: merged,
                    base: profile,
                    created: false,
                    merged_guest: true,
                    consumed_guest: true,
                })
            }
            None => {
                let fresh = fresh_profile(identity, &name, &self.tiers, now);
                let seeded = match guest.as_ref() {
                    Some(guest) => adopt_guest(&fresh, guest, &self.config, &self.tiers),
                    None => fresh.clone(),
                };
                self.write(&seeded).await?;

                let merged_guest = guest.as_ref().is_some_and(|g| g.loyalty_points > 0);

                info!(
                    loyalty_points = seeded.loyalty_points,
                    merged_guest,
                    "Created remote profile"
                );
                Ok(ReconcileOutcome {
                    profile: seeded,
                    base: fresh,
                    created: true,
                    merged_guest,
                    consumed_guest: guest.is_some(),
                })
            }
        }
    }

    async fn write(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let document = serde_json::to_value(profile)?;
        self.remote
            .set(
                &self.config.users_collection,
                &profile.id,
                document,
                SetOptions::merge(),
            )
            .await
    }
}
