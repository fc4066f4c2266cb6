use chrono::Utc;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};

use super::reconcile::{ReconcileOutcome, Reconciler};
use super::writer::RemoteWriter;
use super::{SyncPhase, SyncStatus};
use crate::config::ProgressConfig;
use crate::gamification::{AchievementRules, RegionLookup, StaticRegionLookup, TierProgress, TierTable};
use crate::identity::{DisplayNameGenerator, Identity, PetNameDisplayNameGenerator};
use crate::profile::UserProfile;
use crate::stats::{GameResultPayload, Insights, ProgressEngine, RecordOutcome, UserStats};
use crate::storage::{GuestStore, LocalCache, RemoteDocumentStore, StoreError};

struct ControllerState {
    phase: SyncPhase,
    profile: UserProfile,
    identity: Option<Identity>,
    /// Bumped on every identity transition; stale reconcile results are dropped
    generation: u64,
    /// Bumped whenever the local guest record is written or removed
    guest_revision: u64,
}

type SharedState = Arc<Mutex<ControllerState>>;

fn lock(state: &Mutex<ControllerState>) -> MutexGuard<'_, ControllerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// The pieces a reconcile result needs once it lands, possibly after the
/// caller has been released by the failsafe
#[derive(Clone)]
struct SyncHandles {
    state: SharedState,
    guest: GuestStore,
    writer: Arc<RemoteWriter>,
    config: ProgressConfig,
    tiers: Arc<TierTable>,
}

/// Owns the in-memory profile and drives it through the identity lifecycle.
///
/// Mutations are applied synchronously under the state lock. Guest profiles
/// are written to the local cache inside the same critical section; remote
/// writes are handed to the [`RemoteWriter`] and never awaited.
pub struct ProgressController {
    engine: Arc<ProgressEngine>,
    reconciler: Arc<Reconciler>,
    sync: SyncHandles,
}

impl ProgressController {
    pub fn builder(
        remote: Arc<dyn RemoteDocumentStore>,
        local: Arc<dyn LocalCache>,
    ) -> ProgressControllerBuilder {
        ProgressControllerBuilder::new(remote, local)
    }

    pub fn profile(&self) -> UserProfile {
        lock(&self.sync.state).profile.clone()
    }

    pub fn phase(&self) -> SyncPhase {
        lock(&self.sync.state).phase
    }

    pub fn identity(&self) -> Option<Identity> {
        lock(&self.sync.state).identity.clone()
    }

    pub fn status(&self) -> SyncStatus {
        let state = lock(&self.sync.state);
        SyncStatus {
            phase: state.phase,
            identity_id: state.identity.as_ref().map(|i| i.id.clone()),
        }
    }

    pub fn tier_progress(&self) -> TierProgress {
        let points = lock(&self.sync.state).profile.loyalty_points;
        self.engine.tiers().progress_for(points)
    }

    pub fn insights(&self) -> Insights {
        Insights::from_stats(&lock(&self.sync.state).profile.stats)
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.sync.config
    }

    /// Reacts to the identity provider resolving (or losing) an identity.
    ///
    /// Returns once the profile is resolved or the failsafe timeout elapses,
    /// whichever comes first. Reconciliation that outlives the timeout keeps
    /// running and is applied when it finishes, unless a newer transition
    /// happened in the meantime.
    #[instrument(skip(self, identity), fields(identity_id = identity.as_ref().map(|i| i.id.as_str()).unwrap_or("none")))]
    pub async fn on_identity_changed(&self, identity: Option<Identity>, initializing: bool) -> SyncStatus {
        if initializing {
            debug!("Identity provider still initializing, keeping current state");
            return self.status();
        }

        match identity {
            None => self.enter_guest(),
            Some(identity) => self.sign_in(identity).await,
        }
        self.status()
    }

    fn enter_guest(&self) {
        let now = Utc::now();
        let profile = self.sync.guest.load(now);

        let mut state = lock(&self.sync.state);
        state.generation += 1;
        state.identity = None;
        state.profile = profile;
        state.phase = SyncPhase::GuestActive;
        info!(phase = %state.phase, "Using local guest profile");
    }

    async fn sign_in(&self, identity: Identity) {
        let (ticket, snapshot) = {
            let mut state = lock(&self.sync.state);
            let same_identity = state.identity.as_ref().is_some_and(|i| i.id == identity.id);
            if same_identity && state.phase != SyncPhase::GuestActive {
                debug!(phase = %state.phase, "Identity unchanged, skipping reconcile");
                return;
            }

            state.generation += 1;
            state.identity = Some(identity.clone());
            state.phase = SyncPhase::Syncing;
            info!(phase = %state.phase, "Reconciling profile for signed-in identity");

            let ticket = SyncTicket {
                generation: state.generation,
                guest_revision: state.guest_revision,
            };
            (ticket, self.sync.guest.pending_record(Utc::now()))
        };

        let reconciler = self.reconciler.clone();
        let mut handle: JoinHandle<Result<ReconcileOutcome, StoreError>> =
            tokio::spawn(async move { reconciler.run(&identity, snapshot, Utc::now()).await });

        match tokio::time::timeout(self.sync.config.failsafe_timeout, &mut handle).await {
            Ok(joined) => self.sync.finish_reconcile(ticket, flatten(joined)),
            Err(_) => {
                warn!(
                    timeout_ms = self.sync.config.failsafe_timeout.as_millis() as u64,
                    "Profile sync exceeded failsafe timeout, continuing in background"
                );
                self.sync.release_syncing(ticket.generation);

                let sync = self.sync.clone();
                tokio::spawn(async move {
                    let joined = handle.await;
                    sync.finish_reconcile(ticket, flatten(joined));
                });
            }
        }
    }

    /// Applies one game result and schedules its persistence
    #[instrument(skip(self, payload), fields(game_id = %payload.game_id))]
    pub fn record_game_result(&self, payload: &GameResultPayload) -> RecordOutcome {
        let mut state = lock(&self.sync.state);
        let outcome = self.engine.record(&state.profile, payload, Utc::now());
        if outcome.duplicate {
            return outcome;
        }

        state.profile = outcome.profile.clone();
        self.sync.persist(&mut state);
        outcome
    }

    /// Replaces the stats wholesale, e.g. for a bulk import
    #[instrument(skip(self, stats))]
    pub fn update_stats(&self, stats: UserStats) -> UserProfile {
        let mut state = lock(&self.sync.state);
        let (profile, unlocked) = self.engine.replace_stats(&state.profile, stats, Utc::now());
        debug!(unlocked = unlocked.len(), "Stats replaced");

        state.profile = profile;
        self.sync.persist(&mut state);
        state.profile.clone()
    }

    #[instrument(skip(self))]
    pub fn update_display_name(&self, name: &str) -> UserProfile {
        let mut state = lock(&self.sync.state);
        state.profile.name = name.trim().to_string();

        if state.profile.is_guest() {
            self.sync.persist_guest(&mut state);
        } else if state.phase == SyncPhase::AuthenticatedActive {
            let mut fields = Map::new();
            fields.insert("name".to_string(), Value::String(state.profile.name.clone()));
            self.sync.writer.patch(&state.profile.id, fields);
        }
        state.profile.clone()
    }
}

/// Where a sign-in stood when its reconcile task was spawned
#[derive(Debug, Clone, Copy)]
struct SyncTicket {
    generation: u64,
    guest_revision: u64,
}

impl SyncHandles {
    fn persist(&self, state: &mut ControllerState) {
        if state.profile.is_guest() {
            self.persist_guest(state);
        } else if state.phase == SyncPhase::AuthenticatedActive {
            self.writer.save_profile(&state.profile);
        } else {
            debug!(phase = %state.phase, "Profile not yet resolved, skipping remote write");
        }
    }

    fn persist_guest(&self, state: &mut ControllerState) {
        match self.guest.persist(&state.profile) {
            Ok(()) => state.guest_revision += 1,
            Err(e) => warn!(error = %e, "Failed to persist guest profile locally"),
        }
    }

    fn discard_guest_record(&self, state: &mut ControllerState) {
        match self.guest.clear() {
            Ok(()) => state.guest_revision += 1,
            Err(e) => warn!(error = %e, "Failed to delete local guest record after sync"),
        }
    }

    /// Leaves `Syncing` without a resolved remote profile
    fn release_syncing(&self, generation: u64) {
        let mut state = lock(&self.state);
        if state.generation == generation && state.phase == SyncPhase::Syncing {
            state.phase = SyncPhase::GuestActive;
        }
    }

    fn finish_reconcile(&self, ticket: SyncTicket, result: Result<ReconcileOutcome, StoreError>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(error = %e, "Profile sync failed, keeping guest profile");
                self.release_syncing(ticket.generation);
                return;
            }
        };

        let mut state = lock(&self.state);
        let guest_changed = state.guest_revision != ticket.guest_revision;

        if state.generation != ticket.generation {
            debug!(
                generation = ticket.generation,
                current = state.generation,
                "Discarding reconcile result for superseded identity"
            );
            // The merged snapshot already lives remotely; it must not be merged twice
            if outcome.consumed_guest && !guest_changed {
                self.discard_guest_record(&mut state);
                if state.profile.is_guest() {
                    state.profile = UserProfile::guest(&self.tiers, Utc::now());
                }
            }
            return;
        }

        let refold = guest_changed && state.profile.is_guest();
        let consumed_guest = outcome.consumed_guest || refold;
        let profile = if refold {
            let refolded = outcome.refold(&state.profile, &self.config, &self.tiers);
            info!(
                guest_points = state.profile.loyalty_points,
                loyalty_points = refolded.loyalty_points,
                "Guest kept playing during sync, merged latest guest progress"
            );
            self.writer.save_profile(&refolded);
            refolded
        } else {
            outcome.profile
        };

        if consumed_guest {
            self.discard_guest_record(&mut state);
        }

        state.profile = profile;
        state.phase = SyncPhase::AuthenticatedActive;
        info!(
            phase = %state.phase,
            created = outcome.created,
            merged_guest = outcome.merged_guest,
            loyalty_points = state.profile.loyalty_points,
            "Profile sync complete"
        );
    }
}

fn flatten(
    joined: Result<Result<ReconcileOutcome, StoreError>, tokio::task::JoinError>,
) -> Result<ReconcileOutcome, StoreError> {
    joined.unwrap_or_else(|e| Err(StoreError::Remote(format!("Reconcile task failed: {e}"))))
}

pub struct ProgressControllerBuilder {
    remote: Arc<dyn RemoteDocumentStore>,
    local: Arc<dyn LocalCache>,
    regions: Arc<dyn RegionLookup>,
    names: Arc<dyn DisplayNameGenerator>,
    rules: AchievementRules,
    tiers: TierTable,
    config: ProgressConfig,
}

impl ProgressControllerBuilder {
    fn new(remote: Arc<dyn RemoteDocumentStore>, local: Arc<dyn LocalCache>) -> Self {
        Self {
            remote,
            local,
            regions: Arc::new(StaticRegionLookup::default()),
            names: Arc::new(PetNameDisplayNameGenerator::new()),
            rules: AchievementRules::default(),
            tiers: TierTable::default(),
            config: ProgressConfig::default(),
        }
    }

    pub fn with_region_lookup(mut self, regions: Arc<dyn RegionLookup>) -> Self {
        self.regions = regions;
        self
    }

    pub fn with_name_generator(mut self, names: Arc<dyn DisplayNameGenerator>) -> Self {
        self.names = names;
        self
    }

    pub fn with_rules(mut self, rules: AchievementRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_tiers(mut self, tiers: TierTable) -> Self {
        self.tiers = tiers;
        self
    }

    pub fn with_config(mut self, config: ProgressConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the controller in `GuestActive` with the cached guest profile loaded
    pub fn build(self) -> ProgressController {
        let engine = Arc::new(
            ProgressEngine::builder(self.regions)
                .with_rules(self.rules)
                .with_tiers(self.tiers)
                .with_config(self.config.clone())
                .build(),
        );
        let tiers = engine.tiers().clone();

        let guest = GuestStore::new(self.local, self.config.clone(), tiers.clone());
        let reconciler = Arc::new(Reconciler::new(
            self.remote.clone(),
            self.names,
            self.config.clone(),
            tiers.clone(),
        ));
        let writer = Arc::new(RemoteWriter::new(
            self.remote,
            self.config.users_collection.clone(),
            self.config.write_discipline,
        ));

        let profile = guest.load(Utc::now());
        debug!(loyalty_points = profile.loyalty_points, "Controller started with guest profile");

        let state = Arc::new(Mutex::new(ControllerState {
            phase: SyncPhase::GuestActive,
            profile,
            identity: None,
            generation: 0,
            guest_revision: 0,
        }));

        ProgressController {
            engine,
            reconciler,
            sync: SyncHandles {
                state,
                guest,
                writer,
                config: self.config,
                tiers,
            },
        }
    }
}
