use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    config::ProgressConfig,
    gamification::{advance_streak, AchievementRules, RegionLookup, TierTable},
    profile::{Achievement, UserProfile},
};

use super::{
    aggregator::apply_result,
    calculators::{
        AccuracyBonusCalculator, BaseScoreCalculator, CorrectAnswerBonusCalculator,
        EventCapCalculator,
    },
    CalculationContext, GameResultPayload, PointsCalculator, UserStats,
};

#[derive(Debug, Clone)]
pub struct RecordOutcome {
    pub profile: UserProfile,
    pub points_awarded: u64,
    pub unlocked: Vec<Achievement>,
    /// The payload carried an event id that was already applied
    pub duplicate: bool,
}

/// Turns game results into updated stats, points, tier and achievements.
///
/// Every operation works on a copy; the profile passed in is never modified.
pub struct ProgressEngine {
    calculators: Vec<Arc<dyn PointsCalculator>>,
    rules: AchievementRules,
    tiers: Arc<TierTable>,
    regions: Arc<dyn RegionLookup>,
    config: ProgressConfig,
}

impl ProgressEngine {
    pub fn builder(regions: Arc<dyn RegionLookup>) -> ProgressEngineBuilder {
        ProgressEngineBuilder::new(regions)
    }

    pub fn tiers(&self) -> &Arc<TierTable> {
        &self.tiers
    }

    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Runs the full pipeline for one result
    #[instrument(skip(self, profile, payload), fields(profile_id = %profile.id, game_id = %payload.game_id))]
    pub fn record(
        &self,
        profile: &UserProfile,
        payload: &GameResultPayload,
        now: DateTime<Utc>,
    ) -> RecordOutcome {
        if let Some(event_id) = payload.event_id.as_deref() {
            if profile.has_seen_event(event_id) {
                info!(event_id, "Ignoring already applied game result");
                return RecordOutcome {
                    profile: profile.clone(),
                    points_awarded: 0,
                    unlocked: Vec::new(),
                    duplicate: true,
                };
            }
        }

        let mut next = profile.clone();
        next.stats = apply_result(
            &profile.stats,
            payload,
            self.regions.as_ref(),
            now,
            self.config.max_duration_seconds,
        );

        let points_awarded = self.points_for(payload);
        next.set_loyalty_points(
            profile.loyalty_points.saturating_add(points_awarded),
            &self.tiers,
        );
        next.streak_days = advance_streak(profile.last_session_at, now, profile.streak_days);
        next.last_session_at = now;

        if let Some(event_id) = &payload.event_id {
            next.remember_event(event_id.clone(), self.config.idempotency_window);
        }

        let unlocked = self.rules.evaluate(&mut next, Some(payload), now);

        debug!(
            points_awarded,
            loyalty_points = next.loyalty_points,
            tier = %next.tier,
            unlocked = unlocked.len(),
            "Game result applied"
        );

        RecordOutcome {
            profile: next,
            points_awarded,
            unlocked,
            duplicate: false,
        }
    }

    /// Replaces the stats wholesale and re-checks achievements that depend on them
    #[instrument(skip(self, profile, stats), fields(profile_id = %profile.id))]
    pub fn replace_stats(
        &self,
        profile: &UserProfile,
        stats: UserStats,
        now: DateTime<Utc>,
    ) -> (UserProfile, Vec<Achievement>) {
        let mut next = profile.clone();
        next.stats = stats;
        let unlocked = self.rules.evaluate(&mut next, None, now);
        (next, unlocked)
    }

    /// Loyalty points a single result is worth, after the per-event cap
    pub fn points_for(&self, payload: &GameResultPayload) -> u64 {
        let total = self.calculators.iter().fold(0i64, |running, calculator| {
            calculator.calculate(&CalculationContext::new(payload, running))
        });
        u64::try_from(total).unwrap_or(0)
    }
}

pub struct ProgressEngineBuilder {
    calculators: Vec<Arc<dyn PointsCalculator>>,
    rules: AchievementRules,
    tiers: TierTable,
    regions: Arc<dyn RegionLookup>,
    config: ProgressConfig,
}

impl ProgressEngineBuilder {
    fn new(regions: Arc<dyn RegionLookup>) -> Self {
        Self {
            calculators: vec![
                Arc::new(BaseScoreCalculator::new()),
                Arc::new(AccuracyBonusCalculator::new()),
                Arc::new(CorrectAnswerBonusCalculator::new()),
            ],
            rules: AchievementRules::default(),
            tiers: TierTable::default(),
            regions,
            config: ProgressConfig::default(),
        }
    }

    pub fn with_calculator(mut self, calculator: Arc<dyn PointsCalculator>) -> Self {
        self.calculators.push(calculator);
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

    pub fn build(mut self) -> ProgressEngine {
        self.calculators
            .push(Arc::new(EventCapCalculator::new(self.config.max_event_points)));
        // stable sort keeps insertion order within a priority
        self.calculators.sort_by_key(|c| c.priority());

        ProgressEngine {
            calculators: self.calculators,
            rules: self.rules,
            tiers: Arc::new(self.tiers),
            regions: self.regions,
            config: self.config,
        }
    }
}
