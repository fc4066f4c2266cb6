mod regional;
mod rules;

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

use crate::profile::{Achievement, UserProfile};
use crate::stats::{GameResultPayload, UserStats};

pub use regional::{slugify, RegionCatalog, RegionalMasteryRule, RegionTitle};
pub use rules::{FirstGameRule, ScoreThresholdRule};

/// What a rule hands back when its condition holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AchievementGrant {
    pub id: String,
    pub title: String,
    pub description: String,
    pub icon: String,
}

impl AchievementGrant {
    pub fn new(id: &str, title: &str, description: &str, icon: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
        }
    }

    fn earned_at(self, now: DateTime<Utc>) -> Achievement {
        Achievement {
            id: self.id,
            title: self.title,
            description: self.description,
            earned_at: now,
            icon: self.icon,
        }
    }
}

pub struct EvaluationContext<'a> {
    pub stats: &'a UserStats,
    /// The result that triggered this evaluation, absent for bulk stat imports
    pub payload: Option<&'a GameResultPayload>,
}

pub trait AchievementRule: Send + Sync {
    fn evaluate(&self, context: &EvaluationContext) -> Vec<AchievementGrant>;

    fn rule_name(&self) -> &'static str;
}

/// Immutable set of achievement rules injected into the engine.
///
/// Rules may keep reporting a grant on every evaluation; the profile only
/// records each id once.
#[derive(Clone)]
pub struct AchievementRules {
    rules: Vec<Arc<dyn AchievementRule>>,
}

impl AchievementRules {
    pub fn builder() -> AchievementRulesBuilder {
        AchievementRulesBuilder { rules: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Appends every newly earned achievement to `profile` and returns them.
    /// Existing achievements are never touched.
    pub fn evaluate(
        &self,
        profile: &mut UserProfile,
        payload: Option<&GameResultPayload>,
        now: DateTime<Utc>,
    ) -> Vec<Achievement> {
        let context = EvaluationContext {
            stats: &profile.stats,
            payload,
        };

        let grants: Vec<AchievementGrant> = self
            .rules
            .iter()
            .flat_map(|rule| rule.evaluate(&context))
            .collect();

        let mut unlocked = Vec::new();
        for grant in grants {
            if profile.has_achievement(&grant.id) {
                continue;
            }
            debug!(profile_id = %profile.id, achievement = %grant.id, "Achievement unlocked");
            let achievement = grant.earned_at(now);
            profile.achievements.push(achievement.clone());
            unlocked.push(achievement);
        }

        unlocked
    }
}

impl Default for AchievementRules {
    fn default() -> Self {
        Self::builder()
            .with_rule(Arc::new(FirstGameRule))
            .with_rule(Arc::new(ScoreThresholdRule::new(
                "capital-quiz",
                500,
                AchievementGrant::new(
                    "capital-quiz-500",
                    "Capital Connoisseur",
                    "Scored 500 or more in Capital Quiz",
                    "🏛️",
                ),
            )))
            .with_rule(Arc::new(ScoreThresholdRule::new(
                "map-dash",
                800,
                AchievementGrant::new(
                    "map-dash-800",
                    "Map Sprinter",
                    "Scored 800 or more in Map Dash",
                    "🗺️",
                ),
            )))
            .with_rule(Arc::new(ScoreThresholdRule::new(
                "flag-frenzy",
                400,
                AchievementGrant::new(
                    "flag-frenzy-400",
                    "Flag Fanatic",
                    "Scored 400 or more in Flag Frenzy",
                    "🚩",
                ),
            )))
            .with_rule(Arc::new(RegionalMasteryRule::default()))
            .build()
    }
}

pub struct AchievementRulesBuilder {
    rules: Vec<Arc<dyn AchievementRule>>,
}

impl AchievementRulesBuilder {
    pub fn with_rule(mut self, rule: Arc<dyn AchievementRule>) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn build(self) -> AchievementRules {
        AchievementRules { rules: self.rules }
    }
}
