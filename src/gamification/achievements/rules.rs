use super::{AchievementGrant, AchievementRule, EvaluationContext};

/// Unlocks once any game has been played
pub struct FirstGameRule;

impl AchievementRule for FirstGameRule {
    fn evaluate(&self, context: &EvaluationContext) -> Vec<AchievementGrant> {
        if context.stats.total_plays() >= 1 {
            vec![AchievementGrant::new(
                "first-game",
                "First Steps",
                "Completed your first game",
                "🎯",
            )]
        } else {
            Vec::new()
        }
    }

    fn rule_name(&self) -> &'static str {
        "FirstGameRule"
    }
}

/// Unlocks when a single result for `game_id` reaches `threshold`
pub struct ScoreThresholdRule {
    game_id: String,
    threshold: i64,
    grant: AchievementGrant,
}

impl ScoreThresholdRule {
    pub fn new(game_id: &str, threshold: i64, grant: AchievementGrant) -> Self {
        Self {
            game_id: game_id.to_string(),
            threshold,
            grant,
        }
    }
}

impl AchievementRule for ScoreThresholdRule {
    fn evaluate(&self, context: &EvaluationContext) -> Vec<AchievementGrant> {
        match context.payload {
            Some(payload) if payload.game_id == self.game_id && payload.score >= self.threshold => {
                vec![self.grant.clone()]
            }
            _ => Vec::new(),
        }
    }

    fn rule_name(&self) -> &'static str {
        "ScoreThresholdRule"
    }
}
