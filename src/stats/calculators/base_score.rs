use super::super::{CalculationContext, PointsCalculator};

/// Starts the award from the raw game score
pub struct BaseScoreCalculator;

impl Default for BaseScoreCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl BaseScoreCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl PointsCalculator for BaseScoreCalculator {
    fn calculate(&self, context: &CalculationContext) -> i64 {
        context.current_points.saturating_add(context.payload.score)
    }

    fn priority(&self) -> u32 {
        crate::stats::calculator_priority::BASE_SCORE
    }
}
