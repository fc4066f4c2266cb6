use super::super::{CalculationContext, PointsCalculator};

pub struct CorrectAnswerBonusCalculator {
    points_per_answer: i64,
}

impl Default for CorrectAnswerBonusCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl CorrectAnswerBonusCalculator {
    pub fn new() -> Self {
        Self {
            points_per_answer: 5,
        }
    }
}

impl PointsCalculator for CorrectAnswerBonusCalculator {
    fn calculate(&self, context: &CalculationContext) -> i64 {
        let correct = context.payload.correct_countries.len() as i64;
        context
            .current_points
            .saturating_add(self.points_per_answer.saturating_mul(correct))
    }

    fn priority(&self) -> u32 {
        crate::stats::calculator_priority::BONUS
    }
}
