use super::super::{CalculationContext, PointsCalculator};

/// Up to 50 points for answer accuracy, or a flat 10 when nothing was answered
pub struct AccuracyBonusCalculator {
    max_bonus: f64,
    participation_bonus: i64,
}

impl Default for AccuracyBonusCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl AccuracyBonusCalculator {
    pub fn new() -> Self {
        Self {
            max_bonus: 50.0,
            participation_bonus: 10,
        }
    }
}

impl PointsCalculator for AccuracyBonusCalculator {
    fn calculate(&self, context: &CalculationContext) -> i64 {
        let attempts = context.payload.attempts();
        let bonus = if attempts > 0 {
            let correct = context.payload.correct_countries.len() as f64;
            (self.max_bonus * correct / attempts as f64).round() as i64
        } else {
            self.participation_bonus
        };

        context.current_points.saturating_add(bonus)
    }

    fn priority(&self) -> u32 {
        crate::stats::calculator_priority::BONUS
    }
}
