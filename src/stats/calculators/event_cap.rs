use super::super::{CalculationContext, PointsCalculator};

/// Bounds what a single result can be worth, never below zero
pub struct EventCapCalculator {
    max_points: i64,
}

impl EventCapCalculator {
    pub fn new(max_points: u64) -> Self {
        Self {
            max_points: i64::try_from(max_points).unwrap_or(i64::MAX),
        }
    }
}

impl PointsCalculator for EventCapCalculator {
    fn calculate(&self, context: &CalculationContext) -> i64 {
        context.current_points.clamp(0, self.max_points)
    }

    fn priority(&self) -> u32 {
        crate::stats::calculator_priority::CAP
    }
}
