pub mod aggregator;
pub mod calculators;
pub mod insights;
pub mod models;
pub mod service;

pub use aggregator::apply_result;
pub use insights::{CountryScore, Insights, RegionScore};
pub use models::*;
pub use service::{ProgressEngine, ProgressEngineBuilder, RecordOutcome};

/// Priority constants for points calculators.
/// Lower values run first; each calculator sees the running total of the ones before it.
pub mod calculator_priority {
    /// Raw game score
    pub const BASE_SCORE: u32 = 100;
    /// Additive bonuses (accuracy, correct answers)
    pub const BONUS: u32 = 200;
    /// Per-event cap, runs last
    pub const CAP: u32 = 900;
}

/// One step in turning a game result into loyalty points
pub trait PointsCalculator: Send + Sync {
    fn calculate(&self, context: &CalculationContext) -> i64;

    fn priority(&self) -> u32;
}

pub struct CalculationContext<'a> {
    pub payload: &'a GameResultPayload,
    pub current_points: i64,
}

impl<'a> CalculationContext<'a> {
    pub fn new(payload: &'a GameResultPayload, current_points: i64) -> Self {
        Self {
            payload,
            current_points,
        }
    }
}
