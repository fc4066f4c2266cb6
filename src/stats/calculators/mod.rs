mod accuracy_bonus;
mod base_score;
mod correct_answers;
mod event_cap;

pub use accuracy_bonus::AccuracyBonusCalculator;
pub use base_score::BaseScoreCalculator;
pub use correct_answers::CorrectAnswerBonusCalculator;
pub use event_cap::EventCapCalculator;
