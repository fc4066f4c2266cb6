pub mod achievements;
pub mod regions;
pub mod streak;
pub mod tiers;

pub use achievements::{
    AchievementGrant, AchievementRule, AchievementRules, EvaluationContext, RegionCatalog,
};
pub use regions::{RegionLookup, StaticRegionLookup};
pub use streak::advance_streak;
pub use tiers::{Tier, TierProgress, TierTable};
