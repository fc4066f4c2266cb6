use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tier {
    pub name: String,
    pub min_points: u64,
    pub icon: String,
}

impl Tier {
    pub fn new(name: &str, min_points: u64, icon: &str) -> Self {
        Self {
            name: name.to_string(),
            min_points,
            icon: icon.to_string(),
        }
    }
}

/// Where a point total sits inside the tier ladder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierProgress {
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tier: Option<Tier>,
    /// Percentage of the way to `next_tier`, 0..=100
    pub progress_to_next: u8,
    pub points: u64,
}

/// Ordered loyalty ladder. The first tier always starts at zero points.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    pub fn new(mut tiers: Vec<Tier>) -> Result<Self, ConfigError> {
        tiers.sort_by_key(|tier| tier.min_points);

        match tiers.first() {
            None => {
                return Err(ConfigError::InvalidTierTable(
                    "at least one tier is required".to_string(),
                ))
            }
            Some(first) if first.min_points != 0 => {
                return Err(ConfigError::InvalidTierTable(format!(
                    "lowest tier {} must start at 0 points",
                    first.name
                )))
            }
            Some(_) => {}
        }

        if tiers
            .windows(2)
            .any(|pair| pair[0].min_points == pair[1].min_points)
        {
            return Err(ConfigError::InvalidTierTable(
                "tier thresholds must be distinct".to_string(),
            ));
        }

        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn lowest(&self) -> &Tier {
        &self.tiers[0]
    }

    pub fn highest(&self) -> &Tier {
        &self.tiers[self.tiers.len() - 1]
    }

    /// Highest tier whose threshold is at or below `points`
    pub fn tier_for(&self, points: u64) -> &Tier {
        &self.tiers[self.index_for(points)]
    }

    pub fn progress_for(&self, points: u64) -> TierProgress {
        let index = self.index_for(points);
        let tier = &self.tiers[index];

        match self.tiers.get(index + 1) {
            Some(next) => {
                let span = (next.min_points - tier.min_points) as f64;
                let earned = points.saturating_sub(tier.min_points) as f64;
                let percent = (100.0 * earned / span).round().clamp(0.0, 100.0);

                TierProgress {
                    tier: tier.clone(),
                    next_tier: Some(next.clone()),
                    progress_to_next: percent as u8,
                    points,
                }
            }
            None => TierProgress {
                tier: tier.clone(),
                next_tier: None,
                progress_to_next: 100,
                points,
            },
        }
    }

    fn index_for(&self, points: u64) -> usize {
        // tiers[0].min_points == 0, so the partition point is always >= 1
        self.tiers
            .partition_point(|tier| tier.min_points <= points)
            .saturating_sub(1)
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                Tier::new("Explorer", 0, "🧭"),
                Tier::new("Traveler", 500, "🎒"),
                Tier::new("Voyager", 1_200, "⛵"),
                Tier::new("Navigator", 2_500, "🗺️"),
                Tier::new("Pathfinder", 5_000, "🥾"),
                Tier::new("Cartographer", 10_000, "📜"),
                Tier::new("Globetrotter", 20_000, "✈️"),
                Tier::new("Ambassador", 40_000, "🎖️"),
                Tier::new("Legend", 75_000, "🏆"),
                Tier::new("Grandmaster", 150_000, "👑"),
            ],
        }
    }
}
