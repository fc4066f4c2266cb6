use std::collections::HashMap;

use super::{AchievementGrant, AchievementRule, EvaluationContext};

const FALLBACK_ICON: &str = "🌍";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegionTitle {
    pub region: String,
    pub title: String,
    pub icon: String,
}

impl RegionTitle {
    pub fn new(region: &str, title: &str, icon: &str) -> Self {
        Self {
            region: region.to_string(),
            title: title.to_string(),
            icon: icon.to_string(),
        }
    }
}

/// Titles and icons for region mastery badges.
///
/// Lookup is exact (case-insensitive) first. Then a catalog name contained in
/// the region wins, longest first, and after that the shortest catalog name
/// that contains the region. Anything else gets a generic `"<Region> Expert"`
/// title with a globe icon.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    by_name: HashMap<String, usize>,
    lowered: Vec<String>,
    scan_order: Vec<usize>,
    entries: Vec<RegionTitle>,
}

impl RegionCatalog {
    pub fn new(entries: Vec<RegionTitle>) -> Self {
        let lowered: Vec<String> = entries
            .iter()
            .map(|entry| entry.region.to_lowercase())
            .collect();
        let by_name = lowered
            .iter()
            .enumerate()
            .map(|(index, name)| (name.clone(), index))
            .collect();

        let mut scan_order: Vec<usize> = (0..entries.len()).collect();
        scan_order.sort_by(|&a, &b| {
            entries[b]
                .region
                .len()
                .cmp(&entries[a].region.len())
                .then_with(|| entries[a].region.cmp(&entries[b].region))
        });

        Self {
            by_name,
            lowered,
            scan_order,
            entries,
        }
    }

    pub fn resolve(&self, region: &str) -> RegionTitle {
        let needle = region.trim().to_lowercase();

        if let Some(&index) = self.by_name.get(&needle) {
            return self.titled(region, index);
        }

        if !needle.is_empty() {
            let contained = self
                .scan_order
                .iter()
                .copied()
                .find(|&index| needle.contains(self.lowered[index].as_str()));
            let containing = || {
                self.scan_order
                    .iter()
                    .rev()
                    .copied()
                    .find(|&index| self.lowered[index].contains(needle.as_str()))
            };
            if let Some(index) = contained.or_else(containing) {
                return self.titled(region, index);
            }
        }

        RegionTitle {
            region: region.to_string(),
            title: format!("{region} Expert"),
            icon: FALLBACK_ICON.to_string(),
        }
    }

    fn titled(&self, region: &str, index: usize) -> RegionTitle {
        let entry = &self.entries[index];
        RegionTitle {
            region: region.to_string(),
            title: entry.title.clone(),
            icon: entry.icon.clone(),
        }
    }
}

impl Default for RegionCatalog {
    fn default() -> Self {
        Self::new(vec![
            RegionTitle::new("Africa", "Africa Master", "🦁"),
            RegionTitle::new("Americas", "Americas Master", "🗽"),
            RegionTitle::new("Asia", "Asia Master", "🏯"),
            RegionTitle::new("Europe", "Europe Master", "🏰"),
            RegionTitle::new("Oceania", "Oceania Master", "🏝️"),
            RegionTitle::new("Antarctic", "Polar Pioneer", "🐧"),
            RegionTitle::new("North America", "North America Navigator", "🦅"),
            RegionTitle::new("Central America", "Isthmus Insider", "🌋"),
            RegionTitle::new("South America", "Andes Ace", "🦙"),
            RegionTitle::new("Caribbean", "Island Hopper", "🌴"),
            RegionTitle::new("Northern Africa", "Sahara Scholar", "🐪"),
            RegionTitle::new("Western Africa", "Sahel Specialist", "🥁"),
            RegionTitle::new("Eastern Africa", "Rift Valley Ranger", "🦒"),
            RegionTitle::new("Middle Africa", "Congo Connoisseur", "🦍"),
            RegionTitle::new("Southern Africa", "Cape Captain", "🐘"),
            RegionTitle::new("Western Asia", "Levant Luminary", "🕌"),
            RegionTitle::new("Central Asia", "Silk Road Sage", "🐎"),
            RegionTitle::new("Southern Asia", "Subcontinent Savant", "🐅"),
            RegionTitle::new("Eastern Asia", "Far East Expert", "🐉"),
            RegionTitle::new("South-Eastern Asia", "Archipelago Adept", "🛶"),
            RegionTitle::new("Northern Europe", "Nordic Navigator", "❄️"),
            RegionTitle::new("Western Europe", "Continental Connoisseur", "🥐"),
            RegionTitle::new("Southern Europe", "Mediterranean Maven", "🏛️"),
            RegionTitle::new("Eastern Europe", "Steppe Strategist", "🪆"),
            RegionTitle::new("Australia and New Zealand", "Down Under Dynamo", "🦘"),
            RegionTitle::new("Melanesia", "Melanesia Master", "🌺"),
            RegionTitle::new("Micronesia", "Micronesia Master", "🐚"),
            RegionTitle::new("Polynesia", "Polynesia Master", "🌊"),
        ])
    }
}

/// Lowercase, alphanumeric runs joined by single dashes
pub fn slugify(value: &str) -> String {
    value
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Unlocks `region-master-<slug>` for each region answered often and well enough
pub struct RegionalMasteryRule {
    min_attempts: u64,
    min_accuracy_percent: u64,
    catalog: RegionCatalog,
}

impl RegionalMasteryRule {
    pub fn new(min_attempts: u64, min_accuracy_percent: u64, catalog: RegionCatalog) -> Self {
        Self {
            min_attempts,
            min_accuracy_percent,
            catalog,
        }
    }
}

impl Default for RegionalMasteryRule {
    fn default() -> Self {
        Self::new(15, 70, RegionCatalog::default())
    }
}

impl AchievementRule for RegionalMasteryRule {
    fn evaluate(&self, context: &EvaluationContext) -> Vec<AchievementGrant> {
        context
            .stats
            .by_region
            .iter()
            .filter(|(_, tally)| {
                let attempts = tally.attempts();
                attempts >= self.min_attempts
                    && attempts > 0
                    && tally.correct * 100 >= self.min_accuracy_percent * attempts
            })
            .map(|(region, _)| {
                let titled = self.catalog.resolve(region);
                AchievementGrant {
                    id: format!("region-master-{}", slugify(region)),
                    title: titled.title,
                    description: format!(
                        "Reached {}% accuracy over at least {} questions in {}",
                        self.min_accuracy_percent, self.min_attempts, region
                    ),
                    icon: titled.icon,
                }
            })
            .collect()
    }

    fn rule_name(&self) -> &'static str {
        "RegionalMasteryRule"
    }
}
