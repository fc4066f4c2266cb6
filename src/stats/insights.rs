use serde::{Deserialize, Serialize};

use super::{Tally, UserStats};

const COUNTRY_MIN_ATTEMPTS: u64 = 2;
const COUNTRY_LIMIT: usize = 6;
const REGION_MIN_ATTEMPTS: u64 = 3;
const REGION_LIMIT: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryScore {
    pub country_id: String,
    pub correct: u64,
    pub wrong: u64,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionScore {
    pub region: String,
    pub correct: u64,
    pub wrong: u64,
    pub attempts: u64,
    pub score: f64,
}

/// Strengths and weaknesses derived from the current stats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insights {
    pub country_strengths: Vec<CountryScore>,
    pub country_weaknesses: Vec<CountryScore>,
    pub region_strengths: Vec<RegionScore>,
    pub region_weaknesses: Vec<RegionScore>,
}

impl Insights {
    pub fn from_stats(stats: &UserStats) -> Self {
        let (country_strengths, country_weaknesses) = country_insights(stats);
        let (region_strengths, region_weaknesses) = region_insights(stats);

        Self {
            country_strengths,
            country_weaknesses,
            region_strengths,
            region_weaknesses,
        }
    }
}

/// Best and worst countries with at least two attempts, six of each
pub fn country_insights(stats: &UserStats) -> (Vec<CountryScore>, Vec<CountryScore>) {
    let scored: Vec<CountryScore> = qualifying(stats.by_country.iter(), COUNTRY_MIN_ATTEMPTS)
        .map(|(country_id, tally)| CountryScore {
            country_id: country_id.clone(),
            correct: tally.correct,
            wrong: tally.wrong,
            score: tally.accuracy(),
        })
        .collect();

    rank(scored, COUNTRY_LIMIT, |entry| entry.score)
}

/// Best and worst regions with at least three attempts, five of each
pub fn region_insights(stats: &UserStats) -> (Vec<RegionScore>, Vec<RegionScore>) {
    let scored: Vec<RegionScore> = qualifying(stats.by_region.iter(), REGION_MIN_ATTEMPTS)
        .map(|(region, tally)| RegionScore {
            region: region.clone(),
            correct: tally.correct,
            wrong: tally.wrong,
            attempts: tally.attempts(),
            score: tally.accuracy(),
        })
        .collect();

    rank(scored, REGION_LIMIT, |entry| entry.score)
}

fn qualifying<'a>(
    entries: impl Iterator<Item = (&'a String, &'a Tally)>,
    min_attempts: u64,
) -> impl Iterator<Item = (&'a String, &'a Tally)> {
    entries.filter(move |(_, tally)| tally.attempts() >= min_attempts)
}

fn rank<T: Clone>(entries: Vec<T>, limit: usize, score: impl Fn(&T) -> f64) -> (Vec<T>, Vec<T>) {
    let mut strongest = entries.clone();
    strongest.sort_by(|a, b| score(b).total_cmp(&score(a)));
    strongest.truncate(limit);

    let mut weakest = entries;
    weakest.sort_by(|a, b| score(a).total_cmp(&score(b)));
    weakest.truncate(limit);

    (strongest, weakest)
}
