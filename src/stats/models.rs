use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One finished round of a mini-game, as reported by the presentation layer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameResultPayload {
    pub game_id: String,
    pub score: i64,
    #[serde(default)]
    pub duration_seconds: Option<f64>,
    #[serde(default)]
    pub correct_countries: Vec<String>,
    #[serde(default)]
    pub incorrect_countries: Vec<String>,
    /// Client-generated key used to drop retried submissions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
}

impl GameResultPayload {
    pub fn new(game_id: &str, score: i64) -> Self {
        Self {
            game_id: game_id.to_string(),
            score,
            ..Self::default()
        }
    }

    pub fn with_answers<C, W>(mut self, correct: C, wrong: W) -> Self
    where
        C: IntoIterator,
        C::Item: Into<String>,
        W: IntoIterator,
        W::Item: Into<String>,
    {
        self.correct_countries = correct.into_iter().map(Into::into).collect();
        self.incorrect_countries = wrong.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration_seconds = Some(seconds);
        self
    }

    pub fn with_event_id(mut self, event_id: &str) -> Self {
        self.event_id = Some(event_id.to_string());
        self
    }

    pub fn attempts(&self) -> usize {
        self.correct_countries.len() + self.incorrect_countries.len()
    }
}

/// Correct/wrong counters for a country or a region
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub correct: u64,
    pub wrong: u64,
}

impl Tally {
    pub fn attempts(&self) -> u64 {
        self.correct + self.wrong
    }

    /// Share of correct answers, 0.0 when nothing was attempted
    pub fn accuracy(&self) -> f64 {
        match self.attempts() {
            0 => 0.0,
            attempts => self.correct as f64 / attempts as f64,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProgress {
    pub game_id: String,
    pub plays: u64,
    pub best_score: i64,
    pub last_score: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_played_at: Option<DateTime<Utc>>,
    pub total_correct: u64,
    pub total_wrong: u64,
    pub total_time_seconds: u64,
}

impl GameProgress {
    pub fn new(game_id: &str) -> Self {
        Self {
            game_id: game_id.to_string(),
            ..Self::default()
        }
    }
}

/// Aggregate counters owned by a profile.
///
/// `total_correct`, `total_wrong` and `total_time_seconds` equal the sums over
/// `games` for any sequence of applied results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_correct: u64,
    pub total_wrong: u64,
    pub total_time_seconds: u64,
    #[serde(default)]
    pub games: BTreeMap<String, GameProgress>,
    #[serde(default)]
    pub by_region: BTreeMap<String, Tally>,
    #[serde(default)]
    pub by_country: BTreeMap<String, Tally>,
}

impl UserStats {
    pub fn total_plays(&self) -> u64 {
        self.games.values().map(|game| game.plays).sum()
    }

    pub fn total_attempts(&self) -> u64 {
        self.total_correct + self.total_wrong
    }
}
