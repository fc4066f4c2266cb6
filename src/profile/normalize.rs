use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet, VecDeque};
use tracing::warn;

use super::{Achievement, UserProfile};
use crate::config::ProgressConfig;
use crate::gamification::TierTable;
use crate::stats::{GameProgress, Tally, UserStats};

/// Builds a profile from a stored document, forcing its id to `id`.
///
/// Guest cache entries and remote documents both pass through here. Missing
/// or mistyped fields get defaults and implausible point totals are clamped.
/// Anything that is not a JSON object yields `None`.
pub fn normalize_profile(
    raw: &Value,
    id: &str,
    default_name: &str,
    config: &ProgressConfig,
    tiers: &TierTable,
    now: DateTime<Utc>,
) -> Option<UserProfile> {
    let object = raw.as_object()?;

    let joined_at = timestamp(object.get("joinedAt")).unwrap_or(now);
    let mut profile = UserProfile {
        id: id.to_string(),
        name: string(object.get("name")).unwrap_or_else(|| default_name.to_string()),
        email: string(object.get("email")),
        photo_url: string(object.get("photoURL")),
        joined_at,
        last_session_at: timestamp(object.get("lastSessionAt")).unwrap_or(joined_at),
        loyalty_points: 0,
        tier: String::new(),
        stats: object.get("stats").map(normalize_stats).unwrap_or_default(),
        achievements: achievements(object.get("achievements"), now),
        streak_days: u32::try_from(unsigned(object.get("streakDays")))
            .unwrap_or(u32::MAX)
            .max(1),
        recent_event_ids: event_ids(object.get("recentEventIds"), config.idempotency_window),
    };

    let mut points = unsigned(object.get("loyaltyPoints"));
    if points > config.clamp_threshold {
        warn!(
            profile_id = %id,
            stored_points = points,
            reset_to = config.clamp_reset_points,
            "Clamping implausible loyalty point total"
        );
        points = config.clamp_reset_points;
    }
    profile.set_loyalty_points(points, tiers);

    Some(profile)
}

/// Fills every missing counter and map; non-object input yields empty stats
pub fn normalize_stats(raw: &Value) -> UserStats {
    let Some(object) = raw.as_object() else {
        return UserStats::default();
    };

    let games = object
        .get("games")
        .and_then(Value::as_object)
        .map(|games| {
            games
                .iter()
                .map(|(game_id, entry)| (game_id.clone(), normalize_game(game_id, entry)))
                .collect()
        })
        .unwrap_or_default();

    UserStats {
        total_correct: unsigned(object.get("totalCorrect")),
        total_wrong: unsigned(object.get("totalWrong")),
        total_time_seconds: unsigned(object.get("totalTimeSeconds")),
        games,
        by_region: tallies(object.get("byRegion")),
        by_country: tallies(object.get("byCountry")),
    }
}

fn normalize_game(game_id: &str, raw: &Value) -> GameProgress {
    let empty = Map::new();
    let object = raw.as_object().unwrap_or(&empty);

    GameProgress {
        game_id: string(object.get("gameId")).unwrap_or_else(|| game_id.to_string()),
        plays: unsigned(object.get("plays")),
        best_score: signed(object.get("bestScore")),
        last_score: signed(object.get("lastScore")),
        last_played_at: timestamp(object.get("lastPlayedAt")),
        total_correct: unsigned(object.get("totalCorrect")),
        total_wrong: unsigned(object.get("totalWrong")),
        total_time_seconds: unsigned(object.get("totalTimeSeconds")),
    }
}

fn tallies(raw: Option<&Value>) -> BTreeMap<String, Tally> {
    raw.and_then(Value::as_object)
        .map(|entries| {
            entries
                .iter()
                .map(|(key, entry)| {
                    let tally = Tally {
                        correct: unsigned(entry.get("correct")),
                        wrong: unsigned(entry.get("wrong")),
                    };
                    (key.clone(), tally)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn achievements(raw: Option<&Value>, now: DateTime<Utc>) -> Vec<Achievement> {
    let Some(items) = raw.and_then(Value::as_array) else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    items
        .iter()
        .filter_map(|item| {
            let id = string(item.get("id"))?;
            Some(Achievement {
                title: string(item.get("title")).unwrap_or_else(|| id.clone()),
                description: string(item.get("description")).unwrap_or_default(),
                earned_at: timestamp(item.get("earnedAt")).unwrap_or(now),
                icon: string(item.get("icon")).unwrap_or_else(|| "🏅".to_string()),
                id,
            })
        })
        .filter(|achievement| seen.insert(achievement.id.clone()))
        .collect()
}

fn event_ids(raw: Option<&Value>, window: usize) -> VecDeque<String> {
    let mut ids: VecDeque<String> = raw
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(|item| string(Some(item))).collect())
        .unwrap_or_default();
    while ids.len() > window {
        ids.pop_front();
    }
    ids
}

fn number(raw: Option<&Value>) -> Option<f64> {
    let parsed = match raw? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|n| n.is_finite())
}

/// Non-negative whole number, 0 when absent or unparseable
fn unsigned(raw: Option<&Value>) -> u64 {
    match raw {
        Some(Value::Number(n)) if n.is_u64() => n.as_u64().unwrap_or(0),
        other => number(other).map(|n| n.max(0.0) as u64).unwrap_or(0),
    }
}

fn signed(raw: Option<&Value>) -> i64 {
    match raw {
        Some(Value::Number(n)) if n.is_i64() => n.as_i64().unwrap_or(0),
        other => number(other).map(|n| n as i64).unwrap_or(0),
    }
}

fn string(raw: Option<&Value>) -> Option<String> {
    match raw? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// RFC 3339 strings or epoch milliseconds
fn timestamp(raw: Option<&Value>) -> Option<DateTime<Utc>> {
    match raw? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
