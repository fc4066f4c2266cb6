use chrono::{DateTime, Utc};

use super::{GameProgress, GameResultPayload, UserStats};
use crate::gamification::RegionLookup;

#[derive(Clone, Copy)]
enum Outcome {
    Correct,
    Wrong,
}

/// Applies one game result to a copy of `stats`.
///
/// Not idempotent: applying the same payload twice counts two plays.
pub fn apply_result(
    stats: &UserStats,
    payload: &GameResultPayload,
    regions: &dyn RegionLookup,
    now: DateTime<Utc>,
    max_duration_seconds: u64,
) -> UserStats {
    let mut next = stats.clone();
    let duration = clamp_duration(payload.duration_seconds, max_duration_seconds);

    let game = next
        .games
        .entry(payload.game_id.clone())
        .or_insert_with(|| GameProgress::new(&payload.game_id));

    game.plays += 1;
    game.last_score = payload.score;
    game.best_score = game.best_score.max(payload.score);
    game.last_played_at = Some(now);
    game.total_time_seconds += duration;
    game.total_correct += payload.correct_countries.len() as u64;
    game.total_wrong += payload.incorrect_countries.len() as u64;

    next.total_time_seconds += duration;

    for country in &payload.correct_countries {
        record_answer(&mut next, country, Outcome::Correct, regions);
    }
    for country in &payload.incorrect_countries {
        record_answer(&mut next, country, Outcome::Wrong, regions);
    }

    next
}

fn record_answer(
    stats: &mut UserStats,
    country: &str,
    outcome: Outcome,
    regions: &dyn RegionLookup,
) {
    let country_tally = stats.by_country.entry(country.to_string()).or_default();
    match outcome {
        Outcome::Correct => {
            stats.total_correct += 1;
            country_tally.correct += 1;
        }
        Outcome::Wrong => {
            stats.total_wrong += 1;
            country_tally.wrong += 1;
        }
    }

    // Unknown countries still count per country, just not per region
    if let Some(region) = regions.region_of(country) {
        let region_tally = stats.by_region.entry(region).or_default();
        match outcome {
            Outcome::Correct => region_tally.correct += 1,
            Outcome::Wrong => region_tally.wrong += 1,
        }
    }
}

fn clamp_duration(duration: Option<f64>, max_seconds: u64) -> u64 {
    match duration {
        Some(seconds) if seconds.is_finite() => seconds.clamp(0.0, max_seconds as f64).round() as u64,
        _ => 0,
    }
}
