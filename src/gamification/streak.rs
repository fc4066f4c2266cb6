use chrono::{DateTime, Utc};

/// Daily play streak after a session at `now`, given the previous session time.
///
/// Same UTC day keeps the streak, the following day extends it, anything else
/// starts over at 1.
pub fn advance_streak(previous_session: DateTime<Utc>, now: DateTime<Utc>, streak: u32) -> u32 {
    let previous_day = previous_session.date_naive();
    let today = now.date_naive();

    if today == previous_day {
        streak.max(1)
    } else if previous_day.succ_opt() == Some(today) {
        streak.max(1).saturating_add(1)
    } else {
        1
    }
}
