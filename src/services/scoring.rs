//! Scoring rules
//!
//! Pure functions that turn a reported execution result into a score, an XP
//! award and a streak value. Everything that touches storage lives in
//! [`SubmissionService`](super::SubmissionService).

use chrono::{DateTime, Days, Utc};

use crate::{constants::scoring, models::ExecutionStatus};

/// Speed multiplier for an execution time relative to the challenge limit.
///
/// Finishing under half the limit earns a bonus, taking more than 90% of it
/// costs a penalty. Without a measured time or a positive limit the score is
/// left alone.
pub fn time_multiplier(execution_time_ms: Option<i64>, time_limit_ms: i64) -> f64 {
    let Some(elapsed) = execution_time_ms else {
        return 1.0;
    };
    if time_limit_ms <= 0 || elapsed < 0 {
        return 1.0;
    }

    let ratio = elapsed as f64 / time_limit_ms as f64;
    if ratio < scoring::FAST_RATIO {
        scoring::FAST_MULTIPLIER
    } else if ratio > scoring::SLOW_RATIO {
        scoring::SLOW_MULTIPLIER
    } else {
        1.0
    }
}

/// Final score in `0..=100`. Anything other than a completed run with at
/// least one test scores zero.
pub fn compute_score(
    status: ExecutionStatus,
    total_tests: i32,
    passed_tests: i32,
    execution_time_ms: Option<i64>,
    time_limit_ms: i64,
) -> i32 {
    if status != ExecutionStatus::Completed || total_tests <= 0 {
        return 0;
    }

    let passed = passed_tests.clamp(0, total_tests);
    let base = f64::from(passed) * 100.0 / f64::from(total_tests);
    let adjusted = (base * time_multiplier(execution_time_ms, time_limit_ms)).round();

    (adjusted as i32).clamp(0, scoring::MAX_SCORE)
}

/// Whether a graded submission triggers the success side effects
pub fn is_success(status: ExecutionStatus, score: i32) -> bool {
    status == ExecutionStatus::Completed && score >= scoring::SUCCESS_THRESHOLD
}

/// XP for a score, by tier
pub fn xp_for_score(score: i32) -> i64 {
    scoring::XP_TIERS
        .iter()
        .find(|(min_score, _)| score >= *min_score)
        .map(|(_, xp)| *xp)
        .unwrap_or(scoring::XP_FLOOR)
}

/// Streak after activity at `now`, compared by UTC calendar day.
///
/// Activity the day after the last active day extends the streak, activity on
/// the same day keeps it, anything else starts over at 1.
pub fn next_streak(current: i32, last_active: Option<DateTime<Utc>>, now: DateTime<Utc>) -> i32 {
    let Some(last_active) = last_active else {
        return 1;
    };

    let today = now.date_naive();
    let last_day = last_active.date_naive();

    if last_day == today {
        current
    } else if last_day.checked_add_days(Days::new(1)) == Some(today) {
        current + 1
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const HOUR_MS: i64 = 60 * 60 * 1000;

    #[test]
    fn test_fast_nine_of_ten_scores_99() {
        let limit = HOUR_MS;
        let score = compute_score(ExecutionStatus::Completed, 10, 9, Some(limit / 5), limit);

        assert_eq!(score, 99);
        assert!(is_success(ExecutionStatus::Completed, score));
        assert_eq!(xp_for_score(score), 100);
    }

    #[test]
    fn test_non_completed_status_scores_zero() {
        for status in [ExecutionStatus::Timeout, ExecutionStatus::Failed, ExecutionStatus::Pending] {
            assert_eq!(compute_score(status, 10, 10, Some(1), HOUR_MS), 0);
        }
    }

    #[test]
    fn test_zero_tests_scores_zero() {
        assert_eq!(compute_score(ExecutionStatus::Completed, 0, 0, Some(1), HOUR_MS), 0);
    }

    #[test]
    fn test_score_is_clamped() {
        // 100% with the speed bonus still caps at 100
        assert_eq!(compute_score(ExecutionStatus::Completed, 4, 4, Some(10), HOUR_MS), 100);
        // over-reported passes count as all passed
        assert_eq!(compute_score(ExecutionStatus::Completed, 4, 9, None, HOUR_MS), 100);
        assert_eq!(compute_score(ExecutionStatus::Completed, 4, -3, None, HOUR_MS), 0);
    }

    #[test]
    fn test_score_bounds_hold_for_every_ratio() {
        for total in 1..=20 {
            for passed in 0..=total {
                for elapsed in [None, Some(1), Some(HOUR_MS * 7 / 10), Some(HOUR_MS)] {
                    let score = compute_score(ExecutionStatus::Completed, total, passed, elapsed, HOUR_MS);
                    assert!((0..=100).contains(&score));
                }
            }
        }
    }

    #[test]
    fn test_time_multiplier_bands() {
        assert_eq!(time_multiplier(Some(HOUR_MS / 2 - 1), HOUR_MS), 1.10);
        assert_eq!(time_multiplier(Some(HOUR_MS / 2), HOUR_MS), 1.0);
        assert_eq!(time_multiplier(Some(HOUR_MS * 9 / 10), HOUR_MS), 1.0);
        assert_eq!(time_multiplier(Some(HOUR_MS * 9 / 10 + 1), HOUR_MS), 0.90);
        assert_eq!(time_multiplier(None, HOUR_MS), 1.0);
        assert_eq!(time_multiplier(Some(5), 0), 1.0);
    }

    #[test]
    fn test_slow_run_is_penalised() {
        let score = compute_score(ExecutionStatus::Completed, 10, 8, Some(HOUR_MS), HOUR_MS);
        assert_eq!(score, 72);
    }

    #[test]
    fn test_xp_tiers() {
        assert_eq!(xp_for_score(100), 100);
        assert_eq!(xp_for_score(90), 100);
        assert_eq!(xp_for_score(89), 75);
        assert_eq!(xp_for_score(80), 75);
        assert_eq!(xp_for_score(70), 50);
        assert_eq!(xp_for_score(60), 25);
        assert_eq!(xp_for_score(59), 10);
        assert_eq!(xp_for_score(0), 10);
    }

    #[test]
    fn test_success_threshold() {
        assert!(is_success(ExecutionStatus::Completed, 70));
        assert!(!is_success(ExecutionStatus::Completed, 69));
        assert!(!is_success(ExecutionStatus::Timeout, 100));
    }

    #[test]
    fn test_streak_transitions() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 9, 0, 0).unwrap();

        let yesterday = now - Duration::days(1);
        assert_eq!(next_streak(4, Some(yesterday), now), 5);

        let earlier_today = now - Duration::hours(8);
        assert_eq!(next_streak(4, Some(earlier_today), now), 4);

        let two_days_ago = now - Duration::days(2);
        assert_eq!(next_streak(4, Some(two_days_ago), now), 1);

        assert_eq!(next_streak(0, None, now), 1);
    }

    #[test]
    fn test_streak_uses_calendar_days() {
        // 23:50 yesterday to 00:10 today is a new day
        let last = Utc.with_ymd_and_hms(2024, 3, 9, 23, 50, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 10, 0).unwrap();
        assert_eq!(next_streak(2, Some(last), now), 3);
    }
}
