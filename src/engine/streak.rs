use chrono::{Days, NaiveDate};

use super::dates::{days_between, normalize};
use crate::models::{Consistency, Streak};

pub const DEFAULT_CONSISTENCY_DAYS: u32 = 30;
pub const DEFAULT_ACTIVE_DAYS: u32 = 7;

/// Current and best streak for one habit's completion dates.
///
/// The current streak must start today or yesterday; anything older leaves it
/// at zero. A gap further back only ends the count. `best` is the longest run
/// of consecutive days anywhere in the history and never drops below `current`.
pub fn calculate_streak(dates: &[NaiveDate], today: NaiveDate) -> Streak {
    let sorted = normalize(dates);
    if sorted.is_empty() {
        return Streak::default();
    }

    let current = current_streak(&sorted, today);
    let best = best_streak(&sorted).max(current);

    Streak { current, best }
}

/// `sorted` is deduplicated and most recent first.
fn current_streak(sorted: &[NaiveDate], today: NaiveDate) -> u32 {
    let mut walk = sorted.iter().copied().skip_while(|d| *d > today);

    let Some(first) = walk.next() else {
        return 0;
    };
    if days_between(today, first) > 1 {
        return 0;
    }

    let mut count = 1u32;
    let mut expected = first.pred_opt();
    for date in walk {
        if Some(date) != expected {
            break;
        }
        count += 1;
        expected = date.pred_opt();
    }
    count
}

/// `sorted` is deduplicated and most recent first.
fn best_streak(sorted: &[NaiveDate]) -> u32 {
    let Some(&first) = sorted.first() else {
        return 0;
    };

    let mut best = 0u32;
    let mut run = 1u32;
    let mut prev = first;

    for &date in &sorted[1..] {
        if days_between(prev, date) == 1 {
            run += 1;
        } else {
            best = best.max(run);
            run = 1;
        }
        prev = date;
    }
    best.max(run)
}

/// Share of the window `[today - days, today]` that has a completion.
///
/// `total_days` is always the requested window, however young the habit is.
pub fn calculate_consistency(dates: &[NaiveDate], today: NaiveDate, days: u32) -> Consistency {
    let start = window_start(today, days);
    let completed_days = normalize(dates)
        .into_iter()
        .filter(|d| *d >= start && *d <= today)
        .count() as u32;

    let consistency = if days == 0 {
        0.0
    } else {
        round2(completed_days as f64 / days as f64 * 100.0)
    };

    Consistency {
        total_days: days,
        completed_days,
        consistency,
    }
}

/// A habit is active with at least one completion in the last `window` days, today included.
pub fn is_active(dates: &[NaiveDate], today: NaiveDate, window: u32) -> bool {
    let start = window_start(today, window);
    dates.iter().any(|d| *d >= start)
}

fn window_start(today: NaiveDate, days: u32) -> NaiveDate {
    today
        .checked_sub_days(Days::new(days as u64))
        .unwrap_or(NaiveDate::MIN)
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn ago(n: u64) -> NaiveDate {
        today() - Days::new(n)
    }

    fn streak_of(offsets: &[u64]) -> Streak {
        let dates: Vec<_> = offsets.iter().map(|n| ago(*n)).collect();
        calculate_streak(&dates, today())
    }

    #[test]
    fn empty_history_has_no_streak() {
        assert_eq!(calculate_streak(&[], today()), Streak { current: 0, best: 0 });
    }

    #[test]
    fn single_completion_today() {
        assert_eq!(streak_of(&[0]), Streak { current: 1, best: 1 });
    }

    #[test]
    fn single_completion_yesterday_still_counts() {
        assert_eq!(streak_of(&[1]), Streak { current: 1, best: 1 });
    }

    #[test]
    fn single_old_completion_zeroes_current() {
        assert_eq!(streak_of(&[2]), Streak { current: 0, best: 1 });
        assert_eq!(streak_of(&[5]), Streak { current: 0, best: 1 });
    }

    #[test]
    fn three_days_running() {
        assert_eq!(streak_of(&[0, 1, 2]), Streak { current: 3, best: 3 });
    }

    #[test]
    fn run_ending_yesterday_counts_as_current() {
        assert_eq!(streak_of(&[1, 2, 3, 4]), Streak { current: 4, best: 4 });
    }

    #[test]
    fn older_run_is_the_best_one() {
        assert_eq!(streak_of(&[0, 1, 5, 6, 7]), Streak { current: 2, best: 3 });
    }

    #[test]
    fn mid_walk_gap_truncates_without_zeroing() {
        assert_eq!(streak_of(&[0, 2, 3, 4]), Streak { current: 1, best: 3 });
    }

    #[test]
    fn duplicate_day_is_one_day() {
        assert_eq!(streak_of(&[3, 3]), Streak { current: 0, best: 1 });
        assert_eq!(streak_of(&[0, 0, 1, 1]), Streak { current: 2, best: 2 });
    }

    #[test]
    fn unsorted_input_is_fine() {
        assert_eq!(streak_of(&[2, 0, 7, 1, 6]), Streak { current: 3, best: 3 });
    }

    #[test]
    fn future_dates_do_not_break_current_streak() {
        let dates = [today() + Days::new(1), today(), ago(1)];
        let streak = calculate_streak(&dates, today());
        assert_eq!(streak.current, 2);
        assert_eq!(streak.best, 3);
    }

    #[test]
    fn only_future_dates() {
        let dates = [today() + Days::new(3)];
        assert_eq!(calculate_streak(&dates, today()), Streak { current: 0, best: 1 });
    }

    #[test]
    fn streak_across_month_boundary() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let dates = [
            today,
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 28).unwrap(),
        ];
        assert_eq!(calculate_streak(&dates, today), Streak { current: 3, best: 3 });
    }

    #[test]
    fn consistency_of_nothing() {
        let c = calculate_consistency(&[], today(), 30);
        assert_eq!(c.total_days, 30);
        assert_eq!(c.completed_days, 0);
        assert_eq!(c.consistency, 0.0);
    }

    #[test]
    fn ten_of_thirty_days() {
        let dates: Vec<_> = (0..10).map(|i| ago(i * 3)).collect();
        let c = calculate_consistency(&dates, today(), 30);
        assert_eq!(c.total_days, 30);
        assert_eq!(c.completed_days, 10);
        assert_eq!(c.consistency, 33.33);
    }

    #[test]
    fn consistency_window_is_inclusive_at_both_ends() {
        let dates = [today(), ago(30), ago(31), today() + Days::new(1)];
        let c = calculate_consistency(&dates, today(), 30);
        assert_eq!(c.completed_days, 2);
        assert_eq!(c.consistency, 6.67);
    }

    #[test]
    fn consistency_counts_a_day_once() {
        let dates = [ago(2), ago(2), ago(2)];
        let c = calculate_consistency(&dates, today(), 10);
        assert_eq!(c.completed_days, 1);
        assert_eq!(c.consistency, 10.0);
    }

    #[test]
    fn consistency_is_not_clamped() {
        let dates = [today(), ago(1)];
        let c = calculate_consistency(&dates, today(), 1);
        assert_eq!(c.completed_days, 2);
        assert_eq!(c.consistency, 200.0);
    }

    #[test]
    fn zero_day_window_reports_zero_percent() {
        let c = calculate_consistency(&[today()], today(), 0);
        assert_eq!(c.total_days, 0);
        assert_eq!(c.consistency, 0.0);
    }

    #[test]
    fn active_within_a_week() {
        assert!(!is_active(&[], today(), 7));
        assert!(!is_active(&[ago(8)], today(), 7));
        assert!(is_active(&[ago(7)], today(), 7));
        assert!(is_active(&[ago(6)], today(), 7));
        assert!(is_active(&[ago(30), today()], today(), 7));
    }

    #[test]
    fn rounding_to_two_places() {
        assert_eq!(round2(33.333333), 33.33);
        assert_eq!(round2(66.666666), 66.67);
        assert_eq!(round2(0.0), 0.0);
    }

    fn offsets() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(0u64..60, 0..40)
    }

    proptest! {
        #[test]
        fn order_never_matters(mut offs in offsets()) {
            let forward = streak_of(&offs);
            offs.reverse();
            prop_assert_eq!(streak_of(&offs), forward);
        }

        #[test]
        fn duplicates_never_matter(offs in offsets()) {
            let mut doubled = offs.clone();
            doubled.extend_from_slice(&offs);
            prop_assert_eq!(streak_of(&doubled), streak_of(&offs));
        }

        #[test]
        fn same_input_same_answer(offs in offsets()) {
            prop_assert_eq!(streak_of(&offs), streak_of(&offs));
        }

        #[test]
        fn best_is_longest_run_and_dominates_current(offs in offsets()) {
            let streak = streak_of(&offs);
            prop_assert!(streak.best >= streak.current);

            let mut days = offs.clone();
            days.sort_unstable();
            days.dedup();
            let mut longest = 0u32;
            let mut run = 0u32;
            let mut prev: Option<u64> = None;
            for d in days {
                run = match prev {
                    Some(p) if d == p + 1 => run + 1,
                    _ => 1,
                };
                longest = longest.max(run);
                prev = Some(d);
            }
            prop_assert_eq!(streak.best, longest);
        }

        #[test]
        fn consistency_counts_distinct_days_in_window(offs in offsets()) {
            let dates: Vec<_> = offs.iter().map(|n| ago(*n)).collect();
            let mut inside: Vec<_> = offs.iter().filter(|n| **n <= 30).collect();
            inside.sort_unstable();
            inside.dedup();

            let c = calculate_consistency(&dates, today(), 30);
            prop_assert_eq!(c.completed_days as usize, inside.len());
            prop_assert_eq!(c.consistency, round2(inside.len() as f64 / 30.0 * 100.0));
        }
    }
}
