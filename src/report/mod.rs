//! Derived statistics: every number here comes from the engine applied to
//! dates fetched from a store.

use anyhow::Result;
use chrono::{Days, NaiveDate};
use log::debug;
use std::collections::HashSet;

use crate::config::settings::StatsConfig;
use crate::db::{CompletionSource, HabitStore};
use crate::engine::{calculate_consistency, calculate_streak, is_active, round2};
use crate::models::{
    CompletionRecord, ConsistencyScore, Dashboard, DaySummary, Habit, HabitFilter,
    HabitReport, Streak, TodayHabit,
};

pub fn streak_for<S: CompletionSource + ?Sized>(
    source: &S,
    habit_id: i64,
    today: NaiveDate,
) -> Result<Streak> {
    Ok(calculate_streak(&source.completion_dates(habit_id)?, today))
}

/// Recompute a habit's active flag and store it.
pub fn refresh_active<S: HabitStore + ?Sized>(
    store: &S,
    habit_id: i64,
    today: NaiveDate,
    window: u32,
) -> Result<bool> {
    let active = is_active(&store.completion_dates(habit_id)?, today, window);
    store.set_active(habit_id, active)?;
    debug!("habit {} active={}", habit_id, active);
    Ok(active)
}

pub fn refresh_all_active<S: HabitStore + ?Sized>(
    store: &S,
    today: NaiveDate,
    window: u32,
) -> Result<()> {
    for habit in store.list_habits(&HabitFilter::default())? {
        refresh_active(store, habit.id, today, window)?;
    }
    Ok(())
}

pub fn habit_report<S: HabitStore + ?Sized>(
    store: &S,
    habit: Habit,
    today: NaiveDate,
    stats: &StatsConfig,
) -> Result<HabitReport> {
    let dates = store.completion_dates(habit.id)?;
    Ok(build_report(habit, &dates, today, stats))
}

/// Report for one habit with its active flag brought up to date first.
pub fn current_report<S: HabitStore + ?Sized>(
    store: &S,
    habit_id: i64,
    today: NaiveDate,
    stats: &StatsConfig,
) -> Result<HabitReport> {
    refresh_active(store, habit_id, today, stats.active_days)?;
    let habit = store.require_habit(habit_id)?;
    habit_report(store, habit, today, stats)
}

fn build_report(
    habit: Habit,
    dates: &[NaiveDate],
    today: NaiveDate,
    stats: &StatsConfig,
) -> HabitReport {
    let streak = calculate_streak(dates, today);
    HabitReport {
        habit,
        streak: streak.current,
        best_streak: streak.best,
        completed_today: dates.contains(&today),
        last_completion: dates.iter().max().copied(),
        consistency: calculate_consistency(dates, today, stats.consistency_days),
    }
}

pub fn habit_reports<S: HabitStore + ?Sized>(
    store: &S,
    filter: &HabitFilter,
    today: NaiveDate,
    stats: &StatsConfig,
) -> Result<Vec<HabitReport>> {
    store
        .list_habits(filter)?
        .into_iter()
        .map(|h| habit_report(store, h, today, stats))
        .collect()
}

pub fn dashboard<S: HabitStore + ?Sized>(
    store: &S,
    today: NaiveDate,
    stats: &StatsConfig,
) -> Result<Dashboard> {
    let habits = store.list_habits(&HabitFilter::default())?;

    let mut reports = Vec::with_capacity(habits.len());
    let mut days_done: Vec<HashSet<NaiveDate>> = Vec::with_capacity(habits.len());
    let mut total_points = 0u32;

    for habit in habits {
        let dates = store.completion_dates(habit.id)?;
        total_points += dates.len() as u32;
        days_done.push(dates.iter().copied().collect());
        reports.push(build_report(habit, &dates, today, stats));
    }

    let total_habits = reports.len() as u32;
    let success_rate = if reports.is_empty() {
        0.0
    } else {
        let sum: f64 = reports.iter().map(|r| r.consistency.consistency).sum();
        round2(sum / reports.len() as f64)
    };

    let last_7_days = (0..7u64)
        .rev()
        .filter_map(|ago| today.checked_sub_days(Days::new(ago)))
        .map(|date| DaySummary {
            date,
            weekday: date.format("%a").to_string(),
            completions: days_done.iter().filter(|set| set.contains(&date)).count() as u32,
            total_habits,
        })
        .collect();

    Ok(Dashboard {
        total_habits,
        active_habits: reports.iter().filter(|r| r.habit.is_active).count() as u32,
        current_streak: reports.iter().map(|r| r.streak).sum(),
        best_streak: reports.iter().map(|r| r.best_streak).max().unwrap_or(0),
        success_rate,
        total_points,
        last_7_days,
        today: reports
            .into_iter()
            .map(|r| TodayHabit {
                id: r.habit.id,
                name: r.habit.name,
                category: r.habit.category,
                goal: r.habit.goal,
                completed_today: r.completed_today,
                streak: r.streak,
            })
            .collect(),
    })
}

/// Dashboard after refreshing every habit's active flag.
pub fn current_dashboard<S: HabitStore + ?Sized>(
    store: &S,
    today: NaiveDate,
    stats: &StatsConfig,
) -> Result<Dashboard> {
    refresh_all_active(store, today, stats.active_days)?;
    dashboard(store, today, stats)
}

pub fn consistency_scores<S: HabitStore + ?Sized>(
    store: &S,
    today: NaiveDate,
    days: u32,
) -> Result<Vec<ConsistencyScore>> {
    let mut scores = Vec::new();
    for habit in store.list_habits(&HabitFilter::default())? {
        let dates = store.completion_dates(habit.id)?;
        let consistency = calculate_consistency(&dates, today, days);
        let streak = calculate_streak(&dates, today);
        scores.push(ConsistencyScore {
            habit_id: habit.id,
            habit_name: habit.name,
            consistency: consistency.consistency,
            completed_days: consistency.completed_days,
            total_days: consistency.total_days,
            current_streak: streak.current,
            best_streak: streak.best,
        });
    }
    Ok(scores)
}

/// Completions of one habit: an inclusive range oldest first, or everything most recent first.
pub fn history<S: HabitStore + ?Sized>(
    store: &S,
    habit_id: i64,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<CompletionRecord>> {
    match range {
        Some((start, end)) => store.completions_between(habit_id, start, end),
        None => store.completions(habit_id, None),
    }
}

/// Completions of every habit, in list order, under the same range rules as [`history`].
pub fn history_all<S: HabitStore + ?Sized>(
    store: &S,
    range: Option<(NaiveDate, NaiveDate)>,
) -> Result<Vec<(Habit, Vec<CompletionRecord>)>> {
    store
        .list_habits(&HabitFilter::default())?
        .into_iter()
        .map(|habit| {
            let completions = history(store, habit.id, range)?;
            Ok((habit, completions))
        })
        .collect()
}
