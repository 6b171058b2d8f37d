use anyhow::{anyhow, bail, Context, Result};
use chrono::{Days, Local, NaiveDate};
use log::info;
use std::str::FromStr;

use crate::config::AppConfig;
use crate::db::HabitStore;
use crate::engine::{format_date, parse_date};
use crate::models::{Category, Frequency, HabitFilter, NewHabit, Streak};
use crate::report;
use crate::utils::format::{format_percent, format_relative_day, pad, progress_bar};

// ─── ANSI helpers ────────────────────────────────────────────────────────────

macro_rules! println_colored {
    ($color:expr, $($arg:tt)*) => {{
        print!("{}", $color);
        print!($($arg)*);
        println!("\x1b[0m");
    }};
}

const GREEN: &str = "\x1b[32m";
const AMBER: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";
const BOLD: &str = "\x1b[1m";
const TEAL: &str = "\x1b[38;2;64;178;160m";

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn parse_day(value: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    match value {
        None => Ok(today),
        Some(s) => parse_date(s).with_context(|| format!("Bad --date value '{}'", s)),
    }
}

fn check_mark(done: bool) -> String {
    if done {
        format!("{}✓\x1b[0m", GREEN)
    } else {
        format!("{}○\x1b[0m", DIM)
    }
}

// ─── Habits ──────────────────────────────────────────────────────────────────

pub fn handle_add(
    store: &dyn HabitStore,
    name: &str,
    category: &str,
    frequency: &str,
    goal: Option<String>,
    description: Option<String>,
) -> Result<()> {
    let habit = NewHabit {
        name: name.to_string(),
        description,
        category: Category::from_str(category)?,
        frequency: Frequency::from_str(frequency)?,
        goal,
    }
    .validated()?;

    let created = store.create_habit(&habit)?;
    info!("created habit {}", created.id);
    println_colored!(
        GREEN,
        "  ✓ Added #{} {} ({}, {})",
        created.id,
        created.name,
        created.category,
        created.frequency
    );
    Ok(())
}

pub fn handle_list(
    store: &dyn HabitStore,
    config: &AppConfig,
    category: Option<&str>,
    active: bool,
    inactive: bool,
) -> Result<()> {
    let today = today();
    report::refresh_all_active(store, today, config.stats.active_days)?;

    let filter = HabitFilter {
        category: category.map(Category::from_str).transpose()?,
        is_active: match (active, inactive) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        },
    };
    let reports = report::habit_reports(store, &filter, today, &config.stats)?;

    println!();
    if reports.is_empty() {
        println_colored!(DIM, "  No habits yet. Add one with `growtrack add <name> -c <category>`");
        println!();
        return Ok(());
    }

    println_colored!(
        BOLD,
        "  {:>4}  {}  {}  {:>6}  {:>5}  Today",
        "#",
        pad("Habit", 24),
        pad("Category", 13),
        "Streak",
        "Best"
    );
    for r in &reports {
        let line = format!(
            "  {:>4}  {}  {}  {:>6}  {:>5}  {}",
            r.habit.id,
            pad(&r.habit.name, 24),
            pad(r.habit.category.display_name(), 13),
            r.streak,
            r.best_streak,
            check_mark(r.completed_today)
        );
        if r.habit.is_active {
            println!("{}", line);
        } else {
            println_colored!(DIM, "{}", line);
        }
    }
    println!();
    Ok(())
}

pub fn handle_show(store: &dyn HabitStore, config: &AppConfig, id: i64) -> Result<()> {
    let today = today();
    let r = report::current_report(store, id, today, &config.stats)?;

    println!();
    println_colored!(TEAL, "  #{} {}", r.habit.id, r.habit.name);
    if let Some(desc) = &r.habit.description {
        println_colored!(DIM, "  {}", desc);
    }
    println!();
    println!("  Category:     {}", r.habit.category);
    println!("  Frequency:    {}", r.habit.frequency);
    if let Some(goal) = &r.habit.goal {
        println!("  Goal:         {}", goal);
    }
    if r.habit.is_active {
        println_colored!(GREEN, "  Status:       active");
    } else {
        println_colored!(AMBER, "  Status:       inactive");
    }
    println!();
    println_colored!(
        BOLD,
        "  Streak:       {} days current  |  {} days best",
        r.streak,
        r.best_streak
    );
    println!(
        "  Consistency:  {} {}  ({}/{} days)",
        progress_bar(r.consistency.completed_days, r.consistency.total_days, 20),
        format_percent(r.consistency.consistency),
        r.consistency.completed_days,
        r.consistency.total_days
    );
    println!("  Today:        {}", check_mark(r.completed_today));
    match r.last_completion {
        Some(day) => println!("  Last done:    {}", format_relative_day(day, today)),
        None => println_colored!(DIM, "  Last done:    never"),
    }
    println!();
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_edit(
    store: &dyn HabitStore,
    id: i64,
    name: Option<String>,
    category: Option<&str>,
    frequency: Option<&str>,
    goal: Option<String>,
    description: Option<String>,
    active: Option<bool>,
) -> Result<()> {
    let current = store.require_habit(id)?;
    let mut edit = NewHabit::from(&current);
    if let Some(name) = name {
        edit.name = name;
    }
    if let Some(c) = category {
        edit.category = Category::from_str(c)?;
    }
    if let Some(f) = frequency {
        edit.frequency = Frequency::from_str(f)?;
    }
    if goal.is_some() {
        edit.goal = goal;
    }
    if description.is_some() {
        edit.description = description;
    }

    let updated = store
        .update_habit(id, &edit.validated()?, active)?
        .ok_or_else(|| anyhow!("Habit {} disappeared while editing", id))?;
    println_colored!(GREEN, "  ✓ Updated #{} {}", updated.id, updated.name);
    Ok(())
}

pub fn handle_delete(store: &dyn HabitStore, id: i64) -> Result<()> {
    let habit = store.require_habit(id)?;
    store.delete_habit(id)?;
    info!("deleted habit {}", id);
    println_colored!(RED, "  ✗ Deleted #{} {} and its history", habit.id, habit.name);
    Ok(())
}

// ─── Completions ─────────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub struct MarkOutcome {
    pub completion_id: i64,
    pub date: NaiveDate,
    pub streak: Streak,
    pub active: bool,
}

/// Record a completion, refresh the active flag and return the new streak.
///
/// Without an explicit date a second completion today is an error; with one the call is idempotent.
pub fn mark_done(
    store: &dyn HabitStore,
    id: i64,
    date: Option<NaiveDate>,
    today: NaiveDate,
    active_days: u32,
) -> Result<MarkOutcome> {
    store.require_habit(id)?;

    let day = date.unwrap_or(today);
    if day > today {
        bail!("Cannot mark {} as done: the date is in the future", format_date(day));
    }
    if date.is_none() && store.is_completed_on(id, today)? {
        bail!("Habit {} is already marked as done today", id);
    }

    let completion_id = store.mark_complete(id, day)?;
    let active = report::refresh_active(store, id, today, active_days)?;
    let streak = report::streak_for(store, id, today)?;
    Ok(MarkOutcome {
        completion_id,
        date: day,
        streak,
        active,
    })
}

/// Remove a completion and refresh the active flag. Returns whether anything was removed.
pub fn undo_done(
    store: &dyn HabitStore,
    id: i64,
    day: NaiveDate,
    today: NaiveDate,
    active_days: u32,
) -> Result<bool> {
    store.require_habit(id)?;
    let removed = store.remove_completion(id, day)?;
    if removed {
        report::refresh_active(store, id, today, active_days)?;
    }
    Ok(removed)
}

pub fn handle_done(
    store: &dyn HabitStore,
    config: &AppConfig,
    id: i64,
    date: Option<&str>,
) -> Result<()> {
    let today = today();
    let date = date.map(|s| parse_day(Some(s), today)).transpose()?;
    let outcome = mark_done(store, id, date, today, config.stats.active_days)?;

    println_colored!(
        GREEN,
        "  ✓ #{} done for {}",
        id,
        format_relative_day(outcome.date, today)
    );
    println_colored!(
        BOLD,
        "  Streak: {} days  |  best {}",
        outcome.streak.current,
        outcome.streak.best
    );
    Ok(())
}

pub fn handle_undo(
    store: &dyn HabitStore,
    config: &AppConfig,
    id: i64,
    date: Option<&str>,
) -> Result<()> {
    let today = today();
    let day = parse_day(date, today)?;
    if undo_done(store, id, day, today, config.stats.active_days)? {
        println_colored!(AMBER, "  ○ #{} unmarked for {}", id, format_relative_day(day, today));
    } else {
        println_colored!(DIM, "  Nothing recorded for #{} on {}", id, format_date(day));
    }
    Ok(())
}

pub fn handle_history(
    store: &dyn HabitStore,
    id: Option<i64>,
    from: Option<&str>,
    to: Option<&str>,
) -> Result<()> {
    let range = match (from, to) {
        (Some(f), Some(t)) => {
            let (start, end) = (parse_date(f)?, parse_date(t)?);
            if start > end {
                bail!("--from {} is after --to {}", f, t);
            }
            Some((start, end))
        }
        _ => None,
    };

    let blocks = match id {
        Some(id) => {
            let habit = store.require_habit(id)?;
            let completions = report::history(store, id, range)?;
            vec![(habit, completions)]
        }
        None => report::history_all(store, range)?,
    };

    println!();
    if blocks.is_empty() {
        println_colored!(DIM, "  No habits yet");
        println!();
    }
    for (habit, completions) in &blocks {
        println_colored!(
            TEAL,
            "  History: #{} {} ({})",
            habit.id,
            habit.name,
            habit.category
        );
        println!();
        if completions.is_empty() {
            println_colored!(DIM, "  No completions recorded");
        }
        for c in completions {
            println!("  {}  {}", format_date(c.completion_date), c.completion_date.format("%a"));
        }
        println!();
        println_colored!(DIM, "  {} completions", completions.len());
        println!();
    }
    Ok(())
}

// ─── Stats ───────────────────────────────────────────────────────────────────

pub fn handle_stats(store: &dyn HabitStore, config: &AppConfig) -> Result<()> {
    let today = today();
    let dash = report::current_dashboard(store, today, &config.stats)?;

    println!();
    println_colored!(TEAL, "  Dashboard: {}", format_date(today));
    println!();
    println!(
        "  Habits:        {} total  |  {} active",
        dash.total_habits, dash.active_habits
    );
    println_colored!(
        BOLD,
        "  Streaks:       {} days combined  |  {} days best",
        dash.current_streak,
        dash.best_streak
    );
    println!(
        "  Success rate:  {} ({}d)",
        format_percent(dash.success_rate),
        config.stats.consistency_days
    );
    println!("  Points:        {}", dash.total_points);

    println!();
    println_colored!(DIM, "  Last 7 days");
    for day in &dash.last_7_days {
        let ratio = day.completion_ratio();
        let color = if ratio >= 1.0 {
            GREEN
        } else if ratio > 0.0 {
            AMBER
        } else {
            DIM
        };
        println_colored!(
            color,
            "  {}  {}  {}/{}",
            day.weekday,
            progress_bar(day.completions, day.total_habits, 10),
            day.completions,
            day.total_habits
        );
    }

    if !dash.today.is_empty() {
        println!();
        println_colored!(DIM, "  Today");
        for h in &dash.today {
            println!(
                "  {} {}  {}",
                check_mark(h.completed_today),
                pad(&h.name, 24),
                h.goal.as_deref().unwrap_or("")
            );
        }
    }
    println!();
    Ok(())
}

pub fn handle_consistency(
    store: &dyn HabitStore,
    config: &AppConfig,
    days: Option<u32>,
) -> Result<()> {
    let days = days.unwrap_or(config.stats.consistency_days);
    let scores = report::consistency_scores(store, today(), days)?;

    println!();
    println_colored!(TEAL, "  Consistency: last {} days", days);
    println!();
    if scores.is_empty() {
        println_colored!(DIM, "  No habits yet");
    }
    for s in &scores {
        println!(
            "  {}  {} {:>7}  {:>3}/{:<3}  streak {} (best {})",
            pad(&s.habit_name, 24),
            progress_bar(s.completed_days, s.total_days, 12),
            format_percent(s.consistency),
            s.completed_days,
            s.total_days,
            s.current_streak,
            s.best_streak
        );
    }
    println!();
    Ok(())
}

// ─── Export ──────────────────────────────────────────────────────────────────

pub fn handle_export(store: &dyn HabitStore, config: &AppConfig, json: bool) -> Result<()> {
    let today = today();
    let dash = report::current_dashboard(store, today, &config.stats)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&dash)?);
        return Ok(());
    }

    let week_start = today.checked_sub_days(Days::new(6)).unwrap_or(today);
    println!("# growtrack: Weekly Summary");
    println!("# {} to {}", format_date(week_start), format_date(today));
    println!();
    println!("Storage: {}", store.backend().as_str());
    println!();
    println!("## Completions (last 7 days)");
    for day in &dash.last_7_days {
        println!(
            "  {}  {}/{}  {}",
            format_date(day.date),
            day.completions,
            day.total_habits,
            progress_bar(day.completions, day.total_habits, 5)
        );
    }
    println!();
    println!("## Habits");
    for h in &dash.today {
        println!("  {}  streak {}", pad(&h.name, 24), h.streak);
    }
    println!();
    println!("## Summary");
    println!("  Habits:       {} ({} active)", dash.total_habits, dash.active_habits);
    println!("  Best streak:  {} days", dash.best_streak);
    println!("  Success rate: {}", format_percent(dash.success_rate));
    println!("  Points:       {}", dash.total_points);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{CompletionSource, SqliteStore};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn store_with_habit() -> (SqliteStore, i64) {
        let store = SqliteStore::open_in_memory().unwrap();
        let habit = store
            .create_habit(&NewHabit {
                name: "Stretch".to_string(),
                description: None,
                category: Category::Health,
                frequency: Frequency::Daily,
                goal: None,
            })
            .unwrap();
        (store, habit.id)
    }

    #[test]
    fn marking_today_twice_is_refused() {
        let (store, id) = store_with_habit();
        let first = mark_done(&store, id, None, day(15), 7).unwrap();
        assert_eq!(first.date, day(15));
        assert_eq!(first.streak, Streak { current: 1, best: 1 });
        assert!(first.active);

        let err = mark_done(&store, id, None, day(15), 7).unwrap_err();
        assert!(err.to_string().contains("already marked as done today"));
    }

    #[test]
    fn explicit_date_is_idempotent() {
        let (store, id) = store_with_habit();
        let a = mark_done(&store, id, Some(day(14)), day(15), 7).unwrap();
        let b = mark_done(&store, id, Some(day(14)), day(15), 7).unwrap();
        assert_eq!(a.completion_id, b.completion_id);

        let c = mark_done(&store, id, Some(day(15)), day(15), 7).unwrap();
        assert_eq!(c.streak, Streak { current: 2, best: 2 });
    }

    #[test]
    fn future_dates_are_rejected() {
        let (store, id) = store_with_habit();
        assert!(mark_done(&store, id, Some(day(16)), day(15), 7).is_err());
        assert!(store.completion_dates(id).unwrap().is_empty());
    }

    #[test]
    fn unknown_habit() {
        let (store, _) = store_with_habit();
        assert!(mark_done(&store, 99, None, day(15), 7).is_err());
        assert!(undo_done(&store, 99, day(15), day(15), 7).is_err());
    }

    #[test]
    fn old_completion_leaves_habit_inactive() {
        let (store, id) = store_with_habit();
        let outcome = mark_done(&store, id, Some(day(1)), day(15), 7).unwrap();
        assert!(!outcome.active);
        assert_eq!(outcome.streak, Streak { current: 0, best: 1 });
        assert!(!store.find_habit(id).unwrap().unwrap().is_active);
    }

    #[test]
    fn undo_refreshes_active_flag() {
        let (store, id) = store_with_habit();
        mark_done(&store, id, None, day(15), 7).unwrap();
        assert!(undo_done(&store, id, day(15), day(15), 7).unwrap());
        assert!(!store.find_habit(id).unwrap().unwrap().is_active);
        assert!(!undo_done(&store, id, day(15), day(15), 7).unwrap());
    }

    #[test]
    fn parse_day_defaults_to_today() {
        assert_eq!(parse_day(None, day(15)).unwrap(), day(15));
        assert_eq!(parse_day(Some("2024-03-02"), day(15)).unwrap(), day(2));
        assert!(parse_day(Some("03/02/2024"), day(15)).is_err());
    }
}
