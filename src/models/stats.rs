use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Category, Habit};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Streak {
    pub current: u32,
    pub best: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consistency {
    pub total_days: u32,
    pub completed_days: u32,
    /// Percentage, two decimal places.
    pub consistency: f64,
}

/// A habit together with everything derived from its completions.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitReport {
    #[serde(flatten)]
    pub habit: Habit,
    pub streak: u32,
    pub best_streak: u32,
    pub completed_today: bool,
    pub last_completion: Option<NaiveDate>,
    pub consistency: Consistency,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub weekday: String,
    pub completions: u32,
    pub total_habits: u32,
}

impl DaySummary {
    pub fn completion_ratio(&self) -> f64 {
        if self.total_habits == 0 {
            0.0
        } else {
            self.completions as f64 / self.total_habits as f64
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayHabit {
    pub id: i64,
    pub name: String,
    pub category: Category,
    pub goal: Option<String>,
    pub completed_today: bool,
    pub streak: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub total_habits: u32,
    pub active_habits: u32,
    /// Sum of every habit's current streak.
    pub current_streak: u32,
    pub best_streak: u32,
    /// Mean consistency across habits.
    pub success_rate: f64,
    /// One point per recorded completion.
    pub total_points: u32,
    pub last_7_days: Vec<DaySummary>,
    pub today: Vec<TodayHabit>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsistencyScore {
    pub habit_id: i64,
    pub habit_name: String,
    pub consistency: f64,
    pub completed_days: u32,
    pub total_days: u32,
    pub current_streak: u32,
    pub best_streak: u32,
}
