pub mod completion;
pub mod habit;
pub mod stats;

pub use completion::CompletionRecord;
pub use habit::{Category, Frequency, Habit, HabitFilter, NewHabit};
pub use stats::{
    Consistency, ConsistencyScore, Dashboard, DaySummary, HabitReport, Streak, TodayHabit,
};
