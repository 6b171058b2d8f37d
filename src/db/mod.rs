pub mod json;
pub mod migrations;
pub mod sqlite;

use anyhow::Result;
use chrono::NaiveDate;
use log::{info, warn};
use std::path::Path;
use thiserror::Error;

use crate::config::StorageBackend;
use crate::models::{CompletionRecord, Habit, HabitFilter, NewHabit};

pub use json::JsonStore;
pub use sqlite::SqliteStore;

pub const SQLITE_FILE: &str = "growtrack.db";
pub const JSON_FILE: &str = "growtrack.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Habit {0} not found")]
    HabitNotFound(i64),
    #[error("Corrupt {table} record {id}: {reason}")]
    Corrupt {
        table: &'static str,
        id: i64,
        reason: String,
    },
}

/// Anything that can list the days a habit was completed.
pub trait CompletionSource {
    /// Completion dates for one habit, most recent first.
    fn completion_dates(&self, habit_id: i64) -> Result<Vec<NaiveDate>>;
}

pub trait HabitStore: CompletionSource {
    fn backend(&self) -> StorageBackend;

    fn create_habit(&self, habit: &NewHabit) -> Result<Habit>;
    fn find_habit(&self, id: i64) -> Result<Option<Habit>>;
    /// Newest habits first.
    fn list_habits(&self, filter: &HabitFilter) -> Result<Vec<Habit>>;
    /// `is_active: None` keeps the stored flag.
    fn update_habit(&self, id: i64, habit: &NewHabit, is_active: Option<bool>)
        -> Result<Option<Habit>>;
    /// Also removes the habit's completions.
    fn delete_habit(&self, id: i64) -> Result<bool>;
    fn set_active(&self, id: i64, active: bool) -> Result<()>;

    /// Record a completion. Returns the existing id when the day is already recorded.
    fn mark_complete(&self, habit_id: i64, date: NaiveDate) -> Result<i64>;
    fn remove_completion(&self, habit_id: i64, date: NaiveDate) -> Result<bool>;
    /// Most recent first.
    fn completions(&self, habit_id: i64, limit: Option<usize>) -> Result<Vec<CompletionRecord>>;
    /// Inclusive range, oldest first.
    fn completions_between(
        &self,
        habit_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CompletionRecord>>;
    fn is_completed_on(&self, habit_id: i64, date: NaiveDate) -> Result<bool>;

    fn require_habit(&self, id: i64) -> Result<Habit> {
        self.find_habit(id)?
            .ok_or_else(|| StoreError::HabitNotFound(id).into())
    }
}

/// Open the configured backend once. A SQLite file that cannot be opened
/// falls back to the JSON store in the same directory.
pub fn open_store(backend: StorageBackend, data_dir: &Path) -> Result<Box<dyn HabitStore>> {
    match backend {
        StorageBackend::Sqlite => {
            let path = data_dir.join(SQLITE_FILE);
            match SqliteStore::open(&path) {
                Ok(store) => {
                    info!("using SQLite storage at {}", path.display());
                    Ok(Box::new(store))
                }
                Err(e) => {
                    warn!("could not open {}: {:#}; falling back to JSON storage", path.display(), e);
                    open_json(data_dir)
                }
            }
        }
        StorageBackend::Json => open_json(data_dir),
    }
}

fn open_json(data_dir: &Path) -> Result<Box<dyn HabitStore>> {
    let path = data_dir.join(JSON_FILE);
    let store = JsonStore::open(&path)?;
    info!("using JSON storage at {}", path.display());
    Ok(Box::new(store))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_each_backend_in_a_directory() {
        let dir = tempfile::tempdir().unwrap();

        let sqlite = open_store(StorageBackend::Sqlite, dir.path()).unwrap();
        assert_eq!(sqlite.backend(), StorageBackend::Sqlite);
        assert!(dir.path().join(SQLITE_FILE).exists());

        let json = open_store(StorageBackend::Json, dir.path()).unwrap();
        assert_eq!(json.backend(), StorageBackend::Json);
        assert!(dir.path().join(JSON_FILE).exists());
    }

    #[test]
    fn unusable_sqlite_file_falls_back_to_json() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the database file should be cannot be opened as SQLite.
        std::fs::create_dir(dir.path().join(SQLITE_FILE)).unwrap();

        let store = open_store(StorageBackend::Sqlite, dir.path()).unwrap();
        assert_eq!(store.backend(), StorageBackend::Json);
    }

    #[test]
    fn require_habit_reports_missing_id() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(StorageBackend::Json, dir.path()).unwrap();
        let err = store.require_habit(42).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::HabitNotFound(42))
        ));
    }
}
