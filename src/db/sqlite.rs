use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::str::FromStr;

use super::migrations::run_migrations;
use super::{CompletionSource, HabitStore, StoreError};
use crate::config::StorageBackend;
use crate::engine::{format_date, parse_date, parse_dates};
use crate::models::{Category, CompletionRecord, Frequency, Habit, HabitFilter, NewHabit};

const HABIT_COLUMNS: &str =
    "id, name, description, category, frequency, goal, is_active, created_at";

type HabitRow = (i64, String, Option<String>, String, String, Option<String>, i32, String);

fn read_habit_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<HabitRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
    ))
}

fn habit_from_row(r: HabitRow) -> Result<Habit> {
    let (id, name, description, category, frequency, goal, is_active, created_at) = r;
    let corrupt = |reason: String| StoreError::Corrupt {
        table: "habits",
        id,
        reason,
    };
    Ok(Habit {
        id,
        name,
        description,
        category: Category::from_str(&category).map_err(|e| corrupt(e.to_string()))?,
        frequency: Frequency::from_str(&frequency).map_err(|e| corrupt(e.to_string()))?,
        goal,
        is_active: is_active != 0,
        created_at,
    })
}

fn completion_from_row((id, habit_id, date): (i64, i64, String)) -> Result<CompletionRecord> {
    let completion_date = parse_date(&date).map_err(|e| StoreError::Corrupt {
        table: "habit_completions",
        id,
        reason: e.to_string(),
    })?;
    Ok(CompletionRecord {
        id,
        habit_id,
        completion_date,
    })
}

// ─── Habit repo ──────────────────────────────────────────────────────────────

pub struct HabitRepo;

impl HabitRepo {
    pub fn insert(conn: &Connection, habit: &NewHabit) -> Result<i64> {
        conn.execute(
            "INSERT INTO habits (name, description, category, frequency, goal, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, 1)",
            params![
                habit.name,
                habit.description,
                habit.category.as_str(),
                habit.frequency.as_str(),
                habit.goal,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn get(conn: &Connection, id: i64) -> Result<Option<Habit>> {
        let row = conn
            .query_row(
                &format!("SELECT {HABIT_COLUMNS} FROM habits WHERE id = ?1"),
                params![id],
                read_habit_row,
            )
            .optional()?;
        row.map(habit_from_row).transpose()
    }

    pub fn list(conn: &Connection, filter: &HabitFilter) -> Result<Vec<Habit>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {HABIT_COLUMNS} FROM habits
             WHERE (?1 IS NULL OR category = ?1)
               AND (?2 IS NULL OR is_active = ?2)
             ORDER BY created_at DESC, id DESC"
        ))?;

        let rows = stmt.query_map(
            params![
                filter.category.map(|c| c.as_str()),
                filter.is_active.map(|a| a as i32),
            ],
            read_habit_row,
        )?;

        let mut result = Vec::new();
        for r in rows {
            result.push(habit_from_row(r?)?);
        }
        Ok(result)
    }

    pub fn update(
        conn: &Connection,
        id: i64,
        habit: &NewHabit,
        is_active: Option<bool>,
    ) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE habits
             SET name = ?1, description = ?2, category = ?3, frequency = ?4, goal = ?5,
                 is_active = COALESCE(?6, is_active)
             WHERE id = ?7",
            params![
                habit.name,
                habit.description,
                habit.category.as_str(),
                habit.frequency.as_str(),
                habit.goal,
                is_active.map(|a| a as i32),
                id,
            ],
        )?;
        Ok(changed > 0)
    }

    pub fn delete(conn: &Connection, id: i64) -> Result<bool> {
        Ok(conn.execute("DELETE FROM habits WHERE id = ?1", params![id])? > 0)
    }

    pub fn set_active(conn: &Connection, id: i64, active: bool) -> Result<()> {
        conn.execute(
            "UPDATE habits SET is_active = ?1 WHERE id = ?2",
            params![active as i32, id],
        )?;
        Ok(())
    }
}

// ─── Completion repo ─────────────────────────────────────────────────────────

pub struct CompletionRepo;

impl CompletionRepo {
    pub fn mark(conn: &Connection, habit_id: i64, date: &str) -> Result<i64> {
        conn.execute(
            "INSERT INTO habit_completions (habit_id, completion_date) VALUES (?1, ?2)
             ON CONFLICT(habit_id, completion_date) DO NOTHING",
            params![habit_id, date],
        )?;
        conn.query_row(
            "SELECT id FROM habit_completions WHERE habit_id = ?1 AND completion_date = ?2",
            params![habit_id, date],
            |row| row.get(0),
        )
        .map_err(anyhow::Error::from)
    }

    pub fn remove(conn: &Connection, habit_id: i64, date: &str) -> Result<bool> {
        let removed = conn.execute(
            "DELETE FROM habit_completions WHERE habit_id = ?1 AND completion_date = ?2",
            params![habit_id, date],
        )?;
        Ok(removed > 0)
    }

    pub fn dates(conn: &Connection, habit_id: i64) -> Result<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT completion_date FROM habit_completions
             WHERE habit_id = ?1
             ORDER BY completion_date DESC",
        )?;
        let dates = stmt
            .query_map(params![habit_id], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(dates)
    }

    pub fn recent(conn: &Connection, habit_id: i64, limit: Option<usize>) -> Result<Vec<CompletionRecord>> {
        // LIMIT -1 means no limit in SQLite.
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let mut stmt = conn.prepare(
            "SELECT id, habit_id, completion_date FROM habit_completions
             WHERE habit_id = ?1
             ORDER BY completion_date DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![habit_id, limit], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut result = Vec::new();
        for r in rows {
            result.push(completion_from_row(r?)?);
        }
        Ok(result)
    }

    pub fn between(
        conn: &Connection,
        habit_id: i64,
        start: &str,
        end: &str,
    ) -> Result<Vec<CompletionRecord>> {
        let mut stmt = conn.prepare(
            "SELECT id, habit_id, completion_date FROM habit_completions
             WHERE habit_id = ?1 AND completion_date BETWEEN ?2 AND ?3
             ORDER BY completion_date ASC",
        )?;
        let rows = stmt.query_map(params![habit_id, start, end], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut result = Vec::new();
        for r in rows {
            result.push(completion_from_row(r?)?);
        }
        Ok(result)
    }

    pub fn exists(conn: &Connection, habit_id: i64, date: &str) -> Result<bool> {
        let found: Option<i64> = conn
            .query_row(
                "SELECT id FROM habit_completions WHERE habit_id = ?1 AND completion_date = ?2",
                params![habit_id, date],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

// ─── Store ───────────────────────────────────────────────────────────────────

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Opening database at {:?}", path))?;

        // Enable WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Self::from_connection(conn)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }
}

impl CompletionSource for SqliteStore {
    fn completion_dates(&self, habit_id: i64) -> Result<Vec<NaiveDate>> {
        let raw = CompletionRepo::dates(&self.conn, habit_id)?;
        Ok(parse_dates(&raw)?)
    }
}

impl HabitStore for SqliteStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Sqlite
    }

    fn create_habit(&self, habit: &NewHabit) -> Result<Habit> {
        let id = HabitRepo::insert(&self.conn, habit)?;
        self.require_habit(id)
    }

    fn find_habit(&self, id: i64) -> Result<Option<Habit>> {
        HabitRepo::get(&self.conn, id)
    }

    fn list_habits(&self, filter: &HabitFilter) -> Result<Vec<Habit>> {
        HabitRepo::list(&self.conn, filter)
    }

    fn update_habit(
        &self,
        id: i64,
        habit: &NewHabit,
        is_active: Option<bool>,
    ) -> Result<Option<Habit>> {
        if !HabitRepo::update(&self.conn, id, habit, is_active)? {
            return Ok(None);
        }
        HabitRepo::get(&self.conn, id)
    }

    fn delete_habit(&self, id: i64) -> Result<bool> {
        HabitRepo::delete(&self.conn, id)
    }

    fn set_active(&self, id: i64, active: bool) -> Result<()> {
        HabitRepo::set_active(&self.conn, id, active)
    }

    fn mark_complete(&self, habit_id: i64, date: NaiveDate) -> Result<i64> {
        CompletionRepo::mark(&self.conn, habit_id, &format_date(date))
    }

    fn remove_completion(&self, habit_id: i64, date: NaiveDate) -> Result<bool> {
        CompletionRepo::remove(&self.conn, habit_id, &format_date(date))
    }

    fn completions(&self, habit_id: i64, limit: Option<usize>) -> Result<Vec<CompletionRecord>> {
        CompletionRepo::recent(&self.conn, habit_id, limit)
    }

    fn completions_between(
        &self,
        habit_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CompletionRecord>> {
        CompletionRepo::between(&self.conn, habit_id, &format_date(start), &format_date(end))
    }

    fn is_completed_on(&self, habit_id: i64, date: NaiveDate) -> Result<bool> {
        CompletionRepo::exists(&self.conn, habit_id, &format_date(date))
    }
}
