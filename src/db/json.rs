use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{CompletionSource, HabitStore};
use crate::config::StorageBackend;
use crate::models::{CompletionRecord, Habit, HabitFilter, NewHabit};

#[derive(Debug, Default, Serialize, Deserialize)]
struct JsonData {
    #[serde(default)]
    habits: Vec<Habit>,
    #[serde(default)]
    habit_completions: Vec<CompletionRecord>,
}

impl JsonData {
    fn next_habit_id(&self) -> i64 {
        self.habits.iter().map(|h| h.id).max().unwrap_or(0) + 1
    }

    fn next_completion_id(&self) -> i64 {
        self.habit_completions.iter().map(|c| c.id).max().unwrap_or(0) + 1
    }

    fn habit_mut(&mut self, id: i64) -> Option<&mut Habit> {
        self.habits.iter_mut().find(|h| h.id == id)
    }

    fn completions_of(&self, habit_id: i64) -> impl Iterator<Item = &CompletionRecord> {
        self.habit_completions
            .iter()
            .filter(move |c| c.habit_id == habit_id)
    }
}

/// Flat-file store: the whole document is read for every call and rewritten after every change.
pub struct JsonStore {
    path: PathBuf,
}

impl JsonStore {
    pub fn open(path: &Path) -> Result<Self> {
        let store = Self {
            path: path.to_path_buf(),
        };
        store.load()?;
        Ok(store)
    }

    fn load(&self) -> Result<JsonData> {
        if !self.path.exists() {
            debug!("creating {}", self.path.display());
            let data = JsonData::default();
            self.save(&data)?;
            return Ok(data);
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Reading {:?}", self.path))?;
        serde_json::from_str(&content).with_context(|| format!("Parsing {:?}", self.path))
    }

    fn save(&self, data: &JsonData) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(data).context("Serializing data")?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, content).with_context(|| format!("Writing {:?}", tmp))?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Replacing {:?}", self.path))?;
        Ok(())
    }
}

impl CompletionSource for JsonStore {
    fn completion_dates(&self, habit_id: i64) -> Result<Vec<NaiveDate>> {
        let data = self.load()?;
        let mut dates: Vec<NaiveDate> = data
            .completions_of(habit_id)
            .map(|c| c.completion_date)
            .collect();
        dates.sort_unstable_by(|a, b| b.cmp(a));
        Ok(dates)
    }
}

impl HabitStore for JsonStore {
    fn backend(&self) -> StorageBackend {
        StorageBackend::Json
    }

    fn create_habit(&self, habit: &NewHabit) -> Result<Habit> {
        let mut data = self.load()?;
        let created = Habit {
            id: data.next_habit_id(),
            name: habit.name.clone(),
            description: habit.description.clone(),
            category: habit.category,
            frequency: habit.frequency,
            goal: habit.goal.clone(),
            is_active: true,
            created_at: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        data.habits.push(created.clone());
        self.save(&data)?;
        Ok(created)
    }

    fn find_habit(&self, id: i64) -> Result<Option<Habit>> {
        Ok(self.load()?.habits.into_iter().find(|h| h.id == id))
    }

    fn list_habits(&self, filter: &HabitFilter) -> Result<Vec<Habit>> {
        let mut habits: Vec<Habit> = self
            .load()?
            .habits
            .into_iter()
            .filter(|h| filter.matches(h))
            .collect();
        habits.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(habits)
    }

    fn update_habit(
        &self,
        id: i64,
        habit: &NewHabit,
        is_active: Option<bool>,
    ) -> Result<Option<Habit>> {
        let mut data = self.load()?;
        let Some(stored) = data.habit_mut(id) else {
            return Ok(None);
        };
        stored.name = habit.name.clone();
        stored.description = habit.description.clone();
        stored.category = habit.category;
        stored.frequency = habit.frequency;
        stored.goal = habit.goal.clone();
        if let Some(active) = is_active {
            stored.is_active = active;
        }
        let updated = stored.clone();
        self.save(&data)?;
        Ok(Some(updated))
    }

    fn delete_habit(&self, id: i64) -> Result<bool> {
        let mut data = self.load()?;
        let before = data.habits.len();
        data.habits.retain(|h| h.id != id);
        if data.habits.len() == before {
            return Ok(false);
        }
        data.habit_completions.retain(|c| c.habit_id != id);
        self.save(&data)?;
        Ok(true)
    }

    fn set_active(&self, id: i64, active: bool) -> Result<()> {
        let mut data = self.load()?;
        if let Some(habit) = data.habit_mut(id) {
            if habit.is_active != active {
                habit.is_active = active;
                self.save(&data)?;
            }
        }
        Ok(())
    }

    fn mark_complete(&self, habit_id: i64, date: NaiveDate) -> Result<i64> {
        let mut data = self.load()?;
        if let Some(existing) = data
            .completions_of(habit_id)
            .find(|c| c.completion_date == date)
        {
            return Ok(existing.id);
        }
        if !data.habits.iter().any(|h| h.id == habit_id) {
            anyhow::bail!(super::StoreError::HabitNotFound(habit_id));
        }

        let id = data.next_completion_id();
        data.habit_completions.push(CompletionRecord {
            id,
            habit_id,
            completion_date: date,
        });
        self.save(&data)?;
        Ok(id)
    }

    fn remove_completion(&self, habit_id: i64, date: NaiveDate) -> Result<bool> {
        let mut data = self.load()?;
        let Some(index) = data
            .habit_completions
            .iter()
            .position(|c| c.habit_id == habit_id && c.completion_date == date)
        else {
            return Ok(false);
        };
        data.habit_completions.remove(index);
        self.save(&data)?;
        Ok(true)
    }

    fn completions(&self, habit_id: i64, limit: Option<usize>) -> Result<Vec<CompletionRecord>> {
        let data = self.load()?;
        let mut completions: Vec<CompletionRecord> =
            data.completions_of(habit_id).cloned().collect();
        completions.sort_by(|a, b| b.completion_date.cmp(&a.completion_date));
        if let Some(limit) = limit {
            completions.truncate(limit);
        }
        Ok(completions)
    }

    fn completions_between(
        &self,
        habit_id: i64,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<CompletionRecord>> {
        let data = self.load()?;
        let mut completions: Vec<CompletionRecord> = data
            .completions_of(habit_id)
            .filter(|c| c.completion_date >= start && c.completion_date <= end)
            .cloned()
            .collect();
        completions.sort_by(|a, b| a.completion_date.cmp(&b.completion_date));
        Ok(completions)
    }

    fn is_completed_on(&self, habit_id: i64, date: NaiveDate) -> Result<bool> {
        let data = self.load()?;
        let found = data
            .completions_of(habit_id)
            .any(|c| c.completion_date == date);
        Ok(found)
    }
}
