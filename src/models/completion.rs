use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day on which a habit was done. Storage keeps at most one per habit and date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRecord {
    pub id: i64,
    pub habit_id: i64,
    pub completion_date: NaiveDate,
}
