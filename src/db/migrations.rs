use anyhow::Result;
use log::debug;
use rusqlite::Connection;

pub fn run_migrations(conn: &Connection) -> Result<()> {
    conn.execute_batch("
        CREATE TABLE IF NOT EXISTS habits (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            name         TEXT NOT NULL,
            description  TEXT,
            category     TEXT NOT NULL
                         CHECK(category IN ('health','productivity','finance','personal','study','social','creativity')),
            frequency    TEXT NOT NULL CHECK(frequency IN ('daily','weekly','monthly')),
            goal         TEXT,
            is_active    INTEGER NOT NULL DEFAULT 1,
            created_at   TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS habit_completions (
            id               INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_id         INTEGER NOT NULL REFERENCES habits(id) ON DELETE CASCADE,
            completion_date  TEXT NOT NULL,
            created_at       TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(habit_id, completion_date)
        );

        CREATE INDEX IF NOT EXISTS idx_completions_habit_date
            ON habit_completions (habit_id, completion_date);
    ")?;

    debug!("schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_are_repeatable() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        run_migrations(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'
                 AND name IN ('habits', 'habit_completions')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 2);
    }

    #[test]
    fn one_completion_per_habit_and_day() {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn.execute(
            "INSERT INTO habits (name, category, frequency) VALUES ('Run', 'health', 'daily')",
            [],
        )
        .unwrap();

        let insert = "INSERT INTO habit_completions (habit_id, completion_date) VALUES (1, '2024-03-15')";
        conn.execute(insert, []).unwrap();
        assert!(conn.execute(insert, []).is_err());
    }
}
