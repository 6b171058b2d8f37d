use clap::{Parser, Subcommand};

use crate::config::StorageBackend;

#[derive(Parser, Debug)]
#[command(name = "growtrack", version, about = "Track habits, streaks and consistency from the terminal")]
pub struct Cli {
    /// Storage backend for this run (overrides config.toml)
    #[arg(long, global = true, value_enum)]
    pub storage: Option<StorageBackend>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a habit
    Add {
        /// Habit name
        name: String,
        /// health, productivity, finance, personal, study, social, creativity
        #[arg(long, short)]
        category: String,
        /// daily, weekly or monthly
        #[arg(long, short, default_value = "daily")]
        frequency: String,
        /// Free-form goal, e.g. "20 pages"
        #[arg(long)]
        goal: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List habits with their streaks
    List {
        /// Only habits in this category
        #[arg(long, short)]
        category: Option<String>,
        /// Only active habits
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        /// Only inactive habits
        #[arg(long)]
        inactive: bool,
    },
    /// Show one habit with its statistics
    Show { id: i64 },
    /// Change a habit
    Edit {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long, short)]
        frequency: Option<String>,
        #[arg(long)]
        goal: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// Force the active flag
        #[arg(long)]
        active: Option<bool>,
    },
    /// Delete a habit and its history
    Delete { id: i64 },
    /// Mark a habit as done
    Done {
        id: i64,
        /// Day to record (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// Remove a completion
    Undo {
        id: i64,
        /// Day to remove (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<String>,
    },
    /// List the days a habit was done, or every habit's when no id is given
    History {
        id: Option<i64>,
        /// First day of the range (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,
        /// Last day of the range (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },
    /// Show the dashboard
    Stats,
    /// Consistency score for every habit
    Consistency {
        /// Lookback window in days (defaults to config)
        #[arg(long)]
        days: Option<u32>,
    },
    /// Export a weekly summary to stdout
    Export {
        /// Print the dashboard as JSON instead
        #[arg(long)]
        json: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_done_with_date_and_storage() {
        let cli = Cli::try_parse_from(["growtrack", "--storage", "json", "done", "3", "--date", "2024-03-15"]).unwrap();
        assert_eq!(cli.storage, Some(StorageBackend::Json));
        match cli.command {
            Some(Commands::Done { id, date }) => {
                assert_eq!(id, 3);
                assert_eq!(date.as_deref(), Some("2024-03-15"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let cli = Cli::try_parse_from(["growtrack"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.storage.is_none());
    }

    #[test]
    fn list_flags_conflict() {
        assert!(Cli::try_parse_from(["growtrack", "list", "--active", "--inactive"]).is_err());
    }

    #[test]
    fn history_range_needs_both_ends() {
        assert!(Cli::try_parse_from(["growtrack", "history", "1", "--from", "2024-01-01"]).is_err());
        assert!(Cli::try_parse_from(["growtrack", "history", "1", "--from", "2024-01-01", "--to", "2024-01-31"]).is_ok());
    }

    #[test]
    fn history_id_is_optional() {
        let cli = Cli::try_parse_from(["growtrack", "history"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::History { id: None, .. })));
        let cli = Cli::try_parse_from(["growtrack", "history", "3"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::History { id: Some(3), .. })));
    }

    #[test]
    fn add_defaults_to_daily() {
        let cli = Cli::try_parse_from(["growtrack", "add", "Read", "-c", "study"]).unwrap();
        match cli.command {
            Some(Commands::Add { name, category, frequency, goal, .. }) => {
                assert_eq!(name, "Read");
                assert_eq!(category, "study");
                assert_eq!(frequency, "daily");
                assert!(goal.is_none());
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
