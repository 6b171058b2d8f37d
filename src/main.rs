mod cli;
mod config;
mod db;
mod engine;
mod models;
mod report;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use log::debug;

use cli::args::{Cli, Commands};
use cli::handlers;
use config::AppConfig;

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Loading config")?;

    // Resolve storage once; everything below receives the store explicitly
    let backend = cli.storage.unwrap_or(config.storage.backend);
    let data_dir = config.ensure_data_dir()?;
    debug!("requested {} storage in {:?}", backend.as_str(), data_dir);
    let store = db::open_store(backend, &data_dir)?;
    let store = store.as_ref();

    match cli.command {
        Some(Commands::Add {
            name,
            category,
            frequency,
            goal,
            description,
        }) => {
            handlers::handle_add(store, &name, &category, &frequency, goal, description)?;
        }
        Some(Commands::List {
            category,
            active,
            inactive,
        }) => {
            handlers::handle_list(store, &config, category.as_deref(), active, inactive)?;
        }
        Some(Commands::Show { id }) => {
            handlers::handle_show(store, &config, id)?;
        }
        Some(Commands::Edit {
            id,
            name,
            category,
            frequency,
            goal,
            description,
            active,
        }) => {
            handlers::handle_edit(
                store,
                id,
                name,
                category.as_deref(),
                frequency.as_deref(),
                goal,
                description,
                active,
            )?;
        }
        Some(Commands::Delete { id }) => {
            handlers::handle_delete(store, id)?;
        }
        Some(Commands::Done { id, date }) => {
            handlers::handle_done(store, &config, id, date.as_deref())?;
        }
        Some(Commands::Undo { id, date }) => {
            handlers::handle_undo(store, &config, id, date.as_deref())?;
        }
        Some(Commands::History { id, from, to }) => {
            handlers::handle_history(store, id, from.as_deref(), to.as_deref())?;
        }
        Some(Commands::Consistency { days }) => {
            handlers::handle_consistency(store, &config, days)?;
        }
        Some(Commands::Export { json }) => {
            handlers::handle_export(store, &config, json)?;
        }

        // No subcommand → dashboard
        Some(Commands::Stats) | None => {
            handlers::handle_stats(store, &config)?;
        }
    }

    Ok(())
}
