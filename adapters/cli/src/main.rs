#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for inspecting run history, choosing levels and
//! playing headless Last Stand sessions.

mod config;
mod simulate;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use last_stand_core::{format_clock, LevelNumber, RunRecord, SelectedLevel};
use last_stand_store::FileStore;
use last_stand_system_levels::LevelRegistry;
use last_stand_system_records::RunRecordStore;
use last_stand_system_session::TransitionLog;
use time::format_description::well_known::Rfc3339;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::GameConfig;
use crate::simulate::Plan;

#[derive(Debug, Parser)]
#[command(name = "last-stand", version, about = "Last Stand session tools")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "last_stand.toml")]
    config: PathBuf,
    /// Overrides the preference store location from the configuration.
    #[arg(long)]
    store: Option<PathBuf>,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Lists every stored run record.
    Records,
    /// Shows the fastest completed run for a level.
    Best {
        #[arg(long)]
        level: u32,
    },
    /// Deletes the run history.
    Clear,
    /// Makes a level current, as the level menu does.
    Select {
        #[arg(long)]
        level: u32,
    },
    /// Lists the level table and marks the current level.
    Levels,
    /// Plays the current level headlessly with seeded kill timings.
    Simulate {
        /// Entities eliminated during the run.
        #[arg(long, default_value_t = 20)]
        kills: u32,
        /// Simulated seconds before the run is abandoned.
        #[arg(long, default_value_t = 300)]
        seconds: u32,
        #[arg(long, default_value_t = 0)]
        seed: u64,
    },
}

/// Entry point for the Last Stand command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = GameConfig::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    let store_path = cli.store.unwrap_or_else(|| config.store_path.clone());
    let mut store = FileStore::open(&store_path)
        .with_context(|| format!("failed to open preference store {}", store_path.display()))?;

    match cli.command {
        CliCommand::Records => {
            let history = RunRecordStore::new(&mut store);
            let records = history.all();
            if records.is_empty() {
                println!("No records yet.");
            }
            for (index, record) in records.iter().enumerate() {
                println!("#{:<3} {}", index + 1, describe(record));
            }
        }
        CliCommand::Best { level } => {
            let history = RunRecordStore::new(&mut store);
            match history.best_for_level(LevelNumber::new(level)) {
                Some(record) => println!("Best time: {}", format_clock(record.time_taken())),
                None => println!("Best time: --:--"),
            }
        }
        CliCommand::Clear => {
            let mut history = RunRecordStore::new(&mut store);
            let cleared = history.total_records();
            history.clear();
            println!("Cleared {cleared} records.");
        }
        CliCommand::Select { level } => {
            let mut registry = LevelRegistry::load(config.level_table()?, &store);
            let selection = registry.select(LevelNumber::new(level), &mut store);
            if selection.level.get() != level {
                println!("Level {level} does not exist.");
            }
            println!(
                "Level {}: {} entities in {}",
                selection.level.get(),
                selection.entity_count,
                format_clock(selection.time_limit)
            );
        }
        CliCommand::Levels => {
            let registry = LevelRegistry::load(config.level_table()?, &store);
            for level in registry.table().iter() {
                let marker = if level.level() == registry.current_level() {
                    '*'
                } else {
                    ' '
                };
                println!(
                    "{marker} Level {}: {} entities in {}",
                    level.level().get(),
                    level.entity_count(),
                    format_clock(level.time_limit())
                );
            }
        }
        CliCommand::Simulate {
            kills,
            seconds,
            seed,
        } => {
            let registry = LevelRegistry::load(config.level_table()?, &store);
            let selection = SelectedLevel::from_config(&registry.current_config());
            let mut history = RunRecordStore::with_layout(&mut store, config.record_layout);
            let mut transitions = TransitionLog::new();

            let summary = simulate::run(
                config.arena_config()?,
                Plan {
                    selection,
                    kills,
                    seconds,
                    seed,
                },
                &mut history,
                &mut transitions,
            );

            info!(
                outcome = ?summary.outcome,
                kills = summary.kills,
                elapsed_secs = summary.elapsed.as_secs_f32(),
                "simulation_finished"
            );
            for destination in transitions.requests() {
                info!(?destination, "scene_transition_requested");
            }
            match summary.outcome {
                Some(outcome) => println!(
                    "{outcome:?} on level {} with {} kills and {} left",
                    selection.level.get(),
                    summary.kills,
                    format_clock(summary.time_remaining)
                ),
                None => println!(
                    "Abandoned after {} with {} kills",
                    format_clock(summary.elapsed),
                    summary.kills
                ),
            }
        }
    }

    Ok(())
}

fn describe(record: &RunRecord) -> String {
    let status = if record.completed { "cleared" } else { "failed" };
    let recorded_at = record
        .recorded_at
        .and_then(|stamp| stamp.format(&Rfc3339).ok())
        .unwrap_or_else(|| "unknown date".to_owned());
    format!(
        "level {} {status:<7} {} kills in {} ({recorded_at})",
        record.level.get(),
        record.entities_killed,
        format_clock(record.time_taken()),
    )
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
