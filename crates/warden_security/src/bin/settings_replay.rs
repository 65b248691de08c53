//! # Settings Replay
//!
//! Command-line tool to replay a settings check scenario.
//!
//! ## Usage
//!
//! ```bash
//! settings_replay scenario.toml --window-ms 1000
//! RUST_LOG=warden_security=debug settings_replay scenario.toml
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;
use warden_security::{ReplayOutcome, Scenario, SecurityResult};

/// Replays a scripted sequence of settings fragments against the check.
#[derive(Debug, Parser)]
#[command(name = "settings_replay", version, about)]
struct Args {
    /// Scenario file (TOML).
    scenario: PathBuf,

    /// Override the aggregation window, in milliseconds.
    #[arg(long)]
    window_ms: Option<u64>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    match run(&args) {
        Ok(outcome) => {
            report(&outcome);
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("Replay of {} failed: {}", args.scenario.display(), err);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> SecurityResult<ReplayOutcome> {
    tracing::info!("Loading scenario: {}", args.scenario.display());
    let scenario = Scenario::load(&args.scenario)?;
    tracing::info!(
        "{} players, {} events",
        scenario.players.len(),
        scenario.events.len()
    );
    scenario.run(args.window_ms)
}

fn report(outcome: &ReplayOutcome) {
    for record in &outcome.records {
        tracing::info!(
            "{} ({}) finalized: {} after {:?}",
            record.username,
            record.connection_id,
            record.cause,
            record.collected_for
        );
        for (key, value) in &record.settings {
            tracing::info!("  setting {} = {}", key, value);
        }
        for (key, value) in &record.skin_parts {
            tracing::info!("  skin    {} = {}", key, value);
        }
    }

    let stats = &outcome.stats;
    tracing::info!(
        "Delivered {} records ({} expired, {} disconnected, {} replaced), {} still pending",
        outcome.records.len(),
        stats.finalized_expired,
        stats.finalized_disconnected,
        stats.finalized_replaced,
        outcome.still_pending
    );
    tracing::info!(
        "Fragments: {} accepted, {} dropped (backend {}, privacy {}, unknown {}, checked {}, sealed {})",
        stats.fragments_accepted,
        stats.dropped_total(),
        stats.dropped_backend,
        stats.dropped_privacy,
        stats.dropped_unknown_player,
        stats.dropped_already_checked,
        stats.dropped_sealed
    );
}
