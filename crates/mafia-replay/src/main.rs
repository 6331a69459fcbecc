use std::path::PathBuf;

use clap::Parser;

use mafia_replay::config::{ReplayConfig, ResolvedOutputs};
use mafia_replay::logging::init_logging;
use mafia_replay::replay::ReplayRunner;

/// Replays a recorded game through the deduction engine.
#[derive(Debug, Parser)]
#[command(
    name = "mafia-replay",
    author,
    version,
    about = "Deterministic Mafia event replay harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "demos/replay.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the events file to replay.
    #[arg(long, value_name = "FILE")]
    events: Option<String>,

    /// Override the number of players at the table.
    #[arg(long, value_name = "COUNT")]
    roster_size: Option<u8>,

    /// Exit after validating the configuration (no replay is run).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = ReplayConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(events) = cli.events {
        config.inputs.events = events;
    }

    if let Some(roster_size) = cli.roster_size {
        config.session.roster_size = roster_size;
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let roster_size = config.session.roster_size;

    println!(
        "Loaded configuration '{run_id}' for {roster_size} players from {}",
        outputs.events.display()
    );

    let logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = ReplayRunner::new(config, outputs)?.with_logging(logging_guard);

    if cli.validate_only {
        println!("Validation-only mode: replay skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Replay complete for '{run_id}': {} lines, {} messages → {}",
        summary.lines_replayed,
        summary.messages,
        summary.report_path.display()
    );
    if summary.eliminated.is_empty() {
        println!("Eliminated: none");
    } else {
        println!("Eliminated: {:?}", summary.eliminated);
    }
    if let Some(player) = summary.top_suggestion {
        println!("Suggested check: player {player}");
    }
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }
    if let Some(outputs) = summary.telemetry_outputs.as_ref() {
        println!("Telemetry summary (JSON): {}", outputs.json_path.display());
        println!(
            "Telemetry summary (Markdown): {}",
            outputs.markdown_path.display()
        );
        println!(
            "  Diagnostics logged: {}",
            outputs.summary.actions.diagnostics
        );
    }

    Ok(())
}
