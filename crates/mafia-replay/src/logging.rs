use std::fs::{self, File};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::Level;
use tracing_appender::non_blocking::{self, WorkerGuard};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::{EnvFilter, fmt};

use crate::config::{LoggingConfig, ResolvedOutputs};

/// Overrides the configured filter when set, using `EnvFilter` syntax.
pub const LOG_FILTER_ENV: &str = "MAFIA_LOG";

const ENGINE_TARGETS: [&str; 2] = ["mafia_core", "mafia_replay"];

/// Owns the background writer of the telemetry log.
pub struct LoggingGuard {
    guard: WorkerGuard,
    telemetry_path: PathBuf,
}

impl LoggingGuard {
    /// Stops the writer once every queued record is on disk.
    pub fn finish(self) -> PathBuf {
        drop(self.guard);
        self.telemetry_path
    }
}

/// Engine and harness targets at `level`; everything else only from WARN.
pub fn engine_filter(level: Level) -> Result<EnvFilter> {
    let level = level.as_str().to_ascii_lowercase();
    let mut filter = EnvFilter::new("warn");
    for target in ENGINE_TARGETS {
        let directive: Directive = format!("{target}={level}")
            .parse()
            .with_context(|| format!("building log directive for {target}"))?;
        filter = filter.add_directive(directive);
    }
    Ok(filter)
}

pub fn init_logging(
    logging: &LoggingConfig,
    outputs: &ResolvedOutputs,
    run_id: &str,
) -> Result<Option<LoggingGuard>> {
    if !logging.enable_structured {
        return Ok(None);
    }

    fs::create_dir_all(&outputs.telemetry_dir).with_context(|| {
        format!(
            "creating telemetry directory at {}",
            outputs.telemetry_dir.display()
        )
    })?;
    let file = File::create(&outputs.telemetry_jsonl).with_context(|| {
        format!(
            "creating telemetry file at {}",
            outputs.telemetry_jsonl.display()
        )
    })?;
    let (writer, guard) = non_blocking::NonBlockingBuilder::default()
        .lossy(false)
        .finish(file);

    let filter = match EnvFilter::try_from_env(LOG_FILTER_ENV) {
        Ok(filter) => filter,
        Err(_) => engine_filter(logging.level().unwrap_or(Level::INFO))?,
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .json()
        .with_current_span(false)
        .with_span_events(FmtSpan::NONE)
        .with_writer(writer)
        .finish();

    // Only the first replay in a process installs its subscriber.
    let _ = tracing::subscriber::set_global_default(subscriber);

    tracing::event!(
        target: "mafia_replay::run",
        Level::INFO,
        run_id,
        path = %outputs.telemetry_jsonl.display(),
        "structured logging enabled"
    );

    Ok(Some(LoggingGuard {
        guard,
        telemetry_path: outputs.telemetry_jsonl.clone(),
    }))
}
