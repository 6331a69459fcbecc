mod events;

use std::fs;
use std::path::{Path, PathBuf};

use mafia_core::game::config::EngineConfig;
use mafia_core::{Session, SessionReport};
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{ReplayConfig, ResolvedOutputs};
use crate::logging::LoggingGuard;
use crate::telemetry::{TelemetryError, TelemetryOutputs, write_summary_outputs};

pub use events::{EventLine, load_events};

/// Replays an event file through a fresh session and writes its report.
pub struct ReplayRunner {
    config: ReplayConfig,
    outputs: ResolvedOutputs,
    engine: EngineConfig,
    logging: Option<LoggingGuard>,
}

/// Summary details returned after a run.
#[derive(Debug)]
pub struct RunSummary {
    pub run_id: String,
    pub lines_replayed: usize,
    pub messages: usize,
    pub eliminated: Vec<u8>,
    pub top_suggestion: Option<u8>,
    pub report_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
    pub telemetry_outputs: Option<TelemetryOutputs>,
}

impl ReplayRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: ReplayConfig, outputs: ResolvedOutputs) -> Result<Self, ReplayError> {
        if !outputs.events.is_file() {
            return Err(ReplayError::MissingEvents {
                path: outputs.events.clone(),
            });
        }

        Ok(Self {
            engine: config.session.engine_config(),
            logging: None,
            config,
            outputs,
        })
    }

    /// Hands the telemetry writer to the runner so the log is complete
    /// before it is summarised.
    pub fn with_logging(mut self, guard: Option<LoggingGuard>) -> Self {
        self.logging = guard;
        self
    }

    pub fn engine_config(&self) -> &EngineConfig {
        &self.engine
    }

    /// Replay every event in file order and write the report JSON.
    pub fn run(self) -> Result<RunSummary, ReplayError> {
        let lines = load_events(&self.outputs.events).map_err(|source| ReplayError::Read {
            path: self.outputs.events.clone(),
            source,
        })?;

        let mut session = Session::new(self.engine);
        for line in &lines {
            let before = session.messages().len();
            session.process_line(&line.text);
            if session.messages().len() > before {
                event!(
                    target: "mafia_replay::run",
                    Level::DEBUG,
                    line_number = line.line_number,
                    text = %line.text,
                    "line produced messages"
                );
            }
        }

        let report = session.report();
        write_report(&self.outputs.report_json, &report)?;

        event!(
            target: "mafia_replay::run",
            Level::INFO,
            run_id = %self.config.run_id,
            lines = lines.len(),
            messages = report.messages.len(),
            eliminated = report.eliminated_players.len(),
            "replay complete"
        );

        let telemetry_path = self.logging.map(LoggingGuard::finish);

        let telemetry_outputs = match telemetry_path.as_ref() {
            Some(path) => write_summary_outputs(path, &self.outputs.telemetry_dir)?,
            None => None,
        };

        Ok(RunSummary {
            run_id: self.config.run_id,
            lines_replayed: lines.len(),
            messages: report.messages.len(),
            eliminated: report.eliminated_players.iter().map(|p| p.id()).collect(),
            top_suggestion: report.advisor.first().map(|rec| rec.player.id()),
            report_path: self.outputs.report_json,
            telemetry_path,
            telemetry_outputs,
        })
    }
}

fn write_report(path: &Path, report: &SessionReport) -> Result<(), ReplayError> {
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let json = report.to_json()?;
    fs::write(path, json)?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("events file {path:?} does not exist")]
    MissingEvents { path: PathBuf },
    #[error("failed to read events from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("telemetry summarisation failed: {0}")]
    Telemetry(#[from] TelemetryError),
}
