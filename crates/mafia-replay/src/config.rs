use mafia_core::game::config::{EngineConfig, MAX_ROSTER_SIZE, MIN_ROSTER_SIZE};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::Level;

const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root replay configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ReplayConfig {
    pub run_id: String,
    #[serde(default)]
    pub session: SessionConfig,
    pub inputs: InputsConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ReplayConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let reader = BufReader::new(file);
        let mut cfg: ReplayConfig =
            serde_yaml::from_reader(reader).map_err(|source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            })?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.session.validate()?;
        self.inputs.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        let report_json = resolve_template(&self.run_id, &self.outputs.report_json);
        let telemetry_dir = report_json
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ResolvedOutputs {
            events: resolve_template(&self.run_id, &self.inputs.events),
            report_json,
            telemetry_jsonl: telemetry_dir.join("telemetry.jsonl"),
            telemetry_dir,
        }
    }
}

/// Engine parameters for the replayed session.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SessionConfig {
    #[serde(default = "default_roster_size")]
    pub roster_size: u8,
    #[serde(default = "default_top_triplets")]
    pub top_triplets: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            roster_size: default_roster_size(),
            top_triplets: default_top_triplets(),
        }
    }
}

impl SessionConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_ROSTER_SIZE..=MAX_ROSTER_SIZE).contains(&self.roster_size) {
            return Err(ValidationError::InvalidField {
                field: "session.roster_size".to_string(),
                message: format!(
                    "roster size must be between {MIN_ROSTER_SIZE} and {MAX_ROSTER_SIZE}"
                ),
            });
        }

        if self.top_triplets == 0 {
            return Err(ValidationError::InvalidField {
                field: "session.top_triplets".to_string(),
                message: "top_triplets must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_roster_size(self.roster_size)
            .with_top_triplets(self.top_triplets)
    }
}

fn default_roster_size() -> u8 {
    EngineConfig::from_env().roster_size
}

fn default_top_triplets() -> usize {
    EngineConfig::from_env().top_triplets
}

/// Input artifacts.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct InputsConfig {
    /// Newline-separated event file.
    pub events: String,
}

impl InputsConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.events.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "inputs.events".to_string(),
                message: "path must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub report_json: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        if self.report_json.trim().is_empty() {
            return Err(ValidationError::InvalidField {
                field: "outputs.report_json".to_string(),
                message: "path must not be empty".to_string(),
            });
        }

        let resolved = resolve_template(run_id, &self.report_json);
        if resolved.file_name().is_none() {
            return Err(ValidationError::InvalidField {
                field: "outputs.report_json".to_string(),
                message: "resolved path must name a file".to_string(),
            });
        }
        Ok(())
    }
}

/// Logging configuration defaults to disabled structured logs.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }

    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }

    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Fully resolved input and output paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub events: PathBuf,
    pub report_json: PathBuf,
    /// Directory next to the report that receives telemetry artifacts.
    pub telemetry_dir: PathBuf,
    pub telemetry_jsonl: PathBuf,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures captured with contextual metadata.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "night_one"
session:
  roster_size: 10
  top_triplets: 5
inputs:
  events: "demos/{run_id}.events"
outputs:
  report_json: "replay/out/{run_id}/report.json"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: ReplayConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.session.top_triplets, 5);
        assert!(cfg.logging.enable_structured);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));

        let outputs = cfg.resolved_outputs();
        assert_eq!(outputs.events, PathBuf::from("demos/night_one.events"));
        assert_eq!(
            outputs.report_json,
            PathBuf::from("replay/out/night_one/report.json")
        );
        assert_eq!(
            outputs.telemetry_jsonl,
            PathBuf::from("replay/out/night_one/telemetry.jsonl")
        );
    }

    #[test]
    fn session_block_defaults() {
        let yaml = BASIC_YAML.replace("session:\n  roster_size: 10\n  top_triplets: 5\n", "");
        let mut cfg: ReplayConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.session, SessionConfig::default());
        assert_eq!(cfg.session.engine_config(), EngineConfig::from_env());
    }

    #[test]
    fn rejects_out_of_range_roster() {
        let yaml = BASIC_YAML.replace("roster_size: 10", "roster_size: 3");
        let mut cfg: ReplayConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("small roster");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "session.roster_size"
        ));
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("night_one", "night one");
        let mut cfg: ReplayConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("invalid run id");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "run_id"
        ));
    }

    #[test]
    fn rejects_empty_events_path() {
        let yaml = BASIC_YAML.replace("demos/{run_id}.events", " ");
        let mut cfg: ReplayConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("empty events path");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "inputs.events"
        ));
    }

    #[test]
    fn blank_level_falls_back_to_info() {
        let yaml = BASIC_YAML.replace("tracing_level: \"debug\"", "tracing_level: \"\"");
        let mut cfg: ReplayConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(cfg.logging.level(), Some(Level::INFO));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ReplayConfig::from_path("does/not/exist.yaml").expect_err("missing");
        assert!(matches!(err, ConfigError::Read { .. }));
        assert_eq!(err.path(), Path::new("does/not/exist.yaml"));
    }
}
