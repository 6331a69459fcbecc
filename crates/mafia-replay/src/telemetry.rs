use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse telemetry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct TelemetrySummary {
    pub actions: ActionTelemetrySummary,
    pub voting: VotingTelemetrySummary,
    pub advisor: AdvisorTelemetrySummary,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct ActionTelemetrySummary {
    /// Applied actions keyed by code.
    pub applied: BTreeMap<String, usize>,
    pub diagnostics: usize,
    pub diagnostic_counts: BTreeMap<String, usize>,
    /// Eliminated player ids in log order.
    pub eliminations: Vec<u64>,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct VotingTelemetrySummary {
    pub resolutions: usize,
    pub runoffs: usize,
    pub deadlocks: usize,
}

#[derive(Debug, Default, Serialize, PartialEq)]
pub struct AdvisorTelemetrySummary {
    pub suggestions: usize,
    pub empty_spaces: usize,
    pub best_gain_bits: Option<f64>,
}

/// Aggregate the engine's structured events from a telemetry log.
pub fn summarise_telemetry(path: &Path) -> Result<TelemetrySummary, TelemetryError> {
    if !path.exists() {
        return Ok(TelemetrySummary::default());
    }

    let file = File::open(path).map_err(|source| TelemetryError::Io {
        context: "opening telemetry log",
        source,
    })?;
    let reader = BufReader::new(file);
    let mut summary = TelemetrySummary::default();

    for line in reader.lines() {
        let line = line.map_err(|source| TelemetryError::Io {
            context: "reading telemetry line",
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }

        let payload: Value = serde_json::from_str(&line)?;
        let target = payload
            .get("target")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let fields = payload
            .get("fields")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        let message = fields
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default();

        match (target, message) {
            ("mafia_core::session", "action applied") => {
                let code = fields
                    .get("action")
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or("<unset>");
                *summary
                    .actions
                    .applied
                    .entry(code.to_string())
                    .or_insert(0) += 1;
            }
            ("mafia_core::session", "event rejected") => {
                summary.actions.diagnostics += 1;
                let text = fields
                    .get("diagnostic")
                    .and_then(Value::as_str)
                    .unwrap_or("<unset>");
                *summary
                    .actions
                    .diagnostic_counts
                    .entry(text.to_string())
                    .or_insert(0) += 1;
            }
            ("mafia_core::session", "player eliminated")
            | ("mafia_core::session", "player eliminated by vote") => {
                if let Some(player) = fields.get("player").and_then(Value::as_u64) {
                    summary.actions.eliminations.push(player);
                }
            }
            ("mafia_core::voting", "vote resolved with a single candidate") => {
                summary.voting.resolutions += 1;
            }
            ("mafia_core::voting", "vote tied, collecting a second round") => {
                summary.voting.runoffs += 1;
            }
            ("mafia_core::voting", "second round tied, awaiting vel or novel") => {
                summary.voting.deadlocks += 1;
            }
            ("mafia_core::advisor", "suggested check") => {
                summary.advisor.suggestions += 1;
                if let Some(gain) = fields.get("info_gain_bits").and_then(Value::as_f64) {
                    let best = summary.advisor.best_gain_bits.get_or_insert(gain);
                    if gain > *best {
                        *best = gain;
                    }
                }
            }
            ("mafia_core::advisor", "no possible mafia teams with the current information") => {
                summary.advisor.empty_spaces += 1;
            }
            _ => {}
        }
    }

    Ok(summary)
}

pub fn write_summary_outputs(
    telemetry_path: &Path,
    output_dir: &Path,
) -> Result<Option<TelemetryOutputs>, TelemetryError> {
    if !telemetry_path.exists() {
        return Ok(None);
    }

    let summary = summarise_telemetry(telemetry_path)?;
    let json_path = output_dir.join("telemetry_summary.json");
    let md_path = output_dir.join("telemetry_summary.md");

    std::fs::write(
        &json_path,
        serde_json::to_vec_pretty(&summary).map_err(TelemetryError::from)?,
    )
    .map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary json",
        source,
    })?;

    let markdown = render_markdown(&summary, telemetry_path);
    std::fs::write(&md_path, markdown).map_err(|source| TelemetryError::Io {
        context: "writing telemetry summary markdown",
        source,
    })?;

    Ok(Some(TelemetryOutputs {
        summary,
        json_path,
        markdown_path: md_path,
    }))
}

fn render_markdown(summary: &TelemetrySummary, telemetry_path: &Path) -> String {
    let mut output = String::new();
    output.push_str("# Telemetry Summary\n\n");
    output.push_str(&format!("- Source: `{}`\n", telemetry_path.display()));
    output.push('\n');

    output.push_str("## Actions\n");
    if summary.actions.applied.is_empty() {
        output.push_str("- <none>\n");
    } else {
        for (code, count) in &summary.actions.applied {
            output.push_str(&format!("- {code}: {count}\n"));
        }
    }
    output.push_str(&format!("- Diagnostics: {}\n", summary.actions.diagnostics));
    if !summary.actions.eliminations.is_empty() {
        let ids: Vec<String> = summary
            .actions
            .eliminations
            .iter()
            .map(u64::to_string)
            .collect();
        output.push_str(&format!("- Eliminated: {}\n", ids.join(", ")));
    }
    output.push('\n');

    output.push_str("## Voting\n");
    output.push_str(&format!(
        "- Resolutions: {}\n- Runoffs: {}\n- Deadlocks: {}\n",
        summary.voting.resolutions, summary.voting.runoffs, summary.voting.deadlocks
    ));
    output.push('\n');

    output.push_str("## Advisor\n");
    output.push_str(&format!("- Suggestions: {}\n", summary.advisor.suggestions));
    if let Some(best) = summary.advisor.best_gain_bits {
        output.push_str(&format!("- Best gain: {best:.3} bits\n"));
    }
    if summary.advisor.empty_spaces > 0 {
        output.push_str(&format!(
            "- Empty candidate spaces: {}\n",
            summary.advisor.empty_spaces
        ));
    }
    output
}

#[derive(Debug)]
pub struct TelemetryOutputs {
    pub summary: TelemetrySummary,
    pub json_path: PathBuf,
    pub markdown_path: PathBuf,
}
