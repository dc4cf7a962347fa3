use crate::output::print_json;
use clap::Subcommand;
use gsd_core::error::GsdError;
use gsd_core::{config, roadmap, state};
use serde_json::json;
use std::path::Path;

#[derive(Subcommand)]
pub enum StateSubcommand {
    /// Read STATE.md, whole or one labelled field
    Get {
        field: Option<String>,
    },

    /// Parse STATE.md into a structured snapshot
    Snapshot,

    /// Set one labelled field, appending it when absent
    Update {
        field: String,
        value: String,
    },

    /// Replace several fields at once from a JSON object
    Patch {
        #[arg(long)]
        data: String,
    },

    /// Bump the plan counter within the current phase
    AdvancePlan,

    /// Append a row to the performance metrics table
    RecordMetric {
        #[arg(long)]
        phase: String,

        #[arg(long)]
        plan: String,

        #[arg(long)]
        duration: String,

        #[arg(long)]
        tasks: Option<i64>,

        #[arg(long)]
        files: Option<i64>,
    },

    /// Recompute the progress bar from completed plans
    UpdateProgress,

    /// Append a decision to the decision log
    AddDecision {
        #[arg(long)]
        phase: Option<String>,

        #[arg(long)]
        summary: String,

        #[arg(long)]
        rationale: Option<String>,
    },

    /// Append a blocker line
    AddBlocker {
        #[arg(long)]
        text: String,
    },

    /// Remove the first blocker containing the text
    ResolveBlocker {
        #[arg(long)]
        text: String,
    },

    /// Stamp session continuity fields for a later resume
    RecordSession {
        #[arg(long)]
        stopped_at: Option<String>,

        #[arg(long)]
        resume_file: Option<String>,
    },
}

pub fn run(root: &Path, subcommand: Option<StateSubcommand>) -> anyhow::Result<()> {
    let Some(subcommand) = subcommand else {
        return overview(root);
    };
    match subcommand {
        StateSubcommand::Get { field } => {
            let text = state::load(root)?
                .ok_or_else(|| GsdError::NotFound("STATE.md".to_string()))?;
            match field {
                None => print_json(&json!({ "content": text })),
                Some(field) => {
                    let value = state::get_field(&text, &field);
                    print_json(&json!({ field: value }))
                }
            }
        }
        StateSubcommand::Snapshot => match state::load(root)? {
            Some(text) => print_json(&state::snapshot(&text)),
            None => print_json(&json!({ "error": "STATE.md not found" })),
        },
        StateSubcommand::Update { field, value } => {
            if state::load(root)?.is_none() {
                return print_json(&json!({
                    "updated": false,
                    "reason": "STATE.md not found",
                }));
            }
            state::update_field(root, &field, &value)?;
            print_json(&json!({
                "updated": true,
                "field": field,
                "value": value,
            }))
        }
        StateSubcommand::Patch { data } => {
            let fields: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&data).map_err(|e| {
                    GsdError::InvalidInput(format!("--data is not a JSON object: {e}"))
                })?;
            let updates: Vec<(String, String)> = fields
                .into_iter()
                .map(|(label, value)| {
                    let value = match value {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (label, value)
                })
                .collect();
            let applied = state::patch(root, &updates)?;
            print_json(&json!({ "updated": applied }))
        }
        StateSubcommand::AdvancePlan => print_json(&state::advance_plan(root)?),
        StateSubcommand::RecordMetric {
            phase,
            plan,
            duration,
            tasks,
            files,
        } => {
            state::record_metric(root, &phase, &plan, &duration, tasks, files)?;
            print_json(&json!({
                "recorded": true,
                "phase": phase,
                "plan": plan,
            }))
        }
        StateSubcommand::UpdateProgress => {
            let progress = state::update_progress(root)?;
            print_json(&json!({
                "updated": true,
                "percent": progress.percent,
                "completed": progress.completed,
                "total": progress.total,
            }))
        }
        StateSubcommand::AddDecision {
            phase,
            summary,
            rationale,
        } => {
            state::add_decision(root, phase.as_deref(), &summary, rationale.as_deref())?;
            print_json(&json!({ "added": true }))
        }
        StateSubcommand::AddBlocker { text } => {
            state::add_blocker(root, &text)?;
            print_json(&json!({
                "added": true,
                "blocker": text,
            }))
        }
        StateSubcommand::ResolveBlocker { text } => {
            let removed = state::resolve_blocker(root, &text)?;
            if !removed {
                tracing::debug!(needle = %text, "no blocker matched");
            }
            print_json(&json!({ "resolved": true }))
        }
        StateSubcommand::RecordSession {
            stopped_at,
            resume_file,
        } => {
            let updated = state::record_session(root, stopped_at.as_deref(), resume_file.as_deref())?;
            print_json(&json!({
                "recorded": true,
                "updated": updated,
            }))
        }
    }
}

/// Planning-state overview used by agents to orient before any work.
fn overview(root: &Path) -> anyhow::Result<()> {
    let config = config::load(root);
    let state_raw = state::load(root)?;
    let roadmap_exists = roadmap::load(root)?.is_some();
    print_json(&json!({
        "config_exists": config.exists,
        "state_exists": state_raw.is_some(),
        "roadmap_exists": roadmap_exists,
        "config": config.values,
        "state_raw": state_raw,
    }))
}

#[cfg(test)]
mod tests {
    use gsd_core::{io, paths, state};
    use tempfile::TempDir;

    #[test]
    fn overview_reports_missing_planning_dir() {
        let dir = TempDir::new().unwrap();
        let config = gsd_core::config::load(dir.path());
        assert!(!config.exists);
        assert!(state::load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn patch_skips_absent_labels() {
        let dir = TempDir::new().unwrap();
        io::ensure_dir(&paths::planning_dir(dir.path())).unwrap();
        io::atomic_write(
            &paths::state_path(dir.path()),
            "# State\n\n**Status:** In progress\n",
        )
        .unwrap();
        let applied = state::patch(
            dir.path(),
            &[
                ("Status".to_string(), "Blocked".to_string()),
                ("Missing".to_string(), "x".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(applied, vec!["Status".to_string()]);
    }
}
