//! Workflow context bundles.
//!
//! Each subcommand gathers everything an orchestrating agent needs to start
//! one workflow: resolved models, disk facts, and optionally whole planning
//! documents via `--include`. One invocation replaces the dozen reads an
//! agent would otherwise issue.

use crate::output::print_json;
use chrono::{Local, SecondsFormat, Utc};
use clap::Subcommand;
use gsd_core::config;
use gsd_core::io;
use gsd_core::paths;
use gsd_core::phase::{self, PhaseDir, PhaseDocKind, PhaseId};
use gsd_core::{roadmap, state, todo};
use regex::Regex;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::OnceLock;

#[derive(Subcommand)]
pub enum InitWorkflow {
    /// Context for executing the plans of one phase
    ExecutePhase {
        phase: String,

        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Context for planning one phase
    PlanPhase {
        phase: String,

        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Milestone progress context
    Progress {
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Context for starting a brand-new project
    NewProject {
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Context for starting the next milestone
    NewMilestone {
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Context for an ad-hoc task outside the phase system
    Quick {
        #[arg(required = true)]
        description: Vec<String>,

        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Context for resuming an interrupted session
    Resume {
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Context for verifying executed work in one phase
    VerifyWork {
        phase: String,

        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Context for structural phase operations (add, insert, remove)
    PhaseOp {
        phase: String,

        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Pending-todo triage context
    Todos {
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Milestone completion readiness context
    MilestoneOp {
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },

    /// Codebase mapping context
    MapCodebase {
        #[arg(long, value_delimiter = ',')]
        include: Option<Vec<String>>,
    },
}

pub fn run(root: &Path, workflow: InitWorkflow) -> anyhow::Result<()> {
    match workflow {
        InitWorkflow::ExecutePhase { phase, include } => {
            let id: PhaseId = phase.parse()?;
            let dir = phase::find(root, id)?;
            let (plans, incomplete) = match &dir {
                Some(dir) => (
                    phase::plan_files(&dir.path)?,
                    phase::incomplete_plan_ids(&dir.path)?,
                ),
                None => (Vec::new(), Vec::new()),
            };
            let incomplete_plans: Vec<String> = incomplete
                .iter()
                .map(|prefix| format!("{prefix}-PLAN.md"))
                .collect();
            let mut bundle = json!({
                "phase_found": dir.is_some(),
                "phase_dir": dir.as_ref().map(dir_string),
                "plan_count": plans.len(),
                "plans": plans,
                "incomplete_count": incomplete_plans.len(),
                "incomplete_plans": incomplete_plans,
                "executor_model": model(root, "gsd-executor"),
                "commit_docs": commit_docs(root),
            });
            apply_includes(root, dir.as_ref(), Some(id), include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::PlanPhase { phase, include } => {
            let id: PhaseId = phase.parse()?;
            let dir = phase::find(root, id)?;
            let plan_count = match &dir {
                Some(dir) => phase::plan_files(&dir.path)?.len(),
                None => 0,
            };
            let mut bundle = json!({
                "phase_found": dir.is_some(),
                "phase_number": id.to_string(),
                "phase_dir": dir.as_ref().map(dir_string),
                "planner_model": model(root, "gsd-planner"),
                "checker_model": model(root, "gsd-checker"),
                "has_research": has_doc(dir.as_ref(), PhaseDocKind::Research, id),
                "has_context": has_doc(dir.as_ref(), PhaseDocKind::Context, id),
                "plan_count": plan_count,
                "commit_docs": commit_docs(root),
            });
            apply_includes(root, dir.as_ref(), Some(id), include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::Progress { include } => {
            let mut bundle = match roadmap::analyze(root)? {
                Some(analysis) => {
                    let mut bundle = serde_json::to_value(&analysis)?;
                    if let Some(map) = bundle.as_object_mut() {
                        map.insert("roadmap_exists".to_string(), json!(true));
                    }
                    bundle
                }
                None => json!({
                    "roadmap_exists": false,
                    "phase_count": 0,
                    "phases": [],
                    "completed_phases": 0,
                    "total_plans": 0,
                    "total_summaries": 0,
                    "progress_percent": 0,
                }),
            };
            apply_includes(root, None, None, include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::NewProject { include } => {
            let mut bundle = json!({
                "researcher_model": model(root, "gsd-researcher"),
                "synthesizer_model": model(root, "gsd-synthesizer"),
                "roadmapper_model": model(root, "gsd-roadmapper"),
                "commit_docs": commit_docs(root),
                "planning_exists": paths::planning_dir(root).is_dir(),
                "is_brownfield": has_foreign_entries(root)?,
                "has_git": root.join(".git").is_dir(),
            });
            apply_includes(root, None, None, include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::NewMilestone { include } => {
            let mut bundle = json!({
                "researcher_model": model(root, "gsd-researcher"),
                "current_milestone": roadmap_version(root)?,
                "commit_docs": commit_docs(root),
                "project_exists": paths::project_path(root).is_file(),
                "roadmap_exists": paths::roadmap_path(root).is_file(),
            });
            apply_includes(root, None, None, include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::Quick {
            description,
            include,
        } => {
            let description = description.join(" ");
            let slug = paths::slugify(&description);
            let next_num = quick_task_count(root)? + 1;
            let task_dir = paths::quick_dir(root).join(format!("{next_num}-{slug}"));
            let mut bundle = json!({
                "description": description,
                "slug": slug,
                "next_num": next_num,
                "date": Local::now().format("%Y-%m-%d").to_string(),
                "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                "task_dir": task_dir.to_string_lossy(),
                "commit_docs": commit_docs(root),
            });
            apply_includes(root, None, None, include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::Resume { include } => {
            let state_text = state::load(root)?;
            let has_interrupted_agent = state_text
                .as_deref()
                .map(state::snapshot)
                .is_some_and(|snap| snap.session.resume_file.is_some());
            let mut bundle = json!({
                "state_exists": state_text.is_some(),
                "planning_exists": paths::planning_dir(root).is_dir(),
                "has_interrupted_agent": has_interrupted_agent,
                "commit_docs": commit_docs(root),
            });
            apply_includes(root, None, None, include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::VerifyWork { phase, include } => {
            let id: PhaseId = phase.parse()?;
            let dir = phase::find(root, id)?;
            let (plan_count, summary_count) = match &dir {
                Some(dir) => (
                    phase::plan_files(&dir.path)?.len(),
                    phase::summary_files(&dir.path)?.len(),
                ),
                None => (0, 0),
            };
            let mut bundle = json!({
                "phase_found": dir.is_some(),
                "phase_number": id.to_string(),
                "phase_dir": dir.as_ref().map(dir_string),
                "planner_model": model(root, "gsd-planner"),
                "checker_model": model(root, "gsd-checker"),
                "has_verification": has_doc(dir.as_ref(), PhaseDocKind::Verification, id),
                "plan_count": plan_count,
                "summary_count": summary_count,
                "commit_docs": commit_docs(root),
            });
            apply_includes(root, dir.as_ref(), Some(id), include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::PhaseOp { phase, include } => {
            let id: PhaseId = phase.parse()?;
            let dir = phase::find(root, id)?;
            let plan_count = match &dir {
                Some(dir) => phase::plan_files(&dir.path)?.len(),
                None => 0,
            };
            let mut bundle = json!({
                "phase_found": dir.is_some(),
                "phase_number": id.to_string(),
                "phase_dir": dir.as_ref().map(dir_string),
                "plan_count": plan_count,
                "has_research": has_doc(dir.as_ref(), PhaseDocKind::Research, id),
                "has_context": has_doc(dir.as_ref(), PhaseDocKind::Context, id),
                "commit_docs": commit_docs(root),
            });
            apply_includes(root, dir.as_ref(), Some(id), include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::Todos { include } => {
            let list = todo::list(root, None)?;
            let mut bundle = json!({
                "todo_count": list.count,
                "todos": list.todos,
                "pending_dir": paths::todos_pending_dir(root).to_string_lossy(),
                "completed_dir": paths::todos_completed_dir(root).to_string_lossy(),
                "date": Local::now().format("%Y-%m-%d").to_string(),
            });
            apply_includes(root, None, None, include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::MilestoneOp { include } => {
            let dirs = phase::scan(root)?;
            let mut completed = 0;
            for dir in &dirs {
                let summaries = phase::summary_files(&dir.path)?;
                let incomplete = phase::incomplete_plan_ids(&dir.path)?;
                if !summaries.is_empty() && incomplete.is_empty() {
                    completed += 1;
                }
            }
            let archived = archived_versions(root)?;
            let mut bundle = json!({
                "milestone_version": roadmap_version(root)?,
                "phase_count": dirs.len(),
                "completed_phases": completed,
                "all_phases_complete": !dirs.is_empty() && completed == dirs.len(),
                "archived_milestones": archived,
                "archive_count": archived.len(),
                "commit_docs": commit_docs(root),
            });
            apply_includes(root, None, None, include, &mut bundle)?;
            print_json(&bundle)
        }
        InitWorkflow::MapCodebase { include } => {
            let maps = codebase_maps(root)?;
            let mut bundle = json!({
                "mapper_model": model(root, "gsd-mapper"),
                "commit_docs": commit_docs(root),
                "codebase_dir": paths::codebase_dir(root).to_string_lossy(),
                "existing_maps": maps,
                "has_maps": !maps.is_empty(),
                "planning_exists": paths::planning_dir(root).is_dir(),
            });
            apply_includes(root, None, None, include, &mut bundle)?;
            print_json(&bundle)
        }
    }
}

// ---------------------------------------------------------------------------
// Shared pieces
// ---------------------------------------------------------------------------

fn model(root: &Path, agent: &str) -> &'static str {
    config::resolve_model(root, agent).model
}

fn commit_docs(root: &Path) -> bool {
    config::load(root).bool_value("commit_docs").unwrap_or(true)
}

fn dir_string(dir: &PhaseDir) -> String {
    dir.path.to_string_lossy().into_owned()
}

fn has_doc(dir: Option<&PhaseDir>, kind: PhaseDocKind, id: PhaseId) -> bool {
    dir.is_some_and(|dir| dir.path.join(kind.filename(id)).is_file())
}

/// Add `{key}_content` fields for each requested include. A missing file is
/// null; a key that was not requested never appears.
fn apply_includes(
    root: &Path,
    dir: Option<&PhaseDir>,
    id: Option<PhaseId>,
    include: Option<Vec<String>>,
    bundle: &mut Value,
) -> anyhow::Result<()> {
    let Some(keys) = include else {
        return Ok(());
    };
    let Some(map) = bundle.as_object_mut() else {
        return Ok(());
    };
    for key in keys {
        let content = match key.as_str() {
            "state" => io::read_optional(&paths::state_path(root))?,
            "config" => io::read_optional(&paths::config_path(root))?,
            "roadmap" => io::read_optional(&paths::roadmap_path(root))?,
            "requirements" => io::read_optional(&paths::requirements_path(root))?,
            "project" => io::read_optional(&paths::project_path(root))?,
            "context" | "research" | "verification" | "uat" => {
                let kind: PhaseDocKind = key.parse()?;
                match (dir, id) {
                    (Some(dir), Some(id)) => io::read_optional(&dir.path.join(kind.filename(id)))?,
                    _ => None,
                }
            }
            other => {
                tracing::debug!(key = other, "unknown include key");
                continue;
            }
        };
        map.insert(format!("{key}_content"), json!(content));
    }
    Ok(())
}

static VERSION_RE: OnceLock<Regex> = OnceLock::new();

fn version_re() -> &'static Regex {
    VERSION_RE.get_or_init(|| Regex::new(r"v\d+(?:\.\d+)*").unwrap())
}

/// Milestone tag from the ROADMAP.md title line ("# Roadmap v1.2 Beta").
fn roadmap_version(root: &Path) -> anyhow::Result<Option<String>> {
    Ok(roadmap::load(root)?.and_then(|roadmap| {
        roadmap
            .text
            .lines()
            .next()
            .and_then(|title| version_re().find(title))
            .map(|m| m.as_str().to_string())
    }))
}

fn quick_task_count(root: &Path) -> anyhow::Result<usize> {
    let dir = paths::quick_dir(root);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut count = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        let numbered = name
            .split_once('-')
            .is_some_and(|(num, _)| !num.is_empty() && num.chars().all(|c| c.is_ascii_digit()));
        if numbered {
            count += 1;
        }
    }
    Ok(count)
}

/// Anything in the root besides the planning directory and .git marks an
/// existing codebase.
fn has_foreign_entries(root: &Path) -> anyhow::Result<bool> {
    for entry in std::fs::read_dir(root)? {
        let entry = entry?;
        let name = entry.file_name();
        if name != ".planning" && name != ".git" {
            return Ok(true);
        }
    }
    Ok(false)
}

fn archived_versions(root: &Path) -> anyhow::Result<Vec<String>> {
    let dir = paths::milestones_archive_dir(root);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut versions = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(version) = name.strip_suffix("-ROADMAP.md") {
            versions.push(version.to_string());
        }
    }
    versions.sort();
    Ok(versions)
}

fn codebase_maps(root: &Path) -> anyhow::Result<Vec<String>> {
    let dir = paths::codebase_dir(root);
    let entries = match std::fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut maps = Vec::new();
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(".md") {
            maps.push(name);
        }
    }
    maps.sort();
    Ok(maps)
}
