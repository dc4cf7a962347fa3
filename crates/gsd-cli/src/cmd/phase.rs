use crate::output::print_json;
use clap::Subcommand;
use gsd_core::phase::{self, PhaseId};
use gsd_core::roadmap;
use serde_json::json;
use std::path::Path;

#[derive(Subcommand)]
pub enum PhaseSubcommand {
    /// List phase directories, or their plan/summary files
    List {
        /// List files of this kind instead of directories
        #[arg(long = "type", value_parser = ["plans", "summaries"])]
        kind: Option<String>,

        /// Restrict the file listing to one phase
        #[arg(long)]
        phase: Option<String>,
    },

    /// Locate a phase directory by number
    Find { id: String },

    /// Index every plan in a phase: waves, autonomy, completion
    PlanIndex { id: String },

    /// Next decimal insertion id under a base phase
    NextDecimal { base: String },

    /// Append a phase to ROADMAP.md and create its directory
    Add {
        #[arg(required = true)]
        name: Vec<String>,
    },

    /// Insert a decimal phase after a target phase
    Insert {
        target: String,
        #[arg(required = true)]
        name: Vec<String>,
    },

    /// Remove a phase and renumber the ones after it
    Remove {
        target: String,

        /// Remove even when summaries record executed work
        #[arg(long)]
        force: bool,
    },

    /// Mark a phase complete and advance STATE.md to the next one
    Complete { target: String },
}

pub fn run(root: &Path, subcommand: PhaseSubcommand) -> anyhow::Result<()> {
    match subcommand {
        PhaseSubcommand::List { kind, phase } => list(root, kind.as_deref(), phase.as_deref()),
        PhaseSubcommand::Find { id } => find(root, &id),
        PhaseSubcommand::PlanIndex { id } => plan_index(root, &id),
        PhaseSubcommand::NextDecimal { base } => next_decimal(root, &base),
        PhaseSubcommand::Add { name } => print_json(&roadmap::add_phase(root, &name.join(" "))?),
        PhaseSubcommand::Insert { target, name } => {
            print_json(&roadmap::insert_phase(root, &target, &name.join(" "))?)
        }
        PhaseSubcommand::Remove { target, force } => {
            print_json(&roadmap::remove_phase(root, &target, force)?)
        }
        PhaseSubcommand::Complete { target } => {
            print_json(&roadmap::complete_phase(root, &target)?)
        }
    }
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

fn list(root: &Path, kind: Option<&str>, phase: Option<&str>) -> anyhow::Result<()> {
    let dirs = phase::scan(root)?;

    let Some(kind) = kind else {
        let directories: Vec<&str> = dirs.iter().map(|d| d.name.as_str()).collect();
        return print_json(&json!({
            "directories": directories,
            "count": directories.len(),
        }));
    };

    let selected: Vec<&phase::PhaseDir> = match phase {
        Some(raw) => {
            let id: PhaseId = raw.parse()?;
            dirs.iter().filter(|d| d.id == id).collect()
        }
        None => dirs.iter().collect(),
    };

    let mut files = Vec::new();
    for dir in &selected {
        let names = match kind {
            "plans" => phase::plan_files(&dir.path)?,
            _ => phase::summary_files(&dir.path)?,
        };
        files.extend(names);
    }

    let mut result = json!({
        "files": files,
        "count": files.len(),
    });
    if phase.is_some() {
        if let Some(first) = selected.first() {
            result["phase_dir"] = json!(first.slug);
        }
    }
    print_json(&result)
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

fn find(root: &Path, raw: &str) -> anyhow::Result<()> {
    let id: PhaseId = raw.parse()?;
    match phase::find(root, id)? {
        Some(dir) => print_json(&json!({
            "found": true,
            "phase_number": dir.id.to_string(),
            "phase_name": dir.slug,
            "directory": dir.path.to_string_lossy(),
            "plans": phase::plan_files(&dir.path)?,
            "summaries": phase::summary_files(&dir.path)?,
        })),
        None => print_json(&json!({
            "found": false,
            "directory": null,
        })),
    }
}

fn plan_index(root: &Path, raw: &str) -> anyhow::Result<()> {
    let id: PhaseId = raw.parse()?;
    match phase::plan_index(root, id)? {
        Some(index) => print_json(&index),
        None => print_json(&json!({ "error": "Phase not found" })),
    }
}

fn next_decimal(root: &Path, raw: &str) -> anyhow::Result<()> {
    let base: PhaseId = raw.parse()?;
    let next = phase::next_decimal(root, base)?;
    let existing: Vec<String> = next.existing.iter().map(PhaseId::to_string).collect();
    print_json(&json!({
        "base_phase": next.base.to_string(),
        "next": next.next.to_string(),
        "existing": existing,
        "found": next.base_found,
    }))
}
