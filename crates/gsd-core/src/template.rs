//! Plan/summary/verification skeletons and phase-document scaffolds.
//!
//! Templates are embedded rather than read from disk so a fresh checkout
//! can scaffold without an install step. Selection is a heuristic over the
//! plan text: many tasks, many touched files, or decision language push a
//! plan from the standard skeleton to the complex one.

use crate::error::Result;
use crate::io;
use crate::paths;
use crate::phase::{self, PhaseDocKind, PhaseId};
use chrono::Local;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

static TASK_RE: OnceLock<Regex> = OnceLock::new();
static FILE_MENTION_RE: OnceLock<Regex> = OnceLock::new();
static DECISION_RE: OnceLock<Regex> = OnceLock::new();

fn task_re() -> &'static Regex {
    TASK_RE.get_or_init(|| Regex::new(r"(?m)^#{2,3} Task \d+").unwrap())
}

fn file_mention_re() -> &'static Regex {
    FILE_MENTION_RE.get_or_init(|| Regex::new(r"`[^`\n]*\.[A-Za-z]{1,5}`").unwrap())
}

fn decision_re() -> &'static Regex {
    DECISION_RE.get_or_init(|| {
        Regex::new(r"(?i)\b(decision|decide|choose|choice|trade-?off)\b").unwrap()
    })
}

#[derive(Debug, Serialize)]
pub struct Selection {
    pub template: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(rename = "taskCount")]
    pub task_count: usize,
    #[serde(rename = "fileCount")]
    pub file_count: usize,
    #[serde(rename = "hasDecisions")]
    pub has_decisions: bool,
}

/// Pick a plan skeleton for the given draft. `None` when the file does not
/// exist.
pub fn select(root: &Path, rel_path: &str) -> Result<Option<Selection>> {
    let Some(text) = io::read_optional(&root.join(rel_path))? else {
        return Ok(None);
    };
    let task_count = task_re().find_iter(&text).count();
    let file_count = file_mention_re().find_iter(&text).count();
    let has_decisions = decision_re().is_match(&text);
    let complex = task_count > 5 || file_count >= 7 || has_decisions;
    Ok(Some(Selection {
        template: if complex {
            "plan-complex.md"
        } else {
            "plan-standard.md"
        },
        kind: if complex { "complex" } else { "standard" },
        task_count,
        file_count,
        has_decisions,
    }))
}

// ---------------------------------------------------------------------------
// Fill
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum Fill {
    Created { path: String },
    AlreadyExists,
    PhaseMissing,
}

fn two_digit(seq: &str) -> String {
    format!("{seq:0>2}")
}

pub fn fill_plan(
    root: &Path,
    id: PhaseId,
    plan: &str,
    name: &str,
    kind: &str,
) -> Result<Fill> {
    let seq = two_digit(plan);
    let content = format!(
        "---\nphase: {id}\nplan: {seq}\ntype: {kind}\nwave: 1\ndepends_on: []\nfiles_modified: []\nautonomous: true\nmust_haves:\n  truths: []\n  artifacts: []\n  key_links: []\n---\n\n# Plan {id}-{seq}: {name}\n\n**Objective:** TBD\n\n<task type=\"auto\">\n  <name>Task 1: TBD</name>\n  <files></files>\n  <action></action>\n  <verify></verify>\n  <done></done>\n</task>\n"
    );
    write_phase_file(root, id, &format!("{id}-{seq}-PLAN.md"), &content)
}

pub fn fill_summary(root: &Path, id: PhaseId, plan: &str, name: &str) -> Result<Fill> {
    let seq = two_digit(plan);
    let content = format!(
        "---\nphase: {id}\nplan: {seq}\nname: {name}\none-liner: TBD\nkey-files: []\ntech-stack:\n  added: []\npatterns-established: []\nkey-decisions: []\n---\n\n# Plan {id}-{seq}: {name} Summary\n\n**One-liner:** TBD\n\n## What was built\n\nTBD\n"
    );
    write_phase_file(root, id, &format!("{id}-{seq}-SUMMARY.md"), &content)
}

pub fn fill_verification(root: &Path, id: PhaseId, name: &str) -> Result<Fill> {
    let content = verification_content(id, Some(name));
    write_phase_file(root, id, &PhaseDocKind::Verification.filename(id), &content)
}

fn write_phase_file(root: &Path, id: PhaseId, file: &str, content: &str) -> Result<Fill> {
    let Some(dir) = phase::find(root, id)? else {
        return Ok(Fill::PhaseMissing);
    };
    let path = dir.path.join(file);
    if path.exists() {
        return Ok(Fill::AlreadyExists);
    }
    io::atomic_write(&path, content)?;
    Ok(Fill::Created {
        path: path.to_string_lossy().into_owned(),
    })
}

// ---------------------------------------------------------------------------
// Scaffolds
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Scaffolded {
    pub created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

/// Create a singleton phase document. `None` when the phase directory is
/// missing; an existing file is reported, never overwritten.
pub fn scaffold_doc(root: &Path, kind: PhaseDocKind, id: PhaseId) -> Result<Option<Scaffolded>> {
    let Some(dir) = phase::find(root, id)? else {
        return Ok(None);
    };
    let path = dir.path.join(kind.filename(id));
    if path.exists() {
        return Ok(Some(Scaffolded {
            created: false,
            path: Some(path.to_string_lossy().into_owned()),
            reason: Some("already_exists"),
        }));
    }
    let title = paths::title_case(&dir.slug.replace('-', " "));
    let content = match kind {
        PhaseDocKind::Context => context_content(id, &title),
        PhaseDocKind::Research => research_content(id, &title),
        PhaseDocKind::Verification => verification_content(id, Some(&title)),
        PhaseDocKind::Uat => uat_content(id, &title),
    };
    io::atomic_write(&path, content)?;
    Ok(Some(Scaffolded {
        created: true,
        path: Some(path.to_string_lossy().into_owned()),
        reason: None,
    }))
}

/// Create `{id}-{slug}` under the phases root.
pub fn scaffold_phase_dir(root: &Path, id: PhaseId, name: &str) -> Result<Scaffolded> {
    let dir_name = format!("{id}-{}", paths::slugify(name));
    let path = paths::phases_dir(root).join(&dir_name);
    if path.exists() {
        return Ok(Scaffolded {
            created: false,
            path: Some(path.to_string_lossy().into_owned()),
            reason: Some("already_exists"),
        });
    }
    io::ensure_dir(&path)?;
    Ok(Scaffolded {
        created: true,
        path: Some(path.to_string_lossy().into_owned()),
        reason: None,
    })
}

fn context_content(id: PhaseId, title: &str) -> String {
    let n = id.unpadded();
    format!(
        "# Phase {n}: {title} Context\n\n## Decisions\n\n- None yet\n\n## Discretion Areas\n\n- None yet\n\n## Deferred\n\n- None yet\n"
    )
}

fn research_content(id: PhaseId, title: &str) -> String {
    let n = id.unpadded();
    format!(
        "# Phase {n}: {title} Research\n\n## Questions\n\n- None yet\n\n## Findings\n\n- None yet\n"
    )
}

fn uat_content(id: PhaseId, title: &str) -> String {
    let n = id.unpadded();
    let date = Local::now().format("%Y-%m-%d");
    format!(
        "# Phase {n}: {title} User Acceptance Testing\n\n**Date:** {date}\n\n## Test Results\n\n| # | Test | Expected | Result |\n|---|------|----------|--------|\n\n## Issues Found\n\n- None yet\n"
    )
}

fn verification_content(id: PhaseId, name: Option<&str>) -> String {
    let n = id.unpadded();
    let title = name.unwrap_or("Phase");
    format!(
        "---\nphase: {id}\nverified: false\n---\n\n# Phase {n}: {title} Goal-Backward Verification\n\n## Must-Have Truths\n\n- None yet\n\n## Artifact Audit\n\n| Artifact | Expected | Status |\n|----------|----------|--------|\n\n## Verdict\n\nTBD\n"
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
