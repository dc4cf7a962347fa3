//! Verification audits over plans, phases, and summaries.
//!
//! Content findings fold into structured reports the CLI prints as JSON;
//! only I/O trouble surfaces as an error. A missing file or must-haves
//! block is an outcome, not a failure, so agents can branch on it.

use crate::error::Result;
use crate::frontmatter;
use crate::io;
use crate::musthaves;
use crate::phase::{self, PhaseId};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Plan structure
// ---------------------------------------------------------------------------

static TASK_BLOCK_RE: OnceLock<Regex> = OnceLock::new();
static REFERENCE_RE: OnceLock<Regex> = OnceLock::new();

fn task_block_re() -> &'static Regex {
    TASK_BLOCK_RE.get_or_init(|| Regex::new(r"(?s)<task\b[^>]*>(.*?)</task>").unwrap())
}

const PLAN_KEYS: &[&str] = &[
    "phase",
    "plan",
    "type",
    "wave",
    "depends_on",
    "files_modified",
    "autonomous",
    "must_haves",
];

const TASK_CHILDREN: &[&str] = &["name", "action", "verify", "done"];

#[derive(Debug, Serialize)]
pub struct PlanStructure {
    pub valid: bool,
    pub task_count: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Audit a plan file: required frontmatter keys plus the required children
/// of every `<task>` block. `None` when the file does not exist.
pub fn plan_structure(root: &Path, rel_path: &str) -> Result<Option<PlanStructure>> {
    let Some(text) = io::read_optional(&root.join(rel_path))? else {
        return Ok(None);
    };
    let (front, _) = frontmatter::split(&text);
    let mapping = front
        .map(|f| frontmatter::parse(f).mapping)
        .unwrap_or_default();
    // The frontmatter parser flattens nested blocks, so the must_haves key
    // is judged from the block itself.
    let has_must_haves = musthaves::extract(&text).is_some();

    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let missing: Vec<&str> = PLAN_KEYS
        .iter()
        .copied()
        .filter(|key| !(mapping.contains(key) || (*key == "must_haves" && has_must_haves)))
        .collect();
    if !missing.is_empty() {
        errors.push(format!(
            "Missing required frontmatter fields: {}",
            missing.join(", ")
        ));
    }

    let mut task_count = 0;
    for capture in task_block_re().captures_iter(&text) {
        task_count += 1;
        let body = &capture[1];
        for child in TASK_CHILDREN {
            if !body.contains(&format!("<{child}>")) {
                errors.push(format!("Task {task_count} missing <{child}>"));
            }
        }
    }
    if task_count == 0 {
        warnings.push("No <task> elements found in plan".to_string());
    }

    Ok(Some(PlanStructure {
        valid: errors.is_empty(),
        task_count,
        errors,
        warnings,
    }))
}

// ---------------------------------------------------------------------------
// Phase completeness
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PhaseCompleteness {
    pub complete: bool,
    pub plan_count: usize,
    pub summary_count: usize,
    pub incomplete_plans: Vec<String>,
}

/// Plan/summary pairing audit for one phase. A phase with no plans is
/// trivially complete. `None` when no directory matches the id.
pub fn phase_completeness(root: &Path, id: PhaseId) -> Result<Option<PhaseCompleteness>> {
    let Some(dir) = phase::find(root, id)? else {
        return Ok(None);
    };
    let plans = phase::plan_files(&dir.path)?;
    let summaries = phase::summary_files(&dir.path)?;
    let incomplete = phase::incomplete_plan_ids(&dir.path)?;
    Ok(Some(PhaseCompleteness {
        complete: incomplete.is_empty(),
        plan_count: plans.len(),
        summary_count: summaries.len(),
        incomplete_plans: incomplete,
    }))
}

// ---------------------------------------------------------------------------
// @path references
// ---------------------------------------------------------------------------

fn reference_re() -> &'static Regex {
    REFERENCE_RE.get_or_init(|| Regex::new(r"(?m)(?:^|\s)@([A-Za-z0-9_.~/-]+)").unwrap())
}

#[derive(Debug, Serialize)]
pub struct References {
    pub valid: bool,
    pub missing: Vec<String>,
    pub found: usize,
    pub total: usize,
}

/// Check every `@path` reference in a document against the tree. Paths
/// resolve relative to the project root.
pub fn references(root: &Path, rel_path: &str) -> Result<Option<References>> {
    let Some(text) = io::read_optional(&root.join(rel_path))? else {
        return Ok(None);
    };
    let mut missing = Vec::new();
    let mut found = 0;
    let mut total = 0;
    for capture in reference_re().captures_iter(&text) {
        let target = capture[1].trim_end_matches(['.', ',', ':', ';', ')']);
        if target.is_empty() {
            continue;
        }
        total += 1;
        if root.join(target).exists() {
            found += 1;
        } else {
            missing.push(target.to_string());
        }
    }
    Ok(Some(References {
        valid: missing.is_empty(),
        missing,
        found,
        total,
    }))
}

// ---------------------------------------------------------------------------
// Must-haves audits
// ---------------------------------------------------------------------------

/// Outcome of a must-haves audit over one plan file.
#[derive(Debug)]
pub enum Audit<T> {
    FileMissing,
    NoMustHaves,
    Report(T),
}

#[derive(Debug, Serialize)]
pub struct ArtifactCheck {
    pub path: String,
    pub exists: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ArtifactReport {
    pub all_passed: bool,
    pub passed: usize,
    pub artifacts: Vec<ArtifactCheck>,
}

/// Check each `must_haves.artifacts` entry of a plan: the file must exist
/// and meet its `min_lines` floor when one is declared.
pub fn artifacts(root: &Path, rel_path: &str) -> Result<Audit<ArtifactReport>> {
    let Some(text) = io::read_optional(&root.join(rel_path))? else {
        return Ok(Audit::FileMissing);
    };
    let Some(mh) = musthaves::extract(&text) else {
        return Ok(Audit::NoMustHaves);
    };
    if mh.artifacts.is_empty() {
        return Ok(Audit::NoMustHaves);
    }

    let mut checks = Vec::with_capacity(mh.artifacts.len());
    for artifact in &mh.artifacts {
        let target = root.join(&artifact.path);
        let exists = target.exists();
        let mut issues = Vec::new();
        if !exists {
            issues.push("File not found".to_string());
        } else if let Some(min) = artifact.min_lines {
            let lines = std::fs::read_to_string(&target)
                .map(|content| content.lines().count() as u64)
                .unwrap_or(0);
            if lines < min {
                issues.push(format!("Only {lines} lines (expected at least {min})"));
            }
        }
        checks.push(ArtifactCheck {
            path: artifact.path.clone(),
            exists,
            issues,
        });
    }
    let passed = checks.iter().filter(|c| c.issues.is_empty()).count();
    Ok(Audit::Report(ArtifactReport {
        all_passed: passed == checks.len(),
        passed,
        artifacts: checks,
    }))
}

#[derive(Debug, Serialize)]
pub struct LinkCheck {
    pub from: String,
    pub to: String,
    pub ok: bool,
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub struct KeyLinkReport {
    pub all_verified: bool,
    pub verified: usize,
    pub links: Vec<LinkCheck>,
}

/// Check each `must_haves.key_links` entry: both endpoints exist and the
/// source mentions the declared pattern (or the target's file stem when no
/// pattern is given).
pub fn key_links(root: &Path, rel_path: &str) -> Result<Audit<KeyLinkReport>> {
    let Some(text) = io::read_optional(&root.join(rel_path))? else {
        return Ok(Audit::FileMissing);
    };
    let Some(mh) = musthaves::extract(&text) else {
        return Ok(Audit::NoMustHaves);
    };
    if mh.key_links.is_empty() {
        return Ok(Audit::NoMustHaves);
    }

    let mut links = Vec::with_capacity(mh.key_links.len());
    for link in &mh.key_links {
        let (ok, detail) = check_link(root, link);
        links.push(LinkCheck {
            from: link.from.clone(),
            to: link.to.clone(),
            ok,
            detail,
        });
    }
    let verified = links.iter().filter(|l| l.ok).count();
    Ok(Audit::Report(KeyLinkReport {
        all_verified: verified == links.len(),
        verified,
        links,
    }))
}

fn check_link(root: &Path, link: &musthaves::KeyLink) -> (bool, String) {
    let from = root.join(&link.from);
    if !from.is_file() {
        return (false, format!("Source file not found: {}", link.from));
    }
    if !root.join(&link.to).exists() {
        return (false, format!("Target file not found: {}", link.to));
    }
    let needle = match &link.pattern {
        Some(pattern) => pattern.clone(),
        None => Path::new(&link.to)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| link.to.clone()),
    };
    let content = std::fs::read_to_string(&from).unwrap_or_default();
    if content.contains(&needle) {
        (true, format!("\"{needle}\" found in {}", link.from))
    } else {
        (false, format!("Pattern \"{needle}\" not found in {}", link.from))
    }
}

// ---------------------------------------------------------------------------
// Summary audit
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SummaryAudit {
    pub passed: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Required-section audit for a SUMMARY.md. A missing file is a finding,
/// never an error.
pub fn summary(root: &Path, rel_path: &str) -> Result<SummaryAudit> {
    let Some(text) = io::read_optional(&root.join(rel_path))? else {
        return Ok(SummaryAudit {
            passed: false,
            errors: vec!["SUMMARY.md not found".to_string()],
            warnings: Vec::new(),
        });
    };
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    let (front, body) = frontmatter::split(&text);
    match front {
        None => errors.push("Missing frontmatter".to_string()),
        Some(front) => {
            let mapping = frontmatter::parse(front).mapping;
            if !mapping.contains("one-liner") && !body.contains("**One-liner:**") {
                warnings.push("No one-liner found".to_string());
            }
        }
    }
    if !body.to_lowercase().contains("## what was built") {
        errors.push("Missing \"What was built\" section".to_string());
    }
    Ok(SummaryAudit {
        passed: errors.is_empty(),
        errors,
        warnings,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
