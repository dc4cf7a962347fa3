//! STATE.md parsing and mutation.
//!
//! STATE.md is the project's working memory: bold `**Label:** value` fields,
//! a decisions table, blocker bullets, and a session continuity block.
//! Mutators rewrite only the lines they own and persist atomically.

use crate::error::{GsdError, Result};
use crate::io;
use crate::paths;
use crate::phase;
use chrono::Local;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Field access
// ---------------------------------------------------------------------------

fn field_prefix(label: &str) -> String {
    format!("**{label}:**")
}

pub fn get_field(text: &str, label: &str) -> Option<String> {
    let prefix = field_prefix(label);
    text.lines().find_map(|line| {
        line.trim_start()
            .strip_prefix(&prefix)
            .map(|rest| rest.trim().to_string())
    })
}

/// Replace the value of an existing `**Label:**` line. The bool reports
/// whether a line was found.
pub fn set_field(text: &str, label: &str, value: &str) -> (String, bool) {
    let prefix = field_prefix(label);
    let mut replaced = false;
    let lines: Vec<String> = text
        .lines()
        .map(|line| {
            if !replaced && line.trim_start().starts_with(&prefix) {
                replaced = true;
                format!("{prefix} {value}")
            } else {
                line.to_string()
            }
        })
        .collect();
    (rejoin(lines, text.ends_with('\n')), replaced)
}

/// Replace each label in turn, returning the labels actually present.
pub fn apply_fields(text: &str, updates: &[(&str, &str)]) -> (String, Vec<String>) {
    let mut current = text.to_string();
    let mut applied = Vec::new();
    for (label, value) in updates {
        let (next, replaced) = set_field(&current, label, value);
        if replaced {
            applied.push(label.to_string());
        }
        current = next;
    }
    (current, applied)
}

fn rejoin(lines: Vec<String>, trailing_newline: bool) -> String {
    let mut text = lines.join("\n");
    if trailing_newline {
        text.push('\n');
    }
    text
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

pub fn load(root: &Path) -> Result<Option<String>> {
    io::read_optional(&paths::state_path(root))
}

fn require(root: &Path) -> Result<String> {
    load(root)?.ok_or_else(|| GsdError::NotFound("STATE.md".to_string()))
}

fn save(root: &Path, text: &str) -> Result<()> {
    io::atomic_write(&paths::state_path(root), text)
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct Session {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_file: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Decision {
    pub phase: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct Snapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_phase_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_phases: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_plans_in_phase: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_activity_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<String>,
    pub decisions: Vec<Decision>,
    pub blockers: Vec<String>,
    pub session: Session,
}

static PERCENT_RE: OnceLock<Regex> = OnceLock::new();

fn percent_re() -> &'static Regex {
    PERCENT_RE.get_or_init(|| Regex::new(r"(\d+)\s*%").unwrap())
}

pub fn snapshot(text: &str) -> Snapshot {
    let mut snap = Snapshot {
        current_phase: get_field(text, "Current Phase"),
        current_phase_name: get_field(text, "Current Phase Name"),
        total_phases: get_field(text, "Total Phases").and_then(|v| v.parse().ok()),
        current_plan: get_field(text, "Current Plan"),
        total_plans_in_phase: get_field(text, "Total Plans in Phase")
            .and_then(|v| v.parse().ok()),
        status: get_field(text, "Status"),
        paused_at: get_field(text, "Paused At"),
        ..Snapshot::default()
    };
    if let Some(progress) = get_field(text, "Progress") {
        snap.progress_percent = percent_re()
            .captures(&progress)
            .and_then(|caps| caps[1].parse().ok());
        snap.progress = Some(progress);
    }
    // Older STATE files fold the description into the activity line.
    match (
        get_field(text, "Last Activity"),
        get_field(text, "Last Activity Description"),
    ) {
        (Some(activity), Some(desc)) => {
            snap.last_activity = Some(activity);
            snap.last_activity_description = Some(desc);
        }
        (Some(activity), None) => match activity.split_once(" - ") {
            Some((date, desc)) => {
                snap.last_activity = Some(date.trim().to_string());
                snap.last_activity_description = Some(desc.trim().to_string());
            }
            None => snap.last_activity = Some(activity),
        },
        (None, desc) => snap.last_activity_description = desc,
    }
    snap.decisions = parse_decisions(text);
    snap.blockers = parse_blockers(text);
    snap.session = parse_session(text);
    snap
}

fn section_bounds<S: AsRef<str>>(lines: &[S], title_prefix: &str) -> Option<(usize, usize)> {
    let mut start: Option<usize> = None;
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.as_ref().trim_start();
        if !trimmed.starts_with('#') {
            continue;
        }
        if let Some(s) = start {
            return Some((s, i));
        }
        if trimmed.trim_start_matches('#').trim().starts_with(title_prefix) {
            start = Some(i + 1);
        }
    }
    start.map(|s| (s, lines.len()))
}

fn is_table_separator(cells: &[&str]) -> bool {
    cells
        .iter()
        .all(|cell| !cell.is_empty() && cell.chars().all(|c| c == '-' || c == ':'))
}

fn parse_decisions(text: &str) -> Vec<Decision> {
    let lines: Vec<&str> = text.lines().collect();
    let Some((start, end)) = section_bounds(&lines, "Decisions") else {
        return Vec::new();
    };
    let mut decisions = Vec::new();
    let mut saw_header = false;
    for line in &lines[start..end] {
        let trimmed = line.trim();
        if let Some(stripped) = trimmed.strip_prefix("| ").or_else(|| trimmed.strip_prefix('|')) {
            let cells: Vec<&str> = stripped
                .trim_end_matches('|')
                .split('|')
                .map(str::trim)
                .collect();
            if is_table_separator(&cells) {
                continue;
            }
            if !saw_header {
                saw_header = true;
                continue;
            }
            if cells.len() >= 2 {
                decisions.push(Decision {
                    phase: cells[0].to_string(),
                    summary: cells[1].to_string(),
                    rationale: cells.get(2).filter(|r| !r.is_empty()).map(|r| r.to_string()),
                });
            }
        } else if let Some(bullet) = trimmed.strip_prefix("- ") {
            // Bullet form written by add-decision: "- [Phase 01]: summary".
            if let Some(rest) = bullet.strip_prefix("[Phase ") {
                if let Some((phase, summary)) = rest.split_once("]:") {
                    decisions.push(Decision {
                        phase: phase.trim().to_string(),
                        summary: summary.trim().to_string(),
                        rationale: None,
                    });
                }
            }
        }
    }
    decisions
}

fn parse_blockers(text: &str) -> Vec<String> {
    let lines: Vec<&str> = text.lines().collect();
    let Some((start, end)) = section_bounds(&lines, "Blockers") else {
        return Vec::new();
    };
    lines[start..end]
        .iter()
        .filter_map(|line| line.trim().strip_prefix("- "))
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect()
}

fn parse_session(text: &str) -> Session {
    let lines: Vec<&str> = text.lines().collect();
    let Some((start, end)) = section_bounds(&lines, "Session") else {
        return Session::default();
    };
    let body = lines[start..end].join("\n");
    Session {
        last_date: get_field(&body, "Last Date").or_else(|| get_field(&body, "Last session")),
        stopped_at: get_field(&body, "Stopped At"),
        resume_file: get_field(&body, "Resume File"),
    }
}

// ---------------------------------------------------------------------------
// Mutators
// ---------------------------------------------------------------------------

/// Set a field, appending a new line when the label is absent.
pub fn update_field(root: &Path, label: &str, value: &str) -> Result<()> {
    let text = require(root)?;
    let (next, replaced) = set_field(&text, label, value);
    if replaced {
        save(root, &next)?;
        return Ok(());
    }
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    lines.push(format!("{} {value}", field_prefix(label)));
    save(root, &rejoin(lines, true))
}

/// Replace several fields at once; absent labels are skipped.
pub fn patch(root: &Path, updates: &[(String, String)]) -> Result<Vec<String>> {
    let text = require(root)?;
    let borrowed: Vec<(&str, &str)> = updates
        .iter()
        .map(|(label, value)| (label.as_str(), value.as_str()))
        .collect();
    let (next, applied) = apply_fields(&text, &borrowed);
    save(root, &next)?;
    Ok(applied)
}

#[derive(Debug, Serialize)]
pub struct PlanAdvance {
    pub advanced: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_plan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_plan: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<&'static str>,
}

/// parseInt-style prefix parse; plan counters sometimes carry suffixes.
fn leading_int(value: &str) -> Option<i64> {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Bump the plan counter, refusing to advance past the phase total.
pub fn advance_plan(root: &Path) -> Result<PlanAdvance> {
    let text = require(root)?;
    let current = get_field(&text, "Current Plan")
        .as_deref()
        .and_then(leading_int)
        .ok_or_else(|| GsdError::InvalidInput("STATE.md has no numeric Current Plan".to_string()))?;
    let total = get_field(&text, "Total Plans in Phase")
        .as_deref()
        .and_then(leading_int)
        .ok_or_else(|| {
            GsdError::InvalidInput("STATE.md has no numeric Total Plans in Phase".to_string())
        })?;
    if current >= total {
        return Ok(PlanAdvance {
            advanced: false,
            previous_plan: Some(current),
            current_plan: None,
            reason: Some("last_plan"),
            status: Some("ready_for_verification"),
        });
    }
    let (next, _) = set_field(&text, "Current Plan", &(current + 1).to_string());
    save(root, &next)?;
    Ok(PlanAdvance {
        advanced: true,
        previous_plan: Some(current),
        current_plan: Some(current + 1),
        reason: None,
        status: None,
    })
}

const METRICS_TITLE: &str = "Performance Metrics";
const METRICS_HEADER: &str = "| Plan | Duration | Tasks | Files |";
const METRICS_SEPARATOR: &str = "|------|----------|-------|-------|";

/// Append a row to the Performance Metrics table, creating the section when
/// the file predates it.
pub fn record_metric(
    root: &Path,
    phase: &str,
    plan: &str,
    duration: &str,
    tasks: Option<i64>,
    files: Option<i64>,
) -> Result<()> {
    let text = require(root)?;
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let row = format!(
        "| Phase {phase} P{plan} | {duration} | {} tasks | {} files |",
        tasks.map_or_else(|| "-".to_string(), |n| n.to_string()),
        files.map_or_else(|| "-".to_string(), |n| n.to_string()),
    );
    match section_bounds(&lines, METRICS_TITLE) {
        Some((start, end)) => {
            let last_table_line = lines[start..end]
                .iter()
                .rposition(|line| line.trim_start().starts_with('|'))
                .map(|offset| start + offset);
            match last_table_line {
                Some(i) => lines.insert(i + 1, row),
                None => {
                    let insert = insertion_point(&lines, start, end);
                    lines.splice(insert..insert, [
                        METRICS_HEADER.to_string(),
                        METRICS_SEPARATOR.to_string(),
                        row,
                    ]);
                }
            }
        }
        None => {
            lines.extend([
                String::new(),
                format!("## {METRICS_TITLE}"),
                String::new(),
                METRICS_HEADER.to_string(),
                METRICS_SEPARATOR.to_string(),
                row,
            ]);
        }
    }
    save(root, &rejoin(lines, true))
}

#[derive(Debug, Serialize)]
pub struct ProgressUpdate {
    pub percent: u32,
    pub completed: usize,
    pub total: usize,
}

/// Recount plan completion across all phase directories and rewrite the
/// Progress field with a fresh bar.
pub fn update_progress(root: &Path) -> Result<ProgressUpdate> {
    let text = require(root)?;
    let mut total = 0;
    let mut completed = 0;
    for dir in phase::scan(root)? {
        let plans = phase::plan_files(&dir.path)?;
        let incomplete = phase::incomplete_plan_ids(&dir.path)?;
        total += plans.len();
        completed += plans.len() - incomplete.len();
    }
    let percent = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };
    let filled = (percent / 10) as usize;
    let bar = format!(
        "[{}{}] {percent}% ({completed}/{total} plans)",
        "\u{2588}".repeat(filled),
        "\u{2591}".repeat(10 - filled),
    );
    let (next, replaced) = set_field(&text, "Progress", &bar);
    if replaced {
        save(root, &next)?;
    } else {
        let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
        lines.push(format!("{} {bar}", field_prefix("Progress")));
        save(root, &rejoin(lines, true))?;
    }
    Ok(ProgressUpdate {
        percent,
        completed,
        total,
    })
}

fn is_placeholder(line: &str) -> bool {
    matches!(line.trim().trim_end_matches('.'), "None" | "None yet")
}

/// Last useful insertion index inside a section: after its final non-blank
/// line, or right at the start of an empty section.
fn insertion_point(lines: &[String], start: usize, end: usize) -> usize {
    lines[start..end]
        .iter()
        .rposition(|line| !line.trim().is_empty())
        .map_or(start, |offset| start + offset + 1)
}

/// Append a bullet to a section, dropping `None`/`None yet` placeholders.
/// A missing section is created at the end of the file.
fn append_bullet(text: &str, title_prefix: &str, create_title: &str, bullet: &str) -> String {
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    match section_bounds(&lines, title_prefix) {
        Some((start, end)) => {
            let mut end = end;
            let mut i = start;
            while i < end {
                if is_placeholder(&lines[i]) {
                    lines.remove(i);
                    end -= 1;
                } else {
                    i += 1;
                }
            }
            let insert = insertion_point(&lines, start, end);
            lines.insert(insert, bullet.to_string());
        }
        None => {
            lines.extend([
                String::new(),
                format!("### {create_title}"),
                String::new(),
                bullet.to_string(),
            ]);
        }
    }
    rejoin(lines, true)
}

pub fn add_decision(
    root: &Path,
    phase: Option<&str>,
    summary: &str,
    rationale: Option<&str>,
) -> Result<()> {
    let text = require(root)?;
    let mut bullet = format!("- [Phase {}]: {summary}", phase.unwrap_or("?"));
    if let Some(rationale) = rationale {
        bullet.push_str(&format!(" ({rationale})"));
    }
    save(root, &append_bullet(&text, "Decisions", "Decisions", &bullet))
}

pub fn add_blocker(root: &Path, blocker: &str) -> Result<()> {
    let text = require(root)?;
    save(
        root,
        &append_bullet(&text, "Blockers", "Blockers/Concerns", &format!("- {blocker}")),
    )
}

/// Remove blockers containing `needle`. Reports whether anything matched;
/// no match is not an error.
pub fn resolve_blocker(root: &Path, needle: &str) -> Result<bool> {
    let text = require(root)?;
    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    let Some((start, end)) = section_bounds(&lines, "Blockers") else {
        return Ok(false);
    };
    let before = lines.len();
    let mut i = start;
    let mut end = end;
    while i < end {
        let line = lines[i].trim();
        if line.starts_with("- ") && line.contains(needle) {
            lines.remove(i);
            end -= 1;
        } else {
            i += 1;
        }
    }
    let removed = lines.len() < before;
    if removed {
        save(root, &rejoin(lines, true))?;
    }
    Ok(removed)
}

/// Update session continuity fields: the session date always, the rest when
/// provided. Returns the labels written.
pub fn record_session(
    root: &Path,
    stopped_at: Option<&str>,
    resume_file: Option<&str>,
) -> Result<Vec<String>> {
    let text = require(root)?;
    let today = Local::now().format("%Y-%m-%d").to_string();
    let date_label = if get_field(&text, "Last session").is_some() || get_field(&text, "Last Date").is_none()
    {
        "Last session"
    } else {
        "Last Date"
    };
    let mut updates: Vec<(&str, &str)> = vec![(date_label, today.as_str())];
    if let Some(stopped_at) = stopped_at {
        updates.push(("Stopped At", stopped_at));
    }
    if let Some(resume_file) = resume_file {
        updates.push(("Resume File", resume_file));
    }

    let mut lines: Vec<String> = text.lines().map(str::to_string).collect();
    if section_bounds(&lines, "Session").is_none() {
        lines.extend([String::new(), "## Session Continuity".to_string(), String::new()]);
    }
    let mut current = rejoin(lines, true);
    let mut written = Vec::new();
    for (label, value) in updates {
        let (next, replaced) = set_field(&current, label, value);
        current = if replaced {
            next
        } else {
            // Field missing: add it at the end of the session section.
            let mut lines: Vec<String> = current.lines().map(str::to_string).collect();
            if let Some((start, end)) = section_bounds(&lines, "Session") {
                let insert = insertion_point(&lines, start, end);
                lines.insert(insert, format!("{} {value}", field_prefix(label)));
            }
            rejoin(lines, true)
        };
        written.push(label.to_string());
    }
    save(root, &current)?;
    Ok(written)
}

/// Keep the Total Phases counter honest after a phase removal. Missing
/// STATE.md or a missing counter is fine.
pub fn decrement_total_phases(root: &Path) -> Result<bool> {
    let Some(text) = load(root)? else {
        return Ok(false);
    };
    let Some(total) = get_field(&text, "Total Phases").as_deref().and_then(leading_int) else {
        return Ok(false);
    };
    let (next, replaced) = set_field(&text, "Total Phases", &(total - 1).max(0).to_string());
    if replaced {
        save(root, &next)?;
    }
    Ok(replaced)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_state(root: &Path, content: &str) {
        let dir = root.join(".planning");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("STATE.md"), content).unwrap();
    }

    fn read_state(root: &Path) -> String {
        std::fs::read_to_string(root.join(".planning/STATE.md")).unwrap()
    }

    #[test]
    fn snapshot_extracts_bold_fields() {
        let text = "# Project State\n\n**Current Phase:** 03\n**Current Phase Name:** API Layer\n**Total Phases:** 6\n**Current Plan:** 03-02\n**Total Plans in Phase:** 3\n**Status:** In progress\n**Progress:** 45%\n**Last Activity:** 2024-01-15\n**Last Activity Description:** Completed 03-01-PLAN.md\n";
        let snap = snapshot(text);
        assert_eq!(snap.current_phase.as_deref(), Some("03"));
        assert_eq!(snap.current_phase_name.as_deref(), Some("API Layer"));
        assert_eq!(snap.total_phases, Some(6));
        assert_eq!(snap.current_plan.as_deref(), Some("03-02"));
        assert_eq!(snap.total_plans_in_phase, Some(3));
        assert_eq!(snap.status.as_deref(), Some("In progress"));
        assert_eq!(snap.progress_percent, Some(45));
        assert_eq!(snap.last_activity.as_deref(), Some("2024-01-15"));
        assert_eq!(
            snap.last_activity_description.as_deref(),
            Some("Completed 03-01-PLAN.md")
        );
    }

    #[test]
    fn snapshot_splits_combined_activity_line() {
        let snap = snapshot("**Last Activity:** 2025-01-01 - Finished the parser\n");
        assert_eq!(snap.last_activity.as_deref(), Some("2025-01-01"));
        assert_eq!(
            snap.last_activity_description.as_deref(),
            Some("Finished the parser")
        );
    }

    #[test]
    fn snapshot_parses_decisions_table() {
        let text = "# State\n\n## Decisions Made\n\n| Phase | Decision | Rationale |\n|-------|----------|-----------|\n| 01 | Use Prisma | Better DX than raw SQL |\n| 02 | JWT auth | Stateless authentication |\n";
        let snap = snapshot(text);
        assert_eq!(snap.decisions.len(), 2);
        assert_eq!(snap.decisions[0].phase, "01");
        assert_eq!(snap.decisions[0].summary, "Use Prisma");
        assert_eq!(
            snap.decisions[0].rationale.as_deref(),
            Some("Better DX than raw SQL")
        );
    }

    #[test]
    fn snapshot_parses_decision_bullets() {
        let text = "# State\n\n### Decisions\n\n- [Phase 01]: Use Prisma\n";
        let snap = snapshot(text);
        assert_eq!(snap.decisions.len(), 1);
        assert_eq!(snap.decisions[0].summary, "Use Prisma");
    }

    #[test]
    fn snapshot_parses_blockers_and_session() {
        let text = "# State\n\n## Blockers\n\n- Waiting for API credentials\n- Need design review\n\n## Session\n\n**Last Date:** 2024-01-15\n**Stopped At:** Phase 3, Plan 2\n**Resume File:** .planning/phases/03-api/03-02-PLAN.md\n";
        let snap = snapshot(text);
        assert_eq!(snap.blockers.len(), 2);
        assert_eq!(snap.blockers[0], "Waiting for API credentials");
        assert_eq!(snap.session.last_date.as_deref(), Some("2024-01-15"));
        assert_eq!(snap.session.stopped_at.as_deref(), Some("Phase 3, Plan 2"));
        assert_eq!(
            snap.session.resume_file.as_deref(),
            Some(".planning/phases/03-api/03-02-PLAN.md")
        );
    }

    #[test]
    fn snapshot_reads_paused_at() {
        let snap = snapshot("**Paused At:** Phase 3, Plan 1, Task 2 - mid-implementation\n");
        assert_eq!(
            snap.paused_at.as_deref(),
            Some("Phase 3, Plan 1, Task 2 - mid-implementation")
        );
    }

    #[test]
    fn update_field_replaces_and_appends() {
        let tmp = TempDir::new().unwrap();
        write_state(tmp.path(), "# State\n\n**Status:** In progress\n");
        update_field(tmp.path(), "Status", "Phase complete").unwrap();
        assert!(read_state(tmp.path()).contains("**Status:** Phase complete"));

        update_field(tmp.path(), "Current Plan", "2").unwrap();
        assert!(read_state(tmp.path()).contains("**Current Plan:** 2"));
    }

    #[test]
    fn update_field_missing_state_errors() {
        let tmp = TempDir::new().unwrap();
        let err = update_field(tmp.path(), "Status", "x").unwrap_err();
        assert_eq!(err.to_string(), "STATE.md not found");
    }

    #[test]
    fn patch_reports_applied_labels_only() {
        let tmp = TempDir::new().unwrap();
        write_state(
            tmp.path(),
            "# State\n\n**Status:** Ready\n**Current Plan:** 0\n",
        );
        let applied = patch(
            tmp.path(),
            &[
                ("Status".to_string(), "In progress".to_string()),
                ("Current Plan".to_string(), "1".to_string()),
                ("Nonexistent".to_string(), "x".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(applied, vec!["Status".to_string(), "Current Plan".to_string()]);
        let content = read_state(tmp.path());
        assert!(content.contains("**Status:** In progress"));
        assert!(content.contains("**Current Plan:** 1"));
    }

    #[test]
    fn advance_plan_increments() {
        let tmp = TempDir::new().unwrap();
        write_state(
            tmp.path(),
            "# State\n\n**Current Plan:** 1\n**Total Plans in Phase:** 3\n",
        );
        let advance = advance_plan(tmp.path()).unwrap();
        assert!(advance.advanced);
        assert_eq!(advance.previous_plan, Some(1));
        assert_eq!(advance.current_plan, Some(2));
        assert!(read_state(tmp.path()).contains("**Current Plan:** 2"));
    }

    #[test]
    fn advance_plan_stops_at_last() {
        let tmp = TempDir::new().unwrap();
        write_state(
            tmp.path(),
            "# State\n\n**Current Plan:** 3\n**Total Plans in Phase:** 3\n",
        );
        let advance = advance_plan(tmp.path()).unwrap();
        assert!(!advance.advanced);
        assert_eq!(advance.reason, Some("last_plan"));
        assert_eq!(advance.status, Some("ready_for_verification"));
    }

    #[test]
    fn record_metric_appends_row() {
        let tmp = TempDir::new().unwrap();
        write_state(
            tmp.path(),
            "# State\n\n## Performance Metrics\n\n| Plan | Duration | Tasks | Files |\n|------|----------|-------|-------|\n",
        );
        record_metric(tmp.path(), "01", "01", "5m", Some(3), Some(7)).unwrap();
        let content = read_state(tmp.path());
        assert!(content.contains("| Phase 01 P01 | 5m | 3 tasks | 7 files |"));

        record_metric(tmp.path(), "02", "01", "3m", None, None).unwrap();
        assert!(read_state(tmp.path()).contains("| Phase 02 P01 | 3m | - tasks | - files |"));
    }

    #[test]
    fn record_metric_creates_missing_section() {
        let tmp = TempDir::new().unwrap();
        write_state(tmp.path(), "# State\n\nNo metrics table here.\n");
        record_metric(tmp.path(), "01", "01", "5m", None, None).unwrap();
        let content = read_state(tmp.path());
        assert!(content.contains("## Performance Metrics"));
        assert!(content.contains("| Phase 01 P01 | 5m | - tasks | - files |"));
    }

    #[test]
    fn update_progress_recounts_from_disk() {
        let tmp = TempDir::new().unwrap();
        write_state(tmp.path(), "# State\n\n**Progress:** [old] 0%\n");
        let dir = tmp.path().join(".planning/phases/01-test");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("01-01-PLAN.md"), "plan").unwrap();
        std::fs::write(dir.join("01-01-SUMMARY.md"), "done").unwrap();
        std::fs::write(dir.join("01-02-PLAN.md"), "plan").unwrap();

        let update = update_progress(tmp.path()).unwrap();
        assert_eq!(update.percent, 50);
        assert_eq!(update.completed, 1);
        assert_eq!(update.total, 2);
        let content = read_state(tmp.path());
        assert!(content.contains("50% (1/2 plans)"));
    }

    #[test]
    fn update_progress_empty_project_is_zero() {
        let tmp = TempDir::new().unwrap();
        write_state(tmp.path(), "# State\n\n**Progress:** [old] 0%\n");
        let update = update_progress(tmp.path()).unwrap();
        assert_eq!(update.percent, 0);
        assert_eq!(update.total, 0);
    }

    #[test]
    fn add_decision_replaces_placeholder() {
        let tmp = TempDir::new().unwrap();
        write_state(
            tmp.path(),
            "# State\n\n### Decisions\n\nNone yet.\n\n## Session\n",
        );
        add_decision(tmp.path(), Some("01"), "Use Prisma ORM", None).unwrap();
        let content = read_state(tmp.path());
        assert!(content.contains("- [Phase 01]: Use Prisma ORM"));
        assert!(!content.contains("None yet"));
    }

    #[test]
    fn add_decision_without_phase_uses_question_mark() {
        let tmp = TempDir::new().unwrap();
        write_state(
            tmp.path(),
            "# State\n\n### Decisions\n\nNone yet.\n\n## Session\n",
        );
        add_decision(tmp.path(), None, "Prefer simplicity", None).unwrap();
        assert!(read_state(tmp.path()).contains("- [Phase ?]: Prefer simplicity"));
    }

    #[test]
    fn add_decision_creates_missing_section() {
        let tmp = TempDir::new().unwrap();
        write_state(tmp.path(), "# State\n\nNo decisions section.\n");
        add_decision(tmp.path(), Some("01"), "Test decision", None).unwrap();
        assert!(read_state(tmp.path()).contains("- [Phase 01]: Test decision"));
    }

    #[test]
    fn add_and_resolve_blockers() {
        let tmp = TempDir::new().unwrap();
        write_state(
            tmp.path(),
            "# State\n\n### Blockers/Concerns\n\nNone\n\n## Session\n",
        );
        add_blocker(tmp.path(), "Waiting for API credentials").unwrap();
        add_blocker(tmp.path(), "Design review needed").unwrap();
        let content = read_state(tmp.path());
        assert!(content.contains("- Waiting for API credentials"));
        assert!(content.contains("- Design review needed"));
        assert!(!content.lines().any(|l| l.trim() == "None"));

        let removed = resolve_blocker(tmp.path(), "API credentials").unwrap();
        assert!(removed);
        let content = read_state(tmp.path());
        assert!(!content.contains("API credentials"));
        assert!(content.contains("Design review needed"));

        let removed = resolve_blocker(tmp.path(), "nonexistent issue").unwrap();
        assert!(!removed);
    }

    #[test]
    fn record_session_updates_labels() {
        let tmp = TempDir::new().unwrap();
        write_state(
            tmp.path(),
            "# State\n\n## Session Continuity\n\n**Last session:** 2025-01-01\n**Stopped At:** Phase 1, Plan 1\n**Resume File:** None\n",
        );
        let written = record_session(
            tmp.path(),
            Some("Phase 2, Plan 1"),
            Some(".planning/phases/02-api/02-01-PLAN.md"),
        )
        .unwrap();
        assert!(written.contains(&"Last session".to_string()));
        assert!(written.contains(&"Stopped At".to_string()));
        let content = read_state(tmp.path());
        assert!(content.contains("Phase 2, Plan 1"));
        assert!(content.contains("02-01-PLAN.md"));
    }

    #[test]
    fn record_session_creates_missing_section() {
        let tmp = TempDir::new().unwrap();
        write_state(tmp.path(), "# State\n\nNo session section.\n");
        record_session(tmp.path(), Some("Phase 1"), None).unwrap();
        let content = read_state(tmp.path());
        assert!(content.contains("## Session Continuity"));
        assert!(content.contains("**Stopped At:** Phase 1"));
    }

    #[test]
    fn decrement_total_phases_counts_down() {
        let tmp = TempDir::new().unwrap();
        write_state(tmp.path(), "# State\n\n**Total Phases:** 2\n");
        assert!(decrement_total_phases(tmp.path()).unwrap());
        assert!(read_state(tmp.path()).contains("**Total Phases:** 1"));

        let tmp2 = TempDir::new().unwrap();
        assert!(!decrement_total_phases(tmp2.path()).unwrap());
    }
}
