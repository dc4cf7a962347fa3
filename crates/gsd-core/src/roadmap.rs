//! ROADMAP.md parsing, section slicing, and phase lifecycle operations.
//!
//! The roadmap is authoritative for phase numbering and ordering; phase
//! directories on disk are authoritative for execution state. Lifecycle
//! operations (add, insert, remove, complete) keep the two in step and
//! patch STATE.md where it tracks the same counters.

use crate::error::{GsdError, Result};
use crate::io;
use crate::paths;
use crate::phase::{self, PhaseId};
use crate::state;
use chrono::Local;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static CHECKBOX_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"^(#{2,4})\s*Phase\s+(\d+(?:\.\d+)?):\s*(.+)$").unwrap())
}

fn checkbox_re() -> &'static Regex {
    CHECKBOX_RE
        .get_or_init(|| Regex::new(r"^(\s*-\s*\[)([ xX])(\]\s*Phase\s+)(\d+(?:\.\d+)?)(:.*)$").unwrap())
}

#[derive(Debug, Clone)]
pub struct RoadmapPhase {
    pub id: PhaseId,
    /// Number exactly as written in the heading ("1" or "01.1").
    pub number: String,
    pub name: String,
    pub line: usize,
    pub level: usize,
}

#[derive(Debug)]
pub struct Roadmap {
    pub text: String,
    pub phases: Vec<RoadmapPhase>,
}

impl Roadmap {
    pub fn parse(text: String) -> Roadmap {
        let mut phases = Vec::new();
        for (line, raw) in text.lines().enumerate() {
            let Some(caps) = heading_re().captures(raw) else {
                continue;
            };
            let Some(id) = PhaseId::parse(&caps[2]) else {
                continue;
            };
            phases.push(RoadmapPhase {
                id,
                number: caps[2].to_string(),
                name: caps[3].trim().to_string(),
                line,
                level: caps[1].len(),
            });
        }
        Roadmap { text, phases }
    }

    pub fn find(&self, id: PhaseId) -> Option<&RoadmapPhase> {
        self.phases.iter().find(|p| p.id == id)
    }

    /// Line range of a phase's section: its heading through the line before
    /// the next phase heading (or EOF).
    pub fn section_range(&self, phase: &RoadmapPhase) -> (usize, usize) {
        let end = self
            .phases
            .iter()
            .map(|p| p.line)
            .filter(|&line| line > phase.line)
            .min()
            .unwrap_or_else(|| self.text.lines().count());
        (phase.line, end)
    }

    pub fn section_text(&self, phase: &RoadmapPhase) -> String {
        let (start, end) = self.section_range(phase);
        let lines: Vec<&str> = self.text.lines().collect();
        lines[start..end].join("\n")
    }
}

pub fn load(root: &Path) -> Result<Option<Roadmap>> {
    Ok(io::read_optional(&paths::roadmap_path(root))?.map(Roadmap::parse))
}

fn require(root: &Path) -> Result<Roadmap> {
    load(root)?.ok_or_else(|| GsdError::NotFound("ROADMAP.md".to_string()))
}

fn save(root: &Path, text: &str) -> Result<()> {
    io::atomic_write(&paths::roadmap_path(root), text)
}

// ---------------------------------------------------------------------------
// Section extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PhaseSection {
    pub number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    pub section: String,
}

pub fn get_phase(roadmap: &Roadmap, id: PhaseId) -> Option<PhaseSection> {
    let phase = roadmap.find(id)?;
    let section = roadmap.section_text(phase);
    Some(PhaseSection {
        number: phase.number.clone(),
        name: phase.name.clone(),
        goal: state::get_field(&section, "Goal"),
        depends_on: state::get_field(&section, "Depends on"),
        section,
    })
}

// ---------------------------------------------------------------------------
// Analysis
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AnalyzedPhase {
    pub number: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub depends_on: Option<String>,
    pub disk_status: &'static str,
    pub plans: usize,
    pub summaries: usize,
}

#[derive(Debug, Serialize)]
pub struct Analysis {
    pub phase_count: usize,
    pub phases: Vec<AnalyzedPhase>,
    pub completed_phases: usize,
    pub total_plans: usize,
    pub total_summaries: usize,
    pub progress_percent: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_phase: Option<String>,
}

/// Cross-reference every roadmap phase with its directory. `None` when
/// ROADMAP.md does not exist.
pub fn analyze(root: &Path) -> Result<Option<Analysis>> {
    let Some(roadmap) = load(root)? else {
        return Ok(None);
    };
    let dirs = phase::scan(root)?;
    let mut phases = Vec::new();
    let mut total_plans = 0;
    let mut total_summaries = 0;
    let mut completed = 0;
    for entry in &roadmap.phases {
        let section = roadmap.section_text(entry);
        let dir = dirs.iter().find(|d| d.id == entry.id);
        let (plans, summaries) = match dir {
            Some(dir) => (
                phase::plan_files(&dir.path)?.len(),
                phase::summary_files(&dir.path)?.len(),
            ),
            None => (0, 0),
        };
        let disk_status = match dir {
            None => "no_directory",
            Some(_) if plans == 0 => "empty",
            Some(_) if summaries >= plans => "complete",
            Some(_) if summaries > 0 => "in_progress",
            Some(_) => "planned",
        };
        if disk_status == "complete" {
            completed += 1;
        }
        total_plans += plans;
        total_summaries += summaries;
        phases.push(AnalyzedPhase {
            number: entry.number.clone(),
            name: entry.name.clone(),
            goal: state::get_field(&section, "Goal"),
            depends_on: state::get_field(&section, "Depends on"),
            disk_status,
            plans,
            summaries,
        });
    }
    let progress_percent = if total_plans == 0 {
        0
    } else {
        ((total_summaries as f64 / total_plans as f64) * 100.0).round() as u32
    };
    let current_phase = phases
        .iter()
        .find(|p| p.disk_status != "complete")
        .or_else(|| phases.last())
        .map(|p| p.number.clone());
    Ok(Some(Analysis {
        phase_count: phases.len(),
        phases,
        completed_phases: completed,
        total_plans,
        total_summaries,
        progress_percent,
        current_phase,
    }))
}

// ---------------------------------------------------------------------------
// Lifecycle: add
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct AddedPhase {
    pub phase_number: u32,
    pub slug: String,
    pub directory: String,
}

/// Append a new whole-numbered phase after the highest existing one.
pub fn add_phase(root: &Path, name: &str) -> Result<AddedPhase> {
    let roadmap = require(root)?;
    let next = roadmap
        .phases
        .iter()
        .map(|p| p.id.whole())
        .max()
        .unwrap_or(0)
        + 1;
    let depends = if next > 1 {
        format!("Phase {}", next - 1)
    } else {
        "Nothing".to_string()
    };
    let block = format!(
        "### Phase {next}: {name}\n**Goal:** TBD\n**Depends on:** {depends}\n"
    );
    let text = format!("{}\n\n{block}", roadmap.text.trim_end());
    save(root, &text)?;

    let slug = paths::slugify(name);
    let directory = format!("{}-{slug}", PhaseId::new(next));
    io::ensure_dir(&paths::phases_dir(root).join(&directory))?;
    Ok(AddedPhase {
        phase_number: next,
        slug,
        directory,
    })
}

// ---------------------------------------------------------------------------
// Lifecycle: insert
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct InsertedPhase {
    pub phase_number: String,
    pub after_phase: String,
    pub directory: String,
}

/// Insert an urgent decimal phase directly after `target`. The decimal is
/// computed from directories on disk so roadmap gaps never produce ids that
/// collide.
pub fn insert_phase(root: &Path, target: &str, name: &str) -> Result<InsertedPhase> {
    let roadmap = require(root)?;
    let target_id = PhaseId::from_str(target)?;
    if roadmap.find(target_id).is_none() {
        return Err(GsdError::PhaseNotFound(target.to_string()));
    }
    let next = phase::next_decimal(root, target_id)?.next;

    // Insert after the last roadmap section sharing the target's whole
    // number, so siblings stay in numeric order.
    let insert_after = roadmap
        .phases
        .iter()
        .filter(|p| p.id.whole() == target_id.whole())
        .map(|p| roadmap.section_range(p).1)
        .max()
        .unwrap_or_else(|| roadmap.text.lines().count());

    let mut lines: Vec<String> = roadmap.text.lines().map(str::to_string).collect();
    let mut block = Vec::new();
    if insert_after > 0 && !lines[insert_after - 1].trim().is_empty() {
        block.push(String::new());
    }
    block.push(format!("### Phase {next}: {name} (INSERTED)"));
    block.push("**Goal:** TBD".to_string());
    block.push(format!("**Depends on:** Phase {target}"));
    if insert_after < lines.len() {
        block.push(String::new());
    }
    lines.splice(insert_after..insert_after, block);
    let mut text = lines.join("\n");
    text.push('\n');
    save(root, &text)?;

    let directory = format!("{next}-{}", paths::slugify(name));
    io::ensure_dir(&paths::phases_dir(root).join(&directory))?;
    Ok(InsertedPhase {
        phase_number: next.to_string(),
        after_phase: target.to_string(),
        directory,
    })
}

// ---------------------------------------------------------------------------
// Lifecycle: remove
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RenamedDir {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Serialize)]
pub struct RemovedPhase {
    pub removed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory_deleted: Option<String>,
    pub renamed: Vec<RenamedDir>,
}

/// Remove a phase and close the numbering gap it leaves: whole-phase removal
/// shifts every later whole phase down by one, decimal removal shifts later
/// siblings of the same whole. Executed phases are protected unless forced.
pub fn remove_phase(root: &Path, target: &str, force: bool) -> Result<RemovedPhase> {
    let target_id = PhaseId::from_str(target)?;
    let dirs = phase::scan(root)?;
    let removed_dir = dirs.iter().find(|d| d.id == target_id).cloned();

    if let Some(dir) = &removed_dir {
        let summaries = phase::summary_files(&dir.path)?;
        if !summaries.is_empty() && !force {
            return Err(GsdError::PhaseHasSummaries {
                phase: target.to_string(),
                count: summaries.len(),
            });
        }
        std::fs::remove_dir_all(&dir.path)?;
    }

    // Plan renames before touching anything, then apply in ascending order
    // so each move lands in a slot just vacated.
    let mut mapping: BTreeMap<PhaseId, PhaseId> = BTreeMap::new();
    for dir in &dirs {
        if dir.id == target_id {
            continue;
        }
        let new_id = match target_id.decimal() {
            None if dir.id.whole() > target_id.whole() => match dir.id.decimal() {
                Some(d) => PhaseId::with_decimal(dir.id.whole() - 1, d),
                None => PhaseId::new(dir.id.whole() - 1),
            },
            Some(target_decimal)
                if dir.id.whole() == target_id.whole()
                    && dir.id.decimal().is_some_and(|d| d > target_decimal) =>
            {
                PhaseId::with_decimal(dir.id.whole(), dir.id.decimal().unwrap_or(1) - 1)
            }
            _ => continue,
        };
        mapping.insert(dir.id, new_id);
    }

    let mut renamed = Vec::new();
    for dir in dirs.iter().filter(|d| mapping.contains_key(&d.id)) {
        let new_id = mapping[&dir.id];
        let new_name = format!("{new_id}-{}", dir.slug);
        let new_path = paths::phases_dir(root).join(&new_name);
        std::fs::rename(&dir.path, &new_path)?;
        tracing::debug!(from = %dir.name, to = %new_name, "renamed phase directory");
        rename_prefixed_files(&new_path, &dir.id.to_string(), &new_id.to_string())?;
        renamed.push(RenamedDir {
            from: dir.name.clone(),
            to: new_name,
        });
    }

    if let Some(roadmap) = load(root)? {
        let text = remove_section_and_renumber(&roadmap, target_id, &mapping);
        save(root, &text)?;
    }
    state::decrement_total_phases(root)?;

    Ok(RemovedPhase {
        removed: target.to_string(),
        directory_deleted: removed_dir.map(|d| d.name),
        renamed,
    })
}

fn rename_prefixed_files(dir: &Path, old_id: &str, new_id: &str) -> Result<()> {
    let old_prefix = format!("{old_id}-");
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if let Some(rest) = name.strip_prefix(&old_prefix) {
            std::fs::rename(entry.path(), dir.join(format!("{new_id}-{rest}")))?;
        }
    }
    Ok(())
}

/// Render a renumbered phase reference in the same padding style the
/// document already used.
fn format_like(original: &str, id: PhaseId) -> String {
    if original.starts_with('0') {
        id.to_string()
    } else {
        id.unpadded()
    }
}

fn remove_section_and_renumber(
    roadmap: &Roadmap,
    target_id: PhaseId,
    mapping: &BTreeMap<PhaseId, PhaseId>,
) -> String {
    let lines: Vec<&str> = roadmap.text.lines().collect();
    let removed_range = roadmap.find(target_id).map(|p| roadmap.section_range(p));
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        if removed_range.is_some_and(|(start, end)| i >= start && i < end) {
            continue;
        }
        if let Some(renumbered) = renumber_line(line, target_id, mapping) {
            out.push(renumbered);
        }
    }
    let mut text = out.join("\n");
    if roadmap.text.ends_with('\n') {
        text.push('\n');
    }
    text
}

/// `None` drops the line (the removed phase's own checkbox).
fn renumber_line(
    line: &str,
    target_id: PhaseId,
    mapping: &BTreeMap<PhaseId, PhaseId>,
) -> Option<String> {
    let map_number = |number: &str| -> Option<String> {
        let id = PhaseId::parse(number)?;
        mapping.get(&id).map(|new_id| format_like(number, *new_id))
    };
    if let Some(caps) = heading_re().captures(line) {
        if let Some(mapped) = map_number(&caps[2]) {
            return Some(format!("{} Phase {mapped}: {}", &caps[1], &caps[3]));
        }
        return Some(line.to_string());
    }
    if let Some(caps) = checkbox_re().captures(line) {
        if PhaseId::parse(&caps[4]) == Some(target_id) {
            return None;
        }
        if let Some(mapped) = map_number(&caps[4]) {
            return Some(format!(
                "{}{}{}{mapped}{}",
                &caps[1], &caps[2], &caps[3], &caps[5]
            ));
        }
    }
    Some(line.to_string())
}

// ---------------------------------------------------------------------------
// Lifecycle: complete
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct CompletedPhase {
    pub completed_phase: String,
    pub plans_executed: String,
    pub next_phase: Option<String>,
    pub is_last_phase: bool,
}

/// Mark a phase complete: check off its roadmap entry, stamp the date, and
/// point STATE.md at the next phase (or close out the milestone).
pub fn complete_phase(root: &Path, target: &str) -> Result<CompletedPhase> {
    let roadmap = require(root)?;
    let target_id = PhaseId::from_str(target)?;
    if roadmap.find(target_id).is_none() {
        return Err(GsdError::PhaseNotFound(target.to_string()));
    }

    let (plans, summaries) = match phase::find(root, target_id)? {
        Some(dir) => (
            phase::plan_files(&dir.path)?.len(),
            phase::summary_files(&dir.path)?.len(),
        ),
        None => (0, 0),
    };

    let today = Local::now().format("%Y-%m-%d").to_string();
    let lines: Vec<String> = roadmap
        .text
        .lines()
        .map(|line| {
            let Some(caps) = checkbox_re().captures(line) else {
                return line.to_string();
            };
            if PhaseId::parse(&caps[4]) != Some(target_id) {
                return line.to_string();
            }
            format!(
                "{}x{}{}{} (completed {today})",
                &caps[1],
                &caps[3],
                &caps[4],
                caps[5].trim_end()
            )
        })
        .collect();
    let mut text = lines.join("\n");
    if roadmap.text.ends_with('\n') {
        text.push('\n');
    }
    save(root, &text)?;

    let mut ordered: Vec<&RoadmapPhase> = roadmap.phases.iter().collect();
    ordered.sort_by_key(|p| p.id);
    let next = ordered
        .iter()
        .find(|p| p.id > target_id)
        .map(|p| (p.id.to_string(), p.name.clone()));
    let is_last = next.is_none();

    if let Some(state_text) = state::load(root)? {
        let updated = match &next {
            Some((next_id, next_name)) => {
                let updates: Vec<(&str, &str)> = vec![
                    ("Current Phase", next_id.as_str()),
                    ("Current Phase Name", next_name.as_str()),
                    ("Status", "Ready to plan"),
                    ("Current Plan", "Not started"),
                ];
                state::apply_fields(&state_text, &updates).0
            }
            None => state::apply_fields(&state_text, &[("Status", "Milestone complete")]).0,
        };
        io::atomic_write(&paths::state_path(root), &updated)?;
    }

    Ok(CompletedPhase {
        completed_phase: target.to_string(),
        plans_executed: format!("{summaries}/{plans}"),
        next_phase: next.map(|(id, _)| id),
        is_last_phase: is_last,
    })
}

// ---------------------------------------------------------------------------
// Consistency validation
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct Consistency {
    pub passed: bool,
    pub warning_count: usize,
    pub warnings: Vec<String>,
}

/// Cross-check disk directories against roadmap numbering. `None` when
/// ROADMAP.md does not exist.
pub fn validate_consistency(root: &Path) -> Result<Option<Consistency>> {
    let Some(roadmap) = load(root)? else {
        return Ok(None);
    };
    let mut warnings = Vec::new();

    let dirs = phase::scan(root)?;
    for dir in &dirs {
        if roadmap.find(dir.id).is_none() {
            warnings.push(format!(
                "Phase {} ({}) exists on disk but not in ROADMAP.md",
                dir.id, dir.name
            ));
        }
    }

    let mut wholes: Vec<u32> = roadmap
        .phases
        .iter()
        .filter(|p| !p.id.is_decimal())
        .map(|p| p.id.whole())
        .collect();
    wholes.sort_unstable();
    wholes.dedup();
    for pair in wholes.windows(2) {
        if pair[1] != pair[0] + 1 {
            warnings.push(format!(
                "Gap in phase numbering: Phase {} is followed by Phase {}",
                pair[0], pair[1]
            ));
        }
    }

    Ok(Some(Consistency {
        passed: warnings.is_empty(),
        warning_count: warnings.len(),
        warnings,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
