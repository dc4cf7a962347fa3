//! Phase identifiers and phase-directory scanning.
//!
//! Phase ids are whole numbers (`01`, `02`, …) or decimal insertions
//! (`02.1`). Ordering is always by numeric (whole, decimal) pairs, never by
//! string comparison: `01.9 < 01.10 < 02`.

use crate::error::{GsdError, Result};
use crate::frontmatter;
use crate::paths;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// PhaseId
// ---------------------------------------------------------------------------

/// Derived `Ord` gives the numeric pair order because `decimal` is `None`
/// for whole phases and always >= 1 for insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhaseId {
    whole: u32,
    decimal: Option<u32>,
}

impl PhaseId {
    pub fn new(whole: u32) -> PhaseId {
        PhaseId {
            whole,
            decimal: None,
        }
    }

    pub fn with_decimal(whole: u32, decimal: u32) -> PhaseId {
        PhaseId {
            whole,
            decimal: Some(decimal),
        }
    }

    /// Accepts padded and unpadded forms: "1", "01", "2.1", "10.11".
    /// Rejects empty parts, zero or zero-padded decimals ("1.0", "1.01").
    pub fn parse(s: &str) -> Option<PhaseId> {
        let (whole_part, decimal_part) = match s.split_once('.') {
            Some((w, d)) => (w, Some(d)),
            None => (s, None),
        };
        if whole_part.is_empty() || !whole_part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let whole = whole_part.parse::<u32>().ok()?;
        let decimal = match decimal_part {
            None => None,
            Some(d) => {
                if d.is_empty() || !d.chars().all(|c| c.is_ascii_digit()) || d.starts_with('0') {
                    return None;
                }
                Some(d.parse::<u32>().ok()?)
            }
        };
        Some(PhaseId { whole, decimal })
    }

    pub fn whole(&self) -> u32 {
        self.whole
    }

    pub fn decimal(&self) -> Option<u32> {
        self.decimal
    }

    pub fn is_decimal(&self) -> bool {
        self.decimal.is_some()
    }

    /// The whole-number phase this id belongs to (identity for wholes).
    pub fn base(&self) -> PhaseId {
        PhaseId::new(self.whole)
    }

    /// Render without zero padding: "3", "6.1". Roadmap prose and scaffold
    /// headings use this form; file and directory names use `Display`.
    pub fn unpadded(&self) -> String {
        match self.decimal {
            Some(d) => format!("{}.{d}", self.whole),
            None => self.whole.to_string(),
        }
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.decimal {
            Some(d) => write!(f, "{:02}.{}", self.whole, d),
            None => write!(f, "{:02}", self.whole),
        }
    }
}

impl FromStr for PhaseId {
    type Err = GsdError;

    fn from_str(s: &str) -> Result<PhaseId> {
        PhaseId::parse(s).ok_or_else(|| GsdError::InvalidPhaseId(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Singleton phase documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseDocKind {
    Context,
    Research,
    Verification,
    Uat,
}

impl PhaseDocKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhaseDocKind::Context => "CONTEXT",
            PhaseDocKind::Research => "RESEARCH",
            PhaseDocKind::Verification => "VERIFICATION",
            PhaseDocKind::Uat => "UAT",
        }
    }

    pub fn filename(&self, id: PhaseId) -> String {
        format!("{id}-{}.md", self.as_str())
    }
}

impl FromStr for PhaseDocKind {
    type Err = GsdError;

    fn from_str(s: &str) -> Result<PhaseDocKind> {
        match s.to_lowercase().as_str() {
            "context" => Ok(PhaseDocKind::Context),
            "research" => Ok(PhaseDocKind::Research),
            "verification" => Ok(PhaseDocKind::Verification),
            "uat" => Ok(PhaseDocKind::Uat),
            other => Err(GsdError::InvalidInput(format!(
                "unknown phase document kind: {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Directory scanning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PhaseDir {
    pub id: PhaseId,
    /// Full directory name, e.g. "03-api-layer".
    pub name: String,
    /// Name without the id prefix, e.g. "api-layer".
    pub slug: String,
    pub path: PathBuf,
}

static DIR_RE: OnceLock<Regex> = OnceLock::new();

fn dir_re() -> &'static Regex {
    DIR_RE.get_or_init(|| Regex::new(r"^(\d+(?:\.\d+)?)-(.+)$").unwrap())
}

/// Enumerate phase directories sorted by phase id. A missing `phases/`
/// directory is an empty project, not an error.
pub fn scan(root: &Path) -> Result<Vec<PhaseDir>> {
    let phases = paths::phases_dir(root);
    let mut dirs = Vec::new();
    let entries = match std::fs::read_dir(&phases) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(dirs),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let Some(caps) = dir_re().captures(&name) else {
            continue;
        };
        let Some(id) = PhaseId::parse(&caps[1]) else {
            continue;
        };
        dirs.push(PhaseDir {
            id,
            slug: caps[2].to_string(),
            path: entry.path(),
            name,
        });
    }
    dirs.sort_by(|a, b| a.id.cmp(&b.id).then_with(|| a.name.cmp(&b.name)));
    Ok(dirs)
}

pub fn find(root: &Path, id: PhaseId) -> Result<Option<PhaseDir>> {
    Ok(scan(root)?.into_iter().find(|dir| dir.id == id))
}

/// Sorted `*-PLAN.md` file names in a phase directory.
pub fn plan_files(dir: &Path) -> Result<Vec<String>> {
    files_with_suffix(dir, "-PLAN.md")
}

/// Sorted `*-SUMMARY.md` file names in a phase directory.
pub fn summary_files(dir: &Path) -> Result<Vec<String>> {
    files_with_suffix(dir, "-SUMMARY.md")
}

fn files_with_suffix(dir: &Path, suffix: &str) -> Result<Vec<String>> {
    let mut files = Vec::new();
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(files),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.ends_with(suffix) {
            files.push(name);
        }
    }
    files.sort();
    Ok(files)
}

/// Plan ids (`{phase}-{seq}`) that have no matching summary.
pub fn incomplete_plan_ids(dir: &Path) -> Result<Vec<String>> {
    let summaries: Vec<String> = summary_files(dir)?
        .iter()
        .filter_map(|name| name.strip_suffix("-SUMMARY.md").map(str::to_string))
        .collect();
    Ok(plan_files(dir)?
        .iter()
        .filter_map(|name| name.strip_suffix("-PLAN.md").map(str::to_string))
        .filter(|prefix| !summaries.contains(prefix))
        .collect())
}

// ---------------------------------------------------------------------------
// Decimal insertion points
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct NextDecimal {
    pub base: PhaseId,
    pub next: PhaseId,
    pub existing: Vec<PhaseId>,
    pub base_found: bool,
}

/// Compute the next decimal insertion id under `base`. Gaps are never
/// filled: the result is one past the numeric maximum of the existing
/// siblings. A missing base directory still yields a usable id.
pub fn next_decimal(root: &Path, base: PhaseId) -> Result<NextDecimal> {
    let dirs = scan(root)?;
    let base = base.base();
    let existing: Vec<PhaseId> = dirs
        .iter()
        .map(|dir| dir.id)
        .filter(|id| id.whole() == base.whole() && id.is_decimal())
        .collect();
    let max = existing.iter().filter_map(|id| id.decimal()).max();
    let next = PhaseId::with_decimal(base.whole(), max.map_or(1, |m| m + 1));
    let base_found = dirs.iter().any(|dir| dir.id == base);
    Ok(NextDecimal {
        base,
        next,
        existing,
        base_found,
    })
}

// ---------------------------------------------------------------------------
// Plan index
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct PlanInfo {
    pub id: String,
    pub wave: i64,
    pub autonomous: bool,
    pub objective: String,
    pub files_modified: Vec<String>,
    pub task_count: usize,
    pub has_summary: bool,
}

#[derive(Debug, Serialize)]
pub struct PlanIndex {
    pub phase: String,
    pub plans: Vec<PlanInfo>,
    pub waves: BTreeMap<i64, Vec<String>>,
    pub incomplete: Vec<String>,
    pub has_checkpoints: bool,
}

static TASK_HEADING_RE: OnceLock<Regex> = OnceLock::new();

fn task_heading_re() -> &'static Regex {
    TASK_HEADING_RE.get_or_init(|| Regex::new(r"(?m)^## Task \d+").unwrap())
}

/// Index every plan in a phase: wave grouping, autonomy, completion.
/// Corrupt plan frontmatter degrades to defaults instead of aborting the
/// index. `None` when the phase directory does not exist.
pub fn plan_index(root: &Path, id: PhaseId) -> Result<Option<PlanIndex>> {
    let Some(dir) = find(root, id)? else {
        return Ok(None);
    };
    let summaries: Vec<String> = summary_files(&dir.path)?
        .iter()
        .filter_map(|name| name.strip_suffix("-SUMMARY.md").map(str::to_string))
        .collect();

    let mut plans = Vec::new();
    let mut waves: BTreeMap<i64, Vec<String>> = BTreeMap::new();
    let mut incomplete = Vec::new();
    let mut has_checkpoints = false;
    for file in plan_files(&dir.path)? {
        let Some(plan_id) = file.strip_suffix("-PLAN.md").map(str::to_string) else {
            continue;
        };
        let text = std::fs::read_to_string(dir.path.join(&file))?;
        let (front, body) = frontmatter::split(&text);
        let mapping = front
            .map(|f| frontmatter::parse(f).mapping)
            .unwrap_or_default();

        let wave = mapping.get("wave").and_then(|v| v.as_int()).unwrap_or(1);
        let autonomous = mapping
            .get("autonomous")
            .and_then(|v| v.as_bool())
            .unwrap_or(true);
        let objective = mapping
            .get("objective")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let files_modified = mapping
            .get("files-modified")
            .or_else(|| mapping.get("files_modified"))
            .map(|v| v.to_string_list())
            .unwrap_or_default();
        let task_count = task_heading_re().find_iter(body).count();
        let has_summary = summaries.contains(&plan_id);

        if !autonomous {
            has_checkpoints = true;
        }
        if !has_summary {
            incomplete.push(plan_id.clone());
        }
        waves.entry(wave).or_default().push(plan_id.clone());
        plans.push(PlanInfo {
            id: plan_id,
            wave,
            autonomous,
            objective,
            files_modified,
            task_count,
            has_summary,
        });
    }
    Ok(Some(PlanIndex {
        phase: id.to_string(),
        plans,
        waves,
        incomplete,
        has_checkpoints,
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn mkphase(root: &Path, name: &str) {
        std::fs::create_dir_all(root.join(".planning/phases").join(name)).unwrap();
    }

    fn writefile(root: &Path, dir: &str, file: &str, content: &str) {
        let path = root.join(".planning/phases").join(dir).join(file);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn ordering_is_numeric_not_lexicographic() {
        let a = PhaseId::parse("01.9").unwrap();
        let b = PhaseId::parse("01.10").unwrap();
        let c = PhaseId::parse("02").unwrap();
        let d = PhaseId::parse("02.1").unwrap();
        assert!(a < b);
        assert!(b < c);
        assert!(c < d);
    }

    #[test]
    fn parse_accepts_unpadded_and_pads_display() {
        assert_eq!(PhaseId::parse("1").unwrap().to_string(), "01");
        assert_eq!(PhaseId::parse("06").unwrap().to_string(), "06");
        assert_eq!(PhaseId::parse("2.1").unwrap().to_string(), "02.1");
        assert_eq!(PhaseId::parse("10.11").unwrap().to_string(), "10.11");
    }

    #[test]
    fn parse_rejects_bad_ids() {
        for bad in ["", "a", "1.", ".1", "1.0", "1.01", "1.2.3", "-1"] {
            assert!(PhaseId::parse(bad).is_none(), "expected reject: {bad}");
        }
    }

    #[test]
    fn doc_kind_filenames() {
        let id = PhaseId::parse("3").unwrap();
        assert_eq!(PhaseDocKind::Context.filename(id), "03-CONTEXT.md");
        assert_eq!(PhaseDocKind::Uat.filename(id), "03-UAT.md");
        assert!("research".parse::<PhaseDocKind>().is_ok());
        assert!("nope".parse::<PhaseDocKind>().is_err());
    }

    #[test]
    fn scan_sorts_decimals_between_wholes() {
        let tmp = TempDir::new().unwrap();
        for name in ["03-ui", "02-api", "02.2-patch", "02.1-hotfix", "10-final"] {
            mkphase(tmp.path(), name);
        }
        let names: Vec<String> = scan(tmp.path()).unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["02-api", "02.1-hotfix", "02.2-patch", "03-ui", "10-final"]);
    }

    #[test]
    fn scan_missing_phases_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(scan(tmp.path()).unwrap().is_empty());
    }

    #[test]
    fn find_matches_exact_id() {
        let tmp = TempDir::new().unwrap();
        mkphase(tmp.path(), "03-api-layer");
        let found = find(tmp.path(), PhaseId::parse("3").unwrap()).unwrap().unwrap();
        assert_eq!(found.slug, "api-layer");
        assert!(find(tmp.path(), PhaseId::parse("4").unwrap()).unwrap().is_none());
    }

    #[test]
    fn next_decimal_without_siblings() {
        let tmp = TempDir::new().unwrap();
        mkphase(tmp.path(), "06-deploy");
        let nd = next_decimal(tmp.path(), PhaseId::parse("6").unwrap()).unwrap();
        assert_eq!(nd.next.to_string(), "06.1");
        assert!(nd.existing.is_empty());
        assert!(nd.base_found);
    }

    #[test]
    fn next_decimal_skips_gaps() {
        let tmp = TempDir::new().unwrap();
        mkphase(tmp.path(), "06-deploy");
        mkphase(tmp.path(), "06.1-fix-a");
        mkphase(tmp.path(), "06.3-fix-c");
        let nd = next_decimal(tmp.path(), PhaseId::parse("06").unwrap()).unwrap();
        assert_eq!(nd.next.to_string(), "06.4");
        let existing: Vec<String> = nd.existing.iter().map(|id| id.to_string()).collect();
        assert_eq!(existing, vec!["06.1", "06.3"]);
    }

    #[test]
    fn next_decimal_is_numeric_past_nine() {
        let tmp = TempDir::new().unwrap();
        mkphase(tmp.path(), "01-base");
        for i in 1..=9 {
            mkphase(tmp.path(), &format!("01.{i}-fix"));
        }
        let nd = next_decimal(tmp.path(), PhaseId::parse("01").unwrap()).unwrap();
        assert_eq!(nd.next.to_string(), "01.10");
    }

    #[test]
    fn next_decimal_unknown_base_still_computes() {
        let tmp = TempDir::new().unwrap();
        let nd = next_decimal(tmp.path(), PhaseId::parse("99").unwrap()).unwrap();
        assert!(!nd.base_found);
        assert_eq!(nd.next.to_string(), "99.1");
    }

    #[test]
    fn incomplete_plans_lack_summaries() {
        let tmp = TempDir::new().unwrap();
        writefile(tmp.path(), "03-api", "03-01-PLAN.md", "plan");
        writefile(tmp.path(), "03-api", "03-01-SUMMARY.md", "done");
        writefile(tmp.path(), "03-api", "03-02-PLAN.md", "plan");
        let dir = tmp.path().join(".planning/phases/03-api");
        assert_eq!(incomplete_plan_ids(&dir).unwrap(), vec!["03-02".to_string()]);
    }

    #[test]
    fn plan_index_groups_waves_and_flags_checkpoints() {
        let tmp = TempDir::new().unwrap();
        writefile(
            tmp.path(),
            "03-api",
            "03-01-PLAN.md",
            "---\nwave: 1\nautonomous: true\nobjective: Build endpoints\nfiles-modified: [src/api.js]\n---\n## Task 1: scaffold\n## Task 2: handlers\n",
        );
        writefile(
            tmp.path(),
            "03-api",
            "03-02-PLAN.md",
            "---\nwave: 2\nautonomous: false\n---\nbody\n",
        );
        writefile(tmp.path(), "03-api", "03-01-SUMMARY.md", "done");
        let index = plan_index(tmp.path(), PhaseId::parse("03").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(index.phase, "03");
        assert_eq!(index.plans.len(), 2);
        assert_eq!(index.plans[0].task_count, 2);
        assert_eq!(index.plans[0].files_modified, vec!["src/api.js".to_string()]);
        assert!(index.plans[0].has_summary);
        assert_eq!(index.waves[&1], vec!["03-01".to_string()]);
        assert_eq!(index.waves[&2], vec!["03-02".to_string()]);
        assert_eq!(index.incomplete, vec!["03-02".to_string()]);
        assert!(index.has_checkpoints);
    }

    #[test]
    fn plan_index_tolerates_corrupt_frontmatter() {
        let tmp = TempDir::new().unwrap();
        writefile(
            tmp.path(),
            "04-ui",
            "04-01-PLAN.md",
            "---\nbroken: [unclosed\n---\nbody\n",
        );
        let index = plan_index(tmp.path(), PhaseId::parse("4").unwrap())
            .unwrap()
            .unwrap();
        assert_eq!(index.plans.len(), 1);
        assert_eq!(index.plans[0].wave, 1);
        assert!(index.plans[0].autonomous);
    }

    #[test]
    fn plan_index_missing_phase_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(plan_index(tmp.path(), PhaseId::parse("9").unwrap())
            .unwrap()
            .is_none());
    }
}
