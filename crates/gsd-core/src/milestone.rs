//! Milestone archival.
//!
//! Completing a milestone retires the current ROADMAP.md and REQUIREMENTS.md
//! into `.planning/milestones/` and records a shipped entry in MILESTONES.md
//! with one accomplishment line per executed summary.

use crate::error::Result;
use crate::frontmatter;
use crate::io;
use crate::paths;
use crate::phase;
use chrono::Local;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct ArchivedDocs {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roadmap: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CompletedMilestone {
    pub version: String,
    pub name: String,
    pub phases: usize,
    pub accomplishments: Vec<String>,
    pub archived: ArchivedDocs,
}

/// Archive the shipped milestone. Newest entries sit at the top of
/// MILESTONES.md; existing entries are left untouched.
pub fn complete(root: &Path, version: &str, name: &str) -> Result<CompletedMilestone> {
    let dirs = phase::scan(root)?;
    let mut accomplishments = Vec::new();
    for dir in &dirs {
        for file in phase::summary_files(&dir.path)? {
            let text = std::fs::read_to_string(dir.path.join(&file))?;
            let (front, _) = frontmatter::split(&text);
            let Some(front) = front else {
                continue;
            };
            if let Some(line) = frontmatter::parse(front)
                .mapping
                .get("one-liner")
                .and_then(|v| v.as_str())
            {
                accomplishments.push(line.to_string());
            }
        }
    }

    let milestones_dir = paths::milestones_archive_dir(root);
    io::ensure_dir(&milestones_dir)?;
    let roadmap = archive(
        &paths::roadmap_path(root),
        &milestones_dir.join(format!("{version}-ROADMAP.md")),
    )?;
    let requirements = archive(
        &paths::requirements_path(root),
        &milestones_dir.join(format!("{version}-REQUIREMENTS.md")),
    )?;

    write_entry(root, version, name, dirs.len(), &accomplishments)?;

    Ok(CompletedMilestone {
        version: version.to_string(),
        name: name.to_string(),
        phases: dirs.len(),
        accomplishments,
        archived: ArchivedDocs {
            roadmap,
            requirements,
        },
    })
}

fn archive(from: &Path, to: &Path) -> Result<Option<String>> {
    if !from.exists() {
        return Ok(None);
    }
    io::move_file(from, to)?;
    Ok(Some(to.to_string_lossy().into_owned()))
}

fn write_entry(
    root: &Path,
    version: &str,
    name: &str,
    phases: usize,
    accomplishments: &[String],
) -> Result<()> {
    let today = Local::now().format("%Y-%m-%d").to_string();
    let mut entry = format!("## {version} {name} (Shipped: {today})\n\n");
    entry.push_str(&format!("**Phases completed:** {phases}\n"));
    if !accomplishments.is_empty() {
        entry.push_str("\n**Accomplishments:**\n");
        for line in accomplishments {
            entry.push_str(&format!("- {line}\n"));
        }
    }
    entry.push_str("\n---\n");

    let path = paths::milestones_path(root);
    let text = match io::read_optional(&path)? {
        None => format!("# Milestones\n\n{entry}"),
        Some(existing) => {
            // Insert below the title so the newest milestone reads first.
            let lines: Vec<&str> = existing.lines().collect();
            let after_title = lines
                .iter()
                .position(|l| l.starts_with("# "))
                .map(|i| i + 1)
                .unwrap_or(0);
            let mut out: Vec<String> = lines[..after_title].iter().map(|l| l.to_string()).collect();
            out.push(String::new());
            out.extend(entry.lines().map(str::to_string));
            out.extend(lines[after_title..].iter().map(|l| l.to_string()));
            let mut text = out.join("\n");
            if !text.ends_with('\n') {
                text.push('\n');
            }
            text
        }
    };
    io::atomic_write(&path, &text)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn planning(root: &Path) -> std::path::PathBuf {
        let dir = root.join(".planning");
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn archives_docs_and_writes_milestones() {
        let tmp = TempDir::new().unwrap();
        let planning = planning(tmp.path());
        std::fs::write(
            planning.join("ROADMAP.md"),
            "# Roadmap v1.0 MVP\n\n### Phase 1: Foundation\n**Goal:** Setup\n",
        )
        .unwrap();
        std::fs::write(
            planning.join("REQUIREMENTS.md"),
            "# Requirements\n\n- [ ] User auth\n",
        )
        .unwrap();
        let p1 = planning.join("phases/01-foundation");
        std::fs::create_dir_all(&p1).unwrap();
        std::fs::write(
            p1.join("01-01-SUMMARY.md"),
            "---\none-liner: Set up project infrastructure\n---\n# Summary\n",
        )
        .unwrap();

        let done = complete(tmp.path(), "v1.0", "MVP Foundation").unwrap();
        assert_eq!(done.version, "v1.0");
        assert_eq!(done.phases, 1);
        assert!(done.archived.roadmap.is_some());
        assert!(done.archived.requirements.is_some());
        assert_eq!(
            done.accomplishments,
            vec!["Set up project infrastructure".to_string()]
        );

        assert!(planning.join("milestones/v1.0-ROADMAP.md").is_file());
        assert!(planning.join("milestones/v1.0-REQUIREMENTS.md").is_file());
        assert!(!planning.join("ROADMAP.md").exists());

        let milestones = std::fs::read_to_string(planning.join("MILESTONES.md")).unwrap();
        assert!(milestones.contains("v1.0 MVP Foundation"));
        assert!(milestones.contains("Set up project infrastructure"));
    }

    #[test]
    fn preserves_existing_entries() {
        let tmp = TempDir::new().unwrap();
        let planning = planning(tmp.path());
        std::fs::write(
            planning.join("MILESTONES.md"),
            "# Milestones\n\n## v0.9 Alpha (Shipped: 2025-01-01)\n\n---\n\n",
        )
        .unwrap();
        std::fs::write(planning.join("ROADMAP.md"), "# Roadmap v1.0\n").unwrap();

        complete(tmp.path(), "v1.0", "Beta").unwrap();
        let milestones = std::fs::read_to_string(planning.join("MILESTONES.md")).unwrap();
        assert!(milestones.contains("v0.9 Alpha"));
        assert!(milestones.contains("v1.0 Beta"));
        let new_pos = milestones.find("v1.0 Beta").unwrap();
        let old_pos = milestones.find("v0.9 Alpha").unwrap();
        assert!(new_pos < old_pos);
    }

    #[test]
    fn missing_docs_archive_nothing() {
        let tmp = TempDir::new().unwrap();
        planning(tmp.path());
        let done = complete(tmp.path(), "v0.1", "Empty").unwrap();
        assert_eq!(done.phases, 0);
        assert!(done.archived.roadmap.is_none());
        assert!(done.archived.requirements.is_none());
    }
}
