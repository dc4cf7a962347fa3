//! Cross-phase digests of executed-plan summaries.
//!
//! Summaries carry structured frontmatter (provides, affects, patterns,
//! key decisions, tech additions). The digest folds every summary on disk
//! into one document that downstream planning steps can load instead of
//! re-reading each file.

use crate::error::Result;
use crate::frontmatter;
use crate::io;
use crate::phase;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// History digest
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct PhaseHistory {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub provides: Vec<String>,
    pub affects: Vec<String>,
    pub patterns: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct DigestDecision {
    pub phase: String,
    pub decision: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Default, Serialize)]
pub struct HistoryDigest {
    pub phases: BTreeMap<String, PhaseHistory>,
    pub decisions: Vec<DigestDecision>,
    pub tech_stack: Vec<String>,
}

/// Fold every phase summary into a single digest. Summaries without
/// frontmatter, or with frontmatter the parser had to skip keys in, are
/// ignored rather than poisoning the whole digest.
pub fn history_digest(root: &Path) -> Result<HistoryDigest> {
    let mut digest = HistoryDigest::default();
    for dir in phase::scan(root)? {
        for file in phase::summary_files(&dir.path)? {
            let text = std::fs::read_to_string(dir.path.join(&file))?;
            let (front, _) = frontmatter::split(&text);
            let Some(front) = front else {
                continue;
            };
            let parsed = frontmatter::parse(front);
            if !parsed.skipped.is_empty() {
                continue;
            }
            let mapping = parsed.mapping;

            let key = mapping
                .get("phase")
                .and_then(|v| v.as_str())
                .map(str::to_string)
                .unwrap_or_else(|| dir.id.to_string());
            let entry = digest.phases.entry(key.clone()).or_default();
            if entry.name.is_none() {
                entry.name = mapping
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(str::to_string);
            }
            extend_unique(&mut entry.provides, list_field(&mapping, "provides"));
            extend_unique(&mut entry.affects, list_field(&mapping, "affects"));
            extend_unique(
                &mut entry.patterns,
                list_field(&mapping, "patterns-established"),
            );
            extend_unique(&mut digest.tech_stack, list_field(&mapping, "added"));

            for item in list_field(&mapping, "key-decisions") {
                let (decision, rationale) = split_decision(&item);
                digest.decisions.push(DigestDecision {
                    phase: key.clone(),
                    decision,
                    rationale,
                });
            }
        }
    }
    Ok(digest)
}

fn list_field(mapping: &frontmatter::Mapping, key: &str) -> Vec<String> {
    mapping
        .get(key)
        .map(|v| v.to_string_list())
        .unwrap_or_default()
}

fn extend_unique(target: &mut Vec<String>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}

/// "Use Prisma: Better DX" splits into the decision and its rationale;
/// items without a colon are the decision alone.
fn split_decision(item: &str) -> (String, Option<String>) {
    match item.split_once(':') {
        Some((head, rest)) if !rest.trim().is_empty() => {
            (head.trim().to_string(), Some(rest.trim().to_string()))
        }
        _ => (item.trim().to_string(), None),
    }
}

// ---------------------------------------------------------------------------
// Single-summary extraction
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct SummaryDecision {
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryExtract {
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub one_liner: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_files: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tech_added: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decisions: Option<Vec<SummaryDecision>>,
}

pub const SUMMARY_FIELDS: &[&str] = &[
    "one_liner",
    "key_files",
    "tech_added",
    "patterns",
    "decisions",
];

/// Extract summary frontmatter fields. `fields` limits the output to the
/// named subset (the path is always reported). `None` when the file does
/// not exist.
pub fn summary_extract(
    root: &Path,
    rel_path: &str,
    fields: Option<&[String]>,
) -> Result<Option<SummaryExtract>> {
    let Some(text) = io::read_optional(&root.join(rel_path))? else {
        return Ok(None);
    };
    let (front, _) = frontmatter::split(&text);
    let mapping = front
        .map(|f| frontmatter::parse(f).mapping)
        .unwrap_or_default();

    let wanted = |name: &str| -> bool {
        match fields {
            Some(list) => list.iter().any(|f| f == name),
            None => true,
        }
    };

    let mut extract = SummaryExtract {
        path: rel_path.to_string(),
        one_liner: None,
        key_files: None,
        tech_added: None,
        patterns: None,
        decisions: None,
    };
    if wanted("one_liner") {
        extract.one_liner = mapping
            .get("one-liner")
            .or_else(|| mapping.get("one_liner"))
            .and_then(|v| v.as_str())
            .map(str::to_string);
    }
    if wanted("key_files") {
        extract.key_files = Some(list_field(&mapping, "key-files"));
    }
    if wanted("tech_added") {
        extract.tech_added = Some(list_field(&mapping, "added"));
    }
    if wanted("patterns") {
        extract.patterns = Some(list_field(&mapping, "patterns-established"));
    }
    if wanted("decisions") {
        extract.decisions = Some(
            list_field(&mapping, "key-decisions")
                .iter()
                .map(|item| {
                    let (summary, rationale) = split_decision(item);
                    SummaryDecision { summary, rationale }
                })
                .collect(),
        );
    }
    Ok(Some(extract))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_summary(root: &Path, dir: &str, file: &str, content: &str) {
        let path = root.join(".planning/phases").join(dir);
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join(file), content).unwrap();
    }

    #[test]
    fn empty_project_yields_empty_digest() {
        let tmp = TempDir::new().unwrap();
        let digest = history_digest(tmp.path()).unwrap();
        assert!(digest.phases.is_empty());
        assert!(digest.decisions.is_empty());
        assert!(digest.tech_stack.is_empty());
    }

    #[test]
    fn nested_frontmatter_folds_into_digest() {
        let tmp = TempDir::new().unwrap();
        write_summary(
            tmp.path(),
            "01-foundation",
            "01-01-SUMMARY.md",
            "---\nphase: \"01\"\nname: \"Foundation Setup\"\ndependency-graph:\n  provides:\n    - \"Database schema\"\n    - \"Auth system\"\n  affects:\n    - \"API layer\"\ntech-stack:\n  added:\n    - \"prisma\"\n    - \"jose\"\npatterns-established:\n  - \"Repository pattern\"\nkey-decisions:\n  - \"Use Prisma over Drizzle\"\n---\n\n# Summary\n",
        );
        let digest = history_digest(tmp.path()).unwrap();
        let phase = &digest.phases["01"];
        assert_eq!(phase.provides, vec!["Database schema", "Auth system"]);
        assert_eq!(phase.affects, vec!["API layer"]);
        assert_eq!(phase.patterns, vec!["Repository pattern"]);
        assert_eq!(digest.tech_stack, vec!["prisma", "jose"]);
        assert_eq!(digest.decisions.len(), 1);
        assert_eq!(digest.decisions[0].decision, "Use Prisma over Drizzle");
        assert_eq!(digest.decisions[0].phase, "01");
    }

    #[test]
    fn multiple_phases_merge() {
        let tmp = TempDir::new().unwrap();
        write_summary(
            tmp.path(),
            "01-foundation",
            "01-01-SUMMARY.md",
            "---\nphase: \"01\"\nprovides:\n  - \"Database\"\nkey-decisions:\n  - \"Decision 1\"\n---\n",
        );
        write_summary(
            tmp.path(),
            "02-api",
            "02-01-SUMMARY.md",
            "---\nphase: \"02\"\nprovides:\n  - \"REST endpoints\"\nkey-decisions:\n  - \"Decision 2\"\ntech-stack:\n  added:\n    - \"zod\"\n---\n",
        );
        let digest = history_digest(tmp.path()).unwrap();
        assert!(digest.phases.contains_key("01"));
        assert!(digest.phases.contains_key("02"));
        assert_eq!(digest.decisions.len(), 2);
        assert_eq!(digest.tech_stack, vec!["zod"]);
    }

    #[test]
    fn malformed_summaries_are_skipped() {
        let tmp = TempDir::new().unwrap();
        write_summary(
            tmp.path(),
            "01-test",
            "01-01-SUMMARY.md",
            "---\nphase: \"01\"\nprovides:\n  - \"Valid feature\"\n---\n",
        );
        write_summary(
            tmp.path(),
            "01-test",
            "01-02-SUMMARY.md",
            "# Just a heading\nNo frontmatter here\n",
        );
        write_summary(
            tmp.path(),
            "01-test",
            "01-03-SUMMARY.md",
            "---\nbroken: [unclosed\n---\n",
        );
        let digest = history_digest(tmp.path()).unwrap();
        assert_eq!(digest.phases["01"].provides, vec!["Valid feature"]);
    }

    #[test]
    fn inline_arrays_fold() {
        let tmp = TempDir::new().unwrap();
        write_summary(
            tmp.path(),
            "01-test",
            "01-01-SUMMARY.md",
            "---\nphase: \"01\"\nprovides: [Feature A, Feature B]\npatterns-established: [\"Pattern X\", \"Pattern Y\"]\n---\n",
        );
        let digest = history_digest(tmp.path()).unwrap();
        assert_eq!(digest.phases["01"].provides, vec!["Feature A", "Feature B"]);
        assert_eq!(
            digest.phases["01"].patterns,
            vec!["Pattern X", "Pattern Y"]
        );
    }

    #[test]
    fn missing_phase_key_falls_back_to_directory_id() {
        let tmp = TempDir::new().unwrap();
        write_summary(
            tmp.path(),
            "03-api",
            "03-01-SUMMARY.md",
            "---\nprovides:\n  - \"Endpoints\"\n---\n",
        );
        let digest = history_digest(tmp.path()).unwrap();
        assert!(digest.phases.contains_key("03"));
    }

    #[test]
    fn extract_reads_all_fields() {
        let tmp = TempDir::new().unwrap();
        write_summary(
            tmp.path(),
            "01-foundation",
            "01-01-SUMMARY.md",
            "---\none-liner: Set up Prisma with User and Project models\nkey-files:\n  - prisma/schema.prisma\n  - src/lib/db.ts\ntech-stack:\n  added:\n    - prisma\n    - zod\npatterns-established:\n  - Repository pattern\nkey-decisions:\n  - Use Prisma over Drizzle: Better DX and ecosystem\n  - Single database: Start simple, shard later\n---\n\n# Summary\n",
        );
        let rel = ".planning/phases/01-foundation/01-01-SUMMARY.md";
        let extract = summary_extract(tmp.path(), rel, None).unwrap().unwrap();
        assert_eq!(extract.path, rel);
        assert_eq!(
            extract.one_liner.as_deref(),
            Some("Set up Prisma with User and Project models")
        );
        assert_eq!(
            extract.key_files.as_deref(),
            Some(&["prisma/schema.prisma".to_string(), "src/lib/db.ts".to_string()][..])
        );
        assert_eq!(
            extract.tech_added.as_deref(),
            Some(&["prisma".to_string(), "zod".to_string()][..])
        );
        let decisions = extract.decisions.unwrap();
        assert_eq!(decisions.len(), 2);
        assert_eq!(decisions[0].summary, "Use Prisma over Drizzle");
        assert_eq!(
            decisions[0].rationale.as_deref(),
            Some("Better DX and ecosystem")
        );
    }

    #[test]
    fn extract_filters_requested_fields() {
        let tmp = TempDir::new().unwrap();
        write_summary(
            tmp.path(),
            "01-foundation",
            "01-01-SUMMARY.md",
            "---\none-liner: Set up database\nkey-files:\n  - prisma/schema.prisma\npatterns-established:\n  - Repository pattern\n---\n",
        );
        let rel = ".planning/phases/01-foundation/01-01-SUMMARY.md";
        let fields = vec!["one_liner".to_string(), "key_files".to_string()];
        let extract = summary_extract(tmp.path(), rel, Some(&fields))
            .unwrap()
            .unwrap();
        assert_eq!(extract.one_liner.as_deref(), Some("Set up database"));
        assert!(extract.key_files.is_some());
        assert!(extract.patterns.is_none());
        assert!(extract.decisions.is_none());
    }

    #[test]
    fn extract_defaults_missing_fields_to_empty() {
        let tmp = TempDir::new().unwrap();
        write_summary(
            tmp.path(),
            "01-foundation",
            "01-01-SUMMARY.md",
            "---\none-liner: Minimal summary\n---\n\n# Summary\n",
        );
        let rel = ".planning/phases/01-foundation/01-01-SUMMARY.md";
        let extract = summary_extract(tmp.path(), rel, None).unwrap().unwrap();
        assert_eq!(extract.one_liner.as_deref(), Some("Minimal summary"));
        assert_eq!(extract.key_files.as_deref(), Some(&[][..]));
        assert_eq!(extract.tech_added.as_deref(), Some(&[][..]));
        assert_eq!(extract.patterns.as_deref(), Some(&[][..]));
        assert!(extract.decisions.unwrap().is_empty());
    }

    #[test]
    fn extract_missing_file_is_none() {
        let tmp = TempDir::new().unwrap();
        assert!(summary_extract(tmp.path(), ".planning/phases/x/y.md", None)
            .unwrap()
            .is_none());
    }
}
