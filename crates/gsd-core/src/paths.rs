use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const PLANNING_DIR: &str = ".planning";
pub const PHASES_DIR: &str = ".planning/phases";
pub const MILESTONES_ARCHIVE_DIR: &str = ".planning/milestones";
pub const TODOS_PENDING_DIR: &str = ".planning/todos/pending";
pub const TODOS_COMPLETED_DIR: &str = ".planning/todos/completed";
pub const CODEBASE_DIR: &str = ".planning/codebase";
pub const QUICK_DIR: &str = ".planning/quick";

pub const ROADMAP_FILE: &str = ".planning/ROADMAP.md";
pub const STATE_FILE: &str = ".planning/STATE.md";
pub const REQUIREMENTS_FILE: &str = ".planning/REQUIREMENTS.md";
pub const PROJECT_FILE: &str = ".planning/PROJECT.md";
pub const MILESTONES_FILE: &str = ".planning/MILESTONES.md";
pub const CONFIG_FILE: &str = ".planning/config.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn planning_dir(root: &Path) -> PathBuf {
    root.join(PLANNING_DIR)
}

pub fn phases_dir(root: &Path) -> PathBuf {
    root.join(PHASES_DIR)
}

pub fn roadmap_path(root: &Path) -> PathBuf {
    root.join(ROADMAP_FILE)
}

pub fn state_path(root: &Path) -> PathBuf {
    root.join(STATE_FILE)
}

pub fn requirements_path(root: &Path) -> PathBuf {
    root.join(REQUIREMENTS_FILE)
}

pub fn project_path(root: &Path) -> PathBuf {
    root.join(PROJECT_FILE)
}

pub fn milestones_path(root: &Path) -> PathBuf {
    root.join(MILESTONES_FILE)
}

pub fn milestones_archive_dir(root: &Path) -> PathBuf {
    root.join(MILESTONES_ARCHIVE_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn todos_pending_dir(root: &Path) -> PathBuf {
    root.join(TODOS_PENDING_DIR)
}

pub fn todos_completed_dir(root: &Path) -> PathBuf {
    root.join(TODOS_COMPLETED_DIR)
}

pub fn codebase_dir(root: &Path) -> PathBuf {
    root.join(CODEBASE_DIR)
}

pub fn quick_dir(root: &Path) -> PathBuf {
    root.join(QUICK_DIR)
}

// ---------------------------------------------------------------------------
// Slugs
// ---------------------------------------------------------------------------

/// Collapse free text into a slug: lowercase alphanumeric runs joined by
/// single hyphens, everything else dropped. "Fix auth bug!" -> "fix-auth-bug".
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Capitalize the first letter of each whitespace-separated word.
/// Used for roadmap headings built from slug-style name arguments.
pub fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic() {
        assert_eq!(slugify("User Dashboard Page"), "user-dashboard-page");
        assert_eq!(slugify("Fix auth bug"), "fix-auth-bug");
    }

    #[test]
    fn slugify_drops_punctuation() {
        assert_eq!(slugify("Hello World! @#$ Test"), "hello-world-test");
        assert_eq!(slugify("  spaced   out  "), "spaced-out");
    }

    #[test]
    fn slugify_empty_and_symbols_only() {
        assert_eq!(slugify(""), "");
        assert_eq!(slugify("@#$%"), "");
    }

    #[test]
    fn title_case_words() {
        assert_eq!(title_case("user dashboard"), "User Dashboard");
        assert_eq!(title_case("fix critical bug"), "Fix Critical Bug");
    }

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/proj");
        assert_eq!(
            roadmap_path(root),
            PathBuf::from("/tmp/proj/.planning/ROADMAP.md")
        );
        assert_eq!(
            config_path(root),
            PathBuf::from("/tmp/proj/.planning/config.json")
        );
        assert_eq!(
            todos_pending_dir(root),
            PathBuf::from("/tmp/proj/.planning/todos/pending")
        );
    }
}
