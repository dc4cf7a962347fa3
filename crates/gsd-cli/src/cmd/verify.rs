use crate::output::print_json;
use clap::Subcommand;
use gsd_core::phase::PhaseId;
use gsd_core::verify::{self, Audit};
use serde_json::json;
use std::path::Path;

#[derive(Subcommand)]
pub enum VerifySubcommand {
    /// Structural audit of a single plan file
    PlanStructure { file: String },

    /// Plan/summary pairing audit for one phase
    PhaseCompleteness { phase: String },

    /// Resolve @path references in a document
    References { file: String },

    /// Check must_haves.artifacts of a plan against the working tree
    Artifacts { file: String },

    /// Check must_haves.key_links of a plan against artifact contents
    KeyLinks { file: String },

    /// Required-section audit for a summary file
    Summary { file: String },
}

pub fn run(root: &Path, subcommand: VerifySubcommand) -> anyhow::Result<()> {
    match subcommand {
        VerifySubcommand::PlanStructure { file } => match verify::plan_structure(root, &file)? {
            Some(report) => print_json(&report),
            None => print_json(&json!({ "error": "File not found" })),
        },
        VerifySubcommand::PhaseCompleteness { phase } => {
            let id: PhaseId = phase.parse()?;
            match verify::phase_completeness(root, id)? {
                Some(report) => print_json(&report),
                None => print_json(&json!({ "error": "Phase not found" })),
            }
        }
        VerifySubcommand::References { file } => match verify::references(root, &file)? {
            Some(report) => print_json(&report),
            None => print_json(&json!({ "error": "File not found" })),
        },
        VerifySubcommand::Artifacts { file } => match verify::artifacts(root, &file)? {
            Audit::FileMissing => print_json(&json!({ "error": "File not found" })),
            Audit::NoMustHaves => {
                print_json(&json!({ "error": "No must_haves.artifacts in plan" }))
            }
            Audit::Report(report) => print_json(&report),
        },
        VerifySubcommand::KeyLinks { file } => match verify::key_links(root, &file)? {
            Audit::FileMissing => print_json(&json!({ "error": "File not found" })),
            Audit::NoMustHaves => {
                print_json(&json!({ "error": "No must_haves.key_links in plan" }))
            }
            Audit::Report(report) => print_json(&report),
        },
        VerifySubcommand::Summary { file } => print_json(&verify::summary(root, &file)?),
    }
}
