use crate::output::print_json;
use clap::Subcommand;
use gsd_core::phase::{PhaseDocKind, PhaseId};
use gsd_core::template;
use serde_json::json;
use std::path::Path;

#[derive(Subcommand)]
pub enum ScaffoldSubcommand {
    /// Seed a CONTEXT.md in the phase directory
    Context {
        #[arg(long)]
        phase: String,
    },

    /// Seed a UAT.md in the phase directory
    Uat {
        #[arg(long)]
        phase: String,
    },

    /// Seed a VERIFICATION.md in the phase directory
    Verification {
        #[arg(long)]
        phase: String,
    },

    /// Create the phase directory itself
    PhaseDir {
        #[arg(long)]
        phase: String,

        #[arg(long, required = true, num_args = 1..)]
        name: Vec<String>,
    },
}

pub fn run(root: &Path, subcommand: ScaffoldSubcommand) -> anyhow::Result<()> {
    match subcommand {
        ScaffoldSubcommand::Context { phase } => doc(root, PhaseDocKind::Context, &phase),
        ScaffoldSubcommand::Uat { phase } => doc(root, PhaseDocKind::Uat, &phase),
        ScaffoldSubcommand::Verification { phase } => {
            doc(root, PhaseDocKind::Verification, &phase)
        }
        ScaffoldSubcommand::PhaseDir { phase, name } => {
            let id: PhaseId = phase.parse()?;
            let scaffolded = template::scaffold_phase_dir(root, id, &name.join(" "))?;
            print_json(&scaffolded)
        }
    }
}

fn doc(root: &Path, kind: PhaseDocKind, phase: &str) -> anyhow::Result<()> {
    let id: PhaseId = phase.parse()?;
    match template::scaffold_doc(root, kind, id)? {
        Some(scaffolded) => print_json(&scaffolded),
        None => print_json(&json!({ "error": "Phase not found" })),
    }
}
