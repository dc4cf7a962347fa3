use crate::output::print_json;
use clap::Subcommand;
use gsd_core::error::GsdError;
use gsd_core::phase::PhaseId;
use gsd_core::template::{self, Fill};
use serde_json::json;
use std::path::Path;

#[derive(Subcommand)]
pub enum TemplateSubcommand {
    /// Pick a plan skeleton based on draft complexity
    Select { file: String },

    /// Write a document skeleton into a phase directory
    Fill {
        /// Document kind: plan, summary, or verification
        #[arg(value_parser = ["plan", "summary", "verification"])]
        kind: String,

        #[arg(long)]
        phase: String,

        /// Plan sequence number (plan and summary skeletons)
        #[arg(long)]
        plan: Option<String>,

        /// Document display name
        #[arg(long, required = true, num_args = 1..)]
        name: Vec<String>,

        /// Plan execution style: execute or tdd
        #[arg(long = "type", default_value = "execute")]
        kind_hint: String,
    },
}

pub fn run(root: &Path, subcommand: TemplateSubcommand) -> anyhow::Result<()> {
    match subcommand {
        TemplateSubcommand::Select { file } => match template::select(root, &file)? {
            Some(selection) => print_json(&selection),
            None => print_json(&json!({
                "type": "standard",
                "error": "File not found",
            })),
        },
        TemplateSubcommand::Fill {
            kind,
            phase,
            plan,
            name,
            kind_hint,
        } => {
            let id: PhaseId = phase.parse()?;
            let name = name.join(" ");
            let fill = match kind.as_str() {
                "plan" => {
                    let plan = require_plan(plan.as_deref())?;
                    template::fill_plan(root, id, plan, &name, &kind_hint)?
                }
                "summary" => {
                    let plan = require_plan(plan.as_deref())?;
                    template::fill_summary(root, id, plan, &name)?
                }
                _ => template::fill_verification(root, id, &name)?,
            };
            match fill {
                Fill::Created { path } => print_json(&json!({
                    "created": true,
                    "path": path,
                })),
                Fill::AlreadyExists => print_json(&json!({ "error": "File already exists" })),
                Fill::PhaseMissing => print_json(&json!({ "error": "Phase not found" })),
            }
        }
    }
}

fn require_plan(plan: Option<&str>) -> anyhow::Result<&str> {
    plan.ok_or_else(|| {
        GsdError::InvalidInput("--plan is required for plan and summary skeletons".to_string())
            .into()
    })
}
