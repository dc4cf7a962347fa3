use crate::output::print_json;
use clap::Subcommand;
use gsd_core::phase::PhaseId;
use gsd_core::roadmap;
use serde_json::json;
use std::path::Path;

#[derive(Subcommand)]
pub enum RoadmapSubcommand {
    /// Extract one phase section from ROADMAP.md
    GetPhase { phase: String },

    /// Cross-reference roadmap phases against the phases directory
    Analyze,
}

pub fn run(root: &Path, subcommand: RoadmapSubcommand) -> anyhow::Result<()> {
    match subcommand {
        RoadmapSubcommand::GetPhase { phase } => {
            let id: PhaseId = phase.parse()?;
            let Some(roadmap) = roadmap::load(root)? else {
                return print_json(&json!({
                    "found": false,
                    "error": "ROADMAP.md not found",
                }));
            };
            match roadmap::get_phase(&roadmap, id) {
                Some(section) => {
                    let mut value = serde_json::to_value(&section)?;
                    if let Some(map) = value.as_object_mut() {
                        map.insert("found".to_string(), json!(true));
                        // phase_number/phase_name are the stable keys callers match on
                        if let Some(number) = map.remove("number") {
                            map.insert("phase_number".to_string(), number);
                        }
                        if let Some(name) = map.remove("name") {
                            map.insert("phase_name".to_string(), name);
                        }
                    }
                    print_json(&value)
                }
                None => print_json(&json!({ "found": false })),
            }
        }
        RoadmapSubcommand::Analyze => match roadmap::analyze(root)? {
            Some(analysis) => print_json(&analysis),
            None => print_json(&json!({ "error": "ROADMAP.md not found" })),
        },
    }
}
