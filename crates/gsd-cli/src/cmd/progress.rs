use crate::output::{print_json, print_table};
use clap::ValueEnum;
use gsd_core::roadmap;
use serde_json::json;
use std::path::Path;

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ProgressFormat {
    Json,
    Bar,
    Table,
}

const BAR_WIDTH: usize = 8;

pub fn run(root: &Path, format: ProgressFormat) -> anyhow::Result<()> {
    let Some(analysis) = roadmap::analyze(root)? else {
        return print_json(&json!({ "error": "ROADMAP.md not found" }));
    };
    match format {
        ProgressFormat::Json => print_json(&json!({
            "total_plans": analysis.total_plans,
            "total_summaries": analysis.total_summaries,
            "percent": analysis.progress_percent,
            "phases": analysis.phases,
        })),
        ProgressFormat::Bar => {
            let percent = analysis.progress_percent as usize;
            let filled = (percent * BAR_WIDTH + 50) / 100;
            println!(
                "[{}{}] {}/{} ({percent}%)",
                "#".repeat(filled),
                " ".repeat(BAR_WIDTH - filled),
                analysis.total_summaries,
                analysis.total_plans,
            );
            Ok(())
        }
        ProgressFormat::Table => {
            let rows = analysis
                .phases
                .iter()
                .map(|phase| {
                    vec![
                        phase.number.clone(),
                        phase.name.clone(),
                        phase.disk_status.to_string(),
                        format!("{}/{}", phase.summaries, phase.plans),
                    ]
                })
                .collect();
            print_table(&["PHASE", "NAME", "STATUS", "PLANS"], rows);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    fn bar_fill_rounds_to_nearest() {
        // 50% of 8 chars is 4; 37% rounds to 3
        assert_eq!((50 * 8 + 50) / 100, 4);
        assert_eq!((37 * 8 + 50) / 100, 3);
        assert_eq!((100 * 8 + 50) / 100, 8);
        assert_eq!((0 * 8 + 50) / 100, 0);
    }
}
