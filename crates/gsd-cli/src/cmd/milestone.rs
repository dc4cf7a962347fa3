use crate::output::print_json;
use clap::Subcommand;
use gsd_core::milestone;
use std::path::Path;

#[derive(Subcommand)]
pub enum MilestoneSubcommand {
    /// Archive the current roadmap and requirements under the version tag
    // The positional `version` arg collides with the auto --version flag
    // propagated from the root command, so the flag is disabled here.
    #[command(disable_version_flag = true)]
    Complete {
        version: String,

        #[arg(long, required = true, num_args = 1..)]
        name: Vec<String>,
    },
}

pub fn run(root: &Path, subcommand: MilestoneSubcommand) -> anyhow::Result<()> {
    match subcommand {
        MilestoneSubcommand::Complete { version, name } => {
            let completed = milestone::complete(root, &version, &name.join(" "))?;
            print_json(&completed)
        }
    }
}
