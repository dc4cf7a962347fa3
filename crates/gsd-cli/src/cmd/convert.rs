use clap::Subcommand;
use gsd_core::convert;
use gsd_core::error::GsdError;
use gsd_core::io;
use std::path::Path;

#[derive(Subcommand)]
pub enum ConvertSubcommand {
    /// Rewrite a Claude agent document for OpenCode
    OpencodeAgent {
        file: String,

        /// Replacement for ~/.claude in path references (default ~/.config/opencode)
        #[arg(long)]
        config_root: Option<String>,
    },

    /// Rewrite a Claude agent document for Gemini
    GeminiAgent {
        file: String,

        /// Replacement for ~/.claude in path references (default ~/.gemini)
        #[arg(long)]
        config_root: Option<String>,
    },

    /// Rewrite a Claude command document as a Gemini TOML command
    GeminiCommand {
        file: String,

        #[arg(long)]
        config_root: Option<String>,
    },
}

pub fn run(root: &Path, subcommand: ConvertSubcommand) -> anyhow::Result<()> {
    let out = match subcommand {
        ConvertSubcommand::OpencodeAgent { file, config_root } => {
            let document = read_required(root, &file)?;
            let config_root = config_root.as_deref().unwrap_or(convert::OPENCODE_CONFIG_ROOT);
            convert::to_opencode_agent(&document, config_root)
        }
        ConvertSubcommand::GeminiAgent { file, config_root } => {
            let document = read_required(root, &file)?;
            let config_root = config_root.as_deref().unwrap_or(convert::GEMINI_CONFIG_ROOT);
            convert::to_gemini_agent(&document, config_root)
        }
        ConvertSubcommand::GeminiCommand { file, config_root } => {
            let document = read_required(root, &file)?;
            let config_root = config_root.as_deref().unwrap_or(convert::GEMINI_CONFIG_ROOT);
            convert::to_gemini_command(&document, config_root)
        }
    };
    // Converted documents are written to stdout for redirection, not JSON
    println!("{out}");
    Ok(())
}

fn read_required(root: &Path, rel_path: &str) -> anyhow::Result<String> {
    io::read_optional(&root.join(rel_path))?
        .ok_or_else(|| GsdError::NotFound(rel_path.to_string()).into())
}
