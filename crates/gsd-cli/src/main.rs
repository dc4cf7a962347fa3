mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand, convert::ConvertSubcommand, frontmatter::FrontmatterSubcommand,
    init::InitWorkflow, milestone::MilestoneSubcommand, phase::PhaseSubcommand,
    progress::ProgressFormat, roadmap::RoadmapSubcommand, scaffold::ScaffoldSubcommand,
    state::StateSubcommand, summary::SummarySubcommand, template::TemplateSubcommand,
    todo::TodoSubcommand, verify::VerifySubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "gsd",
    about = "Planning-directory toolkit: phases, plans, state, and workflow context bundles",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .planning/ or .git/)
    #[arg(long, global = true, env = "GSD_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and mutate phase directories
    Phase {
        #[command(subcommand)]
        subcommand: PhaseSubcommand,
    },

    /// Digest executed work and extract summary fields
    Summary {
        #[command(subcommand)]
        subcommand: SummarySubcommand,
    },

    /// Read, edit, and validate markdown frontmatter
    Frontmatter {
        #[command(subcommand)]
        subcommand: FrontmatterSubcommand,
    },

    /// Select and fill document skeletons
    Template {
        #[command(subcommand)]
        subcommand: TemplateSubcommand,
    },

    /// Create singleton phase documents and directories
    Scaffold {
        #[command(subcommand)]
        subcommand: ScaffoldSubcommand,
    },

    /// Structural audits over plans, summaries, and references
    Verify {
        #[command(subcommand)]
        subcommand: VerifySubcommand,
    },

    /// Query ROADMAP.md sections and disk status
    Roadmap {
        #[command(subcommand)]
        subcommand: RoadmapSubcommand,
    },

    /// Read and mutate STATE.md (bare `state` prints the aggregate)
    State {
        #[command(subcommand)]
        subcommand: Option<StateSubcommand>,
    },

    /// Archive a completed milestone
    Milestone {
        #[command(subcommand)]
        subcommand: MilestoneSubcommand,
    },

    /// Manage .planning/config.json
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Look up the model for an agent under the configured profile
    ResolveModel { agent: String },

    /// Collapse free text into a slug
    Slug {
        #[arg(required = true)]
        text: Vec<String>,
    },

    /// Current timestamp (RFC 3339 UTC), or the local date with `date`
    Timestamp {
        #[arg(value_parser = ["date"])]
        mode: Option<String>,
    },

    /// Check whether a path exists under the project root
    Exists { path: String },

    /// Manage .planning/todos
    Todo {
        #[command(subcommand)]
        subcommand: TodoSubcommand,
    },

    /// Milestone progress as JSON, a one-line bar, or a table
    Progress {
        #[arg(long, value_enum, default_value_t = ProgressFormat::Json)]
        format: ProgressFormat,
    },

    /// Roadmap / disk consistency audit
    Validate,

    /// Convert Claude agent documents for other runtimes
    Convert {
        #[command(subcommand)]
        subcommand: ConvertSubcommand,
    },

    /// Emit the JSON context bundle for a workflow
    Init {
        #[command(subcommand)]
        workflow: InitWorkflow,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_target(false)
        .init();

    let root_path = cli.root.as_deref();
    let root = root::resolve_root(root_path);

    let result = match cli.command {
        Commands::Phase { subcommand } => cmd::phase::run(&root, subcommand),
        Commands::Summary { subcommand } => cmd::summary::run(&root, subcommand),
        Commands::Frontmatter { subcommand } => cmd::frontmatter::run(&root, subcommand),
        Commands::Template { subcommand } => cmd::template::run(&root, subcommand),
        Commands::Scaffold { subcommand } => cmd::scaffold::run(&root, subcommand),
        Commands::Verify { subcommand } => cmd::verify::run(&root, subcommand),
        Commands::Roadmap { subcommand } => cmd::roadmap::run(&root, subcommand),
        Commands::State { subcommand } => cmd::state::run(&root, subcommand),
        Commands::Milestone { subcommand } => cmd::milestone::run(&root, subcommand),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand),
        Commands::ResolveModel { agent } => cmd::model::run(&root, &agent),
        Commands::Slug { text } => cmd::slug::run(&text),
        Commands::Timestamp { mode } => cmd::timestamp::run(mode.as_deref()),
        Commands::Exists { path } => cmd::exists::run(&root, &path),
        Commands::Todo { subcommand } => cmd::todo::run(&root, subcommand),
        Commands::Progress { format } => cmd::progress::run(&root, format),
        Commands::Validate => cmd::validate::run(&root),
        Commands::Convert { subcommand } => cmd::convert::run(&root, subcommand),
        Commands::Init { workflow } => cmd::init::run(&root, workflow),
    };

    if let Err(e) = result {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
