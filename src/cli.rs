use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shared application context for global flags
#[derive(Clone, Debug, Default)]
pub struct AppContext {
    pub quiet: bool,    // global --quiet
    pub no_color: bool, // global --no-color
    pub dry_run: bool,  // global --dry-run
    pub verbose: bool,  // global --verbose
}

#[derive(Parser)]
#[command(name = "impsort")]
#[command(about = "A fast, deterministic import/export sorter for TypeScript and JavaScript")]
#[command(version, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Show what would be done without writing files
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Log progress to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sort, merge and prune imports in place
    Format(FormatArgs),

    /// Initialize an impsort.toml config file
    Init(InitArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Args)]
pub struct FormatArgs {
    /// Files or directories to format
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Exit non-zero if any file would change; write nothing
    #[arg(long)]
    pub check: bool,

    /// Print a unified diff instead of writing
    #[arg(long)]
    pub diff: bool,

    /// Print formatted sources to stdout instead of writing
    #[arg(long, conflicts_with_all = ["diff", "json"])]
    pub stdout: bool,

    /// Print planned edits per file as JSON (single line)
    #[arg(long, conflicts_with = "diff")]
    pub json: bool,

    /// Config file (default: impsort.toml/.yaml/.json in the working directory)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Ignore disable markers and exclusion rules
    #[arg(long)]
    pub force: bool,

    /// Remove unused imports
    #[arg(long)]
    pub remove_unused: bool,

    /// Additional glob patterns to skip while walking
    #[arg(short, long)]
    pub ignore: Vec<String>,

    /// Include hidden files and directories
    #[arg(long)]
    pub hidden: bool,
}

#[derive(Debug, Parser)]
pub struct InitArgs {
    /// Directory to initialize config in
    #[arg(long, default_value = ".")]
    pub path: PathBuf,

    /// Overwrite existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

#[derive(Debug, Parser)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,

    /// Output directory; if omitted and --stdout not set, prints error
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Print completion script to stdout instead of a file
    #[arg(long)]
    pub stdout: bool,
}
