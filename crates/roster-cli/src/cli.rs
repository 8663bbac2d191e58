//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use roster_allocator::PolicyKind;

/// Roster - allocate cohorts into balanced, socially coherent groups.
#[derive(Debug, Parser)]
#[command(name = "roster")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Database path (overrides the configuration file)
    #[arg(long, global = true, env = "ROSTER_DB")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (IDs only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Allocate one or more cohorts into k groups
    Allocate(AllocateArgs),

    /// Move one member between groups of a stored run
    Reallocate(ReallocateArgs),

    /// Preservation, centrality and group profiles of a run
    Analyze(AnalyzeArgs),

    /// List stored runs, newest first
    Runs(RunsArgs),

    /// Show the assignment and preservation rows of a run
    Show(ShowArgs),

    /// Import a cohort snapshot from JSON
    Import(ImportArgs),
}

/// Arguments for the allocate command.
#[derive(Debug, Parser)]
pub struct AllocateArgs {
    /// Cohort to allocate (repeat to run several cohorts in parallel)
    #[arg(short, long = "cohort", required = true)]
    pub cohorts: Vec<String>,

    /// Number of groups
    #[arg(short = 'k', long)]
    pub groups: usize,

    /// Allocation policy
    #[arg(short, long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Solver time budget in seconds
    #[arg(short, long)]
    pub time_budget: Option<u64>,

    /// Random seed for hints, restarts and the random policy
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the reallocate command.
#[derive(Debug, Parser)]
pub struct ReallocateArgs {
    /// Run to correct
    pub run: String,

    /// Member to move
    pub member: String,

    /// Group the member is currently in
    #[arg(long)]
    pub from: String,

    /// Group to move the member to
    #[arg(long)]
    pub to: String,
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Run to analyze (latest run when omitted)
    pub run: Option<String>,
}

/// Arguments for the runs command.
#[derive(Debug, Parser)]
pub struct RunsArgs {
    /// Filter by cohort
    #[arg(short, long)]
    pub cohort: Option<String>,

    /// Maximum number of runs
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Arguments for the show command.
#[derive(Debug, Parser)]
pub struct ShowArgs {
    /// Run to show
    pub run: String,
}

/// Arguments for the import command.
#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file with `cohort`, `members` and `edges`
    pub file: Option<String>,

    /// Read the snapshot from stdin
    #[arg(long)]
    pub stdin: bool,
}

/// Policy argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum PolicyArg {
    /// Exact or local search over the full objective
    Solver,
    /// Balance one attribute, ignore relationships
    Greedy,
    /// Seeded shuffle dealt round-robin
    Random,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Quiet => crate::config::OutputFormat::Quiet,
        }
    }
}

impl From<PolicyArg> for PolicyKind {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Solver => PolicyKind::Solver,
            PolicyArg::Greedy => PolicyKind::Greedy,
            PolicyArg::Random => PolicyKind::Random,
        }
    }
}
