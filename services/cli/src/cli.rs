use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use review_rules::versioning::VersionStatus;
use review_rules::{telemetry, AppConfig, AppError};
use tracing::debug;

use crate::commands;
use crate::infra::RuleTooling;

#[derive(Parser, Debug)]
#[command(
    name = "review-rules",
    about = "Manage versioned review scoring rules and evaluate contexts against them",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a rule set JSON file without storing it
    Validate {
        /// Rule set file to check
        file: PathBuf,
    },
    /// Persist and activate the built-in rules when the store holds no versions
    Seed,
    /// Create, activate and inspect rule set versions
    Versions {
        #[command(subcommand)]
        command: VersionsCommand,
    },
    /// Bind computation runs to rule set versions
    Runs {
        #[command(subcommand)]
        command: RunsCommand,
    },
    /// Evaluate a context file with the rules bound to a run
    Evaluate {
        #[command(subcommand)]
        command: EvaluateCommand,
    },
}

#[derive(Subcommand, Debug)]
pub(crate) enum VersionsCommand {
    /// Store a rule set file as a new DRAFT version
    Create(CreateVersionArgs),
    /// Make a version the active one, archiving the previous active version
    Activate {
        version_id: String,
    },
    /// List versions, newest first
    List(ListVersionsArgs),
    /// Print one version including its rules
    Show {
        version_id: String,
    },
    /// Print the active version, if any
    Active,
}

#[derive(Args, Debug)]
pub(crate) struct CreateVersionArgs {
    /// Rule set JSON file
    pub(crate) file: PathBuf,
    #[arg(long)]
    pub(crate) name: Option<String>,
    #[arg(long)]
    pub(crate) description: Option<String>,
    /// Activate the version right after creating it
    #[arg(long)]
    pub(crate) activate: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ListVersionsArgs {
    #[arg(long, value_enum)]
    pub(crate) status: Option<StatusArg>,
    #[arg(long, default_value_t = 20)]
    pub(crate) limit: usize,
    #[arg(long, default_value_t = 0)]
    pub(crate) offset: usize,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub(crate) enum StatusArg {
    Draft,
    Active,
    Archived,
}

impl From<StatusArg> for VersionStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Draft => VersionStatus::Draft,
            StatusArg::Active => VersionStatus::Active,
            StatusArg::Archived => VersionStatus::Archived,
        }
    }
}

#[derive(Subcommand, Debug)]
pub(crate) enum RunsCommand {
    /// Record which rules a run is computed with
    Pin(PinRunArgs),
    /// Show which rules a run resolves to
    Resolve {
        run_id: String,
    },
}

#[derive(Args, Debug)]
pub(crate) struct PinRunArgs {
    pub(crate) run_id: String,
    /// Version to pin
    #[arg(long, conflicts_with = "default", required_unless_present = "default")]
    pub(crate) version: Option<String>,
    /// Pin the built-in default rules
    #[arg(long)]
    pub(crate) default: bool,
}

#[derive(Subcommand, Debug)]
pub(crate) enum EvaluateCommand {
    /// Score a review context file
    Confidence(EvaluateArgs),
    /// Judge a FixScore context file
    Sufficiency(EvaluateArgs),
}

#[derive(Args, Debug)]
pub(crate) struct EvaluateArgs {
    /// Run whose bound rules are used
    #[arg(long)]
    pub(crate) run: String,
    /// Context JSON file
    pub(crate) context: PathBuf,
}

pub(crate) fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    debug!(
        environment = ?config.environment,
        store = %config.store.path.display(),
        rule_set = %config.store.rule_set_id,
        "review-rules starting"
    );

    match cli.command {
        Command::Validate { file } => commands::validate(&file),
        Command::Seed => commands::seed(&RuleTooling::open(&config.store)?),
        Command::Versions { command } => {
            commands::versions(&RuleTooling::open(&config.store)?, command)
        }
        Command::Runs { command } => commands::runs(&RuleTooling::open(&config.store)?, command),
        Command::Evaluate { command } => {
            commands::evaluate(&RuleTooling::open(&config.store)?, command)
        }
    }
}
