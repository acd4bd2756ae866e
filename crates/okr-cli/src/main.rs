mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    checkin::CheckinSubcommand, config::ConfigSubcommand, cycle::CycleSubcommand,
    draft::DraftSubcommand, kr::KrSubcommand, link::LinkSubcommand,
    notification::NotificationSubcommand, objective::ObjectiveSubcommand, team::TeamSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "okr",
    about = "Plan OKR cycles, link objectives, and track check-ins",
    version,
    propagate_version = true
)]
struct Cli {
    /// Organization root (default: auto-detect from .okr/ or .git/)
    #[arg(long, global = true, env = "OKR_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Acting member, checked against the roles in config.yaml
    #[arg(long, global = true, env = "OKR_USER")]
    user: Option<String>,

    /// Treat this date (YYYY-MM-DD) as today
    #[arg(long, global = true, env = "OKR_TODAY")]
    today: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize an organization in the current directory
    Init {
        /// Organization name (defaults to the directory name)
        #[arg(long)]
        organization: Option<String>,
    },

    /// Show organization state and cycles
    State,

    /// Manage cycles
    Cycle {
        #[command(subcommand)]
        subcommand: CycleSubcommand,
    },

    /// Manage objectives
    Objective {
        #[command(subcommand)]
        subcommand: ObjectiveSubcommand,
    },

    /// Manage key results
    Kr {
        #[command(subcommand)]
        subcommand: KrSubcommand,
    },

    /// Manage hierarchy links between objectives
    Link {
        #[command(subcommand)]
        subcommand: LinkSubcommand,
    },

    /// Show the strategic → tactical → operational tree of a cycle
    Tree { cycle: String },

    /// Show progress aggregates for a cycle
    Dashboard { cycle: String },

    /// Show confidence per key result per scheduled check-in date
    Scoreboard { cycle: String },

    /// Record and inspect check-ins
    Checkin {
        #[command(subcommand)]
        subcommand: CheckinSubcommand,
    },

    /// Manage teams
    Team {
        #[command(subcommand)]
        subcommand: TeamSubcommand,
    },

    /// List and acknowledge reminders
    Notification {
        #[command(subcommand)]
        subcommand: NotificationSubcommand,
    },

    /// Parse, import or generate cycle drafts
    Draft {
        #[command(subcommand)]
        subcommand: DraftSubcommand,
    },

    /// Inspect and validate the configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Serve the JSON API
    Serve {
        /// Port to listen on (0 = OS-assigned)
        #[arg(long, default_value = "3141")]
        port: u16,

        /// Don't open browser automatically
        #[arg(long)]
        no_open: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let root = root::resolve_root(cli.root.as_deref());
    let fixed_today = cli.today.as_deref().map(cmd::parse_date).transpose()?;
    let today = fixed_today.unwrap_or_else(|| chrono::Local::now().date_naive());
    let user = cli.user.as_deref();
    let json = cli.json;
    tracing::debug!(root = %root.display(), %today, "resolved context");

    match cli.command {
        Commands::Init { organization } => cmd::init::run(&root, organization.as_deref()),
        Commands::State => cmd::state::run(&root, today, json),
        Commands::Cycle { subcommand } => cmd::cycle::run(&root, subcommand, user, today, json),
        Commands::Objective { subcommand } => cmd::objective::run(&root, subcommand, user, json),
        Commands::Kr { subcommand } => cmd::kr::run(&root, subcommand, user, json),
        Commands::Link { subcommand } => cmd::link::run(&root, subcommand, user, json),
        Commands::Tree { cycle } => cmd::view::tree(&root, &cycle, json),
        Commands::Dashboard { cycle } => cmd::view::dashboard(&root, &cycle, json),
        Commands::Scoreboard { cycle } => cmd::view::scoreboard(&root, &cycle, json),
        Commands::Checkin { subcommand } => {
            cmd::checkin::run(&root, subcommand, user, today, json)
        }
        Commands::Team { subcommand } => cmd::team::run(&root, subcommand, user, json),
        Commands::Notification { subcommand } => {
            cmd::notification::run(&root, subcommand, user, json)
        }
        Commands::Draft { subcommand } => cmd::draft::run(&root, subcommand, user, json),
        Commands::Config { subcommand } => cmd::config::run(&root, subcommand, json),
        Commands::Serve { port, no_open } => cmd::serve::run(&root, port, no_open, fixed_today),
    }
}
