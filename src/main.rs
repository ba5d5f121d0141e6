use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use holdview::cli::setup;
use holdview::config::ViewOverrides;
use holdview::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Group by asset_class, sector, market or market_currency
    #[arg(short, long, global = true)]
    group_by: Option<String>,

    /// Value bucket to show: TRADE, PORTFOLIO or BASE
    #[arg(long, global = true)]
    value_in: Option<String>,

    /// Currency to convert figures into
    #[arg(long, global = true)]
    currency: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for holdview::AppCommand {
    fn from(cmd: Commands) -> holdview::AppCommand {
        match cmd {
            Commands::Holdings => holdview::AppCommand::Holdings,
            Commands::Alloc { exclude } => holdview::AppCommand::Alloc { exclude },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display grouped holdings with subtotals
    Holdings,
    /// Display allocation across groups
    Alloc {
        /// Group to leave out; the rest are renormalised to 100%
        #[arg(short, long)]
        exclude: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let options = holdview::RunOptions {
        config_path: cli.config_path,
        overrides: ViewOverrides {
            group_by: cli.group_by,
            value_in: cli.value_in,
            currency: cli.currency,
        },
        json: cli.json,
    };

    let result = match cli.command {
        Some(Commands::Setup) => match &options.config_path {
            Some(path) => setup::setup_at_path(path),
            None => setup::setup(),
        },
        Some(cmd) => holdview::run_command(cmd.into(), &options).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
