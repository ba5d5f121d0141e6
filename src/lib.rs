pub mod cli;
pub mod core;
pub mod providers;

use crate::core::aggregate::Holdings;
use crate::core::cache::RateCache;
use crate::core::config::{AppConfig, ViewOverrides};
use crate::core::currency::Converter;
use anyhow::Result;
use tracing::{debug, info};

pub use crate::core::config;

pub enum AppCommand {
    Holdings,
    Alloc { exclude: Vec<String> },
}

/// Settings shared by every command.
#[derive(Debug, Default, Clone)]
pub struct RunOptions {
    pub config_path: Option<String>,
    pub overrides: ViewOverrides,
    pub json: bool,
}

pub async fn run_command(command: AppCommand, options: &RunOptions) -> Result<()> {
    info!("holdview starting...");

    let config = match options.config_path.as_deref() {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let view = config.view_config(&options.overrides)?;
    let payload = config.load_holdings()?;
    let holdings = Holdings::build(&payload, &view);

    let base_url = config
        .providers
        .yahoo
        .as_ref()
        .map_or("https://query1.finance.yahoo.com", |p| &p.base_url);
    let currency_provider =
        providers::yahoo_finance::YahooCurrencyProvider::new(base_url, RateCache::new());
    let rates = cli::rates::resolve(
        &holdings,
        view.display_currency.as_ref(),
        &config.rates,
        &currency_provider,
    )
    .await;
    let converter = Converter::new(&rates, view.display_currency.as_ref());

    match command {
        AppCommand::Holdings => cli::holdings::run(&holdings, &converter, options.json),
        AppCommand::Alloc { exclude } => {
            cli::alloc::run(&holdings, &converter, &exclude, options.json)
        }
    }
}
