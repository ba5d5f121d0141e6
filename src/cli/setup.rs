use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use std::path::Path;

const EXAMPLE_CONFIG: &str = include_str!("../../docs/example_config.yaml");
const EXAMPLE_HOLDINGS: &str = include_str!("../../docs/example_holdings.json");

/// Creates a default configuration file with example content at the default location
pub fn setup() -> Result<()> {
    let path = AppConfig::default_config_path()?;
    setup_at_path(path)
}

/// Creates a default configuration file at `path`, plus the example holdings
/// document it points to when none exists yet.
pub fn setup_at_path<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();

    if path.exists() {
        anyhow::bail!("Configuration file already exists at {}", path.display());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    std::fs::write(path, EXAMPLE_CONFIG)
        .with_context(|| format!("Failed to write config file to {}", path.display()))?;
    tracing::info!("Created default configuration at {}", path.display());

    let holdings_path = AppConfig::load_from_path(path)?.holdings_path();
    if !holdings_path.exists() {
        std::fs::write(&holdings_path, EXAMPLE_HOLDINGS).with_context(|| {
            format!("Failed to write holdings file to {}", holdings_path.display())
        })?;
        tracing::info!("Created example holdings at {}", holdings_path.display());
    }
    Ok(())
}
