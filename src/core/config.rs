use crate::core::aggregate::ViewConfig;
use crate::core::currency::RateTable;
use crate::core::grouping::GroupDimension;
use crate::core::model::{Currency, HoldingsPayload, ValueBucket};
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Path to the holdings document. Relative paths resolve against the
    /// directory of the config file.
    pub holdings: String,
    /// Display currency. Figures stay in their bucket's currency when unset.
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub group_by: GroupDimension,
    #[serde(default)]
    pub value_in: ValueBucket,
    #[serde(default)]
    pub hide_empty: bool,
    /// Fixed `FROM:TO` rates. These win over fetched rates.
    #[serde(default)]
    pub rates: RateTable,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Command line choices that take precedence over the config file.
#[derive(Debug, Default, Clone)]
pub struct ViewOverrides {
    pub group_by: Option<String>,
    pub value_in: Option<String>,
    pub currency: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "holdview", "holdview")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_str = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn holdings_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.holdings);
        match &self.base_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path,
        }
    }

    pub fn load_holdings(&self) -> Result<HoldingsPayload> {
        let path = self.holdings_path();
        let payload_str = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read holdings file: {}", path.display()))?;
        let payload: HoldingsPayload = serde_json::from_str(&payload_str)
            .with_context(|| format!("Failed to parse holdings file: {}", path.display()))?;
        debug!(
            "Loaded {} positions for portfolio {}",
            payload.positions.len(),
            payload.portfolio.code
        );
        Ok(payload)
    }

    pub fn view_config(&self, overrides: &ViewOverrides) -> Result<ViewConfig> {
        let dimension = match &overrides.group_by {
            Some(value) => value.parse()?,
            None => self.group_by,
        };
        let bucket = match &overrides.value_in {
            Some(value) => value.parse()?,
            None => self.value_in,
        };
        let display_currency = overrides
            .currency
            .as_deref()
            .or(self.currency.as_deref())
            .map(Currency::from_code);
        Ok(ViewConfig {
            dimension,
            bucket,
            display_currency,
            hide_empty: self.hide_empty,
        })
    }
}
