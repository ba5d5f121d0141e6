//! Partitions positions into named groups along one classification dimension.
use crate::core::model::{Position, ValueBucket};
use crate::core::sort::{sort_group_keys, sort_positions};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

pub const CASH_GROUP: &str = "Cash";
pub const OTHER_GROUP: &str = "Other";
pub const UNCLASSIFIED_GROUP: &str = "Unclassified";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupDimension {
    #[default]
    AssetClass,
    Sector,
    Market,
    MarketCurrency,
}

impl GroupDimension {
    pub const ALL: [GroupDimension; 4] = [
        GroupDimension::AssetClass,
        GroupDimension::Sector,
        GroupDimension::Market,
        GroupDimension::MarketCurrency,
    ];
}

impl Display for GroupDimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                GroupDimension::AssetClass => "Asset Class",
                GroupDimension::Sector => "Sector",
                GroupDimension::Market => "Market",
                GroupDimension::MarketCurrency => "Market Currency",
            }
        )
    }
}

impl FromStr for GroupDimension {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "asset_class" | "class" | "category" => Ok(GroupDimension::AssetClass),
            "sector" => Ok(GroupDimension::Sector),
            "market" => Ok(GroupDimension::Market),
            "market_currency" | "currency" => Ok(GroupDimension::MarketCurrency),
            _ => Err(anyhow::anyhow!("Invalid grouping: {}", s)),
        }
    }
}

/// Maps an upstream asset category id onto its report category.
fn report_category(category_id: &str) -> &'static str {
    match category_id.trim().to_uppercase().as_str() {
        "EQUITY" | "SHARE" | "STOCK" => "Equity",
        "ETF" | "EXCHANGE TRADED FUND" => "ETF",
        "MUTUAL FUND" | "MUTUALFUND" | "FUND" => "Mutual Fund",
        "BOND" | "FIXED INCOME" => "Bond",
        "RE" | "PROPERTY" | "REAL ESTATE" => "Property",
        "CASH" | "ACCOUNT" | "TRADE" => CASH_GROUP,
        _ => OTHER_GROUP,
    }
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() { None } else { Some(trimmed) }
}

/// The group `position` belongs to under `dimension`.
pub fn group_key(position: &Position, dimension: GroupDimension) -> String {
    let asset = &position.asset;
    match dimension {
        GroupDimension::AssetClass => {
            if asset.is_cash_like() {
                CASH_GROUP.to_string()
            } else {
                report_category(&asset.asset_category.id).to_string()
            }
        }
        GroupDimension::Sector => {
            if asset.is_cash_like() {
                CASH_GROUP.to_string()
            } else {
                asset
                    .sector
                    .as_deref()
                    .and_then(non_blank)
                    .unwrap_or(UNCLASSIFIED_GROUP)
                    .to_string()
            }
        }
        GroupDimension::Market => non_blank(&asset.market.code)
            .unwrap_or(OTHER_GROUP)
            .to_string(),
        GroupDimension::MarketCurrency => non_blank(&asset.market.currency.code)
            .map(str::to_uppercase)
            .unwrap_or_else(|| OTHER_GROUP.to_string()),
    }
}

/// Partitions `positions` by group key. Each group keeps the incoming order of
/// its positions; the map itself carries no meaningful order.
pub fn group(positions: &[Position], dimension: GroupDimension) -> HashMap<String, Vec<Position>> {
    let mut groups: HashMap<String, Vec<Position>> = HashMap::new();
    for position in positions {
        groups
            .entry(group_key(position, dimension))
            .or_default()
            .push(position.clone());
    }
    groups
}

/// Groups in display order, each with its positions sorted for `bucket`.
pub fn group_sorted(
    positions: &[Position],
    dimension: GroupDimension,
    bucket: ValueBucket,
) -> Vec<(String, Vec<Position>)> {
    let mut groups = group(positions, dimension);
    let keys: Vec<String> = groups.keys().cloned().collect();
    sort_group_keys(&keys, dimension)
        .into_iter()
        .filter_map(|key| {
            let members = groups.remove(&key)?;
            let sorted = sort_positions(&members, bucket);
            Some((key, sorted))
        })
        .collect()
}
