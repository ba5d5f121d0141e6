//! Deterministic ordering of group keys and of positions inside a group.
use crate::core::grouping::{
    CASH_GROUP, GroupDimension, OTHER_GROUP, UNCLASSIFIED_GROUP,
};
use crate::core::model::{Position, ValueBucket};
use std::cmp::Ordering;

/// Display order of asset classes.
const ASSET_CLASS_RANK: [&str; 6] = ["Equity", "ETF", "Mutual Fund", "Bond", "Property", CASH_GROUP];

const SECTOR_RANK: [&str; 11] = [
    "Information Technology",
    "Health Care",
    "Financials",
    "Consumer Discretionary",
    "Communication Services",
    "Industrials",
    "Consumer Staples",
    "Energy",
    "Utilities",
    "Real Estate",
    "Materials",
];

fn rank_in(table: &[&str], key: &str) -> Option<usize> {
    table.iter().position(|k| k.eq_ignore_ascii_case(key))
}

/// Lower sorts first. Keys sharing a rank are ordered alphabetically.
fn group_rank(key: &str, dimension: GroupDimension) -> (u8, usize) {
    match dimension {
        GroupDimension::AssetClass => match rank_in(&ASSET_CLASS_RANK, key) {
            Some(index) => (0, index),
            None => (1, 0),
        },
        GroupDimension::Sector => {
            if key.eq_ignore_ascii_case(CASH_GROUP) {
                (3, 0)
            } else if key.eq_ignore_ascii_case(UNCLASSIFIED_GROUP) {
                (2, 0)
            } else {
                match rank_in(&SECTOR_RANK, key) {
                    Some(index) => (0, index),
                    None => (1, 0),
                }
            }
        }
        GroupDimension::Market | GroupDimension::MarketCurrency => {
            if key.eq_ignore_ascii_case(OTHER_GROUP) {
                (1, 0)
            } else {
                (0, 0)
            }
        }
    }
}

fn alphabetical(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Orders group keys for `dimension`. Distinct keys never compare equal.
pub fn compare_group_keys(a: &str, b: &str, dimension: GroupDimension) -> Ordering {
    group_rank(a, dimension)
        .cmp(&group_rank(b, dimension))
        .then_with(|| alphabetical(a, b))
}

fn sort_value(position: &Position, bucket: ValueBucket) -> f64 {
    let value = position.market_value(bucket);
    // fold -0.0 into 0.0 so it ties with a missing value
    if value == 0.0 { 0.0 } else { value }
}

/// Non-cash positions first, then by market value, largest first. Equal values
/// compare equal, so a stable sort keeps their incoming order.
pub fn compare_positions_within_group(a: &Position, b: &Position, bucket: ValueBucket) -> Ordering {
    a.asset
        .is_cash_like()
        .cmp(&b.asset.is_cash_like())
        .then_with(|| sort_value(b, bucket).total_cmp(&sort_value(a, bucket)))
}

pub fn sort_group_keys(keys: &[String], dimension: GroupDimension) -> Vec<String> {
    let mut sorted = keys.to_vec();
    sorted.sort_by(|a, b| compare_group_keys(a, b, dimension));
    sorted
}

pub fn sort_positions(positions: &[Position], bucket: ValueBucket) -> Vec<Position> {
    let mut sorted = positions.to_vec();
    sorted.sort_by(|a, b| compare_positions_within_group(a, b, bucket));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Asset, AssetCategory, BucketValues, MoneyValues};

    fn position(code: &str, category: &str, value: f64) -> Position {
        Position {
            asset: Asset {
                code: code.to_string(),
                asset_category: AssetCategory {
                    id: category.to_string(),
                    name: category.to_string(),
                },
                ..Default::default()
            },
            money_values: BucketValues {
                portfolio: MoneyValues {
                    market_value: value,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn codes(positions: &[Position]) -> Vec<&str> {
        positions.iter().map(|p| p.asset.code.as_str()).collect()
    }

    fn keys(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_asset_class_rank_with_unknown_keys_last() {
        let sorted = sort_group_keys(
            &keys(&["Cash", "Zebra", "Equity", "Crypto", "ETF", "Property"]),
            GroupDimension::AssetClass,
        );
        assert_eq!(
            sorted,
            keys(&["Equity", "ETF", "Property", "Cash", "Crypto", "Zebra"])
        );
    }

    #[test]
    fn test_sector_rank_keeps_unclassified_and_cash_last() {
        let sorted = sort_group_keys(
            &keys(&[
                "Cash",
                "Unclassified",
                "Materials",
                "Aerospace",
                "Information Technology",
                "Financials",
            ]),
            GroupDimension::Sector,
        );
        assert_eq!(
            sorted,
            keys(&[
                "Information Technology",
                "Financials",
                "Materials",
                "Aerospace",
                "Unclassified",
                "Cash",
            ])
        );
    }

    #[test]
    fn test_market_keys_alphabetical_with_other_last() {
        let sorted = sort_group_keys(
            &keys(&["Other", "NZX", "asx", "NASDAQ"]),
            GroupDimension::Market,
        );
        assert_eq!(sorted, keys(&["asx", "NASDAQ", "NZX", "Other"]));
    }

    #[test]
    fn test_group_key_comparison_is_total() {
        for dimension in GroupDimension::ALL {
            assert_eq!(compare_group_keys("abc", "ABC", dimension), Ordering::Greater);
            assert_eq!(compare_group_keys("Equity", "Equity", dimension), Ordering::Equal);
        }
    }

    #[test]
    fn test_cash_sorts_after_larger_non_cash_values() {
        let positions = vec![
            position("USD", "CASH", 1_000_000.0),
            position("SMALL", "EQUITY", 1.0),
            position("BIG", "EQUITY", 500.0),
            position("NZD", "ACCOUNT", 50.0),
        ];
        let sorted = sort_positions(&positions, ValueBucket::Portfolio);
        assert_eq!(codes(&sorted), vec!["BIG", "SMALL", "USD", "NZD"]);
    }

    #[test]
    fn test_equal_values_keep_insertion_order() {
        let mut missing = position("MISSING", "EQUITY", 0.0);
        missing.money_values.portfolio.market_value = f64::NAN;
        let positions = vec![
            position("B", "EQUITY", 100.0),
            position("ZERO", "EQUITY", -0.0),
            missing,
            position("A", "EQUITY", 100.0),
        ];
        let sorted = sort_positions(&positions, ValueBucket::Portfolio);
        assert_eq!(codes(&sorted), vec!["B", "A", "ZERO", "MISSING"]);

        let resorted = sort_positions(&sorted, ValueBucket::Portfolio);
        assert_eq!(codes(&resorted), codes(&sorted));
        assert_eq!(codes(&positions), vec!["B", "ZERO", "MISSING", "A"]);
    }
}
