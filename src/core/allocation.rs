//! Flattened, percentage-normalised group totals for allocation summaries.
use crate::core::aggregate::{Holdings, weight_of};
use crate::core::currency::Converter;
use crate::core::grouping::GroupDimension;
use crate::core::sort::compare_group_keys;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationSlice {
    pub key: String,
    pub label: String,
    /// Market value in the display currency.
    pub value: f64,
    pub gain_on_day: f64,
    /// Taken as-is from the group's own figures.
    pub irr: Option<f64>,
    /// Share of the slices' total, 0 to 100.
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub slices: Vec<AllocationSlice>,
    pub total: f64,
}

/// One slice per group, valued in the view's combined bucket and converted
/// into the display currency.
pub fn slice(holdings: &Holdings, converter: &Converter) -> Vec<AllocationSlice> {
    let source = &holdings.currency;
    let mut slices: Vec<AllocationSlice> = holdings
        .groups
        .iter()
        .map(|group| {
            let values = group.sub_totals.get(holdings.view_bucket);
            AllocationSlice {
                key: group.key.clone(),
                label: group.key.clone(),
                value: converter.amount(values.market_value, source),
                gain_on_day: converter.amount(values.gain_on_day, source),
                irr: values.irr,
                percentage: 0.0,
            }
        })
        .collect();
    sort_slices(&mut slices, holdings.dimension);
    renormalize(&slices, &[]).slices
}

pub fn sort_slices(slices: &mut [AllocationSlice], dimension: GroupDimension) {
    slices.sort_by(|a, b| compare_group_keys(&a.key, &b.key, dimension));
}

/// Recomputes percentages over the slices whose key is not in `excluded`.
/// Excluded slices are dropped; the rest share 100% in proportion to value.
pub fn renormalize(slices: &[AllocationSlice], excluded: &[String]) -> Allocation {
    let kept: Vec<&AllocationSlice> = slices
        .iter()
        .filter(|s| !excluded.iter().any(|key| key == &s.key))
        .collect();
    let total: f64 = kept.iter().map(|s| s.value).sum();

    let slices = kept
        .into_iter()
        .map(|s| AllocationSlice {
            percentage: weight_of(s.value, total) * 100.0,
            ..s.clone()
        })
        .collect();

    Allocation { slices, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::ViewConfig;
    use crate::core::currency::{CurrencyPair, RateTable};
    use crate::core::model::{
        Asset, AssetCategory, BucketValues, Currency, HoldingsPayload, MoneyValues, Portfolio,
        Position,
    };

    fn slice_of(key: &str, value: f64) -> AllocationSlice {
        AllocationSlice {
            key: key.to_string(),
            label: key.to_string(),
            value,
            gain_on_day: 0.0,
            irr: None,
            percentage: 0.0,
        }
    }

    fn position(code: &str, category: &str, value: f64) -> Position {
        let values = |currency: &str| MoneyValues {
            currency: Currency::from_code(currency),
            market_value: value,
            gain_on_day: value / 100.0,
            ..Default::default()
        };
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
                trade: values("USD"),
                portfolio: values("NZD"),
                base: values("USD"),
            },
            ..Default::default()
        }
    }

    fn holdings() -> Holdings {
        let payload = HoldingsPayload {
            portfolio: Portfolio {
                code: "TEST".to_string(),
                currency: Currency::from_code("NZD"),
                base: Currency::from_code("USD"),
                ..Default::default()
            },
            as_at: None,
            positions: vec![
                position("USD", "CASH", 250.0),
                position("AAPL", "EQUITY", 500.0),
                position("VOO", "ETF", 250.0),
            ],
        };
        Holdings::build(&payload, &ViewConfig::default())
    }

    fn percentages(allocation: &Allocation) -> Vec<f64> {
        allocation.slices.iter().map(|s| s.percentage).collect()
    }

    #[test]
    fn test_slices_follow_group_order_and_sum_to_hundred() {
        let rates = RateTable::new();
        let slices = slice(&holdings(), &Converter::new(&rates, None));
        let keys: Vec<&str> = slices.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["Equity", "ETF", "Cash"]);
        assert_eq!(slices[0].percentage, 50.0);
        assert_eq!(slices[0].irr, None);
        let total: f64 = slices.iter().map(|s| s.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_slices_convert_into_display_currency() {
        let rates: RateTable = [(CurrencyPair::new("NZD", "EUR"), 0.5)].into_iter().collect();
        let eur = Currency::from_code("EUR");
        let slices = slice(&holdings(), &Converter::new(&rates, Some(&eur)));
        assert_eq!(slices[0].value, 250.0);
        assert_eq!(slices[0].gain_on_day, 2.5);
        assert_eq!(slices[0].percentage, 50.0);
    }

    #[test]
    fn test_renormalize_redistributes_proportionally() {
        let slices = vec![
            slice_of("Equity", 40.0),
            slice_of("ETF", 20.0),
            slice_of("Bond", 20.0),
            slice_of("Property", 10.0),
            slice_of("Cash", 10.0),
        ];
        let allocation = renormalize(&slices, &["Bond".to_string()]);
        assert_eq!(allocation.total, 80.0);
        assert_eq!(allocation.slices.len(), 4);
        assert_eq!(percentages(&allocation), vec![50.0, 25.0, 12.5, 12.5]);
        assert_eq!(slices[2].percentage, 0.0);
    }

    #[test]
    fn test_renormalize_without_exclusions_or_value() {
        let slices = vec![slice_of("Equity", 0.0), slice_of("Cash", 0.0)];
        let allocation = renormalize(&slices, &[]);
        assert_eq!(allocation.total, 0.0);
        assert_eq!(percentages(&allocation), vec![0.0, 0.0]);

        let all_out = renormalize(&slices, &["Equity".to_string(), "Cash".to_string()]);
        assert!(all_out.slices.is_empty());
        assert_eq!(all_out.total, 0.0);
    }
}
