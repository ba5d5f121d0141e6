use super::ui;
use crate::core::aggregate::{HoldingGroup, Holdings};
use crate::core::currency::Converter;
use crate::core::model::{MoneyValues, Position, ValueBucket};
use anyhow::Result;
use chrono::NaiveDate;
use comfy_table::Cell;
use serde::Serialize;

/// One position as shown: its own bucket's figures in the display currency.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRow {
    pub code: String,
    pub name: String,
    pub quantity: f64,
    pub values: MoneyValues,
    pub weight: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupReport {
    pub key: String,
    pub positions: Vec<PositionRow>,
    /// Left out for single-position groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_total: Option<MoneyValues>,
}

/// A holdings view resolved for display.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingsReport {
    pub portfolio: String,
    pub as_at: Option<NaiveDate>,
    pub group_by: String,
    pub value_in: String,
    /// Set when a TRADE view spans several currencies and totals fall back to BASE.
    pub totals_in: String,
    pub groups: Vec<GroupReport>,
    pub total: MoneyValues,
}

impl HoldingsReport {
    pub fn new(holdings: &Holdings, converter: &Converter) -> Self {
        let groups = holdings
            .groups
            .iter()
            .map(|group| group_report(holdings, group, converter))
            .collect();

        HoldingsReport {
            portfolio: holdings.portfolio.code.clone(),
            as_at: holdings.as_at,
            group_by: holdings.dimension.to_string(),
            value_in: holdings.bucket.to_string(),
            totals_in: holdings.view_bucket.to_string(),
            groups,
            total: converter.money_values(&holdings.view_totals),
        }
    }

    pub fn display_as_table(&self) -> String {
        let currency = &self.total.currency.code;
        let mut table = ui::new_styled_table();
        table.set_header(vec![
            ui::header_cell(&self.group_by),
            ui::header_cell("Asset"),
            ui::header_cell("Quantity"),
            ui::header_cell("Value"),
            ui::header_cell("Cost"),
            ui::header_cell("Gain"),
            ui::header_cell("Day"),
            ui::header_cell("IRR"),
            ui::header_cell("Weight"),
        ]);

        for group in &self.groups {
            for (i, row) in group.positions.iter().enumerate() {
                let label = if i == 0 { group.key.as_str() } else { "" };
                table.add_row(vec![
                    Cell::new(label),
                    Cell::new(format!("{} ({})", row.code, row.values.currency.code)),
                    ui::amount_cell(row.quantity),
                    ui::amount_cell(row.values.market_value),
                    ui::amount_cell(row.values.cost_value),
                    ui::signed_cell(row.values.total_gain),
                    ui::signed_cell(row.values.gain_on_day),
                    ui::format_optional_cell(row.values.irr, |v| ui::format_percentage(v * 100.0)),
                    ui::format_percentage_cell(row.weight * 100.0),
                ]);
            }
            if let Some(sub_total) = &group.sub_total {
                table.add_row(vec![
                    ui::total_cell(""),
                    ui::total_cell(&format!("Subtotal ({})", sub_total.currency.code)),
                    Cell::new(""),
                    ui::amount_cell(sub_total.market_value),
                    ui::amount_cell(sub_total.cost_value),
                    ui::signed_cell(sub_total.total_gain),
                    ui::signed_cell(sub_total.gain_on_day),
                    ui::format_optional_cell(sub_total.irr, |v| ui::format_percentage(v * 100.0)),
                    ui::format_percentage_cell(sub_total.weight * 100.0),
                ]);
            }
        }

        let as_at = self.as_at.map_or(String::new(), |d| {
            let date = format!("as at {}", d.format("%Y-%m-%d"));
            format!(" {}", ui::style_text(&date, ui::StyleType::Subtle))
        });
        let mut output = format!(
            "Portfolio: {}{}\n\n",
            ui::style_text(&self.portfolio, ui::StyleType::Title),
            as_at
        );
        output.push_str(&table.to_string());
        output.push_str(&format!(
            "\n\nTotal Value ({}): {}  Gain: {}  Day: {}",
            ui::style_text(currency, ui::StyleType::TotalLabel),
            ui::style_text(&ui::format_amount(self.total.market_value), ui::StyleType::TotalValue),
            ui::format_amount(self.total.total_gain),
            ui::format_amount(self.total.gain_on_day),
        ));
        if self.totals_in != self.value_in {
            output.push_str(&format!(
                "\n{}",
                ui::style_text(
                    &format!(
                        "Positions trade in several currencies, totals shown in {}",
                        self.totals_in
                    ),
                    ui::StyleType::Warning
                )
            ));
        }
        output
    }
}

fn group_report(holdings: &Holdings, group: &HoldingGroup, converter: &Converter) -> GroupReport {
    // rows keep the selected bucket; only the combined subtotal falls back
    let positions = group
        .positions
        .iter()
        .map(|position| position_row(holdings, position, holdings.bucket, converter))
        .collect();
    let sub_total = group
        .show_subtotal()
        .then(|| converter.money_values(group.view_sub_totals(holdings.bucket)));

    GroupReport {
        key: group.key.clone(),
        positions,
        sub_total,
    }
}

fn position_row(
    holdings: &Holdings,
    position: &Position,
    bucket: ValueBucket,
    converter: &Converter,
) -> PositionRow {
    PositionRow {
        code: position.asset.code.clone(),
        name: position.asset.name.clone(),
        quantity: position.quantity_values.total,
        values: converter.money_values(position.values(bucket)),
        weight: holdings.position_weight(position),
    }
}

pub fn run(holdings: &Holdings, converter: &Converter, json: bool) -> Result<()> {
    let report = HoldingsReport::new(holdings, converter);
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.display_as_table());
        ui::print_separator();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::aggregate::ViewConfig;
    use crate::core::currency::{CurrencyPair, RateTable};
    use crate::core::model::{
        Asset, AssetCategory, BucketValues, Currency, HoldingsPayload, Market, Portfolio,
        QuantityValues,
    };

    fn position(code: &str, category: &str, trade: &str, value: f64) -> Position {
        let values = |currency: &str, market_value: f64| MoneyValues {
            currency: Currency::from_code(currency),
            market_value,
            cost_value: market_value * 0.8,
            total_gain: market_value * 0.2,
            ..Default::default()
        };
        Position {
            asset: Asset {
                code: code.to_string(),
                name: code.to_string(),
                asset_category: AssetCategory {
                    id: category.to_string(),
                    name: category.to_string(),
                },
                market: Market {
                    code: trade.to_string(),
                    currency: Currency::from_code(trade),
                },
                sector: None,
            },
            money_values: BucketValues {
                trade: values(trade, value),
                portfolio: values("NZD", value * 1.6),
                base: values("USD", value),
            },
            quantity_values: QuantityValues {
                total: 10.0,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn payload() -> HoldingsPayload {
        HoldingsPayload {
            portfolio: Portfolio {
                code: "GROWTH".to_string(),
                currency: Currency::from_code("NZD"),
                base: Currency::from_code("USD"),
                ..Default::default()
            },
            as_at: NaiveDate::from_ymd_opt(2024, 3, 28),
            positions: vec![
                position("AAPL", "Equity", "USD", 1000.0),
                position("MSFT", "Equity", "USD", 3000.0),
                position("VOD", "Equity", "GBP", 500.0),
                position("NZD-CASH", "Cash", "NZD", 250.0),
            ],
        }
    }

    #[test]
    fn test_report_hides_single_position_subtotals() {
        let holdings = Holdings::build(&payload(), &ViewConfig::default());
        let rates = RateTable::new();
        let report = HoldingsReport::new(&holdings, &Converter::new(&rates, None));

        let keys: Vec<&str> = report.groups.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["Equity", "Cash"]);
        assert!(report.groups[0].sub_total.is_some());
        assert!(report.groups[1].sub_total.is_none());
        assert_eq!(report.total.currency.code, "NZD");
        assert!((report.total.market_value - 4750.0 * 1.6).abs() < 1e-9);

        let weights: f64 = report
            .groups
            .iter()
            .flat_map(|g| g.positions.iter().map(|p| p.weight))
            .sum();
        assert!((weights - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_mixed_trade_report_falls_back_to_base_totals() {
        let config = ViewConfig {
            bucket: ValueBucket::Trade,
            ..Default::default()
        };
        let holdings = Holdings::build(&payload(), &config);
        let rates = RateTable::new();
        let report = HoldingsReport::new(&holdings, &Converter::new(&rates, None));

        assert_eq!(report.value_in, "TRADE");
        assert_eq!(report.totals_in, "BASE");
        assert_eq!(report.total.currency.code, "USD");
        // the cash row keeps its own trade currency
        assert_eq!(report.groups[1].positions[0].values.currency.code, "NZD");

        // so do rows inside the mixed USD and GBP equity group
        let equity = &report.groups[0];
        assert_eq!(equity.key, "Equity");
        let currencies: Vec<(&str, &str)> = equity
            .positions
            .iter()
            .map(|row| (row.code.as_str(), row.values.currency.code.as_str()))
            .collect();
        assert_eq!(currencies, vec![("MSFT", "USD"), ("AAPL", "USD"), ("VOD", "GBP")]);
        assert_eq!(equity.sub_total.as_ref().unwrap().currency.code, "USD");

        let table = report.display_as_table();
        assert!(table.contains("totals shown in BASE"));
        assert!(table.contains("Subtotal (USD)"));
    }

    #[test]
    fn test_report_converts_into_display_currency() {
        let config = ViewConfig {
            bucket: ValueBucket::Base,
            ..Default::default()
        };
        let holdings = Holdings::build(&payload(), &config);
        let rates: RateTable = [(CurrencyPair::new("USD", "EUR"), 0.5)].into_iter().collect();
        let eur = Currency::from_code("EUR");
        let report = HoldingsReport::new(&holdings, &Converter::new(&rates, Some(&eur)));

        assert_eq!(report.total.currency.code, "EUR");
        assert!((report.total.market_value - 2375.0).abs() < 1e-9);
        assert_eq!(report.groups[0].positions[0].values.currency.code, "EUR");
        // ratios are not converted
        assert!((report.groups[0].positions[0].weight - 3000.0 / 4750.0).abs() < 1e-9);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["groupBy"], "Asset Class");
        assert!(json["groups"][1].get("subTotal").is_none());
    }
}
