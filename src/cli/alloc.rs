use super::ui;
use crate::core::aggregate::Holdings;
use crate::core::allocation::{self, Allocation};
use crate::core::currency::Converter;
use anyhow::Result;
use comfy_table::Cell;
use tracing::warn;

/// Slices the holdings by group and renormalises over the groups not in
/// `exclude`.
pub fn build(holdings: &Holdings, converter: &Converter, exclude: &[String]) -> Allocation {
    let slices = allocation::slice(holdings, converter);
    for key in exclude {
        if !slices.iter().any(|s| &s.key == key) {
            warn!("No group named '{}' to exclude", key);
        }
    }
    allocation::renormalize(&slices, exclude)
}

pub fn display_as_table(allocation: &Allocation, dimension: &str, currency: &str) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell(dimension),
        ui::header_cell(&format!("Value ({currency})")),
        ui::header_cell("Day"),
        ui::header_cell("IRR"),
        ui::header_cell("Allocation"),
    ]);

    for slice in &allocation.slices {
        table.add_row(vec![
            Cell::new(&slice.label),
            ui::amount_cell(slice.value),
            ui::signed_cell(slice.gain_on_day),
            ui::format_optional_cell(slice.irr, |v| ui::format_percentage(v * 100.0)),
            ui::format_percentage_cell(slice.percentage),
        ]);
    }

    format!(
        "{table}\n\nTotal ({}): {}",
        ui::style_text(currency, ui::StyleType::TotalLabel),
        ui::style_text(&ui::format_amount(allocation.total), ui::StyleType::TotalValue)
    )
}

pub fn run(holdings: &Holdings, converter: &Converter, exclude: &[String], json: bool) -> Result<()> {
    let allocation = build(holdings, converter, exclude);
    if json {
        println!("{}", serde_json::to_string_pretty(&allocation)?);
        return Ok(());
    }

    let currency = converter.target(&holdings.currency);
    println!(
        "\nPortfolio: {}\n",
        ui::style_text(&holdings.portfolio.code, ui::StyleType::Title)
    );
    println!(
        "{}",
        display_as_table(&allocation, &holdings.dimension.to_string(), &currency.code)
    );
    ui::print_separator();
    Ok(())
}
