use super::ui;
use crate::core::aggregate::Holdings;
use crate::core::currency::{CurrencyPair, CurrencyRateProvider, RateTable};
use crate::core::model::Currency;
use std::collections::BTreeSet;
use tracing::debug;

/// Pairs needed to show `holdings` in `display_currency`, leaving out those
/// `known` already covers. Position rows stay in the selected bucket, so a
/// TRADE view needs every trade currency even where group totals use BASE.
pub fn needed_pairs(
    holdings: &Holdings,
    display_currency: &Currency,
    known: &RateTable,
) -> BTreeSet<CurrencyPair> {
    let mut sources: Vec<&Currency> = vec![&holdings.currency];
    for group in &holdings.groups {
        let total_bucket = group.view_bucket(holdings.bucket);
        sources.push(&group.sub_totals.get(total_bucket).currency);
        sources.extend(
            group
                .positions
                .iter()
                .map(|p| &p.values(holdings.bucket).currency),
        );
    }

    sources
        .into_iter()
        .filter(|c| !c.code.is_empty() && !c.is_mixed() && !c.same_as(display_currency))
        .map(|c| CurrencyPair::new(&c.code, &display_currency.code))
        .filter(|pair| !known.contains(pair))
        .collect()
}

/// Builds the rate snapshot for one run: configured rates, topped up with
/// whatever `provider` can supply for the remaining pairs.
pub async fn resolve(
    holdings: &Holdings,
    display_currency: Option<&Currency>,
    configured: &RateTable,
    provider: &(dyn CurrencyRateProvider + Send + Sync),
) -> RateTable {
    let Some(display_currency) = display_currency else {
        return configured.clone();
    };
    let pairs = needed_pairs(holdings, display_currency, configured);
    if pairs.is_empty() {
        let code = &display_currency.code;
        debug!("All rates for {} are configured", code);
        return configured.clone();
    }

    let pb = ui::new_progress_bar(pairs.len() as u64, true);
    pb.set_message("Fetching exchange rates...");
    let fetched = RateTable::fetch(provider, &pairs, &|| pb.inc(1)).await;
    pb.finish_and_clear();

    fetched.merge(configured)
}
