//! Group subtotals, portfolio totals and weights.
//!
//! Every figure is summed per bucket, so switching the displayed bucket is a
//! lookup rather than a recomputation. Both the group subtotals and the grand
//! total go through [`sum_values`].
use crate::core::currency::{combined_bucket, combined_source_currency};
use crate::core::grouping::{GroupDimension, group_sorted};
use crate::core::model::{
    BucketValues, Currency, HoldingsPayload, MoneyValues, Portfolio, Position, ValueBucket,
    finite_or_zero,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Everything that selects what a holdings view shows. Owned by the caller and
/// handed to each aggregation pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    pub dimension: GroupDimension,
    pub bucket: ValueBucket,
    pub display_currency: Option<Currency>,
    /// Leave out positions with nothing on hand.
    pub hide_empty: bool,
}

/// `value / total`, or 0 when the total is zero or not a number.
pub fn weight_of(value: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() || !value.is_finite() {
        0.0
    } else {
        value / total
    }
}

pub fn position_weight(position: &Position, bucket: ValueBucket, portfolio_market_value: f64) -> f64 {
    weight_of(position.market_value(bucket), portfolio_market_value)
}

#[derive(Default)]
struct Accumulator {
    currency: Option<Currency>,
    mixed: bool,
    market_value: f64,
    cost_value: f64,
    unrealised_gain: f64,
    realised_gain: f64,
    total_gain: f64,
    dividends: f64,
    gain_on_day: f64,
}

impl Accumulator {
    fn add(&mut self, values: &MoneyValues) {
        match &self.currency {
            None => self.currency = Some(values.currency.clone()),
            Some(seen) if !seen.same_as(&values.currency) => self.mixed = true,
            Some(_) => {}
        }
        self.market_value += finite_or_zero(values.market_value);
        self.cost_value += finite_or_zero(values.cost_value);
        self.unrealised_gain += finite_or_zero(values.unrealised_gain);
        self.realised_gain += finite_or_zero(values.realised_gain);
        self.total_gain += finite_or_zero(values.total_gain);
        self.dividends += finite_or_zero(values.dividends);
        self.gain_on_day += finite_or_zero(values.gain_on_day);
    }

    fn finish(self, fallback: &Currency) -> MoneyValues {
        let currency = if self.mixed {
            Currency::mixed()
        } else {
            self.currency.unwrap_or_else(|| fallback.clone())
        };
        MoneyValues {
            currency,
            market_value: self.market_value,
            cost_value: self.cost_value,
            average_cost: 0.0,
            unrealised_gain: self.unrealised_gain,
            realised_gain: self.realised_gain,
            total_gain: self.total_gain,
            dividends: self.dividends,
            gain_on_day: self.gain_on_day,
            // money-weighted returns do not add up
            irr: None,
            roi: weight_of(self.total_gain, self.cost_value),
            weight: 0.0,
            price_data: None,
        }
    }
}

/// Field-wise sum of `values`. The result is labelled with the shared currency,
/// [`Currency::mixed`] if the inputs disagree, or `fallback` when empty.
pub fn sum_values<'a, I>(values: I, fallback: &Currency) -> MoneyValues
where
    I: IntoIterator<Item = &'a MoneyValues>,
{
    let mut acc = Accumulator::default();
    for v in values {
        acc.add(v);
    }
    acc.finish(fallback)
}

/// Sums one bucket over `positions` and weighs it against the portfolio.
pub fn subtotal(positions: &[Position], bucket: ValueBucket, portfolio_market_value: f64) -> MoneyValues {
    let mut values = sum_values(positions.iter().map(|p| p.values(bucket)), &Currency::default());
    values.weight = weight_of(values.market_value, portfolio_market_value);
    values
}

/// Grand total as the sum of group subtotals.
pub fn grand_total(groups: &[HoldingGroup]) -> BucketValues {
    totals_from(|bucket| sum_values(groups.iter().map(|g| g.sub_totals.get(bucket)), &Currency::default()))
}

/// Grand total summed straight from the positions.
pub fn grand_total_from_positions(positions: &[Position]) -> BucketValues {
    totals_from(|bucket| sum_values(positions.iter().map(|p| p.values(bucket)), &Currency::default()))
}

fn totals_from(mut sum: impl FnMut(ValueBucket) -> MoneyValues) -> BucketValues {
    let mut totals = BucketValues::default();
    for bucket in ValueBucket::ALL {
        let mut values = sum(bucket);
        values.weight = weight_of(values.market_value, values.market_value);
        *totals.get_mut(bucket) = values;
    }
    totals
}

/// Positions sharing a group key, with their per-bucket subtotal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingGroup {
    pub key: String,
    pub positions: Vec<Position>,
    pub sub_totals: BucketValues,
    pub position_count: usize,
}

impl HoldingGroup {
    /// A one-position group's subtotal repeats that position's row, so it is
    /// hidden. It is still computed and still part of the grand total.
    pub fn show_subtotal(&self) -> bool {
        self.position_count > 1
    }

    pub fn view_bucket(&self, bucket: ValueBucket) -> ValueBucket {
        combined_bucket(bucket, &self.positions)
    }

    pub fn view_sub_totals(&self, bucket: ValueBucket) -> &MoneyValues {
        self.sub_totals.get(self.view_bucket(bucket))
    }
}

/// A grouped, totalled view over one portfolio's positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Holdings {
    pub portfolio: Portfolio,
    pub as_at: Option<NaiveDate>,
    pub dimension: GroupDimension,
    pub bucket: ValueBucket,
    pub groups: Vec<HoldingGroup>,
    pub totals: BucketValues,
    /// Bucket the combined totals are shown in; BASE when a TRADE view spans
    /// several trade currencies.
    pub view_bucket: ValueBucket,
    pub view_totals: MoneyValues,
    pub currency: Currency,
}

impl Holdings {
    pub fn build(payload: &HoldingsPayload, config: &ViewConfig) -> Self {
        let portfolio = &payload.portfolio;
        let positions: Vec<Position> = payload
            .positions
            .iter()
            .filter(|p| !(config.hide_empty && p.is_empty()))
            .cloned()
            .collect();
        debug!(
            "Aggregating {} of {} positions for {} by {}",
            positions.len(),
            payload.positions.len(),
            portfolio.code,
            config.dimension
        );

        // TRADE weights are only meaningful in one currency; otherwise use BASE
        let trade_weight_bucket = combined_bucket(ValueBucket::Trade, &positions);
        // Portfolio::market_value is reporting currency only, so each bucket
        // weighs against its own summed total instead
        let denominators = grand_total_from_positions(&positions);

        let groups: Vec<HoldingGroup> = group_sorted(&positions, config.dimension, config.bucket)
            .into_iter()
            .map(|(key, members)| {
                let sub_totals = bucket_subtotals(&members, &denominators, trade_weight_bucket);
                HoldingGroup {
                    key,
                    position_count: members.len(),
                    positions: members,
                    sub_totals,
                }
            })
            .collect();

        let mut totals = grand_total(&groups);
        if positions.is_empty() {
            for bucket in ValueBucket::ALL {
                totals.get_mut(bucket).currency = fallback_currency(bucket, portfolio);
            }
        }
        let trade_weight = weight_of(
            totals.get(trade_weight_bucket).market_value,
            totals.get(trade_weight_bucket).market_value,
        );
        totals.trade.weight = trade_weight;

        let view_bucket = combined_bucket(config.bucket, &positions);
        let view_totals = totals.get(view_bucket).clone();
        let currency = combined_source_currency(config.bucket, portfolio, &positions);

        Holdings {
            portfolio: portfolio.clone(),
            as_at: payload.as_at,
            dimension: config.dimension,
            bucket: config.bucket,
            groups,
            totals,
            view_bucket,
            view_totals,
            currency,
        }
    }

    pub fn group(&self, key: &str) -> Option<&HoldingGroup> {
        self.groups.iter().find(|g| g.key == key)
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.groups.iter().flat_map(|g| g.positions.iter())
    }

    pub fn position_count(&self) -> usize {
        self.groups.iter().map(|g| g.position_count).sum()
    }

    pub fn has_mixed_trade_currencies(&self) -> bool {
        self.bucket == ValueBucket::Trade && self.view_bucket == ValueBucket::Base
    }

    /// Weight of one position against the combined view total.
    pub fn position_weight(&self, position: &Position) -> f64 {
        position_weight(
            position,
            self.view_bucket,
            self.totals.get(self.view_bucket).market_value,
        )
    }
}

fn fallback_currency(bucket: ValueBucket, portfolio: &Portfolio) -> Currency {
    match bucket {
        ValueBucket::Trade | ValueBucket::Portfolio => portfolio.currency.clone(),
        ValueBucket::Base => portfolio.base.clone(),
    }
}

fn bucket_subtotals(
    members: &[Position],
    denominators: &BucketValues,
    trade_weight_bucket: ValueBucket,
) -> BucketValues {
    let mut sub_totals = BucketValues::default();
    for bucket in ValueBucket::ALL {
        *sub_totals.get_mut(bucket) =
            subtotal(members, bucket, denominators.get(bucket).market_value);
    }
    if trade_weight_bucket != ValueBucket::Trade {
        sub_totals.trade.weight = sub_totals.get(trade_weight_bucket).weight;
    }
    sub_totals
}
