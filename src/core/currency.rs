//! Currency conversion over a snapshot of FX rates.
//!
//! Conversion never fails: a missing rate leaves the amount unconverted so that
//! one absent pair cannot blank out a whole view.
use crate::core::model::{Currency, MoneyValues, Portfolio, Position, ValueBucket};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use futures::future::join_all;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeSet, HashMap};
use std::fmt::Display;
use std::str::FromStr;
use tracing::{debug, warn};

#[async_trait]
pub trait CurrencyRateProvider: Send + Sync {
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CurrencyPair {
    pub from: String,
    pub to: String,
}

impl CurrencyPair {
    pub fn new(from: &str, to: &str) -> Self {
        CurrencyPair {
            from: from.trim().to_uppercase(),
            to: to.trim().to_uppercase(),
        }
    }
}

impl Display for CurrencyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.from, self.to)
    }
}

impl FromStr for CurrencyPair {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((from, to)) if !from.trim().is_empty() && !to.trim().is_empty() => {
                Ok(CurrencyPair::new(from, to))
            }
            _ => Err(anyhow!("Invalid currency pair: {} (expected FROM:TO)", s)),
        }
    }
}

impl Serialize for CurrencyPair {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CurrencyPair {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Read-only snapshot of FX rates keyed by currency pair.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateTable {
    rates: HashMap<CurrencyPair, f64>,
}

impl RateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pair: CurrencyPair, rate: f64) {
        self.rates.insert(pair, rate);
    }

    pub fn rate(&self, from: &str, to: &str) -> Option<f64> {
        self.rates.get(&CurrencyPair::new(from, to)).copied()
    }

    pub fn contains(&self, pair: &CurrencyPair) -> bool {
        self.rates.contains_key(pair)
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    /// Returns a new table with `overrides` layered on top of `self`.
    pub fn merge(&self, overrides: &RateTable) -> RateTable {
        let mut merged = self.clone();
        for (pair, rate) in &overrides.rates {
            merged.rates.insert(pair.clone(), *rate);
        }
        merged
    }

    pub fn convert(&self, amount: f64, from: &Currency, to: &Currency) -> f64 {
        if from.same_as(to) {
            return amount;
        }
        match self.rate(&from.code, &to.code) {
            Some(rate) if rate.is_finite() => amount * rate,
            _ => {
                debug!(
                    "No rate for {} -> {}, leaving {} unconverted",
                    from.code, to.code, amount
                );
                amount
            }
        }
    }

    /// Resolves every pair through `provider` concurrently. Pairs that fail to
    /// resolve are logged and left out of the snapshot.
    pub async fn fetch(
        provider: &(dyn CurrencyRateProvider + Send + Sync),
        pairs: &BTreeSet<CurrencyPair>,
        update_callback: &(dyn Fn() + Sync),
    ) -> RateTable {
        let rate_futures = pairs.iter().map(|pair| async move {
            let result = provider.get_rate(&pair.from, &pair.to).await;
            update_callback();
            (pair.clone(), result)
        });

        let mut table = RateTable::new();
        for (pair, result) in join_all(rate_futures).await {
            match result {
                Ok(rate) => {
                    debug!("Resolved {} at {}", pair, rate);
                    table.insert(pair, rate);
                }
                Err(e) => warn!("Rate lookup failed for {}: {}", pair, e),
            }
        }
        table
    }
}

impl FromIterator<(CurrencyPair, f64)> for RateTable {
    fn from_iter<I: IntoIterator<Item = (CurrencyPair, f64)>>(iter: I) -> Self {
        RateTable {
            rates: iter.into_iter().collect(),
        }
    }
}

/// Converts `amount` from `source` into `display` using `rates`.
pub fn convert(amount: f64, source: &Currency, display: &Currency, rates: &RateTable) -> f64 {
    rates.convert(amount, source, display)
}

/// Currency a single position's figures are denominated in for `bucket`.
pub fn source_currency<'a>(
    bucket: ValueBucket,
    portfolio: &'a Portfolio,
    position: &'a Position,
) -> &'a Currency {
    match bucket {
        ValueBucket::Trade => position.trade_currency(),
        ValueBucket::Portfolio => &portfolio.currency,
        ValueBucket::Base => &portfolio.base,
    }
}

/// True when the positions are quoted in more than one trade currency.
pub fn has_mixed_trade_currencies<'a, I>(positions: I) -> bool
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut codes = positions.into_iter().map(|p| &p.trade_currency().code);
    match codes.next() {
        Some(first) => codes.any(|code| code != first),
        None => false,
    }
}

/// The bucket a combined figure over `positions` can be shown in. TRADE figures
/// in different currencies cannot be added up, so they fall back to BASE.
pub fn combined_bucket<'a, I>(bucket: ValueBucket, positions: I) -> ValueBucket
where
    I: IntoIterator<Item = &'a Position>,
{
    if bucket == ValueBucket::Trade && has_mixed_trade_currencies(positions) {
        ValueBucket::Base
    } else {
        bucket
    }
}

/// Currency of a combined figure over `positions` for `bucket`.
pub fn combined_source_currency(
    bucket: ValueBucket,
    portfolio: &Portfolio,
    positions: &[Position],
) -> Currency {
    match combined_bucket(bucket, positions) {
        ValueBucket::Trade => positions
            .first()
            .map(|p| p.trade_currency().clone())
            .unwrap_or_else(|| portfolio.currency.clone()),
        ValueBucket::Portfolio => portfolio.currency.clone(),
        ValueBucket::Base => portfolio.base.clone(),
    }
}

/// Applies the selected display currency to figures at read time.
#[derive(Debug, Clone)]
pub struct Converter<'a> {
    rates: &'a RateTable,
    display: Option<&'a Currency>,
}

impl<'a> Converter<'a> {
    pub fn new(rates: &'a RateTable, display: Option<&'a Currency>) -> Self {
        Converter { rates, display }
    }

    pub fn display_currency(&self) -> Option<&'a Currency> {
        self.display
    }

    /// Currency figures end up in when they start out in `source`.
    pub fn target<'s>(&self, source: &'s Currency) -> &'s Currency
    where
        'a: 's,
    {
        self.display.unwrap_or(source)
    }

    pub fn amount(&self, value: f64, source: &Currency) -> f64 {
        match self.display {
            Some(display) => self.rates.convert(value, source, display),
            None => value,
        }
    }

    /// Builds the display-currency copy of `values`. Ratios are carried over
    /// untouched.
    pub fn money_values(&self, values: &MoneyValues) -> MoneyValues {
        let source = &values.currency;
        let Some(display) = self.display else {
            return values.clone();
        };
        if source.same_as(display) || source.is_mixed() {
            return values.clone();
        }
        let convert = |v: f64| self.rates.convert(v, source, display);
        MoneyValues {
            currency: display.clone(),
            market_value: convert(values.market_value),
            cost_value: convert(values.cost_value),
            average_cost: convert(values.average_cost),
            unrealised_gain: convert(values.unrealised_gain),
            realised_gain: convert(values.realised_gain),
            total_gain: convert(values.total_gain),
            dividends: convert(values.dividends),
            gain_on_day: convert(values.gain_on_day),
            irr: values.irr,
            roi: values.roi,
            weight: values.weight,
            price_data: values.price_data.clone(),
        }
    }
}
