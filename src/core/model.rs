//! Value types describing positions, portfolios and their money figures.
//!
//! Everything here arrives already valued from an upstream service. The engine
//! only reads these types and builds new aggregates from them.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

const MIXED_CODE: &str = "MIXED";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Currency {
    pub code: String,
    pub name: String,
    pub symbol: String,
}

impl Currency {
    /// Builds a currency from its ISO code, filling in the name and symbol for
    /// common codes. Unknown codes use the code for both.
    pub fn from_code(code: &str) -> Self {
        let code = code.trim().to_uppercase();
        let (name, symbol) = match code.as_str() {
            "USD" => ("US Dollar", "$"),
            "EUR" => ("Euro", "€"),
            "GBP" => ("Pound Sterling", "£"),
            "NZD" => ("New Zealand Dollar", "$"),
            "AUD" => ("Australian Dollar", "$"),
            "CAD" => ("Canadian Dollar", "$"),
            "SGD" => ("Singapore Dollar", "$"),
            "JPY" => ("Japanese Yen", "¥"),
            "INR" => ("Indian Rupee", "₹"),
            "CHF" => ("Swiss Franc", "CHF"),
            _ => (code.as_str(), code.as_str()),
        };
        Currency {
            name: name.to_string(),
            symbol: symbol.to_string(),
            code,
        }
    }

    /// Label for a raw TRADE aggregate spanning several trade currencies.
    pub fn mixed() -> Self {
        Currency {
            code: MIXED_CODE.to_string(),
            name: "Mixed currencies".to_string(),
            symbol: String::new(),
        }
    }

    pub fn is_mixed(&self) -> bool {
        self.code == MIXED_CODE
    }

    pub fn same_as(&self, other: &Currency) -> bool {
        self.code == other.code
    }
}

impl Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

/// Which of the parallel denominations a money figure is expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ValueBucket {
    #[serde(alias = "trade")]
    Trade,
    #[default]
    #[serde(alias = "portfolio")]
    Portfolio,
    #[serde(alias = "base")]
    Base,
}

impl ValueBucket {
    pub const ALL: [ValueBucket; 3] = [ValueBucket::Trade, ValueBucket::Portfolio, ValueBucket::Base];
}

impl Display for ValueBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                ValueBucket::Trade => "TRADE",
                ValueBucket::Portfolio => "PORTFOLIO",
                ValueBucket::Base => "BASE",
            }
        )
    }
}

impl FromStr for ValueBucket {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "TRADE" => Ok(ValueBucket::Trade),
            "PORTFOLIO" => Ok(ValueBucket::Portfolio),
            "BASE" => Ok(ValueBucket::Base),
            _ => Err(anyhow::anyhow!("Invalid value bucket: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PriceData {
    pub close: f64,
    pub previous_close: f64,
    pub change: f64,
    pub change_percent: f64,
    pub price_date: Option<NaiveDate>,
}

/// Money figures for one bucket of a position or group.
///
/// Absent numeric fields deserialize as zero so a sparse row never breaks a sum.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MoneyValues {
    pub currency: Currency,
    pub market_value: f64,
    pub cost_value: f64,
    pub average_cost: f64,
    pub unrealised_gain: f64,
    pub realised_gain: f64,
    pub total_gain: f64,
    pub dividends: f64,
    pub gain_on_day: f64,
    /// `None` when the return was not computed at this level.
    pub irr: Option<f64>,
    pub roi: f64,
    pub weight: f64,
    pub price_data: Option<PriceData>,
}

impl MoneyValues {
    pub fn empty(currency: Currency) -> Self {
        MoneyValues {
            currency,
            ..Default::default()
        }
    }
}

/// One `MoneyValues` per bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketValues {
    #[serde(rename = "TRADE")]
    pub trade: MoneyValues,
    #[serde(rename = "PORTFOLIO")]
    pub portfolio: MoneyValues,
    #[serde(rename = "BASE")]
    pub base: MoneyValues,
}

impl BucketValues {
    pub fn get(&self, bucket: ValueBucket) -> &MoneyValues {
        match bucket {
            ValueBucket::Trade => &self.trade,
            ValueBucket::Portfolio => &self.portfolio,
            ValueBucket::Base => &self.base,
        }
    }

    pub fn get_mut(&mut self, bucket: ValueBucket) -> &mut MoneyValues {
        match bucket {
            ValueBucket::Trade => &mut self.trade,
            ValueBucket::Portfolio => &mut self.portfolio,
            ValueBucket::Base => &mut self.base,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuantityValues {
    pub total: f64,
    pub purchased: f64,
    pub sold: f64,
    pub precision: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DateValues {
    pub opened: Option<NaiveDate>,
    pub closed: Option<NaiveDate>,
    pub last_dividend: Option<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetCategory {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Market {
    pub code: String,
    pub currency: Currency,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Asset {
    pub code: String,
    pub name: String,
    pub asset_category: AssetCategory,
    pub market: Market,
    pub sector: Option<String>,
}

impl Asset {
    /// True for cash balances and cash-equivalent accounts.
    pub fn is_cash_like(&self) -> bool {
        matches!(
            self.asset_category.id.to_uppercase().as_str(),
            "CASH" | "ACCOUNT" | "TRADE"
        ) || self.market.code.eq_ignore_ascii_case("CASH")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Position {
    pub asset: Asset,
    pub money_values: BucketValues,
    pub quantity_values: QuantityValues,
    pub date_values: DateValues,
    /// Quantity held per broker when the position is split across custodians.
    pub held: Option<BTreeMap<String, f64>>,
}

impl Position {
    pub fn values(&self, bucket: ValueBucket) -> &MoneyValues {
        self.money_values.get(bucket)
    }

    pub fn market_value(&self, bucket: ValueBucket) -> f64 {
        finite_or_zero(self.values(bucket).market_value)
    }

    pub fn trade_currency(&self) -> &Currency {
        &self.money_values.trade.currency
    }

    /// A position with nothing left on hand, typically closed out.
    pub fn is_empty(&self) -> bool {
        self.quantity_values.total == 0.0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Portfolio {
    pub id: String,
    pub code: String,
    pub name: String,
    /// Reporting currency.
    pub currency: Currency,
    /// Cost-tracking currency.
    pub base: Currency,
    pub market_value: f64,
    pub irr: f64,
}

/// The holdings document handed over by the upstream valuation service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct HoldingsPayload {
    pub portfolio: Portfolio,
    pub as_at: Option<NaiveDate>,
    pub positions: Vec<Position>,
}

pub(crate) fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() { value } else { 0.0 }
}
