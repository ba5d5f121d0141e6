//! Holdings aggregation and valuation

pub mod aggregate;
pub mod allocation;
pub mod cache;
pub mod config;
pub mod currency;
pub mod grouping;
pub mod log;
pub mod model;
pub mod sign;
pub mod sort;

// Re-export main types for cleaner imports
pub use aggregate::{HoldingGroup, Holdings, ViewConfig};
pub use allocation::{Allocation, AllocationSlice};
pub use currency::{Converter, CurrencyPair, CurrencyRateProvider, RateTable};
pub use grouping::GroupDimension;
pub use model::{Currency, HoldingsPayload, MoneyValues, Portfolio, Position, ValueBucket};
