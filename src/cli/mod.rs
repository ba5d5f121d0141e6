pub mod alloc;
pub mod holdings;
pub mod rates;
pub mod setup;
pub mod ui;
