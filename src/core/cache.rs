use crate::core::currency::CurrencyPair;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Shared, in-memory store of FX rates already fetched during this run.
#[derive(Clone, Default)]
pub struct RateCache {
    inner: Arc<Mutex<HashMap<CurrencyPair, f64>>>,
}

impl RateCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, pair: &CurrencyPair) -> Option<f64> {
        let cache = self.inner.lock().await;
        let rate = cache.get(pair).copied();
        if rate.is_some() {
            debug!("Rate cache HIT for {}", pair);
        } else {
            debug!("Rate cache MISS for {}", pair);
        }
        rate
    }

    pub async fn put(&self, pair: CurrencyPair, rate: f64) {
        let mut cache = self.inner.lock().await;
        debug!("Rate cache PUT {} = {}", pair, rate);
        cache.insert(pair, rate);
    }
}
