use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::core::cache::RateCache;
use crate::core::currency::{CurrencyPair, CurrencyRateProvider};
use crate::providers::util::with_retry;

const RETRIES: usize = 2;
const RETRY_DELAY_MS: u64 = 250;

/// FX rates from the Yahoo Finance chart endpoint, quoted as `{FROM}{TO}=X`.
pub struct YahooCurrencyProvider {
    base_url: String,
    cache: RateCache,
}

impl YahooCurrencyProvider {
    pub fn new(base_url: &str, cache: RateCache) -> Self {
        YahooCurrencyProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache,
        }
    }
}

#[derive(Debug, Deserialize)]
struct YahooCurrencyResponse {
    chart: CurrencyChartResult,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartResult {
    result: Vec<CurrencyChartItem>,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartItem {
    meta: CurrencyChartMeta,
}

#[derive(Debug, Deserialize)]
struct CurrencyChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: f64,
}

#[async_trait]
impl CurrencyRateProvider for YahooCurrencyProvider {
    #[instrument(name = "YahooRateFetch", skip(self))]
    async fn get_rate(&self, from: &str, to: &str) -> Result<f64> {
        let pair = CurrencyPair::new(from, to);
        if let Some(cached) = self.cache.get(&pair).await {
            return Ok(cached);
        }

        let symbol = format!("{}{}=X", pair.from, pair.to);
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        debug!("Requesting currency rate from {}", url);

        let client = reqwest::Client::builder()
            .user_agent("holdview/0.1")
            .build()?;

        let response = with_retry(&symbol, || client.get(&url).send(), RETRIES, RETRY_DELAY_MS)
            .await
            .map_err(|e| anyhow!("Request error: {} for currency pair: {}", e, symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for currency pair: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooCurrencyResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let rate = data
            .chart
            .result
            .into_iter()
            .next()
            .map(|item| item.meta.regular_market_price)
            .filter(|rate| rate.is_finite() && *rate > 0.0)
            .ok_or_else(|| anyhow!("No rate data found for currency pair: {}", symbol))?;

        self.cache.put(pair, rate).await;
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn mount_chart(server: &MockServer, symbol: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(format!("/v8/finance/chart/{symbol}")))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_successful_rate_fetch() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), RateCache::new());

        let mock_response = r#"{
            "chart": {
                "result": [
                    {
                        "meta": {
                            "regularMarketPrice": 1.6412
                        }
                    }
                ]
            }
        }"#;
        mount_chart(
            &mock_server,
            "USDNZD=X",
            ResponseTemplate::new(200).set_body_string(mock_response),
        )
        .await;

        let rate = provider
            .get_rate("usd", "NZD")
            .await
            .expect("Failed to get rate");
        assert_eq!(rate, 1.6412);
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let mock_server = MockServer::start().await;
        let cache = RateCache::new();
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), cache.clone());

        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/EURUSD=X"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 1.08}}]}}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        assert_eq!(provider.get_rate("EUR", "USD").await.unwrap(), 1.08);
        assert_eq!(provider.get_rate("EUR", "USD").await.unwrap(), 1.08);
        assert_eq!(cache.get(&CurrencyPair::new("EUR", "USD")).await, Some(1.08));
    }

    #[tokio::test]
    async fn test_no_currency_rate_found() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), RateCache::new());

        mount_chart(
            &mock_server,
            "USDEUR=X",
            ResponseTemplate::new(200).set_body_string(r#"{"chart": {"result": []}}"#),
        )
        .await;

        let result = provider.get_rate("USD", "EUR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "No rate data found for currency pair: USDEUR=X"
        );
    }

    #[tokio::test]
    async fn test_zero_rate_is_rejected() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), RateCache::new());

        mount_chart(
            &mock_server,
            "GBPJPY=X",
            ResponseTemplate::new(200).set_body_string(
                r#"{"chart": {"result": [{"meta": {"regularMarketPrice": 0.0}}]}}"#,
            ),
        )
        .await;

        assert!(provider.get_rate("GBP", "JPY").await.is_err());
    }

    #[tokio::test]
    async fn test_yahoo_currency_api_error_response() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), RateCache::new());

        mount_chart(&mock_server, "USDEUR=X", ResponseTemplate::new(500)).await;

        let result = provider.get_rate("USD", "EUR").await;
        assert_eq!(
            result.unwrap_err().to_string(),
            "HTTP error: 500 Internal Server Error for currency pair: USDEUR=X"
        );
    }

    #[tokio::test]
    async fn test_yahoo_currency_api_malformed_response() {
        let mock_server = MockServer::start().await;
        let provider = YahooCurrencyProvider::new(&mock_server.uri(), RateCache::new());

        mount_chart(
            &mock_server,
            "USDEUR=X",
            ResponseTemplate::new(200).set_body_string(r#"{"chart": {"results": []}}"#),
        )
        .await;

        let result = provider.get_rate("USD", "EUR").await;
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Failed to parse JSON response for USDEUR=X")
        );
    }
}
