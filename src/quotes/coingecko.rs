//! CoinGecko Quote Provider
//!
//! Fetches cryptocurrency spot prices from the CoinGecko `simple/price`
//! endpoint, all coins in one request.
//! - Public API: 10-30 calls/minute (no API key)
//! - Demo API: 30 calls/minute (free API key required, "CG-...")
//! - Pro API: Higher limits (paid)
//!
//! API documentation: https://docs.coingecko.com/

use super::{FetchError, PriceQuotes, PriceSource};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

/// Public API (no key required, limited)
const PUBLIC_BASE_URL: &str = "https://api.coingecko.com/api/v3";
/// Demo API (free key, higher limits)
const DEMO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
/// Pro API (paid)
const PRO_BASE_URL: &str = "https://pro-api.coingecko.com/api/v3";

const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Get base URL based on API key
fn get_base_url(api_key: Option<&str>) -> &'static str {
    match api_key {
        Some(key) if key.starts_with("CG-") => DEMO_BASE_URL,
        Some(_) => PRO_BASE_URL,
        None => PUBLIC_BASE_URL,
    }
}

/// Batched CoinGecko price client
#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    currency: String,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout: Duration,
}

impl CoinGeckoClient {
    /// # Arguments
    /// * `currency` - Reference currency (e.g., "usd", "EUR"), stored lowercase
    pub fn new(currency: &str) -> Self {
        Self {
            currency: currency.to_lowercase(),
            api_key: None,
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Optional API key (Demo: "CG-...", Pro: other)
    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    /// Override the API host, e.g. for a proxy. Wins over key-based selection.
    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        self.base_url = base_url.map(|u| u.trim_end_matches('/').to_string());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn base_url(&self) -> &str {
        match self.base_url {
            Some(ref url) => url.as_str(),
            None => get_base_url(self.api_key.as_deref()),
        }
    }

    fn price_url(&self, feed_ids: &[String]) -> String {
        format!(
            "{}/simple/price?ids={}&vs_currencies={}",
            self.base_url(),
            urlencoding::encode(&feed_ids.join(",")),
            urlencoding::encode(&self.currency)
        )
    }
}

#[async_trait]
impl PriceSource for CoinGeckoClient {
    fn name(&self) -> &str {
        "COINGECKO"
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    async fn fetch_prices(&self, feed_ids: &[String]) -> Result<PriceQuotes, FetchError> {
        if feed_ids.is_empty() {
            log::debug!("No feed ids to quote, skipping CoinGecko request");
            return Ok(PriceQuotes::new());
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(FetchError::Client)?;

        let url = self.price_url(feed_ids);
        log::debug!("Fetching {} CoinGecko prices from {}", feed_ids.len(), url);

        // Always ask for a live quote, never a cached one
        let mut request = client
            .get(&url)
            .header("Accept", "application/json")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache");

        // Add API key header if provided
        if let Some(ref key) = self.api_key {
            if key.starts_with("CG-") {
                request = request.header("x-cg-demo-api-key", key);
            } else {
                request = request.header("x-cg-pro-api-key", key);
            }
        }

        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body = response.text().await?;
        parse_simple_price(&body, &self.currency)
    }
}

/// Parse a `simple/price` body: `{"<id>": {"<currency>": <price>, ...}, ...}`
///
/// Coins without a usable quote in `currency` are left out rather than
/// zeroed; deciding what a missing quote is worth is the caller's business.
pub fn parse_simple_price(body: &str, currency: &str) -> Result<PriceQuotes, FetchError> {
    let data: HashMap<String, Value> = serde_json::from_str(body)
        .map_err(|e| FetchError::MalformedResponse(e.to_string()))?;

    let currency_lower = currency.to_lowercase();
    let mut quotes = PriceQuotes::with_capacity(data.len());

    for (coin_id, coin_data) in data {
        let values = coin_data.as_object().ok_or_else(|| {
            FetchError::MalformedResponse(format!("Entry for {} is not an object", coin_id))
        })?;

        match values.get(&currency_lower).and_then(Value::as_f64) {
            Some(price) if price.is_finite() && price >= 0.0 => {
                quotes.insert(coin_id, price);
            }
            Some(price) => {
                log::warn!("Ignoring invalid {} price {} for {}", currency_lower, price, coin_id);
            }
            None => {
                log::debug!("No {} price for {}", currency_lower, coin_id);
            }
        }
    }

    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP response, handing back the raw request text.
    async fn serve_once(
        status_line: &'static str,
        body: &'static str,
    ) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let response = format!(
                "HTTP/1.1 {}\r\n\
                 Content-Type: application/json\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&buf).to_string()
        });

        (format!("http://{}", addr), handle)
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_get_base_url() {
        assert_eq!(get_base_url(None), PUBLIC_BASE_URL);
        assert_eq!(get_base_url(Some("CG-abc")), DEMO_BASE_URL);
        assert_eq!(get_base_url(Some("pro-key")), PRO_BASE_URL);
    }

    #[test]
    fn test_price_url_batches_all_ids() {
        let client = CoinGeckoClient::new("USD");
        let url = client.price_url(&ids(&["ethereum", "polkadot"]));
        assert_eq!(
            url,
            format!("{}/simple/price?ids=ethereum%2Cpolkadot&vs_currencies=usd", PUBLIC_BASE_URL)
        );
    }

    #[test]
    fn test_base_url_override_wins() {
        let client = CoinGeckoClient::new("usd")
            .with_api_key(Some("pro-key".to_string()))
            .with_base_url(Some("http://localhost:8080/".to_string()));
        assert_eq!(client.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let client = CoinGeckoClient::new("usd").with_api_key(Some("  ".to_string()));
        assert_eq!(client.base_url(), PUBLIC_BASE_URL);
    }

    #[test]
    fn test_parse_simple_price() {
        let body = r#"{"ethereum":{"usd":3100.5},"polkadot":{"usd":7.25}}"#;
        let quotes = parse_simple_price(body, "usd").unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes["ethereum"], 3100.5);
        assert_eq!(quotes["polkadot"], 7.25);
    }

    #[test]
    fn test_parse_leaves_out_coins_without_currency() {
        let body = r#"{
            "ethereum": {"usd": 3100.5},
            "acala": {},
            "nym": {"eur": 0.1},
            "swarm": {"usd": null}
        }"#;
        let quotes = parse_simple_price(body, "USD").unwrap();
        assert_eq!(quotes.len(), 1);
        assert!(quotes.contains_key("ethereum"));
        assert!(!quotes.contains_key("acala"));
        assert!(!quotes.contains_key("nym"));
        assert!(!quotes.contains_key("swarm"));
    }

    #[test]
    fn test_parse_empty_object() {
        assert!(parse_simple_price("{}", "usd").unwrap().is_empty());
    }

    #[test]
    fn test_parse_malformed_payloads() {
        for body in ["not json", "[1,2,3]", r#"{"ethereum": 5}"#] {
            let result = parse_simple_price(body, "usd");
            assert!(
                matches!(result, Err(FetchError::MalformedResponse(_))),
                "expected malformed for {}",
                body
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_prices_single_batched_request() {
        let (base, server) = serve_once("200 OK", r#"{"x":{"usd":2.5}}"#).await;
        let client = CoinGeckoClient::new("usd").with_base_url(Some(base));

        let quotes = client.fetch_prices(&ids(&["x", "y"])).await.unwrap();
        assert_eq!(quotes.get("x"), Some(&2.5));
        assert_eq!(quotes.get("y"), None);

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /simple/price?ids=x%2cy&vs_currencies=usd "));
        assert!(request.contains("cache-control: no-cache"));
    }

    #[tokio::test]
    async fn test_fetch_prices_sends_demo_key_header() {
        let (base, server) = serve_once("200 OK", "{}").await;
        let client = CoinGeckoClient::new("usd")
            .with_api_key(Some("CG-test".to_string()))
            .with_base_url(Some(base));

        client.fetch_prices(&ids(&["x"])).await.unwrap();

        let request = server.await.unwrap().to_lowercase();
        assert!(request.contains("x-cg-demo-api-key: cg-test"));
    }

    #[tokio::test]
    async fn test_fetch_prices_non_success_status() {
        let (base, _server) =
            serve_once("429 Too Many Requests", r#"{"error":"rate limited"}"#).await;
        let client = CoinGeckoClient::new("usd").with_base_url(Some(base));

        match client.fetch_prices(&ids(&["x"])).await {
            Err(FetchError::Status { status, body }) => {
                assert_eq!(status, 429);
                assert!(body.contains("rate limited"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_prices_malformed_body() {
        let (base, _server) = serve_once("200 OK", "<html>oops</html>").await;
        let client = CoinGeckoClient::new("usd").with_base_url(Some(base));

        let result = client.fetch_prices(&ids(&["x"])).await;
        assert!(matches!(result, Err(FetchError::MalformedResponse(_))));
    }

    #[tokio::test]
    async fn test_fetch_prices_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = CoinGeckoClient::new("usd")
            .with_base_url(Some(format!("http://{}", addr)))
            .with_timeout(Duration::from_secs(2));

        let result = client.fetch_prices(&ids(&["x"])).await;
        assert!(matches!(result, Err(FetchError::Request(_))));
    }

    #[tokio::test]
    async fn test_fetch_prices_no_ids_skips_request() {
        let client =
            CoinGeckoClient::new("usd").with_base_url(Some("http://127.0.0.1:1".to_string()));
        assert!(client.fetch_prices(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    #[ignore] // Requires network
    async fn test_fetch_live_prices() {
        let client = CoinGeckoClient::new("usd");
        let quotes = client.fetch_prices(&ids(&["ethereum", "polkadot"])).await.unwrap();
        assert!(quotes["ethereum"] > 0.0);
    }
}
