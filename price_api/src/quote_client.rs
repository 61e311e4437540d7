use {
	crate::{
		config::QuoteProviderConfig,
		consts::{MAX_BACKOFF_EXPONENT, SIMPLE_PRICE_PATH},
	},
	async_trait::async_trait,
	reqwest::{Client, StatusCode},
	serde_json::Value,
	std::time::Duration,
	thiserror::Error,
	tracing::{debug, warn},
};

#[derive(Debug, Error)]
pub enum QuoteClientError {
	#[error("Quote request failed: {0}")]
	Request(#[from] reqwest::Error),

	#[error("Quote provider returned status={status}, body={body}")]
	Status { status: StatusCode, body: String },

	#[error("Coalesced quote request was dropped by its leader")]
	Coalesced,
}

impl QuoteClientError {
	/// 超时 连接失败 429 和 5xx 可以重试 其它 4xx 重试也没用
	pub fn is_retryable(&self) -> bool {
		match self {
			QuoteClientError::Request(e) => e.is_timeout() || e.is_connect(),
			QuoteClientError::Status { status, .. } => *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error(),
			QuoteClientError::Coalesced => false,
		}
	}
}

/// 上游返回的原始报价文档 不做任何解析
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuoteDocument {
	pub body: String,
}

impl RawQuoteDocument {
	pub fn new(body: impl Into<String>) -> Self {
		Self { body: body.into() }
	}

	pub fn parse(&self) -> Result<QuoteDocument, serde_json::Error> {
		serde_json::from_str(&self.body).map(QuoteDocument)
	}
}

/// {"<symbol>": {"<currency>": <price>}}
#[derive(Debug, Clone)]
pub struct QuoteDocument(Value);

impl QuoteDocument {
	pub fn price(&self, symbol: &str, currency: &str) -> Option<f64> {
		self.0.get(symbol)?.get(currency)?.as_f64()
	}
}

/// 批量报价接口 每次调用对应上游一次请求（含重试）
#[async_trait]
pub trait QuoteClient: Send + Sync {
	async fn fetch_batch(&self, symbols: &[String], currency: &str) -> Result<RawQuoteDocument, QuoteClientError>;
}

pub struct HttpQuoteClient {
	client: Client,
	base_url: String,
	retry_attempts: u32,
	retry_backoff: Duration,
}

impl HttpQuoteClient {
	pub fn new(config: &QuoteProviderConfig) -> Result<Self, QuoteClientError> {
		let client = Client::builder().timeout(config.timeout()).connect_timeout(config.connect_timeout()).build()?;
		Ok(Self { client, base_url: config.base_url.trim_end_matches('/').to_string(), retry_attempts: config.retry_attempts, retry_backoff: config.retry_backoff() })
	}

	pub fn price_url(&self) -> String {
		format!("{}{}", self.base_url, SIMPLE_PRICE_PATH)
	}

	async fn fetch_once(&self, ids: &str, currency: &str) -> Result<RawQuoteDocument, QuoteClientError> {
		let url = self.price_url();
		debug!("Making quote request to {} ids={} vs_currencies={}", url, ids, currency);
		let response = self.client.get(&url).query(&[("ids", ids), ("vs_currencies", currency)]).send().await?;

		let status = response.status();
		if !status.is_success() {
			return Err(QuoteClientError::Status { status, body: response.text().await.unwrap_or_default() });
		}

		Ok(RawQuoteDocument::new(response.text().await?))
	}
}

/// base * 2^attempt
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
	base.saturating_mul(1u32 << attempt.min(MAX_BACKOFF_EXPONENT))
}

#[async_trait]
impl QuoteClient for HttpQuoteClient {
	async fn fetch_batch(&self, symbols: &[String], currency: &str) -> Result<RawQuoteDocument, QuoteClientError> {
		let ids = symbols.join(",");
		let mut attempt = 0;
		loop {
			match self.fetch_once(&ids, currency).await {
				Ok(document) => return Ok(document),
				Err(e) if e.is_retryable() && attempt < self.retry_attempts => {
					let delay = backoff_delay(self.retry_backoff, attempt);
					attempt += 1;
					warn!("Quote request failed (attempt {}/{}), retrying in {:?}: {}", attempt, self.retry_attempts + 1, delay, e);
					tokio::time::sleep(delay).await;
				}
				Err(e) => return Err(e),
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_quote_document_price() {
		let raw = RawQuoteDocument::new(r#"{"bitcoin":{"usd":47000.0,"eur":43000.5},"ethereum":{}}"#);
		let document = raw.parse().unwrap();
		assert_eq!(document.price("bitcoin", "usd"), Some(47000.0));
		assert_eq!(document.price("bitcoin", "eur"), Some(43000.5));
		assert_eq!(document.price("bitcoin", "gbp"), None);
		assert_eq!(document.price("ethereum", "usd"), None);
		assert_eq!(document.price("solana", "usd"), None);
	}

	#[test]
	fn test_quote_document_rejects_non_numeric() {
		let document = RawQuoteDocument::new(r#"{"bitcoin":{"usd":"47000"}}"#).parse().unwrap();
		assert_eq!(document.price("bitcoin", "usd"), None);
		assert!(RawQuoteDocument::new("<html>rate limited</html>").parse().is_err());
	}

	#[test]
	fn test_backoff_delay() {
		let base = Duration::from_millis(100);
		assert_eq!(backoff_delay(base, 0), Duration::from_millis(100));
		assert_eq!(backoff_delay(base, 1), Duration::from_millis(200));
		assert_eq!(backoff_delay(base, 3), Duration::from_millis(800));
		assert_eq!(backoff_delay(base, 50), backoff_delay(base, MAX_BACKOFF_EXPONENT));
	}

	#[test]
	fn test_status_retryable() {
		let status = |code: u16| QuoteClientError::Status { status: StatusCode::from_u16(code).unwrap(), body: String::new() };
		assert!(status(429).is_retryable());
		assert!(status(503).is_retryable());
		assert!(!status(404).is_retryable());
		assert!(!QuoteClientError::Coalesced.is_retryable());
	}

	#[test]
	fn test_price_url_trims_trailing_slash() {
		let config = QuoteProviderConfig { base_url: "https://api.coingecko.com/api/v3/".to_string(), timeout_secs: 5, connect_timeout_secs: 3, retry_attempts: 0, retry_backoff_ms: 100 };
		let client = HttpQuoteClient::new(&config).unwrap();
		assert_eq!(client.price_url(), "https://api.coingecko.com/api/v3/simple/price");
	}
}
