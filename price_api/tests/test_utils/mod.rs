#![allow(dead_code)]

use {
	async_trait::async_trait,
	price_api::{
		cache::{CacheError, QuoteCache},
		config::PriceServiceConfig,
		price_service::PriceService,
		quote_client::{QuoteClient, QuoteClientError, RawQuoteDocument},
	},
	redis::{ErrorKind, RedisError},
	reqwest::StatusCode,
	std::{
		collections::HashMap,
		sync::{
			Arc, Mutex,
			atomic::{AtomicBool, Ordering},
		},
		time::Duration,
	},
};

/// 内存版缓存 记录所有 get/set 调用
#[derive(Default)]
pub struct MockQuoteCache {
	entries: Mutex<HashMap<String, (String, Duration)>>,
	gets: Mutex<Vec<String>>,
	sets: Mutex<Vec<(String, String, Duration)>>,
	fail_get: AtomicBool,
	fail_set: AtomicBool,
	get_delay: Mutex<Option<Duration>>,
	set_delay: Mutex<Option<Duration>>,
}

impl MockQuoteCache {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	/// 预置缓存内容
	pub fn insert(&self, key: &str, value: &str) {
		self.entries.lock().unwrap().insert(key.to_string(), (value.to_string(), Duration::from_secs(30)));
	}

	pub fn value(&self, key: &str) -> Option<String> {
		self.entries.lock().unwrap().get(key).map(|(value, _)| value.clone())
	}

	pub fn ttl(&self, key: &str) -> Option<Duration> {
		self.entries.lock().unwrap().get(key).map(|(_, ttl)| *ttl)
	}

	pub fn get_calls(&self) -> Vec<String> {
		self.gets.lock().unwrap().clone()
	}

	pub fn set_calls(&self) -> Vec<(String, String, Duration)> {
		self.sets.lock().unwrap().clone()
	}

	pub fn fail_gets(&self, fail: bool) {
		self.fail_get.store(fail, Ordering::SeqCst);
	}

	pub fn fail_sets(&self, fail: bool) {
		self.fail_set.store(fail, Ordering::SeqCst);
	}

	pub fn delay_gets(&self, delay: Duration) {
		*self.get_delay.lock().unwrap() = Some(delay);
	}

	pub fn delay_sets(&self, delay: Duration) {
		*self.set_delay.lock().unwrap() = Some(delay);
	}
}

fn connection_error() -> CacheError {
	CacheError::Redis(RedisError::from((ErrorKind::IoError, "redis connection error")))
}

#[async_trait]
impl QuoteCache for MockQuoteCache {
	async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
		self.gets.lock().unwrap().push(key.to_string());
		let delay = *self.get_delay.lock().unwrap();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if self.fail_get.load(Ordering::SeqCst) {
			return Err(connection_error());
		}
		Ok(self.value(key))
	}

	async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
		self.sets.lock().unwrap().push((key.to_string(), value.to_string(), ttl));
		let delay = *self.set_delay.lock().unwrap();
		if let Some(delay) = delay {
			tokio::time::sleep(delay).await;
		}
		if self.fail_set.load(Ordering::SeqCst) {
			return Err(connection_error());
		}
		self.entries.lock().unwrap().insert(key.to_string(), (value.to_string(), ttl));
		Ok(())
	}

	async fn ping(&self) -> Result<(), CacheError> {
		Ok(())
	}
}

/// 上游返回的脚本
#[derive(Clone)]
pub enum MockResponse {
	Body(String),
	Fail,
	Delayed(Duration, String),
}

/// 记录每次调用的 symbols 和 currency
pub struct MockQuoteClient {
	response: Mutex<MockResponse>,
	calls: Mutex<Vec<(Vec<String>, String)>>,
}

impl MockQuoteClient {
	pub fn new(response: MockResponse) -> Arc<Self> {
		Arc::new(Self { response: Mutex::new(response), calls: Mutex::new(Vec::new()) })
	}

	pub fn with_body(body: &str) -> Arc<Self> {
		Self::new(MockResponse::Body(body.to_string()))
	}

	pub fn failing() -> Arc<Self> {
		Self::new(MockResponse::Fail)
	}

	pub fn set_response(&self, response: MockResponse) {
		*self.response.lock().unwrap() = response;
	}

	pub fn calls(&self) -> Vec<(Vec<String>, String)> {
		self.calls.lock().unwrap().clone()
	}

	pub fn call_count(&self) -> usize {
		self.calls.lock().unwrap().len()
	}
}

#[async_trait]
impl QuoteClient for MockQuoteClient {
	async fn fetch_batch(&self, symbols: &[String], currency: &str) -> Result<RawQuoteDocument, QuoteClientError> {
		self.calls.lock().unwrap().push((symbols.to_vec(), currency.to_string()));
		let response = self.response.lock().unwrap().clone();
		match response {
			MockResponse::Body(body) => Ok(RawQuoteDocument::new(body)),
			MockResponse::Fail => Err(QuoteClientError::Status { status: StatusCode::SERVICE_UNAVAILABLE, body: "upstream down".to_string() }),
			MockResponse::Delayed(delay, body) => {
				tokio::time::sleep(delay).await;
				Ok(RawQuoteDocument::new(body))
			}
		}
	}
}

pub fn test_config() -> PriceServiceConfig {
	PriceServiceConfig::default()
}

pub fn build_service(cache: &Arc<MockQuoteCache>, client: &Arc<MockQuoteClient>, config: PriceServiceConfig) -> Arc<PriceService> {
	let cache: Arc<dyn QuoteCache> = cache.clone();
	let client: Arc<dyn QuoteClient> = client.clone();
	Arc::new(PriceService::new(cache, client, config))
}

pub fn symbols(list: &[&str]) -> Vec<String> {
	list.iter().map(|s| s.to_string()).collect()
}
