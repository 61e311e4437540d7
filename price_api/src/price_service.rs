//! 价格查询核心逻辑（cache-aside）
//!
//! 1. 每个 symbol 并发查缓存 命中直接用
//! 2. miss / 缓存出错的 symbol 合并成一次上游批量请求
//! 3. 上游有价格的写回缓存（后台任务 不阻塞返回） 没有的给兜底值
//! 4. 整个过程受一个截止时间约束 超时未解决的 symbol 一律兜底
//!
//! 下游的任何失败都不会变成请求失败 只有入参不合法才返回错误

use {
	crate::{
		api_types::{PriceQuote, PriceResult},
		cache::{QuoteCache, decode_price_entry, encode_price_entry},
		config::{CacheErrorPolicy, PriceServiceConfig},
		consts::SYMBOL_SEPARATOR,
		quote_client::{QuoteClient, QuoteClientError, RawQuoteDocument},
		singleflight::{QuoteBatchGroup, quote_batch_key},
	},
	common::key::{is_valid_key_segment, price_key},
	futures_util::stream::{FuturesUnordered, StreamExt},
	std::{
		collections::{HashMap, HashSet},
		sync::Arc,
	},
	thiserror::Error,
	tokio::time::{Instant, timeout, timeout_at},
	tokio_util::task::TaskTracker,
	tracing::{debug, info, warn},
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
	#[error("No symbols requested")]
	EmptySymbols,

	#[error("Currency is empty")]
	EmptyCurrency,

	#[error("Invalid symbol: {0:?}")]
	InvalidSymbol(String),

	#[error("Invalid currency: {0:?}")]
	InvalidCurrency(String),
}

/// 缓存探测阶段的结果
struct ProbeOutcome {
	missing: Vec<String>,
	deadline_exceeded: bool,
}

pub struct PriceService {
	cache: Arc<dyn QuoteCache>,
	client: Arc<dyn QuoteClient>,
	config: PriceServiceConfig,
	batch_group: QuoteBatchGroup,
	write_backs: TaskTracker,
}

impl PriceService {
	pub fn new(cache: Arc<dyn QuoteCache>, client: Arc<dyn QuoteClient>, config: PriceServiceConfig) -> Self {
		Self { cache, client, config, batch_group: QuoteBatchGroup::new(), write_backs: TaskTracker::new() }
	}

	/// 查询一批 symbol 在 currency 下的价格
	/// 返回结果对每个去重后的 symbol 恰好有一条记录
	pub async fn resolve(&self, symbols: &[String], currency: &str) -> Result<PriceResult, ResolveError> {
		let unique = validate_request(symbols, currency)?;
		let deadline = Instant::now() + self.config.deadline();
		let mut quotes: HashMap<String, PriceQuote> = HashMap::with_capacity(unique.len());

		let probe = self.probe_cache(&unique, currency, deadline, &mut quotes).await;
		if probe.deadline_exceeded {
			warn!("Resolve deadline exceeded while probing cache, {} symbol(s) unresolved", unique.len() - quotes.len());
		} else if !probe.missing.is_empty() {
			self.fetch_missing(&probe.missing, currency, deadline, &mut quotes).await;
		}

		// 没解决的全部兜底
		for symbol in unique {
			quotes.entry(symbol).or_insert(PriceQuote::Unavailable);
		}
		Ok(PriceResult::new(quotes))
	}

	async fn probe_cache(&self, symbols: &[String], currency: &str, deadline: Instant, quotes: &mut HashMap<String, PriceQuote>) -> ProbeOutcome {
		let mut probes: FuturesUnordered<_> = symbols
			.iter()
			.map(|symbol| async move {
				let lookup = self.cache.get(&price_key(symbol, currency)).await;
				(symbol, lookup)
			})
			.collect();

		let mut missing = Vec::new();
		loop {
			let (symbol, lookup) = match timeout_at(deadline, probes.next()).await {
				Ok(Some(probed)) => probed,
				Ok(None) => break,
				Err(_) => return ProbeOutcome { missing, deadline_exceeded: true },
			};

			match lookup {
				Ok(Some(raw)) => match decode_price_entry(symbol, &raw).map(PriceQuote::from_price) {
					Some(quote @ PriceQuote::Available(_)) => {
						debug!("Cache hit for {}:{}", symbol, currency);
						quotes.insert(symbol.clone(), quote);
					}
					_ => {
						warn!("Failed to parse cached price for {}:{}, fetching upstream. raw={}", symbol, currency, raw);
						missing.push(symbol.clone());
					}
				},
				Ok(None) => {
					debug!("Cache miss for {}:{}", symbol, currency);
					missing.push(symbol.clone());
				}
				Err(e) => match self.config.cache_error_policy {
					CacheErrorPolicy::Fetch => {
						warn!("Cache error for {}:{}, fetching upstream: {}", symbol, currency, e);
						missing.push(symbol.clone());
					}
					CacheErrorPolicy::Fallback => {
						warn!("Cache error for {}:{}, setting fallback price: {}", symbol, currency, e);
						quotes.insert(symbol.clone(), PriceQuote::Unavailable);
					}
				},
			}
		}
		ProbeOutcome { missing, deadline_exceeded: false }
	}

	async fn fetch_missing(&self, missing: &[String], currency: &str, deadline: Instant, quotes: &mut HashMap<String, PriceQuote>) {
		let raw = match timeout_at(deadline, self.fetch_upstream(missing, currency)).await {
			Ok(Ok(raw)) => raw,
			Ok(Err(e)) => {
				warn!("Upstream quote request failed, setting fallback prices for {} symbol(s): {}", missing.len(), e);
				return;
			}
			Err(_) => {
				warn!("Resolve deadline exceeded waiting for upstream, setting fallback prices for {} symbol(s)", missing.len());
				return;
			}
		};

		let document = match raw.parse() {
			Ok(document) => document,
			Err(e) => {
				warn!("Failed to parse upstream quote response, setting fallback prices: {}", e);
				return;
			}
		};

		for symbol in missing {
			match document.price(symbol, currency).map(PriceQuote::from_price) {
				Some(PriceQuote::Available(price)) => {
					quotes.insert(symbol.clone(), PriceQuote::Available(price));
					self.spawn_write_back(symbol, currency, price);
				}
				_ => {
					info!("Price for {}:{} not found in upstream response, setting fallback price", symbol, currency);
					quotes.insert(symbol.clone(), PriceQuote::Unavailable);
				}
			}
		}
	}

	async fn fetch_upstream(&self, missing: &[String], currency: &str) -> Result<RawQuoteDocument, QuoteClientError> {
		if !self.config.coalesce_upstream {
			return self.client.fetch_batch(missing, currency).await;
		}

		let singleflight_key = quote_batch_key(missing, currency);
		match self.batch_group.work(&singleflight_key, self.client.fetch_batch(missing, currency)).await {
			Ok(raw) => Ok(raw),
			Err(Some(e)) => Err(e),
			// Leader dropped 或者 leader 失败（错误只交给 leader）
			Err(None) => Err(QuoteClientError::Coalesced),
		}
	}

	/// 写回缓存 不等待结果 失败只打日志
	fn spawn_write_back(&self, symbol: &str, currency: &str, price: f64) {
		let key = price_key(symbol, currency);
		let value = match encode_price_entry(symbol, price) {
			Ok(value) => value,
			Err(e) => {
				warn!("Failed to encode cache entry for {}: {}", key, e);
				return;
			}
		};

		let cache = Arc::clone(&self.cache);
		let ttl = self.config.cache_ttl();
		let write_timeout = self.config.write_back_timeout();
		self.write_backs.spawn(async move {
			match timeout(write_timeout, cache.set(&key, &value, ttl)).await {
				Ok(Ok(())) => debug!("Cached {} for {:?}", key, ttl),
				Ok(Err(e)) => warn!("Failed to cache price for {}: {}", key, e),
				Err(_) => warn!("Timed out caching price for {}", key),
			}
		});
	}

	pub fn pending_write_backs(&self) -> usize {
		self.write_backs.len()
	}

	/// 等待所有已发起的回写完成 用于停机和测试
	/// close 之后仍然可以继续 spawn 回写 wait 在没有未完成任务时立即返回
	pub async fn wait_write_backs(&self) {
		self.write_backs.close();
		self.write_backs.wait().await;
	}
}

/// 校验入参并按首次出现顺序去重
fn validate_request(symbols: &[String], currency: &str) -> Result<Vec<String>, ResolveError> {
	if currency.is_empty() {
		return Err(ResolveError::EmptyCurrency);
	}
	if !is_valid_key_segment(currency) || currency.contains(SYMBOL_SEPARATOR) {
		return Err(ResolveError::InvalidCurrency(currency.to_string()));
	}
	if symbols.is_empty() {
		return Err(ResolveError::EmptySymbols);
	}

	let mut seen = HashSet::with_capacity(symbols.len());
	let mut unique = Vec::with_capacity(symbols.len());
	for symbol in symbols {
		if !is_valid_key_segment(symbol) || symbol.contains(SYMBOL_SEPARATOR) {
			return Err(ResolveError::InvalidSymbol(symbol.clone()));
		}
		if seen.insert(symbol.as_str()) {
			unique.push(symbol.clone());
		}
	}
	Ok(unique)
}
