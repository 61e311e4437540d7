use {
	async_trait::async_trait,
	deadpool_redis::{Pool, PoolError},
	redis::{AsyncCommands, RedisError},
	std::{collections::BTreeMap, time::Duration},
	thiserror::Error,
};

/// 缓存相关错误类型
#[derive(Debug, Error)]
pub enum CacheError {
	#[error("Cache pool error: {0}")]
	Pool(#[from] PoolError),

	#[error("Cache redis error: {0}")]
	Redis(#[from] RedisError),
}

/// 价格缓存的存取接口
/// get 区分 "key 不存在"(Ok(None)) 和 "传输失败"(Err)
#[async_trait]
pub trait QuoteCache: Send + Sync {
	async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

	async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

	async fn ping(&self) -> Result<(), CacheError>;
}

/// 基于 deadpool-redis 连接池的实现
#[derive(Clone)]
pub struct RedisQuoteCache {
	pool: Pool,
}

impl RedisQuoteCache {
	pub fn new(pool: Pool) -> Self {
		Self { pool }
	}

	/// 关闭连接池 (释放所有连接)
	pub fn close(&self) {
		self.pool.close();
	}
}

#[async_trait]
impl QuoteCache for RedisQuoteCache {
	async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
		let mut conn = self.pool.get().await?;
		let value: Option<String> = conn.get(key).await?;
		Ok(value)
	}

	async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
		let mut conn = self.pool.get().await?;
		// SET EX 最小 1 秒
		let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
		Ok(())
	}

	async fn ping(&self) -> Result<(), CacheError> {
		let mut conn = self.pool.get().await?;
		let _: () = conn.ping().await?;
		Ok(())
	}
}

/// 单个 symbol 的缓存内容: {"<symbol>": <price>}
pub fn encode_price_entry(symbol: &str, price: f64) -> Result<String, serde_json::Error> {
	let mut entry = BTreeMap::new();
	entry.insert(symbol, price);
	serde_json::to_string(&entry)
}

/// 解析缓存内容 解析失败或者没有这个 symbol 时返回 None
pub fn decode_price_entry(symbol: &str, raw: &str) -> Option<f64> {
	let entry: BTreeMap<String, f64> = serde_json::from_str(raw).ok()?;
	entry.get(symbol).copied()
}
