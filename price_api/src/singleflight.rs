use {
	crate::quote_client::{QuoteClientError, RawQuoteDocument},
	async_singleflight::Group,
};

//Group中Hashmap中的key-value都是send 外面加了Mutex
//所以Group是send+sync的 可以直接放进 Arc<PriceService>

/// 上游批量报价的 singleflight group
/// 同一时刻相同 (currency, 缺失 symbol 集合) 的请求只会打一次上游
pub type QuoteBatchGroup = Group<String, RawQuoteDocument, QuoteClientError>;

/// Key: currency|symbol1,symbol2,... (symbol 排序 与请求顺序无关)
pub fn quote_batch_key(symbols: &[String], currency: &str) -> String {
	let mut sorted: Vec<&str> = symbols.iter().map(String::as_str).collect();
	sorted.sort_unstable();
	format!("{}|{}", currency, sorted.join(","))
}
