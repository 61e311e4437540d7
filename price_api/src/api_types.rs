use {
	crate::{
		api_error::ApiError,
		consts::{FALLBACK_PRICE, SYMBOL_SEPARATOR},
	},
	common::key::is_valid_key_segment,
	serde::{Deserialize, Serialize},
	std::collections::{BTreeMap, HashMap},
};

/// 单个资产的价格结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriceQuote {
	Available(f64),
	Unavailable,
}

impl PriceQuote {
	/// 只接受有限的正数 其余一律视为不可用
	pub fn from_price(price: f64) -> Self {
		if price.is_finite() && price > 0.0 { PriceQuote::Available(price) } else { PriceQuote::Unavailable }
	}

	pub fn is_available(&self) -> bool {
		matches!(self, PriceQuote::Available(_))
	}

	/// 对外 JSON 中的数值 不可用时为 -1
	pub fn wire_value(&self) -> f64 {
		match self {
			PriceQuote::Available(price) => *price,
			PriceQuote::Unavailable => FALLBACK_PRICE,
		}
	}
}

/// 一次 resolve 的完整结果 每个去重后的 symbol 恰好一条
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PriceResult {
	quotes: HashMap<String, PriceQuote>,
}

impl PriceResult {
	pub fn new(quotes: HashMap<String, PriceQuote>) -> Self {
		Self { quotes }
	}

	pub fn get(&self, symbol: &str) -> Option<PriceQuote> {
		self.quotes.get(symbol).copied()
	}

	pub fn len(&self) -> usize {
		self.quotes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.quotes.is_empty()
	}

	pub fn symbols(&self) -> impl Iterator<Item = &str> {
		self.quotes.keys().map(String::as_str)
	}

	pub fn iter(&self) -> impl Iterator<Item = (&str, PriceQuote)> {
		self.quotes.iter().map(|(symbol, quote)| (symbol.as_str(), *quote))
	}

	pub fn into_wire(self) -> BTreeMap<String, f64> {
		self.quotes.into_iter().map(|(symbol, quote)| (symbol, quote.wire_value())).collect()
	}
}

/// GET /price 查询参数
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PriceRequest {
	pub crypto: Option<String>,
	pub currency: Option<String>,
}

impl PriceRequest {
	/// 校验参数值
	/// - crypto 逗号分隔 去掉首尾空白 丢弃空项 至少保留一个
	/// - currency 非空
	/// - symbol 和 currency 都不能包含 ':' (缓存 key 分隔符)
	pub fn validate(&self) -> Result<(Vec<String>, String), ApiError> {
		let symbols: Vec<String> = self.crypto.as_deref().unwrap_or_default().split(SYMBOL_SEPARATOR).map(str::trim).filter(|s| !s.is_empty()).map(str::to_string).collect();
		if symbols.is_empty() {
			return Err(ApiError::MissingParameter("crypto"));
		}

		let currency = self.currency.as_deref().map(str::trim).unwrap_or_default();
		if currency.is_empty() {
			return Err(ApiError::MissingParameter("currency"));
		}
		if !is_valid_key_segment(currency) || currency.contains(SYMBOL_SEPARATOR) {
			return Err(ApiError::InvalidParameter(format!("Invalid currency: {}", currency)));
		}

		if let Some(bad) = symbols.iter().find(|s| !is_valid_key_segment(s)) {
			return Err(ApiError::InvalidParameter(format!("Invalid crypto symbol: {}", bad)));
		}

		Ok((symbols, currency.to_string()))
	}
}

/// GET /price 响应 {"prices": {...}}
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricesResponse {
	#[serde(rename = "prices")]
	pub prices: BTreeMap<String, f64>,
}

impl From<PriceResult> for PricesResponse {
	fn from(result: PriceResult) -> Self {
		Self { prices: result.into_wire() }
	}
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	#[serde(rename = "error")]
	pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PingResponse {
	#[serde(rename = "message")]
	pub message: String,
}
