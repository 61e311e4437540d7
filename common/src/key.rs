// Redis key generation utilities

/// Price cache key prefix (used with GET/SET EX)
pub const PRICE_CACHE_KEY_PREFIX: &str = "prices";

/// Separator between key segments. Symbols and currencies must not contain it.
pub const KEY_SEPARATOR: char = ':';

/// Generate price cache key: prices:<symbol>:<currency>
pub fn price_key(symbol: &str, currency: &str) -> String {
	format!("{}{}{}{}{}", PRICE_CACHE_KEY_PREFIX, KEY_SEPARATOR, symbol, KEY_SEPARATOR, currency)
}

/// A key segment is usable when it is non-empty and free of the separator
pub fn is_valid_key_segment(segment: &str) -> bool {
	!segment.is_empty() && !segment.contains(KEY_SEPARATOR)
}
