use {
	common::{
		consts::{ENV_SEPARATOR, PRICE_API_ENV_PREFIX},
		logging::LoggingConfig,
	},
	config::{Config, Environment, File},
	serde::{Deserialize, Serialize},
	std::time::Duration,
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	pub logging: LoggingConfig,
	pub server: ServerConfig,
	pub quote_provider: QuoteProviderConfig,
	pub price_service: PriceServiceConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
	pub port: u16,
}

impl ServerConfig {
	pub fn get_addr(&self) -> String {
		format!("0.0.0.0:{}", self.port)
	}
}

/// 上游报价服务（CoinGecko 兼容）配置
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuoteProviderConfig {
	pub base_url: String,
	pub timeout_secs: u64,
	pub connect_timeout_secs: u64,
	/// 首次请求失败后的最大重试次数 0 表示不重试
	pub retry_attempts: u32,
	pub retry_backoff_ms: u64,
}

impl QuoteProviderConfig {
	pub fn check(&self) -> anyhow::Result<()> {
		if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
			return Err(anyhow::anyhow!("Quote provider base_url must be an http(s) url: {}", self.base_url));
		}
		if self.timeout_secs == 0 {
			return Err(anyhow::anyhow!("Quote provider timeout_secs must be greater than 0"));
		}
		if self.connect_timeout_secs == 0 {
			return Err(anyhow::anyhow!("Quote provider connect_timeout_secs must be greater than 0"));
		}
		Ok(())
	}

	pub fn timeout(&self) -> Duration {
		Duration::from_secs(self.timeout_secs)
	}

	pub fn connect_timeout(&self) -> Duration {
		Duration::from_secs(self.connect_timeout_secs)
	}

	pub fn retry_backoff(&self) -> Duration {
		Duration::from_millis(self.retry_backoff_ms)
	}
}

/// 缓存读取出错时的处理方式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheErrorPolicy {
	/// 和 miss 一样 去上游取
	#[default]
	Fetch,
	/// 直接给兜底值 不请求上游
	Fallback,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceServiceConfig {
	pub cache_ttl_secs: u64,
	/// 整个 resolve（所有缓存读取 + 上游请求）的截止时间
	pub deadline_ms: u64,
	pub write_back_timeout_ms: u64,
	#[serde(default)]
	pub cache_error_policy: CacheErrorPolicy,
	#[serde(default = "default_coalesce_upstream")]
	pub coalesce_upstream: bool,
}

fn default_coalesce_upstream() -> bool {
	true
}

impl Default for PriceServiceConfig {
	fn default() -> Self {
		Self { cache_ttl_secs: 30, deadline_ms: 5000, write_back_timeout_ms: 1000, cache_error_policy: CacheErrorPolicy::Fetch, coalesce_upstream: true }
	}
}

impl PriceServiceConfig {
	pub fn check(&self) -> anyhow::Result<()> {
		if self.cache_ttl_secs == 0 {
			return Err(anyhow::anyhow!("Price service cache_ttl_secs must be greater than 0"));
		}
		if self.deadline_ms == 0 {
			return Err(anyhow::anyhow!("Price service deadline_ms must be greater than 0"));
		}
		if self.write_back_timeout_ms == 0 {
			return Err(anyhow::anyhow!("Price service write_back_timeout_ms must be greater than 0"));
		}
		Ok(())
	}

	pub fn cache_ttl(&self) -> Duration {
		Duration::from_secs(self.cache_ttl_secs)
	}

	pub fn deadline(&self) -> Duration {
		Duration::from_millis(self.deadline_ms)
	}

	pub fn write_back_timeout(&self) -> Duration {
		Duration::from_millis(self.write_back_timeout_ms)
	}
}

/// 读取 {config_path}/{run_mode}.toml 再叠加 PRICE_API__* 环境变量
pub fn load_config(config_path: &str, run_mode: &str) -> anyhow::Result<ApiConfig> {
	let config = Config::builder()
		.add_source(File::with_name(&format!("{}/{}", config_path, run_mode)).required(true))
		.add_source(Environment::with_prefix(PRICE_API_ENV_PREFIX).prefix_separator(ENV_SEPARATOR).separator(ENV_SEPARATOR))
		.build()?;

	let api_config: ApiConfig = config.try_deserialize()?;
	api_config.check()?;
	Ok(api_config)
}

impl ApiConfig {
	pub fn check(&self) -> anyhow::Result<()> {
		self.logging.check()?;
		self.quote_provider.check()?;
		self.price_service.check()?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const DEV_TOML: &str = r#"
[logging]
level = "info"
console = true
rotation_max_files = 7

[server]
port = 8080

[quote_provider]
base_url = "https://api.coingecko.com/api/v3"
timeout_secs = 5
connect_timeout_secs = 3
retry_attempts = 2
retry_backoff_ms = 200

[price_service]
cache_ttl_secs = 30
deadline_ms = 5000
write_back_timeout_ms = 1000
cache_error_policy = "fallback"
"#;

	fn parse(toml: &str) -> anyhow::Result<ApiConfig> {
		let config = Config::builder().add_source(File::from_str(toml, config::FileFormat::Toml)).build()?;
		Ok(config.try_deserialize()?)
	}

	#[test]
	fn test_parse_config() {
		let config = parse(DEV_TOML).unwrap();
		assert!(config.check().is_ok());
		assert_eq!(config.server.get_addr(), "0.0.0.0:8080");
		assert_eq!(config.quote_provider.retry_attempts, 2);
		assert_eq!(config.price_service.cache_ttl(), Duration::from_secs(30));
		assert_eq!(config.price_service.deadline(), Duration::from_secs(5));
		assert_eq!(config.price_service.cache_error_policy, CacheErrorPolicy::Fallback);
		assert!(config.price_service.coalesce_upstream);
	}

	#[test]
	fn test_check_rejects_bad_values() {
		let mut config = parse(DEV_TOML).unwrap();
		config.quote_provider.base_url = "api.coingecko.com".to_string();
		assert!(config.check().is_err());

		let mut config = parse(DEV_TOML).unwrap();
		config.price_service.cache_ttl_secs = 0;
		assert!(config.check().is_err());

		let mut config = parse(DEV_TOML).unwrap();
		config.price_service.deadline_ms = 0;
		assert!(config.check().is_err());
	}

	#[test]
	fn test_default_price_service_config() {
		let config = PriceServiceConfig::default();
		assert!(config.check().is_ok());
		assert_eq!(config.cache_ttl(), Duration::from_secs(30));
		assert_eq!(config.deadline(), Duration::from_millis(5000));
		assert_eq!(config.cache_error_policy, CacheErrorPolicy::Fetch);
	}
}
