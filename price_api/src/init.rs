use {
	crate::{
		cache::{QuoteCache, RedisQuoteCache},
		config::{ApiConfig, load_config},
		price_service::PriceService,
		quote_client::HttpQuoteClient,
		server::AppState,
	},
	common::{
		common_env::{self, CommonEnv},
		consts::{PRICE_API_CONFIG_PATH, REDIS_DB_CACHE},
	},
	std::sync::Arc,
	tracing::info,
};

/// 启动时构造的全部依赖 之后以参数形式传递 不放全局变量
pub struct AppContext {
	pub config: ApiConfig,
	pub cache: Arc<RedisQuoteCache>,
	pub state: AppState,
}

pub async fn init_all() -> anyhow::Result<AppContext> {
	let (common_env, config) = init_load()?;
	common::logging::init_logging(&config.logging)?; // 初始化日志
	info!("Configuration loaded for mode: {}", common_env.run_mode);
	info!("Configuration: {:?}", config);

	let cache = Arc::new(init_redis_cache(&common_env).await?); // 初始化 Redis 缓存
	let client = Arc::new(HttpQuoteClient::new(&config.quote_provider)?); // 初始化 HTTP Client
	info!("Quote client initialized (base_url: {}, retry_attempts: {})", config.quote_provider.base_url, config.quote_provider.retry_attempts);

	let cache_handle: Arc<dyn QuoteCache> = cache.clone();
	let price_service = Arc::new(PriceService::new(cache_handle, client, config.price_service.clone()));
	let state = AppState::new(price_service);
	Ok(AppContext { config, cache, state })
}

fn init_load() -> anyhow::Result<(CommonEnv, ApiConfig)> {
	let common_env = common_env::load_common_env()?;
	let config = load_config(PRICE_API_CONFIG_PATH, &common_env.run_mode)?;
	Ok((common_env, config))
}

async fn init_redis_cache(env: &CommonEnv) -> anyhow::Result<RedisQuoteCache> {
	let pool = common::redis_pool::create_pool(&env.cache_redis_host, env.cache_redis_password.as_deref(), REDIS_DB_CACHE)?;
	let cache = RedisQuoteCache::new(pool);
	cache.ping().await.map_err(|e| anyhow::anyhow!("Cache Redis ping error: {}", e))?;
	info!("Cache Redis pool initialized (host: {}, db: {})", env.cache_redis_host, REDIS_DB_CACHE);
	Ok(cache)
}
