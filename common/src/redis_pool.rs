use {
	crate::consts::REDIS_POOL_MAX_SIZE,
	deadpool_redis::{Config, Pool, PoolConfig, Runtime},
};

/// redis://[:password@]host/db
pub fn redis_url(redis_host: &str, redis_password: Option<&str>, db: u32) -> String {
	let auth = match redis_password {
		Some(pwd) if !pwd.is_empty() => format!(":{}@", pwd),
		_ => String::new(),
	};
	format!("redis://{}{}/{}", auth, redis_host, db)
}

/// 创建 Redis 连接池 连接是懒加载的 调用方需要自己 ping 确认可用
pub fn create_pool(redis_host: &str, redis_password: Option<&str>, db: u32) -> anyhow::Result<Pool> {
	let mut cfg = Config::from_url(redis_url(redis_host, redis_password, db));
	cfg.pool = Some(PoolConfig::new(REDIS_POOL_MAX_SIZE));
	let pool = cfg.create_pool(Some(Runtime::Tokio1))?;
	Ok(pool)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_redis_url_without_password() {
		assert_eq!(redis_url("127.0.0.1:6379", None, 4), "redis://127.0.0.1:6379/4");
		assert_eq!(redis_url("127.0.0.1:6379", Some(""), 4), "redis://127.0.0.1:6379/4");
	}

	#[test]
	fn test_redis_url_with_password() {
		assert_eq!(redis_url("redis:6379", Some("secret"), 0), "redis://:secret@redis:6379/0");
	}

	#[tokio::test]
	async fn test_create_pool_is_lazy() {
		// 不会真正建立连接
		let pool = create_pool("127.0.0.1:1", None, 4).expect("pool should be created");
		assert_eq!(pool.status().max_size, REDIS_POOL_MAX_SIZE);
	}
}
