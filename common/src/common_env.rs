use {
	crate::consts::COMMON_ENV_PATH,
	config::{Config, Environment},
	serde::{Deserialize, Serialize},
	std::path::Path,
	tracing::info,
};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommonEnv {
	pub run_mode: String,

	// Cache Redis 配置
	pub cache_redis_host: String,
	pub cache_redis_password: Option<String>,
}

impl CommonEnv {
	pub fn check(&self) -> anyhow::Result<()> {
		// 验证 RUN_MODE
		crate::consts::validate_run_mode(&self.run_mode)?;

		if self.cache_redis_host.is_empty() {
			return Err(anyhow::anyhow!("Cache Redis host is empty"));
		}
		Ok(())
	}
}

/// 先用 dotenvy 把 env 文件加载到进程环境变量 文件不存在时直接使用系统环境变量
pub fn load_common_env() -> anyhow::Result<CommonEnv> {
	load_common_env_from(COMMON_ENV_PATH)
}

pub fn load_common_env_from(env_path: &str) -> anyhow::Result<CommonEnv> {
	if Path::new(env_path).exists() {
		dotenvy::from_path(env_path)?;
	} else {
		info!("No env file at {}, relying on process environment", env_path);
	}

	let config = Config::builder().add_source(Environment::default()).build()?;

	let common_env: CommonEnv = config.try_deserialize()?;
	common_env.check()?;
	Ok(common_env)
}
