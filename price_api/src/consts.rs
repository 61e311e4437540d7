/// 价格不可用时对外返回的兜底值 不是真实价格
pub const FALLBACK_PRICE: f64 = -1.0;

/// 上游报价接口路径
pub const SIMPLE_PRICE_PATH: &str = "/simple/price";

/// Graceful shutdown: 等待缓存回写任务完成的最长时间（秒）
pub const GRACEFUL_WRITE_BACK_WAIT_SECS: u64 = 5;

/// 上游 ids / vs_currencies 参数和 crypto 查询参数里的列表分隔符
pub const SYMBOL_SEPARATOR: char = ',';

/// 重试退避的最大指数 防止 backoff 溢出
pub const MAX_BACKOFF_EXPONENT: u32 = 6;
