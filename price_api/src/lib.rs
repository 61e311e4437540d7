// price_api 库入口
// 导出所有需要在测试中使用的模块

pub mod api_error;
pub mod api_types;
pub mod cache;
pub mod config;
pub mod consts;
pub mod handlers;
pub mod init;
pub mod price_service;
pub mod quote_client;
pub mod server;
pub mod singleflight;
