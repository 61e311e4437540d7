use {
	price_api::{consts::GRACEFUL_WRITE_BACK_WAIT_SECS, init, server},
	std::time::Duration,
	tracing::info,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let ctx = init::init_all().await?;

	let addr = ctx.config.server.get_addr();
	let listener = tokio::net::TcpListener::bind(&addr).await?;
	info!("🚀 Price API Server is running at {}", listener.local_addr()?);

	let price_service = ctx.state.price_service.clone();
	let app = server::app(ctx.state);

	// 使用 axum 的 with_graceful_shutdown 实现优雅停机
	axum::serve(listener, app).with_graceful_shutdown(common::graceful::shutdown_signal()).await?;

	// 等待还没写完的缓存回写
	common::graceful::wait_for_drain("cache write-backs", Duration::from_secs(GRACEFUL_WRITE_BACK_WAIT_SECS), || price_service.wait_write_backs()).await;
	ctx.cache.close();

	info!("Price API service stopped");
	Ok(())
}
