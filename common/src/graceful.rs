use {
	std::{future::Future, time::Duration},
	tokio::signal,
	tracing::{info, warn},
};

/// 等待 SIGINT / SIGTERM，用于 axum::serve(..).with_graceful_shutdown
pub async fn shutdown_signal() {
	#[cfg(unix)]
	{
		use tokio::signal::unix::{SignalKind, signal};
		let mut sigterm = match signal(SignalKind::terminate()) {
			Ok(sigterm) => sigterm,
			Err(e) => {
				warn!("Failed to create SIGTERM signal handler: {}", e);
				let _ = signal::ctrl_c().await;
				info!("Received SIGINT, starting graceful shutdown...");
				return;
			}
		};
		tokio::select! {
			_ = signal::ctrl_c() => {
				info!("Received SIGINT, starting graceful shutdown...");
			}
			_ = sigterm.recv() => {
				info!("Received SIGTERM, starting graceful shutdown...");
			}
		}
	}
	#[cfg(not(unix))]
	{
		let _ = signal::ctrl_c().await;
		info!("Received SIGINT, starting graceful shutdown...");
	}
}

/// 停机时等待后台任务收尾 最多等待 max_wait
/// 返回 true 表示在超时前完成
pub async fn wait_for_drain<F, Fut>(name: &str, max_wait: Duration, drain: F) -> bool
where
	F: FnOnce() -> Fut,
	Fut: Future<Output = ()>,
{
	info!("Waiting for {} to drain (max {:?})...", name, max_wait);
	match tokio::time::timeout(max_wait, drain()).await {
		Ok(()) => {
			info!("{} drained", name);
			true
		}
		Err(_) => {
			warn!("{} did not drain within {:?}", name, max_wait);
			false
		}
	}
}
