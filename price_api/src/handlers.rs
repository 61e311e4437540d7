use {
	crate::{
		api_error::ApiError,
		api_types::{PingResponse, PriceRequest, PricesResponse},
		server::AppState,
	},
	axum::{
		extract::{Query, State},
		response::Json,
	},
	tracing::error,
};

/// 健康检查
pub async fn handle_ping() -> Json<PingResponse> {
	Json(PingResponse { message: "PONG".to_string() })
}

/// GET /price?crypto=bitcoin,ethereum&currency=usd
/// 下游故障体现为 -1 兜底价格 只有参数错误才返回 4xx
pub async fn handle_price(State(state): State<AppState>, Query(params): Query<PriceRequest>) -> Result<Json<PricesResponse>, ApiError> {
	let (symbols, currency) = params.validate()?;

	let result = state.price_service.resolve(&symbols, &currency).await.map_err(|e| {
		error!("Failed to resolve prices for crypto={:?}, currency={}: {}", symbols, currency, e);
		ApiError::FetchPricesFailed
	})?;

	Ok(Json(PricesResponse::from(result)))
}
