use {
	crate::{
		handlers::{handle_ping, handle_price},
		price_service::PriceService,
	},
	axum::{
		Router,
		extract::Request,
		http::HeaderName,
		middleware::{self, Next},
		response::Response,
		routing::get,
	},
	std::{sync::Arc, time::Duration},
	tokio::time::Instant,
	tower_http::{
		compression::CompressionLayer,
		cors::{Any, CorsLayer},
		request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
	},
	tracing::info,
};

const X_REQUEST_ID: &str = "x-request-id";

#[derive(Clone)]
pub struct AppState {
	pub price_service: Arc<PriceService>,
}

impl AppState {
	pub fn new(price_service: Arc<PriceService>) -> Self {
		Self { price_service }
	}
}

//中间件 记录每个请求的耗时和状态码
async fn log_request(request: Request, next: Next) -> Response {
	let request_id = request.headers().get(X_REQUEST_ID).and_then(|header| header.to_str().ok()).unwrap_or_default().to_string();
	let method = request.method().clone();
	let uri = request.uri().clone();
	let start = Instant::now();

	let response = next.run(request).await;

	info!("request_id={} {} {} -> {} in {:?}", request_id, method, uri, response.status(), start.elapsed());
	response
}

pub fn app(state: AppState) -> Router {
	let x_request_id = HeaderName::from_static(X_REQUEST_ID);
	Router::new()
		.route("/", get(handle_ping))
		.route("/price", get(handle_price))
		.layer(PropagateRequestIdLayer::new(x_request_id.clone())) //将请求id从请求头中传递到响应头中
		.layer(CompressionLayer::new())
		.layer(middleware::from_fn(log_request))
		.layer(SetRequestIdLayer::new(x_request_id, MakeRequestUuid)) //生成请求id 并放到请求头中
		.layer(CorsLayer::new().allow_methods(Any).allow_origin(Any).allow_credentials(false).allow_headers(Any).expose_headers(Any).max_age(Duration::from_secs(60) * 10))
		.with_state(state)
}
