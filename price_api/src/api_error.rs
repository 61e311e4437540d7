use {
	crate::api_types::ErrorResponse,
	axum::{
		Json,
		http::StatusCode,
		response::{IntoResponse, Response},
	},
	thiserror::Error,
};

/// HTTP 边界上的错误 只有请求格式错误返回 4xx
#[derive(Debug, Error)]
pub enum ApiError {
	#[error("Missing '{0}' query parameter")]
	MissingParameter(&'static str),

	#[error("{0}")]
	InvalidParameter(String),

	#[error("Failed to fetch prices")]
	FetchPricesFailed,
}

impl ApiError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			ApiError::MissingParameter(_) | ApiError::InvalidParameter(_) => StatusCode::BAD_REQUEST,
			ApiError::FetchPricesFailed => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorResponse { error: self.to_string() };
		(self.status_code(), Json(body)).into_response()
	}
}
