use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tessera_order::OrderError;

#[derive(Debug)]
pub enum AppError {
    ValidationError(Vec<String>),
    MalformedBody(String),
    BusinessRuleError(String),
    UpstreamError(String),
    TimeoutError(String),
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::BusinessRule(message) => AppError::BusinessRuleError(message),
            OrderError::Provider { .. } => {
                tracing::error!(error = %err, "Provider failure while processing order");
                AppError::UpstreamError("License provider request failed".to_string())
            }
            OrderError::SubmissionRejected { status, .. } => {
                tracing::error!(error = %err, "Provider rejected order submission");
                AppError::UpstreamError(format!(
                    "License provider rejected the order with status {}",
                    status
                ))
            }
            OrderError::Cancelled => {
                AppError::TimeoutError("Order processing was cancelled".to_string())
            }
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::MalformedBody(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::ValidationError(details) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": "Invalid order request", "details": details }),
            ),
            AppError::MalformedBody(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            AppError::BusinessRuleError(msg) => {
                tracing::warn!("Order rejected: {}", msg);
                (StatusCode::UNPROCESSABLE_ENTITY, json!({ "error": msg }))
            }
            AppError::UpstreamError(msg) => (StatusCode::BAD_GATEWAY, json!({ "error": msg })),
            AppError::TimeoutError(msg) => (StatusCode::GATEWAY_TIMEOUT, json!({ "error": msg })),
        };

        (status, Json(body)).into_response()
    }
}
