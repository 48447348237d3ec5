use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Malformed webhook body: {0}")]
    MalformedBody(#[from] serde_json::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::InvalidSignature => {
                tracing::warn!("Rejected webhook with invalid signature");
                (StatusCode::BAD_REQUEST, "Invalid signature".to_string())
            }
            AppError::MalformedBody(e) => {
                tracing::error!("Malformed webhook body: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
