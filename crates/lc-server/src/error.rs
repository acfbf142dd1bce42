use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Cost error: {0}")]
    Cost(#[from] lc_cost::CostError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            ServerError::Cost(err) => match err {
                lc_cost::CostError::RateMissing { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "rate_missing")
                }
                lc_cost::CostError::StatsMissing { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "stats_missing")
                }
                lc_cost::CostError::InvariantViolation { .. } => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation")
                }
                _ => (StatusCode::UNPROCESSABLE_ENTITY, "cost_error"),
            },
            ServerError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "io_error"),
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
