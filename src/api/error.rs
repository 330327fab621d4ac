use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::core::SweepError;

use super::types::ErrorResponse;

pub struct ApiError(pub SweepError);

impl From<SweepError> for ApiError {
    fn from(err: SweepError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            SweepError::InvalidIdentifier(_) => StatusCode::BAD_REQUEST,
            SweepError::DatabaseError(_) | SweepError::TransactionClosed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            SweepError::ConfigParsingError(_)
            | SweepError::IoError(_)
            | SweepError::ScheduleError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = ErrorResponse {
            error: self.0.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
