use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use services::services::{
    auto_fold::AutoFoldError, check_in_reminder::ReminderError, weekly_recap::WeeklyRecapError,
};
use thiserror::Error;
use tracing::error;
use utils::response::ApiResponse;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),
    #[error(transparent)]
    Reminder(#[from] ReminderError),
    #[error(transparent)]
    AutoFold(#[from] AutoFoldError),
    #[error(transparent)]
    WeeklyRecap(#[from] WeeklyRecapError),
    #[error("pact not found: {0}")]
    PactNotFound(Uuid),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::PactNotFound(_)
            | ApiError::Reminder(ReminderError::PactNotFound(_))
            | ApiError::WeeklyRecap(WeeklyRecapError::PactNotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Database(_)
            | ApiError::Reminder(ReminderError::Database(_))
            | ApiError::AutoFold(AutoFoldError::Database(_))
            | ApiError::WeeklyRecap(WeeklyRecapError::Database(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        }

        let message = match status {
            StatusCode::INTERNAL_SERVER_ERROR => "Internal server error".to_string(),
            _ => self.to_string(),
        };
        let body = ApiResponse::<()>::error(&message);
        (status, ResponseJson(body)).into_response()
    }
}
