use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{llm::LlmError, response::ApiResponse};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("User processing failed")]
    UserProcessing(#[source] sea_orm::DbErr),

    #[error("Conversation processing failed")]
    ConversationProcessing(#[source] sea_orm::DbErr),

    #[error("LLM processing failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Internal server error")]
    DbError(#[from] sqlx::Error),

    #[error("Internal server error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UserProcessing(_)
            | AppError::ConversationProcessing(_)
            | AppError::Llm(_)
            | AppError::DbError(_)
            | AppError::OrmError(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            match std::error::Error::source(&self) {
                Some(source) => tracing::error!(error = %self, source = %source, "request failed"),
                None => tracing::error!(error = %self, "request failed"),
            }
        }

        let message = self.to_string();
        let body = ApiResponse {
            message: message.clone(),
            data: Some(ErrorData { error: message }),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_errors_map_to_distinct_messages() {
        let user = AppError::UserProcessing(sea_orm::DbErr::Custom("boom".into()));
        let conv = AppError::ConversationProcessing(sea_orm::DbErr::Custom("boom".into()));
        assert_eq!(user.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(user.to_string(), "User processing failed");
        assert_eq!(conv.to_string(), "Conversation processing failed");
    }

    #[test]
    fn client_errors_keep_their_message() {
        let err = AppError::NotFound("Invalid conversation ID".into());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Invalid conversation ID");

        let err = AppError::BadRequest("Email and message are required".into());
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn llm_errors_carry_reason() {
        let err = AppError::from(LlmError::InvalidReply("missing action".into()));
        assert_eq!(
            err.to_string(),
            "LLM processing failed: invalid reply: missing action"
        );
    }
}
