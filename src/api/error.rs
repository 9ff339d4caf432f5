use crate::application::library::LibraryError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(LibraryError);

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            LibraryError::Validation(_)
            | LibraryError::InvalidCommand { .. }
            | LibraryError::UnknownCommand(_) => StatusCode::BAD_REQUEST,
            LibraryError::NotFound(_) => StatusCode::NOT_FOUND,
            LibraryError::Conflict(_) => StatusCode::CONFLICT,
            LibraryError::HandlerNotFound(_) | LibraryError::Repository(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<LibraryError> for ApiError {
    fn from(err: LibraryError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (error_type, message) = match &self.0 {
            // 400 Bad Request - 入力不正
            LibraryError::Validation(_) => ("VALIDATION_ERROR", self.0.to_string()),
            LibraryError::InvalidCommand { .. } | LibraryError::UnknownCommand(_) => {
                ("INVALID_COMMAND", self.0.to_string())
            }

            // 404 Not Found - 書籍または貸出中の記録が存在しない
            LibraryError::NotFound(_) => ("NOT_FOUND", self.0.to_string()),

            // 409 Conflict - 一意性・排他性の違反
            LibraryError::Conflict(_) => ("CONFLICT", self.0.to_string()),

            // 500 Internal Server Error - 構成不備・システム障害
            // 内部エラーの詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            LibraryError::HandlerNotFound(kind) => {
                tracing::error!("No handler registered for {} command", kind);
                ("HANDLER_NOT_FOUND", "Command is not supported".to_string())
            }
            LibraryError::Repository(e) => {
                tracing::error!("Repository error: {}", e);
                (
                    "REPOSITORY_ERROR",
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
