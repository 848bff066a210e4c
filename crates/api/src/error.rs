use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, warn};

use alchemist_errors::AlchemistError;

use crate::response::ApiResponse;

/// `/api/ask-ai` 失败时返回给调用方的固定文本
pub const ASK_AI_FAILURE: &str = "AI failed to interpret query.";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Alchemist(#[from] AlchemistError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("AI failed to interpret query. ({0})")]
    AskAi(String),

    #[error("内部服务器错误: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Alchemist(AlchemistError::RowNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Alchemist(e) if e.is_soft_failure() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Alchemist(AlchemistError::Upload(_))
            | ApiError::Alchemist(AlchemistError::Serialization(_))
            | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Alchemist(_) | ApiError::AskAi(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::Alchemist(AlchemistError::RowNotFound { .. }) => "ROW_NOT_FOUND",
            ApiError::Alchemist(AlchemistError::UnknownField { .. }) => "UNKNOWN_FIELD",
            ApiError::Alchemist(AlchemistError::InvalidFieldValue { .. }) => "INVALID_FIELD_VALUE",
            ApiError::Alchemist(AlchemistError::InvalidRule(_)) => "INVALID_RULE",
            ApiError::Alchemist(AlchemistError::InvalidPriority(_)) => "INVALID_PRIORITY",
            ApiError::Alchemist(AlchemistError::InterpreterFailure(_)) => "INTERPRETER_FAILURE",
            ApiError::Alchemist(AlchemistError::InterpreterResponse { .. }) => {
                "INTERPRETER_RESPONSE"
            }
            ApiError::Alchemist(AlchemistError::Upload(_)) => "UPLOAD_ERROR",
            ApiError::Alchemist(AlchemistError::Serialization(_)) => "SERIALIZATION_ERROR",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::AskAi(_) => "ASK_AI_FAILED",
            ApiError::Alchemist(_) | ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> String {
        match self {
            ApiError::Alchemist(e) => e.user_message().to_string(),
            ApiError::BadRequest(msg) => format!("请求参数错误: {msg}"),
            ApiError::AskAi(_) => ASK_AI_FAILURE.to_string(),
            ApiError::Internal(_) => "系统内部错误".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("请求处理失败: {}", self);
        } else {
            warn!("请求被拒绝: {}", self);
        }

        let details = json!({
            "type": self.error_type(),
            "code": status.as_u16(),
            "detail": self.to_string(),
        });

        (status, ApiResponse::failure(Some(details), self.message())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (
                ApiError::from(AlchemistError::row_not_found("Task", 9)),
                StatusCode::NOT_FOUND,
            ),
            (
                ApiError::from(AlchemistError::unknown_field("Task", "Colour")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(AlchemistError::interpreter_response("missing type", "{}")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(AlchemistError::interpreter_failure("timeout")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(AlchemistError::invalid_priority("fairness = 101")),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(AlchemistError::upload("缺少表头")),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::BadRequest("unknown entity".to_string()),
                StatusCode::BAD_REQUEST,
            ),
            (
                ApiError::from(AlchemistError::Io("disk full".to_string())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                ApiError::AskAi("timeout".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.status(), expected, "{error}");
            assert_eq!(error.into_response().status(), expected);
        }
    }

    #[test]
    fn test_ask_ai_message() {
        let error = ApiError::AskAi("connection refused".to_string());
        assert_eq!(error.message(), ASK_AI_FAILURE);
        assert!(error.to_string().contains("connection refused"));
    }

    #[test]
    fn test_interpreter_response_keeps_raw_text() {
        let error = ApiError::from(AlchemistError::interpreter_response(
            "missing filter",
            "I cannot help",
        ));
        assert_eq!(error.error_type(), "INTERPRETER_RESPONSE");
        assert!(error.to_string().contains("I cannot help"));
    }
}
