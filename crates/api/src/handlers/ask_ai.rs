use axum::{extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    response::success,
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct AskAiRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct AskAiResponse {
    pub result: String,
}

/// 直接转发给解释器，原样返回其文本
pub async fn ask_ai(
    State(state): State<AppState>,
    Json(request): Json<AskAiRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.prompt.trim().is_empty() {
        return Err(ApiError::BadRequest("prompt 不能为空".to_string()));
    }

    let result = state
        .interpreter
        .interpret(&request.prompt)
        .await
        .map_err(|e| {
            warn!("解释器调用失败: {}", e);
            ApiError::AskAi(e.to_string())
        })?;
    Ok(success(AskAiResponse { result }))
}
