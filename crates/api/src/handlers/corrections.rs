use axum::{extract::State, response::IntoResponse, Json};
use serde::Serialize;

use alchemist_domain::Correction;

use crate::{
    error::ApiResult,
    response::{success, success_with_message},
    routes::AppState,
};

#[derive(Debug, Serialize)]
pub struct Suggestion {
    #[serde(flatten)]
    pub correction: Correction,
    pub description: String,
}

impl From<Correction> for Suggestion {
    fn from(correction: Correction) -> Self {
        let description = correction.describe();
        Self {
            correction,
            description,
        }
    }
}

/// 为最近一次校验的全部问题请求纠正建议
///
/// 解释器调用期间不持有会话锁，结果保存为待处理建议，不会自动应用。
/// 期间表数据被重新上传或编辑时，建议照常返回但不保存。
pub async fn suggest_corrections(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let (findings, revision) = {
        let session = state.session.lock().await;
        (session.report().findings.clone(), session.revision())
    };

    let corrections = state.corrections.suggest(&findings).await;

    let stored = state
        .session
        .lock()
        .await
        .store_corrections_for(revision, corrections.clone());

    let suggestions: Vec<Suggestion> = corrections.into_iter().map(Suggestion::from).collect();
    if stored {
        Ok(success(suggestions).into_response())
    } else {
        let message = "表数据在生成建议期间已变化，建议未保存，请重新校验".to_string();
        Ok(success_with_message(suggestions, message).into_response())
    }
}

pub async fn apply_correction(
    State(state): State<AppState>,
    Json(correction): Json<Correction>,
) -> ApiResult<impl IntoResponse> {
    let report = state.session.lock().await.apply_correction(&correction)?;
    Ok(success(report))
}
