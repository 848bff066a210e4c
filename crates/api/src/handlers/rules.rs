use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use alchemist_domain::RuleDraft;

use crate::{
    error::{ApiError, ApiResult},
    response::{created, success},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct NaturalLanguageRuleRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct SetPriorityRequest {
    pub name: String,
    pub value: i64,
}

pub async fn list_rules(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let rules = state.session.lock().await.rules().clone();
    Ok(success(rules))
}

pub async fn create_rule(
    State(state): State<AppState>,
    Json(draft): Json<RuleDraft>,
) -> ApiResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    let rule = state.rules.add_structured(&mut session, &draft)?;
    Ok(created(rule))
}

/// 自然语言规则，解释器返回可识别的 `type` 时才会追加
pub async fn create_rule_from_text(
    State(state): State<AppState>,
    Json(request): Json<NaturalLanguageRuleRequest>,
) -> ApiResult<impl IntoResponse> {
    if request.text.trim().is_empty() {
        return Err(ApiError::BadRequest("规则描述不能为空".to_string()));
    }

    // 解释期间不持有会话锁
    let prompt = {
        let session = state.session.lock().await;
        state.rules.build_prompt(&session, &request.text)?
    };
    let rule = state.rules.interpret(&prompt).await?;

    state.session.lock().await.add_rule(rule.clone());
    Ok(created(rule))
}

pub async fn get_priorities(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let priorities = state.session.lock().await.priorities();
    Ok(success(priorities))
}

pub async fn set_priority(
    State(state): State<AppState>,
    Json(request): Json<SetPriorityRequest>,
) -> ApiResult<impl IntoResponse> {
    let priorities = state
        .session
        .lock()
        .await
        .set_priority(&request.name, request.value)?;
    Ok(success(priorities))
}

/// 规则导出内容 `{ rules, priorities }`
pub async fn export_rules(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let config = state.session.lock().await.rules_config();
    Ok(success(config))
}
