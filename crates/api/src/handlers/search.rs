use axum::{extract::State, response::IntoResponse, Json};
use serde::Deserialize;

use crate::{
    error::ApiResult,
    response::{success, success_with_message},
    routes::AppState,
};

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// 自然语言任务搜索，成功后任务表进入过滤视图
pub async fn search_tasks(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> ApiResult<impl IntoResponse> {
    let filter = state.search.interpret_query(&request.query).await?;
    let tasks = state.session.lock().await.apply_task_filter(&filter)?;
    let message = format!("{} 个任务匹配", tasks.len());
    Ok(success_with_message(tasks, message))
}

pub async fn clear_search(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let mut session = state.session.lock().await;
    session.clear_task_filter();
    Ok(success(session.visible_tasks()))
}
