use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use alchemist_application::LoadSummary;
use alchemist_domain::{EntityKind, ValidationReport};
use alchemist_errors::AlchemistError;
use alchemist_infrastructure::parse_records;

use super::parse_entity;
use crate::{
    error::ApiResult,
    response::{success, success_with_message},
    routes::AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct TableQuery {
    /// 为 true 时忽略任务过滤视图
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Deserialize)]
pub struct EditCellRequest {
    pub field: String,
    pub value: Value,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub summary: LoadSummary,
    pub report: ValidationReport,
}

/// 上传CSV或电子表格并整体替换对应的表，随后重新校验
pub async fn upload_table(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    body: Bytes,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_entity(&entity)?;
    let records = parse_records(body.as_ref())?;

    let mut session = state.session.lock().await;
    let summary = session.load(kind, &records);
    let report = session.validate();
    info!(
        "上传 {}: 保留 {} 行, 丢弃 {} 行",
        kind, summary.loaded, summary.discarded
    );

    let message = format!("已加载 {} 条 {} 记录", summary.loaded, kind);
    Ok(success_with_message(
        UploadResponse { summary, report },
        message,
    ))
}

/// 当前表内容；任务表在过滤视图生效时只返回视图中的行
pub async fn get_table(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(query): Query<TableQuery>,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_entity(&entity)?;
    let session = state.session.lock().await;

    let rows = if kind == EntityKind::Task && !query.all && session.task_filter().is_some() {
        serde_json::to_value(session.visible_tasks()).map_err(AlchemistError::from)?
    } else {
        session.table_json(kind)?
    };
    Ok(success(rows))
}

pub async fn edit_cell(
    State(state): State<AppState>,
    Path((entity, row)): Path<(String, usize)>,
    Json(request): Json<EditCellRequest>,
) -> ApiResult<impl IntoResponse> {
    let kind = parse_entity(&entity)?;
    let report = state
        .session
        .lock()
        .await
        .set_field(kind, row, &request.field, &request.value)?;
    Ok(success(report))
}

pub async fn validate(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let report = state.session.lock().await.validate();
    Ok(success(report))
}
