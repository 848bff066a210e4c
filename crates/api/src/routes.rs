use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tokio::sync::Mutex;

use alchemist_application::{CorrectionService, Interpreter, RuleService, SearchService, Session};

use crate::handlers::{
    ask_ai::ask_ai,
    corrections::{apply_correction, suggest_corrections},
    health::health_check,
    rules::{
        create_rule, create_rule_from_text, export_rules, get_priorities, list_rules, set_priority,
    },
    search::{clear_search, search_tasks},
    tables::{edit_cell, get_table, upload_table, validate},
};

/// API应用状态
///
/// 整个服务只有一个会话，所有修改在锁内串行完成。
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Mutex<Session>>,
    pub interpreter: Arc<dyn Interpreter>,
    pub corrections: Arc<CorrectionService>,
    pub rules: Arc<RuleService>,
    pub search: Arc<SearchService>,
}

impl AppState {
    pub fn new(session: Session, interpreter: Arc<dyn Interpreter>) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            corrections: Arc::new(CorrectionService::new(interpreter.clone())),
            rules: Arc::new(RuleService::new(interpreter.clone())),
            search: Arc::new(SearchService::new(interpreter.clone())),
            interpreter,
        }
    }
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 数据表
        .route("/api/uploads/{entity}", post(upload_table))
        .route("/api/tables/{entity}", get(get_table))
        .route("/api/tables/{entity}/{row}", put(edit_cell))
        .route("/api/validate", post(validate))
        // 纠正建议
        .route("/api/corrections/suggest", post(suggest_corrections))
        .route("/api/corrections/apply", post(apply_correction))
        // 规则与优先级
        .route("/api/rules", get(list_rules).post(create_rule))
        .route("/api/rules/natural-language", post(create_rule_from_text))
        .route("/api/priorities", get(get_priorities).put(set_priority))
        .route("/api/export/rules", get(export_rules))
        // 自然语言
        .route("/api/search", post(search_tasks).delete(clear_search))
        .route("/api/ask-ai", post(ask_ai))
        .with_state(state)
}
