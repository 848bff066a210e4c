use std::sync::Arc;

use tracing::{info, instrument, warn};

use alchemist_domain::{Task, TaskFilter};
use alchemist_errors::{AlchemistError, AlchemistResult};

use crate::interpretation::parse_filter;
use crate::ports::Interpreter;
use crate::prompts::filter_prompt;
use crate::session::Session;

/// 自然语言任务搜索
pub struct SearchService {
    interpreter: Arc<dyn Interpreter>,
}

impl SearchService {
    pub fn new(interpreter: Arc<dyn Interpreter>) -> Self {
        Self { interpreter }
    }

    /// 把查询解释为任务过滤条件；不访问会话
    #[instrument(skip(self), fields(interpreter = self.interpreter.name()))]
    pub async fn interpret_query(&self, query: &str) -> AlchemistResult<TaskFilter> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AlchemistError::invalid_value("query", "查询不能为空"));
        }

        let raw = self.interpreter.interpret(&filter_prompt(query)).await?;
        parse_filter(&raw).inspect_err(|e| {
            warn!("解释器返回的过滤条件无效: {}", e);
        })
    }

    /// 解释查询并在会话中设置任务过滤视图，返回视图中的任务
    pub async fn search_tasks(
        &self,
        session: &mut Session,
        query: &str,
    ) -> AlchemistResult<Vec<Task>> {
        let filter = self.interpret_query(query).await?;
        let tasks = session.apply_task_filter(&filter)?;
        info!("搜索 \"{}\" 返回 {} 个任务", query.trim(), tasks.len());
        Ok(tasks)
    }
}
