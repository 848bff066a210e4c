//! 实体表校验
//!
//! 每次校验都基于当前三张表完整重算。结果顺序固定：
//! 客户、任务、Worker、技能覆盖、并发可行性；每一段内部按行号顺序。

mod clients;
mod cross_entity;
mod tasks;
mod workers;

use std::collections::HashSet;

use tracing::{debug, info_span};

use crate::entities::{Client, Task, Worker};
use crate::value_objects::ValidationReport;

pub use clients::validate_clients;
pub use cross_entity::{validate_concurrency, validate_skill_coverage};
pub use tasks::validate_tasks;
pub use workers::validate_workers;

/// 客户引用检查使用的任务标识集合，每次校验重新计算
pub fn task_id_set(tasks: &[Task]) -> HashSet<&str> {
    tasks
        .iter()
        .map(|task| task.task_id.as_str())
        .filter(|id| !id.is_empty())
        .collect()
}

pub(crate) fn is_missing_id(id: &str) -> bool {
    id.trim().is_empty()
}

pub fn validate_all(clients: &[Client], workers: &[Worker], tasks: &[Task]) -> ValidationReport {
    let _span = info_span!(
        "validate_all",
        clients = clients.len(),
        tasks = tasks.len(),
        workers = workers.len()
    )
    .entered();

    let task_ids = task_id_set(tasks);

    let mut findings = validate_clients(clients, &task_ids);
    findings.extend(validate_tasks(tasks));
    findings.extend(validate_workers(workers));
    findings.extend(validate_skill_coverage(tasks, workers));
    findings.extend(validate_concurrency(tasks, workers));

    debug!(
        "校验完成: {} 个客户, {} 个Worker, {} 个任务, 共 {} 条问题",
        clients.len(),
        workers.len(),
        tasks.len(),
        findings.len()
    );

    ValidationReport::new(findings)
}
