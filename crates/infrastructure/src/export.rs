//! 导出归一化后的三张表和规则配置
//!
//! 列表字段：技能和任务ID用逗号连接，阶段/时段列表写成JSON数组，
//! AttributesJSON 写成JSON文本。无法解析的数值写作 `NaN`。

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use alchemist_application::{ExportBundle, RulesConfig};
use alchemist_config::ExportConfig;
use alchemist_domain::{Client, Entity, FieldList, Task, Worker};
use alchemist_errors::{AlchemistError, AlchemistResult};

#[derive(Debug, Clone, Serialize)]
pub struct ExportSummary {
    pub files: Vec<PathBuf>,
    pub clients: usize,
    pub workers: usize,
    pub tasks: usize,
    pub rules: usize,
}

fn number_cell(value: Option<i64>) -> String {
    value.map_or_else(|| "NaN".to_string(), |n| n.to_string())
}

fn raw_cell(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn joined_cell(list: &FieldList<String>) -> String {
    match list {
        FieldList::Items(items) => items.join(","),
        FieldList::Malformed(raw) => raw_cell(raw),
    }
}

fn json_list_cell(list: &FieldList<i64>) -> String {
    match list {
        FieldList::Items(items) => Value::from(items.clone()).to_string(),
        FieldList::Malformed(raw) => raw_cell(raw),
    }
}

pub(crate) fn client_row(client: &Client) -> Vec<String> {
    vec![
        client.client_id.clone(),
        client.client_name.clone(),
        number_cell(client.priority_level),
        joined_cell(&client.requested_task_ids),
        client.group_tag.clone(),
        raw_cell(&client.attributes),
    ]
}

pub(crate) fn worker_row(worker: &Worker) -> Vec<String> {
    vec![
        worker.worker_id.clone(),
        worker.worker_name.clone(),
        joined_cell(&worker.skills),
        json_list_cell(&worker.available_slots),
        number_cell(worker.max_load_per_phase),
        worker.worker_group.clone(),
        worker.qualification_level.clone(),
    ]
}

pub(crate) fn task_row(task: &Task) -> Vec<String> {
    vec![
        task.task_id.clone(),
        task.task_name.clone(),
        task.category.clone(),
        number_cell(task.duration),
        joined_cell(&task.required_skills),
        json_list_cell(&task.preferred_phases),
        number_cell(task.max_concurrent),
    ]
}

fn write_table<T: Entity>(
    path: &Path,
    rows: &[T],
    to_row: fn(&T) -> Vec<String>,
) -> AlchemistResult<()> {
    let export_error = |e: csv::Error| {
        AlchemistError::Io(format!("写入 {} 失败: {e}", path.display()))
    };

    let mut writer = csv::Writer::from_path(path).map_err(export_error)?;
    writer.write_record(T::columns()).map_err(export_error)?;
    for row in rows {
        writer.write_record(to_row(row)).map_err(export_error)?;
    }
    writer.flush()?;
    Ok(())
}

pub fn rules_json(config: &RulesConfig) -> AlchemistResult<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

/// 写出 clients / workers / tasks 三个CSV和规则JSON，目录不存在时创建
pub fn write_export(
    bundle: &ExportBundle,
    config: &ExportConfig,
    dir: &Path,
) -> AlchemistResult<ExportSummary> {
    fs::create_dir_all(dir)?;

    let clients_path = dir.join(&config.clients_file);
    let workers_path = dir.join(&config.workers_file);
    let tasks_path = dir.join(&config.tasks_file);
    let rules_path = dir.join(&config.rules_file);

    write_table(&clients_path, &bundle.clients, client_row)?;
    write_table(&workers_path, &bundle.workers, worker_row)?;
    write_table(&tasks_path, &bundle.tasks, task_row)?;
    fs::write(&rules_path, rules_json(&bundle.rules)?)?;

    info!(
        "导出完成: {} 个客户, {} 个Worker, {} 个任务, {} 条规则 -> {}",
        bundle.clients.len(),
        bundle.workers.len(),
        bundle.tasks.len(),
        bundle.rules.rules.len(),
        dir.display()
    );

    Ok(ExportSummary {
        files: vec![clients_path, workers_path, tasks_path, rules_path],
        clients: bundle.clients.len(),
        workers: bundle.workers.len(),
        tasks: bundle.tasks.len(),
        rules: bundle.rules.rules.len(),
    })
}
