//! 解释器输出的防御性解析
//!
//! 顺序固定：JSON解析 → 顶层字段检查 → 类型化反序列化。
//! 任何一步失败都返回 `InterpreterResponse`，附带原始输出。

use serde_json::{Map, Value};

use alchemist_domain::{Correction, EntityKind, Rule, TaskFilter};
use alchemist_errors::{AlchemistError, AlchemistResult};

/// 去掉模型常加的 ```json 代码块包裹
fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_suffix("```").unwrap_or(inner);
    match inner.split_once('\n') {
        Some((lang, body)) if !lang.trim_start().starts_with('{') => body.trim(),
        _ => inner.trim(),
    }
}

fn parse_object(raw: &str) -> AlchemistResult<Map<String, Value>> {
    match serde_json::from_str::<Value>(strip_code_fence(raw)) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(AlchemistError::interpreter_response("返回内容不是JSON对象", raw)),
        Err(e) => Err(AlchemistError::interpreter_response(
            format!("返回内容不是合法的JSON: {e}"),
            raw,
        )),
    }
}

fn require_keys(map: &Map<String, Value>, keys: &[&str], raw: &str) -> AlchemistResult<()> {
    let missing: Vec<&str> = keys
        .iter()
        .copied()
        .filter(|key| !map.contains_key(*key))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AlchemistError::interpreter_response(
            format!("缺少字段: {}", missing.join(", ")),
            raw,
        ))
    }
}

pub fn parse_correction(raw: &str) -> AlchemistResult<Correction> {
    let map = parse_object(raw)?;
    require_keys(&map, &["entity", "row", "field", "suggestedValue"], raw)?;

    serde_json::from_value(Value::Object(map)).map_err(|e| {
        AlchemistError::interpreter_response(format!("纠正建议格式无效: {e}"), raw)
    })
}

pub fn parse_filter(raw: &str) -> AlchemistResult<TaskFilter> {
    let mut map = parse_object(raw)?;
    require_keys(&map, &["entity", "filter"], raw)?;

    let targets_tasks = map
        .get("entity")
        .and_then(Value::as_str)
        .and_then(|entity| entity.parse::<EntityKind>().ok())
        == Some(EntityKind::Task);
    if !targets_tasks {
        return Err(AlchemistError::interpreter_response(
            "只支持对任务表过滤",
            raw,
        ));
    }

    let filter = map.remove("filter").unwrap_or(Value::Null);
    if !filter.is_object() {
        return Err(AlchemistError::interpreter_response("filter 不是对象", raw));
    }
    let filter: TaskFilter = serde_json::from_value(filter).map_err(|e| {
        AlchemistError::interpreter_response(format!("过滤条件格式无效: {e}"), raw)
    })?;
    filter
        .check()
        .map_err(|e| AlchemistError::interpreter_response(e.to_string(), raw))?;
    Ok(filter)
}

pub fn parse_rule(raw: &str) -> AlchemistResult<Rule> {
    let map = parse_object(raw)?;
    if !map.get("type").is_some_and(Value::is_string) {
        return Err(AlchemistError::interpreter_response(
            "缺少可识别的 type 字段",
            raw,
        ));
    }

    let rule: Rule = serde_json::from_value(Value::Object(map)).map_err(|e| {
        AlchemistError::interpreter_response(format!("规则格式无效: {e}"), raw)
    })?;
    rule.check()
        .map_err(|e| AlchemistError::interpreter_response(e.to_string(), raw))?;
    Ok(rule)
}
