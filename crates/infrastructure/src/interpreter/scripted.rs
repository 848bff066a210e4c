use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::Utc;
use regex::Regex;
use serde_json::{json, Value};
use tracing::debug;

use alchemist_application::Interpreter;
use alchemist_errors::AlchemistResult;

static CORRECTION_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn correction_pattern() -> Option<&'static Regex> {
    CORRECTION_PATTERN
        .get_or_init(|| Regex::new(r"in (\w+) at row (\d+): (.+)").ok())
        .as_ref()
}

/// 离线解释器，只认识几种固定的提示词，其余一律返回 `{}`
///
/// - 纠正建议：缺少 TaskID 时生成新ID，PriorityLevel 越界时建议 1，
///   引用了不存在的任务时建议清空 RequestedTaskIDs
/// - 搜索："Duration > 1" 且 "phase 2"
/// - 规则："Tasks T1 and T2 must run together"
#[derive(Debug, Clone, Default)]
pub struct ScriptedInterpreter;

impl ScriptedInterpreter {
    pub fn new() -> Self {
        Self
    }

    fn suggest_correction(prompt: &str) -> Option<Value> {
        let captures = correction_pattern()?.captures(prompt)?;
        let entity = &captures[1];
        let row = captures[2].parse::<i64>().ok()? - 1;
        let message = &captures[3];

        let (field, suggested_value) = if message.contains("Missing or empty TaskID") {
            ("TaskID", json!(format!("T{}", Utc::now().timestamp_millis())))
        } else if message.contains("PriorityLevel must be 1–5") {
            ("PriorityLevel", json!(1))
        } else if message.contains("Unknown TaskID") {
            ("RequestedTaskIDs", json!([]))
        } else {
            return None;
        };

        Some(json!({
            "entity": entity,
            "row": row,
            "field": field,
            "suggestedValue": suggested_value
        }))
    }

    fn answer(prompt: &str) -> Value {
        if prompt.contains("Suggest a correction") {
            if let Some(correction) = Self::suggest_correction(prompt) {
                return correction;
            }
        }
        if prompt.contains("Parse this natural language query")
            && prompt.contains("Duration > 1")
            && prompt.contains("phase 2")
        {
            return json!({
                "entity": "tasks",
                "filter": { "Duration": ">1", "PreferredPhases": "includes 2" }
            });
        }
        if prompt.contains("Convert this natural language rule")
            && prompt.contains("Tasks T1 and T2 must run together")
        {
            return json!({ "type": "coRun", "tasks": ["T1", "T2"], "priority": 1 });
        }
        json!({})
    }
}

#[async_trait]
impl Interpreter for ScriptedInterpreter {
    async fn interpret(&self, prompt: &str) -> AlchemistResult<String> {
        let answer = Self::answer(prompt).to_string();
        debug!("脚本化解释器返回: {}", answer);
        Ok(answer)
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
