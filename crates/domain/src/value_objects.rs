use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entities::EntityKind;
use alchemist_errors::{AlchemistError, AlchemistResult};

/// 列表字段
///
/// 归一化后通常是 `Items`；当上传或编辑给出的值不是预期元素类型的数组时，
/// 原值保存在 `Malformed` 中，由校验器报告，而不是在归一化阶段拒绝整行。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldList<T> {
    Items(Vec<T>),
    Malformed(serde_json::Value),
}

impl<T> FieldList<T> {
    pub fn empty() -> Self {
        FieldList::Items(Vec::new())
    }

    pub fn items(&self) -> Option<&[T]> {
        match self {
            FieldList::Items(items) => Some(items),
            FieldList::Malformed(_) => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FieldList::Malformed(_))
    }
}

impl<T> Default for FieldList<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<Vec<T>> for FieldList<T> {
    fn from(items: Vec<T>) -> Self {
        FieldList::Items(items)
    }
}

/// 单条校验结果，row 为该实体表中从0开始的行号
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub entity: EntityKind,
    pub row: usize,
    pub message: String,
}

impl Finding {
    pub fn new(entity: EntityKind, row: usize, message: impl Into<String>) -> Self {
        Self {
            entity,
            row,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingSummary {
    pub clients: usize,
    pub workers: usize,
    pub tasks: usize,
}

impl FindingSummary {
    pub fn from_findings(findings: &[Finding]) -> Self {
        findings
            .iter()
            .fold(Self::default(), |mut summary, finding| {
                match finding.entity {
                    EntityKind::Client => summary.clients += 1,
                    EntityKind::Worker => summary.workers += 1,
                    EntityKind::Task => summary.tasks += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.clients + self.workers + self.tasks
    }
}

/// 一次完整校验的快照；每次校验都重新计算，不做增量修补
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
    pub summary: FindingSummary,
    pub validated_at: DateTime<Utc>,
}

impl ValidationReport {
    pub fn new(findings: Vec<Finding>) -> Self {
        Self {
            summary: FindingSummary::from_findings(&findings),
            findings,
            validated_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// 解释器针对某条校验结果给出的单字段修改建议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Correction {
    pub entity: EntityKind,
    pub row: usize,
    pub field: String,
    pub suggested_value: serde_json::Value,
}

impl Correction {
    pub fn describe(&self) -> String {
        format!(
            "{} (row {}): Set {} to {}",
            self.entity,
            self.row + 1,
            self.field,
            self.suggested_value
        )
    }
}

/// 分配优先级权重，百分比，不强制总和为100
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityWeights {
    pub priority_level: u8,
    pub task_fulfillment: u8,
    pub fairness: u8,
}

impl Default for PriorityWeights {
    fn default() -> Self {
        Self {
            priority_level: 50,
            task_fulfillment: 30,
            fairness: 20,
        }
    }
}

impl PriorityWeights {
    pub const NAMES: [&'static str; 3] = ["priorityLevel", "taskFulfillment", "fairness"];

    /// 设置单个权重，名称同时接受 camelCase 和 snake_case
    pub fn set(&mut self, name: &str, value: i64) -> AlchemistResult<()> {
        if !(0..=100).contains(&value) {
            return Err(AlchemistError::invalid_priority(format!(
                "{name}={value}, 必须在0到100之间"
            )));
        }
        let value = value as u8;
        match name {
            "priorityLevel" | "priority_level" => self.priority_level = value,
            "taskFulfillment" | "task_fulfillment" => self.task_fulfillment = value,
            "fairness" => self.fairness = value,
            _ => {
                return Err(AlchemistError::invalid_priority(format!(
                    "未知的权重名称: {name}，可选: {}",
                    Self::NAMES.join(", ")
                )))
            }
        }
        Ok(())
    }
}
