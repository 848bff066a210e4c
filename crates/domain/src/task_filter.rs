use serde::{Deserialize, Serialize};

use crate::entities::Task;
use alchemist_errors::{AlchemistError, AlchemistResult};

/// 任务表的过滤条件，字段名与解释器返回的 filter 对象一致
///
/// `Duration` 形如 `">2"`（也接受 `>=`、`<`、`<=`、`=`），
/// `PreferredPhases` 形如 `"includes 3"`。两个条件同时给出时取交集。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilter {
    #[serde(rename = "Duration", default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(
        rename = "PreferredPhases",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub preferred_phases: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Greater,
    GreaterOrEqual,
    Less,
    LessOrEqual,
    Equal,
}

impl Comparison {
    fn matches(self, actual: i64, expected: i64) -> bool {
        match self {
            Comparison::Greater => actual > expected,
            Comparison::GreaterOrEqual => actual >= expected,
            Comparison::Less => actual < expected,
            Comparison::LessOrEqual => actual <= expected,
            Comparison::Equal => actual == expected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Predicates {
    duration: Option<(Comparison, i64)>,
    phase: Option<i64>,
}

fn parse_number(field: &str, input: &str) -> AlchemistResult<i64> {
    let trimmed = input.trim();
    trimmed.parse().map_err(|_| {
        AlchemistError::invalid_value(field, format!("过滤条件中的 {trimmed} 不是整数"))
    })
}

fn parse_duration(input: &str) -> AlchemistResult<(Comparison, i64)> {
    let trimmed = input.trim();
    let (comparison, rest) = if let Some(rest) = trimmed.strip_prefix(">=") {
        (Comparison::GreaterOrEqual, rest)
    } else if let Some(rest) = trimmed.strip_prefix("<=") {
        (Comparison::LessOrEqual, rest)
    } else if let Some(rest) = trimmed.strip_prefix('>') {
        (Comparison::Greater, rest)
    } else if let Some(rest) = trimmed.strip_prefix('<') {
        (Comparison::Less, rest)
    } else if let Some(rest) = trimmed.strip_prefix('=') {
        (Comparison::Equal, rest)
    } else {
        return Err(AlchemistError::invalid_value(
            "Duration",
            format!("无法识别的比较条件: {trimmed}"),
        ));
    };
    Ok((comparison, parse_number("Duration", rest)?))
}

fn parse_phase(input: &str) -> AlchemistResult<i64> {
    let trimmed = input.trim();
    match trimmed.strip_prefix("includes") {
        Some(rest) => parse_number("PreferredPhases", rest),
        None => Err(AlchemistError::invalid_value(
            "PreferredPhases",
            format!("无法识别的包含条件: {trimmed}"),
        )),
    }
}

impl TaskFilter {
    pub fn is_empty(&self) -> bool {
        self.duration.is_none() && self.preferred_phases.is_none()
    }

    fn predicates(&self) -> AlchemistResult<Predicates> {
        if self.is_empty() {
            return Err(AlchemistError::invalid_value("filter", "过滤条件为空"));
        }
        Ok(Predicates {
            duration: self.duration.as_deref().map(parse_duration).transpose()?,
            phase: self.preferred_phases.as_deref().map(parse_phase).transpose()?,
        })
    }

    /// 检查条件能否被识别，不做任何过滤
    pub fn check(&self) -> AlchemistResult<()> {
        self.predicates().map(|_| ())
    }

    /// 返回满足条件的任务行号，按表中顺序
    pub fn matching_rows(&self, tasks: &[Task]) -> AlchemistResult<Vec<usize>> {
        let predicates = self.predicates()?;

        Ok(tasks
            .iter()
            .enumerate()
            .filter(|(_, task)| {
                let duration_ok = predicates.duration.is_none_or(|(comparison, expected)| {
                    task.duration
                        .is_some_and(|actual| comparison.matches(actual, expected))
                });
                let phase_ok = predicates.phase.is_none_or(|phase| {
                    task.preferred_phases
                        .items()
                        .is_some_and(|phases| phases.contains(&phase))
                });
                duration_ok && phase_ok
            })
            .map(|(row, _)| row)
            .collect())
    }
}
