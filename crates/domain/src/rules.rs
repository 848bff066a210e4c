//! 分配规则
//!
//! 规则只做记录，不在此处求值；规则列表按创建顺序保存，供下游的分配器使用。

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::normalizer::expand_phase_range;
use alchemist_errors::{AlchemistError, AlchemistResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideScope {
    #[default]
    Global,
    Specific,
}

impl FromStr for OverrideScope {
    type Err = AlchemistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "global" => Ok(OverrideScope::Global),
            "specific" => Ok(OverrideScope::Specific),
            other => Err(AlchemistError::invalid_rule(format!(
                "overrideType 只能是 global 或 specific，实际为: {other}"
            ))),
        }
    }
}

/// 规则类型名，对应JSON中的 `type` 字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    CoRun,
    SlotRestriction,
    LoadLimit,
    PhaseWindow,
    PatternMatch,
    PrecedenceOverride,
}

impl RuleKind {
    pub const ALL: [RuleKind; 6] = [
        RuleKind::CoRun,
        RuleKind::SlotRestriction,
        RuleKind::LoadLimit,
        RuleKind::PhaseWindow,
        RuleKind::PatternMatch,
        RuleKind::PrecedenceOverride,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleKind::CoRun => "coRun",
            RuleKind::SlotRestriction => "slotRestriction",
            RuleKind::LoadLimit => "loadLimit",
            RuleKind::PhaseWindow => "phaseWindow",
            RuleKind::PatternMatch => "patternMatch",
            RuleKind::PrecedenceOverride => "precedenceOverride",
        }
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleKind {
    type Err = AlchemistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| AlchemistError::invalid_rule(format!("未知的规则类型: {trimmed}")))
    }
}

/// 分配规则，`type` 字段决定哪些可选字段有意义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Rule {
    #[serde(rename_all = "camelCase")]
    CoRun {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        tasks: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    SlotRestriction {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_common_slots: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    LoadLimit {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        group: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_slots_per_phase: Option<i64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    PhaseWindow {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        allowed_phases: Option<Vec<i64>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    PatternMatch {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        override_type: Option<OverrideScope>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<i64>,
    },
    #[serde(rename_all = "camelCase")]
    PrecedenceOverride {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        override_type: Option<OverrideScope>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<i64>,
    },
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::CoRun { .. } => RuleKind::CoRun,
            Rule::SlotRestriction { .. } => RuleKind::SlotRestriction,
            Rule::LoadLimit { .. } => RuleKind::LoadLimit,
            Rule::PhaseWindow { .. } => RuleKind::PhaseWindow,
            Rule::PatternMatch { .. } => RuleKind::PatternMatch,
            Rule::PrecedenceOverride { .. } => RuleKind::PrecedenceOverride,
        }
    }

    pub fn priority(&self) -> Option<i64> {
        match self {
            Rule::CoRun { priority, .. }
            | Rule::SlotRestriction { priority, .. }
            | Rule::LoadLimit { priority, .. }
            | Rule::PhaseWindow { priority, .. }
            | Rule::PatternMatch { priority, .. }
            | Rule::PrecedenceOverride { priority, .. } => *priority,
        }
    }

    /// 检查字段之间的约束，目前只有 patternMatch 的正则需要能编译
    pub fn check(&self) -> AlchemistResult<()> {
        if let Rule::PatternMatch {
            pattern: Some(pattern),
            ..
        } = self
        {
            Regex::new(pattern).map_err(|e| {
                AlchemistError::invalid_rule(format!("pattern 不是合法的正则表达式: {e}"))
            })?;
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str(self.kind().as_str()),
        }
    }
}

/// 结构化规则表单，所有输入都是文本
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RuleDraft {
    #[serde(rename = "type")]
    pub rule_type: String,
    pub tasks: String,
    pub group: String,
    pub min_common_slots: String,
    pub max_slots_per_phase: String,
    pub allowed_phases: String,
    pub pattern: String,
    pub override_type: String,
    pub priority: String,
}

fn optional_text(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn optional_int(name: &str, input: &str) -> AlchemistResult<Option<i64>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<i64>()
        .map(Some)
        .map_err(|_| AlchemistError::invalid_rule(format!("{name} 必须是整数，实际为: {trimmed}")))
}

fn optional_list(input: &str) -> Option<Vec<String>> {
    let items: Vec<String> = input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

/// 阶段列表，每一项可以是单个整数或 "a-b" 区间
fn optional_phases(input: &str) -> AlchemistResult<Option<Vec<i64>>> {
    let Some(segments) = optional_list(input) else {
        return Ok(None);
    };

    let mut phases = Vec::new();
    for segment in segments {
        if let Ok(phase) = segment.parse::<i64>() {
            phases.push(phase);
        } else if let Some(range) = expand_phase_range(&segment) {
            phases.extend(range);
        } else {
            return Err(AlchemistError::invalid_rule(format!(
                "allowedPhases 中的 {segment} 不是整数或区间"
            )));
        }
    }
    Ok(Some(phases))
}

fn override_scope(input: &str) -> AlchemistResult<Option<OverrideScope>> {
    match optional_text(input) {
        Some(text) => text.parse().map(Some),
        None => Ok(Some(OverrideScope::Global)),
    }
}

impl RuleDraft {
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            ..Self::default()
        }
    }

    /// 生成规则：空白字段省略，数值字段必须是整数
    pub fn build(&self) -> AlchemistResult<Rule> {
        let priority = optional_int("priority", &self.priority)?;

        let rule = match self.rule_type.parse::<RuleKind>()? {
            RuleKind::CoRun => Rule::CoRun {
                tasks: optional_list(&self.tasks),
                priority,
            },
            RuleKind::SlotRestriction => Rule::SlotRestriction {
                group: optional_text(&self.group),
                min_common_slots: optional_int("minCommonSlots", &self.min_common_slots)?,
                priority,
            },
            RuleKind::LoadLimit => Rule::LoadLimit {
                group: optional_text(&self.group),
                max_slots_per_phase: optional_int("maxSlotsPerPhase", &self.max_slots_per_phase)?,
                priority,
            },
            RuleKind::PhaseWindow => Rule::PhaseWindow {
                allowed_phases: optional_phases(&self.allowed_phases)?,
                priority,
            },
            RuleKind::PatternMatch => Rule::PatternMatch {
                pattern: optional_text(&self.pattern),
                override_type: override_scope(&self.override_type)?,
                priority,
            },
            RuleKind::PrecedenceOverride => Rule::PrecedenceOverride {
                override_type: override_scope(&self.override_type)?,
                priority,
            },
        };

        rule.check()?;
        Ok(rule)
    }
}

/// 按创建顺序保存的规则列表，只追加，不合并也不去重
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
