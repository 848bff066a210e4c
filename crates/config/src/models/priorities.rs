use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

/// 优先级权重的初始值（百分比，不要求总和为100）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PriorityDefaults {
    pub priority_level: u8,
    pub task_fulfillment: u8,
    pub fairness: u8,
}

impl Default for PriorityDefaults {
    fn default() -> Self {
        Self {
            priority_level: 50,
            task_fulfillment: 30,
            fairness: 20,
        }
    }
}

impl ConfigValidator for PriorityDefaults {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_percentage(self.priority_level, "priorities.priority_level")?;
        ValidationUtils::validate_percentage(self.task_fulfillment, "priorities.task_fulfillment")?;
        ValidationUtils::validate_percentage(self.fairness, "priorities.fairness")?;
        Ok(())
    }
}
