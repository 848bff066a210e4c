//! # 领域模型
//!
//! 三张互相关联的实体表（客户、Worker、任务）、归一化策略、校验规则，
//! 以及用户定义的分配规则。此crate不做任何IO，所有操作都是同步的纯计算。

pub mod entities;
pub mod normalizer;
pub mod rules;
pub mod task_filter;
pub mod validation;
pub mod value_objects;

pub use alchemist_errors::{AlchemistError, AlchemistResult};
pub use entities::*;
pub use normalizer::{normalize, NormalizedBatch, RawRecord};
pub use rules::{OverrideScope, Rule, RuleDraft, RuleKind, RuleSet};
pub use task_filter::TaskFilter;
pub use validation::validate_all;
pub use value_objects::*;
