//! # 应用层
//!
//! 会话状态（三张实体表、校验结果、规则、优先级、待处理的纠正建议）
//! 以及依赖外部解释器的用例：纠正建议、自然语言规则、自然语言任务搜索。

pub mod interpretation;
pub mod ports;
pub mod prompts;
pub mod session;
pub mod use_cases;

pub use ports::*;
pub use session::{ExportBundle, LoadSummary, RulesConfig, Session};
pub use use_cases::*;
