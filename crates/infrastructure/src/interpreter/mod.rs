pub mod openai;
pub mod scripted;

pub use openai::OpenAiInterpreter;
pub use scripted::ScriptedInterpreter;

use std::sync::Arc;

use alchemist_application::Interpreter;
use alchemist_config::{InterpreterConfig, InterpreterProvider};
use alchemist_errors::AlchemistResult;
use tracing::info;

/// 根据配置创建解释器
pub struct InterpreterFactory;

impl InterpreterFactory {
    pub fn create(config: &InterpreterConfig) -> AlchemistResult<Arc<dyn Interpreter>> {
        match config.provider {
            InterpreterProvider::OpenAi => {
                info!("使用OpenAI兼容解释器: {} ({})", config.endpoint, config.model);
                Ok(Arc::new(OpenAiInterpreter::from_config(config)?))
            }
            InterpreterProvider::Scripted => {
                info!("使用离线脚本化解释器");
                Ok(Arc::new(ScriptedInterpreter::new()))
            }
        }
    }
}
