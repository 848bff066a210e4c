use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

/// 默认的系统提示词：约束解释器只返回三种JSON形状之一
pub const DEFAULT_SYSTEM_PROMPT: &str = r#"You are an AI assistant for a resource allocation configurator.
For data filtering, return JSON like: { entity: "tasks", filter: { Duration: ">2", PreferredPhases: "includes 3" } }
For rule creation, return JSON like: { type: "coRun", tasks: ["T1", "T2"] } or { type: "slotRestriction", group: "GroupA", minCommonSlots: 2 }
For data correction, return JSON like: { entity: "clients", row: 0, field: "AttributesJSON", suggestedValue: "{\"budget\":100000}" }"#;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum InterpreterProvider {
    /// 调用兼容 OpenAI chat completions 的HTTP接口
    #[serde(rename = "openai")]
    OpenAi,
    /// 离线的脚本化解释器，用于演示和测试
    #[default]
    Scripted,
}

impl std::str::FromStr for InterpreterProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(InterpreterProvider::OpenAi),
            "scripted" => Ok(InterpreterProvider::Scripted),
            _ => Err(format!(
                "Invalid interpreter provider: {s}. Valid providers: openai, scripted"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpreterConfig {
    pub provider: InterpreterProvider,
    pub endpoint: String,
    pub model: String,
    /// 保存API密钥的环境变量名，密钥本身不写入配置文件
    pub api_key_env: String,
    pub request_timeout_seconds: u64,
    pub system_prompt: String,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            provider: InterpreterProvider::Scripted,
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            request_timeout_seconds: 60,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl InterpreterConfig {
    /// 从环境变量读取API密钥
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl ConfigValidator for InterpreterConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_timeout_seconds(
            self.request_timeout_seconds,
            "interpreter.request_timeout_seconds",
        )?;
        ValidationUtils::validate_not_empty(&self.system_prompt, "interpreter.system_prompt")?;

        if self.provider == InterpreterProvider::OpenAi {
            ValidationUtils::validate_url(&self.endpoint, "interpreter.endpoint")?;
            ValidationUtils::validate_not_empty(&self.model, "interpreter.model")?;
            ValidationUtils::validate_not_empty(&self.api_key_env, "interpreter.api_key_env")?;
        }

        Ok(())
    }
}
