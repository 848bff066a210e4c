use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use alchemist_application::Interpreter;
use alchemist_config::InterpreterConfig;
use alchemist_errors::{AlchemistError, AlchemistResult};

/// 调用兼容 OpenAI chat completions 的HTTP接口
pub struct OpenAiInterpreter {
    endpoint: String,
    model: String,
    api_key: Option<String>,
    system_prompt: String,
    http_client: reqwest::Client,
}

impl OpenAiInterpreter {
    pub fn from_config(config: &InterpreterConfig) -> AlchemistResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| AlchemistError::config_error(format!("无法创建HTTP客户端: {e}")))?;

        let api_key = config.api_key();
        if api_key.is_none() {
            warn!("环境变量 {} 未设置，请求将不带认证信息", config.api_key_env);
        }

        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key,
            system_prompt: config.system_prompt.clone(),
            http_client,
        })
    }

    fn request_body(&self, prompt: &str) -> Value {
        json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": self.system_prompt },
                { "role": "user", "content": prompt }
            ]
        })
    }

    /// 取 `choices[0].message.content`，缺失时按空串处理
    fn extract_content(body: &Value) -> String {
        body.pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl Interpreter for OpenAiInterpreter {
    async fn interpret(&self, prompt: &str) -> AlchemistResult<String> {
        let mut request = self
            .http_client
            .post(&self.endpoint)
            .json(&self.request_body(prompt));
        if let Some(api_key) = &self.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(|e| {
            error!("无法连接解释器服务: {}", e);
            AlchemistError::interpreter_failure(format!("连接失败: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("解释器服务返回错误: HTTP {} - {}", status, body);
            return Err(AlchemistError::interpreter_failure(format!(
                "HTTP {status} - {body}"
            )));
        }

        let body: Value = response.json().await.map_err(|e| {
            AlchemistError::interpreter_failure(format!("响应不是合法的JSON: {e}"))
        })?;

        let content = Self::extract_content(&body);
        debug!("解释器返回 {} 字节", content.len());
        Ok(content)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
