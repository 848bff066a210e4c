//! 解释器的内存mock
//!
//! 按提示词中包含的子串匹配预设回复，未命中时返回兜底回复（默认 `{}`），
//! 并记录收到的所有提示词。可以挂一个闸门，让每次调用停在解释器里，
//! 直到测试放行。

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;
use alchemist_application::Interpreter;
use alchemist_errors::{AlchemistError, AlchemistResult};

#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Failure(String),
}

impl MockReply {
    fn resolve(&self) -> AlchemistResult<String> {
        match self {
            MockReply::Text(text) => Ok(text.clone()),
            MockReply::Failure(message) => Err(AlchemistError::interpreter_failure(message.clone())),
        }
    }
}

#[derive(Debug, Default)]
struct GateSignals {
    entered: Notify,
    release: Notify,
}

/// 控制被闸住的解释器调用
#[derive(Debug, Clone)]
pub struct InterpreterGate(Arc<GateSignals>);

impl InterpreterGate {
    /// 等到有一次调用进入解释器
    pub async fn entered(&self) {
        self.0.entered.notified().await;
    }

    /// 放行一次调用
    pub fn release(&self) {
        self.0.release.notify_one();
    }
}

#[derive(Debug, Clone)]
pub struct MockInterpreter {
    replies: Arc<Mutex<Vec<(String, MockReply)>>>,
    fallback: Arc<Mutex<MockReply>>,
    prompts: Arc<Mutex<Vec<String>>>,
    gate: Option<Arc<GateSignals>>,
}

impl MockInterpreter {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            fallback: Arc::new(Mutex::new(MockReply::Text("{}".to_string()))),
            prompts: Arc::new(Mutex::new(Vec::new())),
            gate: None,
        }
    }

    /// 每次调用都停在解释器里，直到 `InterpreterGate::release`
    pub fn gated(mut self) -> (Self, InterpreterGate) {
        let signals = Arc::new(GateSignals::default());
        self.gate = Some(signals.clone());
        (self, InterpreterGate(signals))
    }

    /// 所有请求都失败
    pub fn failing(message: &str) -> Self {
        let mock = Self::new();
        *mock.fallback.lock().unwrap() = MockReply::Failure(message.to_string());
        mock
    }

    pub fn with_reply(self, needle: &str, reply: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push((needle.to_string(), MockReply::Text(reply.to_string())));
        self
    }

    pub fn with_failure(self, needle: &str, message: &str) -> Self {
        self.replies
            .lock()
            .unwrap()
            .push((needle.to_string(), MockReply::Failure(message.to_string())));
        self
    }

    pub fn with_fallback(self, reply: &str) -> Self {
        *self.fallback.lock().unwrap() = MockReply::Text(reply.to_string());
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

impl Default for MockInterpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Interpreter for MockInterpreter {
    async fn interpret(&self, prompt: &str) -> AlchemistResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        let reply = self
            .replies
            .lock()
            .unwrap()
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, reply)| reply.clone())
            .unwrap_or_else(|| self.fallback.lock().unwrap().clone());

        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        reply.resolve()
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
