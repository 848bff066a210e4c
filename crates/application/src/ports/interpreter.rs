use async_trait::async_trait;
use alchemist_errors::AlchemistResult;

/// 外部自然语言解释器
///
/// 输入一段自然语言指令，返回应当可以解析为JSON的文本。
/// 返回内容不可信，调用方必须按 `interpretation` 模块的方式防御性解析。
#[async_trait]
pub trait Interpreter: Send + Sync {
    /// 解释一段提示词
    ///
    /// # Returns
    /// * `AlchemistResult<String>` - 解释器的原始输出；传输失败返回 `InterpreterFailure`
    async fn interpret(&self, prompt: &str) -> AlchemistResult<String>;

    /// 用于日志的实现名称
    fn name(&self) -> &'static str;
}
