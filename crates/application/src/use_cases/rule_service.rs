use std::sync::Arc;

use tracing::{info, instrument, warn};

use alchemist_domain::{Rule, RuleDraft};
use alchemist_errors::AlchemistResult;

use crate::interpretation::parse_rule;
use crate::ports::Interpreter;
use crate::prompts::rule_prompt;
use crate::session::Session;

/// 规则服务 - 结构化表单和自然语言两种方式添加规则
pub struct RuleService {
    interpreter: Arc<dyn Interpreter>,
}

impl RuleService {
    pub fn new(interpreter: Arc<dyn Interpreter>) -> Self {
        Self { interpreter }
    }

    pub fn add_structured(
        &self,
        session: &mut Session,
        draft: &RuleDraft,
    ) -> AlchemistResult<Rule> {
        let rule = draft.build()?;
        session.add_rule(rule.clone());
        Ok(rule)
    }

    /// 在持有会话时调用，用三张表的当前快照构造提示词
    pub fn build_prompt(&self, session: &Session, text: &str) -> AlchemistResult<String> {
        rule_prompt(text, &session.data_context())
    }

    /// 只有返回内容带有可识别的 `type` 时才得到规则；不访问会话
    #[instrument(skip_all, fields(interpreter = self.interpreter.name()))]
    pub async fn interpret(&self, prompt: &str) -> AlchemistResult<Rule> {
        let raw = self.interpreter.interpret(prompt).await?;

        let rule = parse_rule(&raw).inspect_err(|e| {
            warn!("解释器返回的规则无效: {}", e);
        })?;
        info!("自然语言规则解释为: {}", rule);
        Ok(rule)
    }

    /// 把自然语言规则连同三张表的当前快照发给解释器，成功后追加到会话
    pub async fn add_from_text(&self, session: &mut Session, text: &str) -> AlchemistResult<Rule> {
        let prompt = self.build_prompt(session, text)?;
        let rule = self.interpret(&prompt).await?;
        session.add_rule(rule.clone());
        Ok(rule)
    }
}
