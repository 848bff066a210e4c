use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use alchemist_domain::{Correction, Finding};

use crate::interpretation::parse_correction;
use crate::ports::Interpreter;
use crate::prompts::correction_prompt;

/// 纠正建议服务 - 为每条校验结果并发请求解释器给出单字段修改建议
///
/// 建议只返回给调用方展示，从不自动应用。
pub struct CorrectionService {
    interpreter: Arc<dyn Interpreter>,
}

impl CorrectionService {
    pub fn new(interpreter: Arc<dyn Interpreter>) -> Self {
        Self { interpreter }
    }

    /// 并发请求全部建议，单条失败或无法解析时丢弃该条，不影响其他
    #[instrument(skip_all, fields(
        finding_count = findings.len(),
        interpreter = self.interpreter.name(),
    ))]
    pub async fn suggest(&self, findings: &[Finding]) -> Vec<Correction> {
        if findings.is_empty() {
            return Vec::new();
        }

        let requests = findings.iter().map(|finding| async move {
            let prompt = correction_prompt(finding);
            let raw = match self.interpreter.interpret(&prompt).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(
                        "获取纠正建议失败 ({} 第 {} 行): {}",
                        finding.entity, finding.row, e
                    );
                    return None;
                }
            };
            match parse_correction(&raw) {
                Ok(correction) => Some(correction),
                Err(e) => {
                    debug!("丢弃无法解析的纠正建议: {}", e);
                    None
                }
            }
        });

        let corrections: Vec<Correction> =
            join_all(requests).await.into_iter().flatten().collect();

        info!(
            "纠正建议完成: {} 条问题，{} 条可用建议",
            findings.len(),
            corrections.len()
        );
        corrections
    }
}
