use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use alchemist_api::{create_app, serve, AppState};
use alchemist_application::{
    CorrectionService, Interpreter, LoadSummary, RuleService, RulesConfig, SearchService, Session,
};
use alchemist_config::{AppConfig, PriorityDefaults};
use alchemist_domain::{Correction, PriorityWeights, Rule, Task, ValidationReport};
use alchemist_infrastructure::{read_upload, write_export, ExportSummary, InterpreterFactory};

/// `validate` 子命令的输出
#[derive(Debug, Serialize)]
pub struct ValidateOutput {
    pub loaded: Vec<LoadSummary>,
    pub report: ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggestions: Option<Vec<Correction>>,
}

/// 主应用程序
pub struct Application {
    config: AppConfig,
    interpreter: Arc<dyn Interpreter>,
}

fn initial_weights(defaults: &PriorityDefaults) -> PriorityWeights {
    PriorityWeights {
        priority_level: defaults.priority_level,
        task_fulfillment: defaults.task_fulfillment,
        fairness: defaults.fairness,
    }
}

impl Application {
    pub fn new(config: AppConfig) -> Result<Self> {
        let interpreter =
            InterpreterFactory::create(&config.interpreter).context("创建解释器失败")?;
        Ok(Self::with_interpreter(config, interpreter))
    }

    pub fn with_interpreter(config: AppConfig, interpreter: Arc<dyn Interpreter>) -> Self {
        info!("初始化应用程序，解释器: {}", interpreter.name());
        Self {
            config,
            interpreter,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    fn new_session(&self) -> Session {
        Session::new(initial_weights(&self.config.priorities))
    }

    /// 依次加载文件，实体种类由文件名推断；同一种类出现多次时后者替换前者
    fn load_files(&self, session: &mut Session, files: &[PathBuf]) -> Result<Vec<LoadSummary>> {
        files
            .iter()
            .map(|path| {
                let table = read_upload(path)
                    .with_context(|| format!("读取文件失败: {}", path.display()))?;
                let summary = session.load(table.kind, &table.records);
                info!(
                    "{} -> {}: 保留 {} 行, 丢弃 {} 行",
                    path.display(),
                    summary.entity,
                    summary.loaded,
                    summary.discarded
                );
                Ok(summary)
            })
            .collect()
    }

    pub async fn validate(&self, files: &[PathBuf], suggest: bool) -> Result<ValidateOutput> {
        let mut session = self.new_session();
        let loaded = self.load_files(&mut session, files)?;
        let report = session.validate();
        info!("校验完成: {} 条问题", report.findings.len());

        let suggestions = if suggest {
            let service = CorrectionService::new(self.interpreter.clone());
            Some(service.suggest(&report.findings).await)
        } else {
            None
        };

        Ok(ValidateOutput {
            loaded,
            report,
            suggestions,
        })
    }

    pub async fn rule(&self, text: &str, files: &[PathBuf]) -> Result<Rule> {
        let mut session = self.new_session();
        self.load_files(&mut session, files)?;

        let service = RuleService::new(self.interpreter.clone());
        let rule = service
            .add_from_text(&mut session, text)
            .await
            .context("无法把描述转换为规则")?;
        Ok(rule)
    }

    pub async fn search(&self, query: &str, files: &[PathBuf]) -> Result<Vec<Task>> {
        let mut session = self.new_session();
        self.load_files(&mut session, files)?;

        let service = SearchService::new(self.interpreter.clone());
        let tasks = service
            .search_tasks(&mut session, query)
            .await
            .context("无法解释搜索条件")?;
        Ok(tasks)
    }

    /// 归一化后导出；`rules` 为之前导出的规则文件，其中的规则和优先级一并写出
    pub fn export(
        &self,
        files: &[PathBuf],
        out: Option<&Path>,
        rules: Option<&Path>,
    ) -> Result<ExportSummary> {
        let mut session = self.new_session();
        self.load_files(&mut session, files)?;

        if let Some(path) = rules {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("读取规则文件失败: {}", path.display()))?;
            let config: RulesConfig = serde_json::from_str(&content)
                .with_context(|| format!("规则文件格式错误: {}", path.display()))?;
            session.import_rules(config);
        }

        let report = session.validate();
        if !report.is_clean() {
            warn!("导出的数据仍有 {} 条校验问题", report.findings.len());
        }

        let dir = out
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(&self.config.export.output_dir));
        let summary = write_export(&session.export_snapshot(), &self.config.export, &dir)
            .with_context(|| format!("导出失败: {}", dir.display()))?;
        Ok(summary)
    }

    /// 运行API服务器直到 `shutdown` 完成
    pub async fn serve<F>(&self, files: &[PathBuf], shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        if !self.config.api.enabled {
            return Err(anyhow::anyhow!("API服务被禁用，请检查配置"));
        }

        let mut session = self.new_session();
        if !files.is_empty() {
            self.load_files(&mut session, files)?;
            session.validate();
        }

        let state = AppState::new(session, self.interpreter.clone());
        let app = create_app(state, &self.config.api);
        serve(app, &self.config.api.bind_address, shutdown)
            .await
            .context("API服务器运行失败")?;
        Ok(())
    }
}
