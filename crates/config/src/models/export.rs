use crate::validation::{ConfigValidator, ValidationUtils};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub output_dir: String,
    pub clients_file: String,
    pub workers_file: String,
    pub tasks_file: String,
    pub rules_file: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: "export".to_string(),
            clients_file: "clients.csv".to_string(),
            workers_file: "workers.csv".to_string(),
            tasks_file: "tasks.csv".to_string(),
            rules_file: "rules.json".to_string(),
        }
    }
}

impl ConfigValidator for ExportConfig {
    fn validate(&self) -> crate::ConfigResult<()> {
        ValidationUtils::validate_not_empty(&self.output_dir, "export.output_dir")?;
        ValidationUtils::validate_not_empty(&self.clients_file, "export.clients_file")?;
        ValidationUtils::validate_not_empty(&self.workers_file, "export.workers_file")?;
        ValidationUtils::validate_not_empty(&self.tasks_file, "export.tasks_file")?;
        ValidationUtils::validate_not_empty(&self.rules_file, "export.rules_file")?;

        let names = [
            &self.clients_file,
            &self.workers_file,
            &self.tasks_file,
            &self.rules_file,
        ];
        for (i, name) in names.iter().enumerate() {
            if names[i + 1..].contains(name) {
                return Err(crate::ConfigError::Validation(format!(
                    "export file names must be distinct, {name} is used twice"
                )));
            }
        }

        Ok(())
    }
}
