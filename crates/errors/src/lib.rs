use thiserror::Error;

#[derive(Debug, Error)]
pub enum AlchemistError {
    #[error("配置错误: {0}")]
    Configuration(String),
    #[error("序列化错误: {0}")]
    Serialization(String),
    #[error("上传文件无法读取: {0}")]
    Upload(String),
    #[error("解释器调用失败: {0}")]
    InterpreterFailure(String),
    #[error("解释器返回内容无效: {reason} (原始内容: {raw})")]
    InterpreterResponse { reason: String, raw: String },
    #[error("行不存在: {entity} 第 {row} 行")]
    RowNotFound { entity: String, row: usize },
    #[error("未知字段: {entity}.{field}")]
    UnknownField { entity: String, field: String },
    #[error("字段值无效: {field} - {reason}")]
    InvalidFieldValue { field: String, reason: String },
    #[error("无效的规则: {0}")]
    InvalidRule(String),
    #[error("无效的优先级权重: {0}")]
    InvalidPriority(String),
    #[error("IO错误: {0}")]
    Io(String),
    #[error("内部错误: {0}")]
    Internal(String),
}

pub type AlchemistResult<T> = Result<T, AlchemistError>;

impl AlchemistError {
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn upload<S: Into<String>>(msg: S) -> Self {
        Self::Upload(msg.into())
    }
    pub fn interpreter_failure<S: Into<String>>(msg: S) -> Self {
        Self::InterpreterFailure(msg.into())
    }
    pub fn interpreter_response<R: Into<String>, S: Into<String>>(reason: R, raw: S) -> Self {
        Self::InterpreterResponse {
            reason: reason.into(),
            raw: raw.into(),
        }
    }
    pub fn row_not_found<S: Into<String>>(entity: S, row: usize) -> Self {
        Self::RowNotFound {
            entity: entity.into(),
            row,
        }
    }
    pub fn unknown_field<E: Into<String>, F: Into<String>>(entity: E, field: F) -> Self {
        Self::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }
    pub fn invalid_value<F: Into<String>, R: Into<String>>(field: F, reason: R) -> Self {
        Self::InvalidFieldValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
    pub fn invalid_rule<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRule(msg.into())
    }
    pub fn invalid_priority<S: Into<String>>(msg: S) -> Self {
        Self::InvalidPriority(msg.into())
    }
    /// 用户可见但不改变任何状态的失败：解释器、规则、纠正相关
    pub fn is_soft_failure(&self) -> bool {
        matches!(
            self,
            AlchemistError::InterpreterFailure(_)
                | AlchemistError::InterpreterResponse { .. }
                | AlchemistError::InvalidRule(_)
                | AlchemistError::InvalidFieldValue { .. }
                | AlchemistError::UnknownField { .. }
                | AlchemistError::InvalidPriority(_)
        )
    }
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            AlchemistError::Internal(_) | AlchemistError::Configuration(_)
        )
    }
    pub fn user_message(&self) -> &str {
        match self {
            AlchemistError::Upload(_) => "上传的文件无法解析，数据未更新",
            AlchemistError::InterpreterFailure(_) => "AI解释服务暂时不可用，请稍后重试",
            AlchemistError::InterpreterResponse { .. } => "AI返回的内容无法识别，未做任何修改",
            AlchemistError::RowNotFound { .. } => "请求的数据行不存在",
            AlchemistError::UnknownField { .. } => "请求的字段不存在",
            AlchemistError::InvalidFieldValue { .. } => "字段值格式有误",
            AlchemistError::InvalidRule(_) => "规则定义有误",
            AlchemistError::InvalidPriority(_) => "优先级权重必须在0到100之间",
            _ => "系统繁忙，请稍后重试",
        }
    }
}

impl From<serde_json::Error> for AlchemistError {
    fn from(err: serde_json::Error) -> Self {
        AlchemistError::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for AlchemistError {
    fn from(err: std::io::Error) -> Self {
        AlchemistError::Io(err.to_string())
    }
}

impl From<anyhow::Error> for AlchemistError {
    fn from(err: anyhow::Error) -> Self {
        AlchemistError::Internal(err.to_string())
    }
}
