use crate::ConfigResult;

/// Trait for configuration validation
pub trait ConfigValidator {
    fn validate(&self) -> ConfigResult<()>;
}

/// General validation utilities
pub struct ValidationUtils;

impl ValidationUtils {
    /// Validate that a string is not empty
    pub fn validate_not_empty(value: &str, field_name: &str) -> ConfigResult<()> {
        if value.trim().is_empty() {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} cannot be empty"
            )));
        }
        Ok(())
    }

    /// Validate that a timeout is reasonable
    pub fn validate_timeout_seconds(timeout_seconds: u64, field_name: &str) -> ConfigResult<()> {
        if timeout_seconds == 0 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be greater than 0"
            )));
        }
        if timeout_seconds > 3600 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be less than or equal to 3600"
            )));
        }
        Ok(())
    }

    /// Validate a percentage weight (0-100 inclusive)
    pub fn validate_percentage(value: u8, field_name: &str) -> ConfigResult<()> {
        if value > 100 {
            return Err(crate::ConfigError::Validation(format!(
                "{field_name} must be between 0 and 100, got {value}"
            )));
        }
        Ok(())
    }

    /// Validate that a URL parses and carries an http(s) scheme
    pub fn validate_url(value: &str, field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(value, field_name)?;
        let parsed = url::Url::parse(value)?;
        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(crate::ConfigError::Validation(format!(
                "{field_name} must use http or https, got {other}"
            ))),
        }
    }

    /// Validate a socket address of the form host:port
    pub fn validate_bind_address(value: &str, field_name: &str) -> ConfigResult<()> {
        Self::validate_not_empty(value, field_name)?;
        match value.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() => match port.parse::<u16>() {
                Ok(0) | Err(_) => Err(crate::ConfigError::Validation(format!(
                    "{field_name} has an invalid port: {port}"
                ))),
                Ok(_) => Ok(()),
            },
            _ => Err(crate::ConfigError::Validation(format!(
                "{field_name} must be in host:port form"
            ))),
        }
    }
}
