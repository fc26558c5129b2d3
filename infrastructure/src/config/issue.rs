//! Structured configuration issues.
//!
//! [`FileConfig::validate`](super::FileConfig::validate) collects every
//! problem it finds instead of stopping at the first one. Errors abort
//! start-up; warnings are logged and the fallback value is used.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: a fallback value is used.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    EmptyModelName,
    ZeroMaxTokens,
    TemperatureOutOfRange,
    UnknownModelContext { model: String },
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
    MissingStorageDir,
    ZeroRequestTimeout,
}

/// A detected issue in the configuration.
#[derive(Debug, Clone)]
pub struct ConfigIssue {
    pub severity: Severity,
    pub code: ConfigIssueCode,
    pub message: String,
}

impl ConfigIssue {
    pub fn error(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
        }
    }

    pub fn warning(code: ConfigIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}
