//! Configuration issues reported instead of hard failures.
//!
//! Catalog and policy configuration is validated up front; problems are
//! returned as structured issues with a severity so the binary can decide
//! whether to refuse startup or merely warn.

/// Severity level of a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Fatal: the configuration cannot work at all.
    Error,
    /// Non-fatal: the configuration works but may not behave as expected.
    Warning,
}

/// Identifies a specific configuration issue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigIssueCode {
    /// An agent entry has an empty description; selection cannot use it.
    MissingDescription { agent: String },
    /// Two agent entries share a name; the later one wins.
    DuplicateAgent { agent: String },
    /// The configured default agent is not registered.
    UnknownDefaultAgent { agent: String },
    /// A repeatable-content pattern failed to compile.
    InvalidPattern { pattern: String },
    /// A recurring job schedule cannot produce a next fire time.
    UnschedulableJob { job: String },
    /// A field required by the entry's kind is absent.
    MissingField { entry: String, field: String },
    /// A string field holds a value outside its accepted set.
    InvalidEnumValue {
        field: String,
        value: String,
        valid_values: Vec<String>,
    },
}

/// A detected configuration issue.
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_severity() {
        let e = ConfigIssue::error(
            ConfigIssueCode::UnknownDefaultAgent {
                agent: "general".to_string(),
            },
            "missing",
        );
        assert!(e.is_error());

        let w = ConfigIssue::warning(
            ConfigIssueCode::DuplicateAgent {
                agent: "a".to_string(),
            },
            "dup",
        );
        assert!(!w.is_error());
        assert_eq!(w.message, "dup");
    }
}
