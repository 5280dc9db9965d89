//! Validation issues and the report that collects them

use serde::{Deserialize, Serialize};

use crate::validator::ValidationCheck;

/// How serious an issue is
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Blocking,
    Error,
    Warning,
}

impl Severity {
    /// BLOCKING and ERROR both make a report invalid
    pub fn is_blocking(&self) -> bool {
        matches!(self, Self::Blocking | Self::Error)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Blocking => "BLOCKING",
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single finding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Stable code, `PRD-001` to `PRD-014`
    pub code: String,
    pub check: ValidationCheck,
    pub severity: Severity,
    pub message: String,
    /// Structured context (service names, entity names, cycle path, ...)
    #[serde(default)]
    pub details: serde_json::Value,
}

impl Issue {
    pub fn new(check: ValidationCheck, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code: check.code().to_string(),
            check,
            severity,
            message: message.into(),
            details: serde_json::Value::Null,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Everything the validator found, in check order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueReport {
    pub issues: Vec<Issue>,
    /// Checks that could not complete and were skipped
    #[serde(default)]
    pub skipped_checks: Vec<ValidationCheck>,
}

impl IssueReport {
    /// Valid iff there are no BLOCKING or ERROR issues
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity.is_blocking())
    }

    pub fn blocking(&self) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity.is_blocking())
            .collect()
    }

    pub fn warnings(&self) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|i| i.severity == Severity::Warning)
            .collect()
    }

    pub fn by_code(&self, code: &str) -> Vec<&Issue> {
        self.issues.iter().filter(|i| i.code == code).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    /// Plain-string rendering: `ERROR: ...` for blocking issues, `WARNING: ...` otherwise
    pub fn to_plain_strings(&self) -> Vec<String> {
        self.issues
            .iter()
            .map(|i| {
                let prefix = if i.severity.is_blocking() {
                    "ERROR"
                } else {
                    "WARNING"
                };
                format!("{}: {}", prefix, i.message)
            })
            .collect()
    }
}

impl std::fmt::Display for IssueReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let status = if self.is_valid() { "VALID" } else { "INVALID" };
        writeln!(
            f,
            "Validation: {} ({} blocking, {} warnings)",
            status,
            self.blocking().len(),
            self.warnings().len()
        )?;
        for issue in &self.issues {
            writeln!(f, "  [{}] {} {}", issue.severity, issue.code, issue.message)?;
        }
        for check in &self.skipped_checks {
            writeln!(f, "  [SKIPPED] {} {}", check.code(), check.name())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> IssueReport {
        IssueReport {
            issues: vec![
                Issue::new(ValidationCheck::EmptyEntity, Severity::Warning, "Entity 'Tag' has no fields"),
                Issue::new(
                    ValidationCheck::DuplicateServiceName,
                    Severity::Error,
                    "Service name 'orders' is used 2 times",
                ),
                Issue::new(
                    ValidationCheck::MissingContractProvider,
                    Severity::Blocking,
                    "Service 'orders' consumes 'billing-api' which no service provides",
                ),
            ],
            skipped_checks: Vec::new(),
        }
    }

    #[test]
    fn test_validity() {
        assert!(!report().is_valid());
        assert!(IssueReport::default().is_valid());

        let warnings_only = IssueReport {
            issues: vec![Issue::new(ValidationCheck::TooFewServices, Severity::Warning, "x")],
            skipped_checks: Vec::new(),
        };
        assert!(warnings_only.is_valid());
    }

    #[test]
    fn test_filters() {
        let report = report();
        assert_eq!(report.blocking().len(), 2);
        assert_eq!(report.warnings().len(), 1);
        assert_eq!(report.by_code("PRD-011").len(), 1);
        assert_eq!(report.by_code("PRD-006")[0].check, ValidationCheck::EmptyEntity);
    }

    #[test]
    fn test_plain_strings() {
        assert_eq!(
            report().to_plain_strings(),
            vec![
                "WARNING: Entity 'Tag' has no fields",
                "ERROR: Service name 'orders' is used 2 times",
                "ERROR: Service 'orders' consumes 'billing-api' which no service provides",
            ]
        );
    }

    #[test]
    fn test_severity_serialization() {
        let json = serde_json::to_string(&Severity::Blocking).unwrap();
        assert_eq!(json, "\"BLOCKING\"");
        let issue = serde_json::to_value(&report().issues[1]).unwrap();
        assert_eq!(issue["severity"], "ERROR");
        assert_eq!(issue["code"], "PRD-011");
        assert_eq!(issue["check"], "duplicate_service_name");
    }

    #[test]
    fn test_display() {
        let rendered = report().to_string();
        assert!(rendered.starts_with("Validation: INVALID (2 blocking, 1 warnings)\n"));
        assert!(rendered.contains("[BLOCKING] PRD-003"));
    }
}
