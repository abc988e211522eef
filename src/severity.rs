use serde::{Deserialize, Serialize};

/// Severity of a reported diagnostic, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Hidden,
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Hidden => "hidden",
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::Warning
    }
}

/// Per-diagnostic override configured on a project.
///
/// `Default` keeps the descriptor's own severity and enablement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportDiagnostic {
    Default,
    Suppress,
    Hidden,
    Info,
    Warning,
    Error,
}

impl ReportDiagnostic {
    /// Severity to report with, or `None` when the diagnostic is suppressed.
    pub fn apply(self, default: Severity, enabled_by_default: bool) -> Option<Severity> {
        match self {
            ReportDiagnostic::Default => enabled_by_default.then_some(default),
            ReportDiagnostic::Suppress => None,
            ReportDiagnostic::Hidden => Some(Severity::Hidden),
            ReportDiagnostic::Info => Some(Severity::Info),
            ReportDiagnostic::Warning => Some(Severity::Warning),
            ReportDiagnostic::Error => Some(Severity::Error),
        }
    }
}
