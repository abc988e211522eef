use std::cmp::Ordering;
use std::fmt;

use itertools::Itertools;

use crate::severity::Severity;
use crate::text::{LineIndex, LinePositionSpan, TextSpan};

/// Static metadata describing one diagnostic an analyzer can report.
#[derive(Debug)]
pub struct DiagnosticDescriptor {
    pub id: &'static str,
    pub title: &'static str,
    /// Message template; `{0}`, `{1}`, … are replaced by report arguments.
    pub message_format: &'static str,
    pub category: &'static str,
    pub default_severity: Severity,
    pub enabled_by_default: bool,
}

impl DiagnosticDescriptor {
    /// Helper to create an enabled descriptor reported as a warning.
    pub const fn warning(
        id: &'static str,
        title: &'static str,
        message_format: &'static str,
        category: &'static str,
    ) -> Self {
        Self {
            id,
            title,
            message_format,
            category,
            default_severity: Severity::Warning,
            enabled_by_default: true,
        }
    }

    pub const fn disabled_by_default(mut self) -> Self {
        self.enabled_by_default = false;
        self
    }

    pub const fn with_severity(mut self, severity: Severity) -> Self {
        self.default_severity = severity;
        self
    }

    pub fn format_message(&self, args: &[&str]) -> String {
        let mut message = self.message_format.to_string();
        for (i, arg) in args.iter().enumerate() {
            message = message.replace(&format!("{{{i}}}"), arg);
        }
        message
    }
}

/// A position in a named document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    pub path: String,
    pub span: TextSpan,
    pub line_span: LinePositionSpan,
}

impl Location {
    pub fn new(path: impl Into<String>, span: TextSpan, lines: &LineIndex) -> Self {
        Self {
            path: path.into(),
            span,
            line_span: lines.line_span(span),
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self.line_span.start;
        write!(f, "{}({},{})", self.path, start.line + 1, start.column + 1)
    }
}

/// A single finding reported by an analyzer or the compiler.
///
/// Equality is deep: id, severity, every location and the message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[must_use]
pub struct Diagnostic {
    pub id: String,
    pub severity: Severity,
    pub location: Location,
    pub additional_locations: Vec<Location>,
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        id: impl Into<String>,
        severity: Severity,
        location: Location,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            severity,
            location,
            additional_locations: Vec::new(),
            message: message.into(),
        }
    }

    pub fn from_descriptor(
        descriptor: &DiagnosticDescriptor,
        severity: Severity,
        location: Location,
        args: &[&str],
    ) -> Self {
        Self::new(descriptor.id, severity, location, descriptor.format_message(args))
    }

    #[must_use]
    pub fn with_additional_locations(mut self, locations: Vec<Location>) -> Self {
        self.additional_locations = locations;
        self
    }

    pub fn span(&self) -> TextSpan {
        self.location.span
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} {}: {}",
            self.location,
            self.severity.as_str(),
            self.id,
            self.message
        )
    }
}

/// Canonical order: start position ascending, then id.
pub fn canonical_order(a: &Diagnostic, b: &Diagnostic) -> Ordering {
    a.location
        .span
        .start
        .cmp(&b.location.span.start)
        .then_with(|| a.id.cmp(&b.id))
}

pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(canonical_order);
}

/// One diagnostic per line, used in failure messages.
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("  {d}"))
        .join("\n")
}
