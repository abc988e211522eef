//! Immutable description of one verification test.

use itertools::Itertools;

use crate::diagnostics::{Diagnostic, Location};
use crate::severity::Severity;
use crate::text::{self, LinePositionSpanInfo, SpanParseError};

/// An extra document added to the test project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalFile {
    pub source: String,
    /// When set, the document's final text must equal this.
    pub expected_source: Option<String>,
}

impl AdditionalFile {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            expected_source: None,
        }
    }

    pub fn with_expected(source: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            expected_source: Some(expected.into()),
        }
    }
}

/// A diagnostic expected at one location, with its own id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDiagnostic {
    pub id: String,
    pub location: LinePositionSpanInfo,
    /// Document the diagnostic is reported in; `None` means the primary one.
    pub document: Option<String>,
    pub additional_locations: Vec<LinePositionSpanInfo>,
    /// Overrides [`TestState::diagnostic_message`] for this diagnostic.
    pub message: Option<String>,
}

impl ExpectedDiagnostic {
    pub fn new(id: impl Into<String>, location: LinePositionSpanInfo) -> Self {
        Self {
            id: id.into(),
            location,
            document: None,
            additional_locations: Vec::new(),
            message: None,
        }
    }

    #[must_use]
    pub fn in_document(mut self, name: impl Into<String>) -> Self {
        self.document = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_additional_locations(mut self, locations: Vec<LinePositionSpanInfo>) -> Self {
        self.additional_locations = locations;
        self
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Everything a single test asserts: the source under test, where the
/// diagnostics (or the refactoring span) are, and what the text should
/// look like afterwards.
///
/// Built once per test; the `with_*` methods return modified copies for
/// parameterized variants.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TestState {
    pub source: String,
    pub expected_source: Option<String>,
    pub spans: Vec<LinePositionSpanInfo>,
    pub additional_spans: Vec<LinePositionSpanInfo>,
    /// Id each span is expected to be reported with.
    pub diagnostic_id: Option<String>,
    /// Expectations beyond the spans, each carrying its own id.
    pub diagnostics: Vec<ExpectedDiagnostic>,
    pub diagnostic_message: Option<String>,
    pub additional_files: Vec<AdditionalFile>,
    pub equivalence_key: Option<String>,
    pub code_action_title: Option<String>,
    pub verify_additional_locations: bool,
}

impl TestState {
    /// A state over plain text with no spans.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// A state over annotated text; every `[|..|]` span becomes an expected
    /// location.
    pub fn from_annotated(annotated: &str, expected: Option<&str>) -> Result<Self, SpanParseError> {
        let parsed = text::parse(annotated)?;
        Ok(Self {
            source: parsed.text,
            expected_source: expected.map(str::to_string),
            spans: parsed.spans,
            ..Self::default()
        })
    }

    /// A state built by substituting `source_data` into the single span of
    /// `template`, see [`text::parse_and_replace`].
    pub fn from_template(
        template: &str,
        source_data: &str,
        expected_data: Option<&str>,
    ) -> Result<Self, SpanParseError> {
        let parsed = text::parse_and_replace(template, source_data, expected_data)?;
        Ok(Self {
            source: parsed.text,
            expected_source: parsed.expected,
            spans: parsed.spans,
            ..Self::default()
        })
    }

    /// Shorthand for an annotated state expecting `id` at every span.
    pub fn diagnostic(
        id: impl Into<String>,
        annotated: &str,
        expected: Option<&str>,
    ) -> Result<Self, SpanParseError> {
        Ok(Self::from_annotated(annotated, expected)?.with_diagnostic_id(id))
    }

    #[must_use]
    pub fn with_diagnostic_id(mut self, id: impl Into<String>) -> Self {
        self.diagnostic_id = Some(id.into());
        self
    }

    /// Expect one more diagnostic, independent of `spans` and `diagnostic_id`.
    #[must_use]
    pub fn with_expected_diagnostic(mut self, expected: ExpectedDiagnostic) -> Self {
        self.diagnostics.push(expected);
        self
    }

    /// Move every span into an expectation with the id at the same index.
    ///
    /// Extra spans keep expecting `diagnostic_id`; extra ids are ignored.
    #[must_use]
    pub fn with_span_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids = ids.into_iter();
        let mut rest = Vec::new();
        for info in std::mem::take(&mut self.spans) {
            match ids.next() {
                Some(id) => self.diagnostics.push(
                    ExpectedDiagnostic::new(id, info)
                        .with_additional_locations(self.additional_spans.clone()),
                ),
                None => rest.push(info),
            }
        }
        self.spans = rest;
        self
    }

    #[must_use]
    pub fn with_expected_source(mut self, expected: impl Into<String>) -> Self {
        self.expected_source = Some(expected.into());
        self
    }

    #[must_use]
    pub fn with_additional_file(mut self, file: AdditionalFile) -> Self {
        self.additional_files.push(file);
        self
    }

    #[must_use]
    pub fn with_additional_spans(mut self, spans: Vec<LinePositionSpanInfo>) -> Self {
        self.additional_spans = spans;
        self
    }

    #[must_use]
    pub fn with_equivalence_key(mut self, key: impl Into<String>) -> Self {
        self.equivalence_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_code_action_title(mut self, title: impl Into<String>) -> Self {
        self.code_action_title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_diagnostic_message(mut self, message: impl Into<String>) -> Self {
        self.diagnostic_message = Some(message.into());
        self
    }

    #[must_use]
    pub fn with_verify_additional_locations(mut self, verify: bool) -> Self {
        self.verify_additional_locations = verify;
        self
    }

    /// Ids this state expects to see reported, each once.
    pub fn expected_ids(&self) -> impl Iterator<Item = &str> {
        self.diagnostic_id
            .as_deref()
            .into_iter()
            .chain(self.diagnostics.iter().map(|d| d.id.as_str()))
            .unique()
    }

    /// Every expected diagnostic; those without a document are placed in
    /// the primary document `path`.
    ///
    /// Severity is not compared, so every expected diagnostic carries the
    /// default one.
    pub fn expected_diagnostics(&self, path: &str) -> Vec<Diagnostic> {
        let locate = |document: &str, info: &LinePositionSpanInfo| Location {
            path: document.to_string(),
            span: info.span,
            line_span: info.line_span,
        };
        let default_message = self.diagnostic_message.clone().unwrap_or_default();

        let mut expected = Vec::new();
        if let Some(id) = self.diagnostic_id.as_deref() {
            let additional: Vec<Location> =
                self.additional_spans.iter().map(|info| locate(path, info)).collect();
            expected.extend(self.spans.iter().map(|info| {
                Diagnostic::new(id, Severity::default(), locate(path, info), default_message.clone())
                    .with_additional_locations(additional.clone())
            }));
        }

        expected.extend(self.diagnostics.iter().map(|d| {
            let document = d.document.as_deref().unwrap_or(path);
            Diagnostic::new(
                d.id.as_str(),
                Severity::default(),
                locate(document, &d.location),
                d.message.clone().unwrap_or_else(|| default_message.clone()),
            )
            .with_additional_locations(
                d.additional_locations.iter().map(|info| locate(document, info)).collect(),
            )
        }));
        expected
    }
}
