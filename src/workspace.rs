//! In-memory project model: options, documents, and materialization of a
//! [`TestState`] into a project.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::diagnostics::DiagnosticDescriptor;
use crate::severity::{ReportDiagnostic, Severity};
use crate::state::TestState;

pub const PROJECT_NAME: &str = "TestProject";

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParseOptions {
    /// Language version label, e.g. `latest` or `7.3`.
    pub language_version: String,
    pub preprocessor_symbols: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompilationOptions {
    /// Per-id severity overrides, applied to analyzer and compiler diagnostics.
    pub specific_diagnostic_options: BTreeMap<String, ReportDiagnostic>,
    pub nullable_reference_types: bool,
    pub allow_unsafe: bool,
}

/// Fixed configuration every test project in a verifier is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectOptions {
    pub language: String,
    pub document_name: String,
    pub parse: ParseOptions,
    pub compilation: CompilationOptions,
    pub references: Vec<String>,
    /// Compiler diagnostics at or below this severity never fail a test.
    pub allowed_compiler_severity: Severity,
    /// Compiler diagnostic ids that never fail a test.
    pub allowed_compiler_ids: BTreeSet<String>,
}

impl ProjectOptions {
    pub fn new(language: impl Into<String>, document_name: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            document_name: document_name.into(),
            parse: ParseOptions::default(),
            compilation: CompilationOptions::default(),
            references: Vec::new(),
            allowed_compiler_severity: Severity::Info,
            allowed_compiler_ids: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_language_version(mut self, version: impl Into<String>) -> Self {
        self.parse.language_version = version.into();
        self
    }

    #[must_use]
    pub fn with_preprocessor_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parse.preprocessor_symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_nullable_reference_types(mut self, enabled: bool) -> Self {
        self.compilation.nullable_reference_types = enabled;
        self
    }

    #[must_use]
    pub fn with_diagnostic_option(mut self, id: impl Into<String>, report: ReportDiagnostic) -> Self {
        self.compilation
            .specific_diagnostic_options
            .insert(id.into(), report);
        self
    }

    #[must_use]
    pub fn with_allow_unsafe(mut self, enabled: bool) -> Self {
        self.compilation.allow_unsafe = enabled;
        self
    }

    /// Report `descriptor` at its default severity even if it is disabled by default.
    #[must_use]
    pub fn enable_diagnostic(self, descriptor: &DiagnosticDescriptor) -> Self {
        let report = match descriptor.default_severity {
            Severity::Hidden => ReportDiagnostic::Hidden,
            Severity::Info => ReportDiagnostic::Info,
            Severity::Warning => ReportDiagnostic::Warning,
            Severity::Error => ReportDiagnostic::Error,
        };
        self.with_diagnostic_option(descriptor.id, report)
    }

    #[must_use]
    pub fn disable_diagnostic(self, descriptor: &DiagnosticDescriptor) -> Self {
        self.with_diagnostic_option(descriptor.id, ReportDiagnostic::Suppress)
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.references.push(reference.into());
        self
    }

    #[must_use]
    pub fn with_allowed_compiler_severity(mut self, severity: Severity) -> Self {
        self.allowed_compiler_severity = severity;
        self
    }

    #[must_use]
    pub fn with_allowed_compiler_ids<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_compiler_ids.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn report_for(&self, id: &str) -> ReportDiagnostic {
        self.compilation
            .specific_diagnostic_options
            .get(id)
            .copied()
            .unwrap_or(ReportDiagnostic::Default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocumentId(usize);

impl DocumentId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub text: String,
}

/// Immutable snapshot of a project. Changing a document yields a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub name: String,
    options: Arc<ProjectOptions>,
    documents: Vec<Document>,
}

impl Project {
    pub fn new(options: Arc<ProjectOptions>) -> Self {
        Self {
            name: PROJECT_NAME.to_string(),
            options,
            documents: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_document(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        let id = DocumentId(self.documents.len());
        self.documents.push(Document {
            id,
            name: name.into(),
            text: text.into(),
        });
        self
    }

    /// A copy of this project with the text of `id` replaced.
    /// Unknown ids leave the project unchanged.
    #[must_use]
    pub fn with_document_text(&self, id: DocumentId, text: impl Into<String>) -> Self {
        let mut next = self.clone();
        if let Some(doc) = next.documents.get_mut(id.0) {
            doc.text = text.into();
        }
        next
    }

    pub fn options(&self) -> &ProjectOptions {
        &self.options
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0)
    }

    pub fn document_by_name(&self, name: &str) -> Option<&Document> {
        self.documents.iter().find(|d| d.name == name)
    }
}

/// An auxiliary document whose final text must match `expected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDocument {
    pub id: DocumentId,
    pub expected: String,
}

#[derive(Debug, Clone)]
pub struct Materialized {
    pub project: Project,
    pub primary: DocumentId,
    pub expected_documents: Vec<ExpectedDocument>,
}

impl Materialized {
    pub fn primary_document(&self) -> &Document {
        // The primary document is always the first one added.
        &self.project.documents[self.primary.0]
    }
}

/// Build the test project for `state`: the primary document followed by
/// one document per additional file (`Test2.cs`, `Test3.cs`, …).
pub fn materialize(state: &TestState, options: Arc<ProjectOptions>) -> Materialized {
    let document_name = options.document_name.clone();
    let mut project = Project::new(options).with_document(&document_name, &state.source);
    let primary = DocumentId(0);

    let mut expected_documents = Vec::new();
    for (i, file) in state.additional_files.iter().enumerate() {
        let name = append_number_to_file_name(&document_name, i + 2);
        project = project.with_document(name, &file.source);
        if let Some(expected) = &file.expected_source {
            expected_documents.push(ExpectedDocument {
                id: DocumentId(i + 1),
                expected: expected.clone(),
            });
        }
    }

    Materialized {
        project,
        primary,
        expected_documents,
    }
}

/// Insert `number` before the extension: `Test.cs` becomes `Test2.cs`.
pub fn append_number_to_file_name(file_name: &str, number: usize) -> String {
    match file_name.rfind('.') {
        Some(dot) => format!("{}{number}{}", &file_name[..dot], &file_name[dot..]),
        None => format!("{file_name}{number}"),
    }
}
