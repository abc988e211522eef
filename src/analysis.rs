//! Analyzer seam and the runner that collects analyzer diagnostics for a
//! compilation.

use std::collections::HashSet;
use std::sync::Arc;

use tree_sitter::Tree;

use crate::compiler::Compilation;
use crate::diagnostics::{Diagnostic, DiagnosticDescriptor, Location, sort_diagnostics};
use crate::text::{LineIndex, TextSpan};
use crate::workspace::{Document, ProjectOptions};

/// A diagnostic analyzer that inspects one document at a time.
pub trait Analyzer: Send + Sync {
    fn supported_diagnostics(&self) -> &[&'static DiagnosticDescriptor];

    /// `tree` is `None` when the compiler does not produce syntax trees.
    fn analyze(&self, document: &Document, tree: Option<&Tree>, ctx: &mut AnalysisContext<'_>);

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

/// Collects diagnostics reported while analyzing one document.
pub struct AnalysisContext<'a> {
    document: &'a Document,
    lines: LineIndex,
    options: &'a ProjectOptions,
    force_enabled: &'a HashSet<String>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        document: &'a Document,
        options: &'a ProjectOptions,
        force_enabled: &'a HashSet<String>,
    ) -> Self {
        Self {
            document,
            lines: LineIndex::new(&document.text),
            options,
            force_enabled,
            diagnostics: Vec::new(),
        }
    }

    pub fn source(&self) -> &'a str {
        &self.document.text
    }

    pub fn location(&self, span: TextSpan) -> Location {
        Location::new(&self.document.name, span, &self.lines)
    }

    pub fn report(&mut self, descriptor: &'static DiagnosticDescriptor, span: TextSpan, args: &[&str]) {
        self.report_with_additional(descriptor, span, &[], args);
    }

    /// Report at `span`, honoring the project's per-id overrides and the
    /// descriptor's default enablement.
    pub fn report_with_additional(
        &mut self,
        descriptor: &'static DiagnosticDescriptor,
        span: TextSpan,
        additional: &[TextSpan],
        args: &[&str],
    ) {
        let enabled = descriptor.enabled_by_default || self.force_enabled.contains(descriptor.id);
        let Some(severity) = self
            .options
            .report_for(descriptor.id)
            .apply(descriptor.default_severity, enabled)
        else {
            return;
        };

        let additional = additional.iter().map(|s| self.location(*s)).collect();
        let diagnostic =
            Diagnostic::from_descriptor(descriptor, severity, self.location(span), args)
                .with_additional_locations(additional);
        self.diagnostics.push(diagnostic);
    }

    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Run every analyzer over every document in `compilation`.
///
/// Descriptors disabled by default are enabled for the ids in
/// `force_enabled`. The result is in canonical order.
pub fn analyzer_diagnostics(
    analyzers: &[Arc<dyn Analyzer>],
    compilation: &Compilation,
    force_enabled: &HashSet<String>,
) -> Vec<Diagnostic> {
    let project = compilation.project();
    let mut diagnostics = Vec::new();

    for document in project.documents() {
        let tree = compilation.syntax_tree(document.id);
        for analyzer in analyzers {
            let mut ctx = AnalysisContext::new(document, project.options(), force_enabled);
            analyzer.analyze(document, tree, &mut ctx);
            diagnostics.extend(ctx.into_diagnostics());
        }
    }

    sort_diagnostics(&mut diagnostics);
    diagnostics
}

/// Every descriptor supported by `analyzers`, in registration order.
pub fn supported_diagnostics(analyzers: &[Arc<dyn Analyzer>]) -> Vec<&'static DiagnosticDescriptor> {
    analyzers
        .iter()
        .flat_map(|a| a.supported_diagnostics().iter().copied())
        .collect()
}

pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
