use std::collections::HashSet;

use anyhow::Result;
use tree_sitter::Tree;

use crate::action::{CodeAction, FixContext, FixProvider};
use crate::analysis::{AnalysisContext, Analyzer};
use crate::diagnostics::DiagnosticDescriptor;
use crate::fix::TextEdit;
use crate::workspace::Document;

use super::util::{compact_ws, slice, span_of, span_start_receiver, walk};

// ============================================================================
// UseSpanStartAnalyzer - RCS9002
// ============================================================================

pub static USE_SPAN_START: DiagnosticDescriptor = DiagnosticDescriptor::warning(
    "RCS9002",
    "Use property SyntaxNode.SpanStart",
    "Use property SyntaxNode.SpanStart",
    "Roslynator",
);

/// Reports `x.Span.Start`, which `x.SpanStart` expresses without computing
/// the span.
///
/// Purely syntactic: the receiver's type is not checked.
pub struct UseSpanStartAnalyzer;

const MEMBER_ACCESS_KINDS: &[&str] = &["member_access_expression", "qualified_name"];

static SUPPORTED: [&DiagnosticDescriptor; 1] = [&USE_SPAN_START];

impl Analyzer for UseSpanStartAnalyzer {
    fn supported_diagnostics(&self) -> &[&'static DiagnosticDescriptor] {
        &SUPPORTED
    }

    fn analyze(&self, document: &Document, tree: Option<&Tree>, ctx: &mut AnalysisContext<'_>) {
        let Some(tree) = tree else {
            return;
        };
        let source = document.text.as_str();

        let mut reported = HashSet::new();
        walk(tree.root_node(), &mut |node| {
            if !MEMBER_ACCESS_KINDS.contains(&node.kind()) {
                return;
            }
            if !compact_ws(slice(source, node)).ends_with(".Span.Start") {
                return;
            }
            if span_start_receiver(slice(source, node)).is_none() {
                return;
            }
            // Wrapper nodes can share a range with the access itself.
            let span = span_of(node);
            if reported.insert(span) {
                ctx.report(&USE_SPAN_START, span, &[]);
            }
        });
    }
}

/// Rewrites `x.Span.Start` to `x.SpanStart`.
pub struct UseSpanStartFix;

impl FixProvider for UseSpanStartFix {
    fn fixable_diagnostic_ids(&self) -> &[&str] {
        &["RCS9002"]
    }

    fn register_code_fixes(&self, ctx: &mut FixContext<'_>) -> Result<()> {
        let span = ctx.span();
        let Some(receiver) = ctx
            .document
            .text
            .get(span.range())
            .and_then(span_start_receiver)
        else {
            return Ok(());
        };

        let action = CodeAction::new(USE_SPAN_START.title)
            .with_equivalence_key(USE_SPAN_START.id)
            .with_edits(
                ctx.document.id,
                vec![TextEdit::replace(span, format!("{receiver}.SpanStart"))],
            );
        ctx.register(action);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::analysis::analyzer_diagnostics;
    use crate::compiler::Compilation;
    use crate::csharp;
    use crate::workspace::Project;

    fn compile(text: &str) -> Compilation {
        let project = Project::new(csharp::default_options()).with_document("Test.cs", text);
        csharp::compiler().compile(&project).unwrap()
    }

    fn reported(text: &str) -> Vec<&str> {
        let compilation = compile(text);
        let analyzers: Vec<std::sync::Arc<dyn Analyzer>> = vec![std::sync::Arc::new(UseSpanStartAnalyzer)];
        analyzer_diagnostics(&analyzers, &compilation, &HashSet::new())
            .into_iter()
            .map(|d| &text[d.span().range()])
            .collect()
    }

    #[test]
    fn supports_only_its_own_descriptor() {
        let ids: Vec<&str> = UseSpanStartAnalyzer
            .supported_diagnostics()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["RCS9002"]);
    }

    #[test]
    fn reports_each_access_once() {
        let text = "class C { int M(SyntaxNode a, SyntaxNode b) => a.Span.Start + b.Parent.Span.Start; }";
        assert_eq!(reported(text), vec!["a.Span.Start", "b.Parent.Span.Start"]);
    }

    #[test]
    fn ignores_other_members() {
        let text = "class C { int M(SyntaxNode a) => a.Span.End + a.SpanStart + Span.Start; }";
        assert!(reported(text).is_empty());
    }

    #[test]
    fn fix_keeps_the_receiver() {
        let text = "class C { int M(SyntaxNode a) => a.Parent.Span.Start; }";
        let compilation = compile(text);
        let document = &compilation.project().documents()[0];
        let start = text.find("a.Parent").unwrap();
        let span = crate::text::TextSpan::new(start, start + "a.Parent.Span.Start".len());
        let diagnostic = crate::diagnostics::Diagnostic::new(
            "RCS9002",
            crate::severity::Severity::Warning,
            crate::diagnostics::Location::new("Test.cs", span, &crate::text::LineIndex::new(text)),
            "",
        );

        let mut ctx = FixContext::new(&compilation, document, &diagnostic);
        UseSpanStartFix.register_code_fixes(&mut ctx).unwrap();
        let fixes = ctx.into_fixes();
        assert_eq!(fixes.len(), 1);
        assert_eq!(fixes[0].action.equivalence_key.as_deref(), Some("RCS9002"));

        let fixed = fixes[0].action.apply(compilation.project()).unwrap();
        assert_eq!(
            fixed.documents()[0].text,
            "class C { int M(SyntaxNode a) => a.Parent.SpanStart; }"
        );
    }
}
