#![allow(dead_code)]

//! Toy compiler, analyzer and providers for exercising the drivers without
//! a real grammar.
//!
//! The compiler knows three words: `ERR` is an error, `oops` is a fixable
//! compiler error, and `unused` is a warning on the allowed list. The
//! analyzer reports `bad` as `TV001` and, when forced, `meh` as `TV002`.

use std::sync::Arc;

use anyhow::Result;
use lint_verify::diagnostics::{Diagnostic, DiagnosticDescriptor, Location};
use lint_verify::fix::TextEdit;
use lint_verify::text::{LineIndex, TextSpan};
use lint_verify::{
    AnalysisContext, Analyzer, CodeAction, Compilation, Compiler, Document, FixContext, FixProvider,
    FixVerifier, DiagnosticVerifier, Project, ProjectOptions, RecordingAssert, Severity, Verifier,
};
use tree_sitter::Tree;

pub const SYNTAX_ERROR: &str = "CS1002";
pub const OOPS: &str = "CS0001";
pub const UNUSED: &str = "CS0168";

pub static BAD_WORD: DiagnosticDescriptor =
    DiagnosticDescriptor::warning("TV001", "Avoid 'bad'", "Replace '{0}'", "Style");
pub static MEH_WORD: DiagnosticDescriptor =
    DiagnosticDescriptor::warning("TV002", "Avoid 'meh'", "Replace '{0}'", "Style")
        .disabled_by_default();

fn occurrences(text: &str, word: &str) -> Vec<TextSpan> {
    text.match_indices(word)
        .map(|(start, m)| TextSpan::new(start, start + m.len()))
        .collect()
}

/// Reports `ERR`, `oops` and `unused` as compiler diagnostics.
#[derive(Debug, Default)]
pub struct WordCompiler;

impl Compiler for WordCompiler {
    fn compile(&self, project: &Project) -> Result<Compilation> {
        let mut diagnostics = Vec::new();
        for doc in project.documents() {
            let lines = LineIndex::new(&doc.text);
            for (word, id, severity) in [
                ("ERR", SYNTAX_ERROR, Severity::Error),
                ("oops", OOPS, Severity::Error),
                ("unused", UNUSED, Severity::Warning),
            ] {
                for span in occurrences(&doc.text, word) {
                    diagnostics.push(Diagnostic::new(
                        id,
                        severity,
                        Location::new(&doc.name, span, &lines),
                        format!("'{word}' is not allowed here"),
                    ));
                }
            }
        }
        Ok(Compilation::new(project.clone(), diagnostics))
    }

    fn normalize(&self, text: &str) -> String {
        text.trim_end().to_string()
    }
}

static WORD_DIAGNOSTICS: [&DiagnosticDescriptor; 2] = [&BAD_WORD, &MEH_WORD];

pub struct WordAnalyzer;

impl Analyzer for WordAnalyzer {
    fn supported_diagnostics(&self) -> &[&'static DiagnosticDescriptor] {
        &WORD_DIAGNOSTICS
    }

    fn analyze(&self, document: &Document, _tree: Option<&Tree>, ctx: &mut AnalysisContext<'_>) {
        for span in occurrences(&document.text, "bad") {
            ctx.report(&BAD_WORD, span, &["bad"]);
        }
        for span in occurrences(&document.text, "meh") {
            ctx.report(&MEH_WORD, span, &["meh"]);
        }
    }
}

/// Replaces the flagged word with `replacement`.
pub struct ReplaceWord {
    pub ids: &'static [&'static str],
    pub replacement: &'static str,
    pub title: &'static str,
    pub key: &'static str,
}

impl ReplaceWord {
    pub const fn new(replacement: &'static str) -> Self {
        Self {
            ids: &["TV001", "TV002"],
            replacement,
            title: "Replace word",
            key: "ReplaceWord",
        }
    }
}

impl FixProvider for ReplaceWord {
    fn fixable_diagnostic_ids(&self) -> &[&str] {
        self.ids
    }

    fn register_code_fixes(&self, ctx: &mut FixContext<'_>) -> Result<()> {
        let action = CodeAction::new(self.title)
            .with_equivalence_key(self.key)
            .with_edits(ctx.document.id, vec![TextEdit::replace(ctx.span(), self.replacement)]);
        ctx.register(action);
        Ok(())
    }
}

/// Offers nothing.
pub struct NoFix;

impl FixProvider for NoFix {
    fn fixable_diagnostic_ids(&self) -> &[&str] {
        &["TV001", "CS0001"]
    }

    fn register_code_fixes(&self, _ctx: &mut FixContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Fails every request.
pub struct BrokenFix;

impl FixProvider for BrokenFix {
    fn fixable_diagnostic_ids(&self) -> &[&str] {
        &["TV001"]
    }

    fn register_code_fixes(&self, _ctx: &mut FixContext<'_>) -> Result<()> {
        anyhow::bail!("provider crashed")
    }
}

pub fn options() -> Arc<ProjectOptions> {
    Arc::new(
        ProjectOptions::new("C#", "Test.cs")
            .with_allowed_compiler_severity(Severity::Info)
            .with_allowed_compiler_ids([UNUSED]),
    )
}

/// A core verifier over the toy compiler, recording failures in the
/// returned backend.
pub fn recording_verifier() -> (Verifier, Arc<RecordingAssert>) {
    let assert = Arc::new(RecordingAssert::new());
    let verifier = Verifier::new(options(), Arc::new(WordCompiler)).with_assert(assert.clone());
    (verifier, assert)
}

pub fn diagnostic_verifier() -> (DiagnosticVerifier, Arc<RecordingAssert>) {
    let (core, assert) = recording_verifier();
    (DiagnosticVerifier::new(core, Arc::new(WordAnalyzer)), assert)
}

pub fn fix_verifier(provider: impl FixProvider + 'static) -> (FixVerifier, Arc<RecordingAssert>) {
    let (diagnostics, assert) = diagnostic_verifier();
    (FixVerifier::new(diagnostics, Arc::new(provider)), assert)
}
