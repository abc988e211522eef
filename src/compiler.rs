//! The compiler seam: turns a [`Project`] into syntax trees and compiler
//! diagnostics.

use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use tree_sitter::{Language, Node, Parser, Tree};

use crate::diagnostics::{Diagnostic, Location, sort_diagnostics};
use crate::severity::Severity;
use crate::text::{LineIndex, TextSpan};
use crate::workspace::{DocumentId, Project};

/// Produces a [`Compilation`] for a project snapshot.
pub trait Compiler: Send + Sync {
    fn compile(&self, project: &Project) -> Result<Compilation>;

    /// Canonical form of a document's text before comparison.
    fn normalize(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Result of compiling one project snapshot.
#[derive(Debug)]
pub struct Compilation {
    project: Project,
    diagnostics: Vec<Diagnostic>,
    trees: HashMap<DocumentId, Tree>,
}

impl Compilation {
    pub fn new(project: Project, mut diagnostics: Vec<Diagnostic>) -> Self {
        sort_diagnostics(&mut diagnostics);
        Self {
            project,
            diagnostics,
            trees: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_tree(mut self, id: DocumentId, tree: Tree) -> Self {
        self.trees.insert(id, tree);
        self
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Compiler diagnostics in canonical order.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Syntax tree of `id`, if the compiler produces trees.
    pub fn syntax_tree(&self, id: DocumentId) -> Option<&Tree> {
        self.trees.get(&id)
    }
}

/// Reported for a region the grammar could not parse.
pub const UNEXPECTED_SYNTAX: &str = "TS1001";
/// Reported where the grammar inserted a missing token.
pub const MISSING_TOKEN: &str = "TS1002";

/// A compiler backed by a tree-sitter grammar. Syntax errors are its only
/// diagnostics.
#[derive(Clone, Copy)]
pub struct TreeSitterCompiler {
    language: fn() -> Language,
}

impl TreeSitterCompiler {
    pub fn new(language: fn() -> Language) -> Self {
        Self { language }
    }

    pub fn parse(&self, text: &str) -> Result<Tree> {
        let mut parser = Parser::new();
        parser
            .set_language((self.language)())
            .context("failed to load tree-sitter grammar")?;
        parser
            .parse(text, None)
            .ok_or_else(|| anyhow!("tree-sitter failed to produce a tree"))
    }
}

impl std::fmt::Debug for TreeSitterCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeSitterCompiler").finish_non_exhaustive()
    }
}

impl Compiler for TreeSitterCompiler {
    fn compile(&self, project: &Project) -> Result<Compilation> {
        let options = project.options();
        let mut diagnostics = Vec::new();
        let mut trees = Vec::new();

        for doc in project.documents() {
            let tree = self
                .parse(&doc.text)
                .with_context(|| format!("failed to parse {}", doc.name))?;

            let lines = LineIndex::new(&doc.text);
            collect_syntax_errors(tree.root_node(), &doc.text, &mut |id, span, message| {
                let Some(severity) = options.report_for(id).apply(Severity::Error, true) else {
                    return;
                };
                diagnostics.push(Diagnostic::new(
                    id,
                    severity,
                    Location::new(&doc.name, span, &lines),
                    message,
                ));
            });
            trees.push((doc.id, tree));
        }

        let compilation = Compilation::new(project.clone(), diagnostics);
        Ok(trees
            .into_iter()
            .fold(compilation, |c, (id, tree)| c.with_tree(id, tree)))
    }
}

fn collect_syntax_errors(
    node: Node,
    source: &str,
    report: &mut impl FnMut(&'static str, TextSpan, String),
) {
    if node.is_missing() {
        let span = TextSpan::from_range(node.byte_range());
        report(MISSING_TOKEN, span, format!("'{}' expected", node.kind()));
        return;
    }

    if node.is_error() {
        let span = TextSpan::from_range(node.byte_range());
        let text = source.get(node.byte_range()).unwrap_or("").trim();
        report(UNEXPECTED_SYNTAX, span, format!("Unexpected syntax '{text}'"));
        return;
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_syntax_errors(child, source, report);
    }
}
