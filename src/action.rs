//! Code actions and the fix/refactoring provider seams.

use anyhow::Result;

use crate::analysis::short_type_name;
use crate::compiler::Compilation;
use crate::diagnostics::Diagnostic;
use crate::fix::{EditError, TextEdit, apply_edits};
use crate::text::TextSpan;
use crate::workspace::{Document, DocumentId, Project};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChange {
    pub document: DocumentId,
    pub edits: Vec<TextEdit>,
}

/// A titled set of edits offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeAction {
    pub title: String,
    /// Distinguishes actions of the same provider that share a title.
    pub equivalence_key: Option<String>,
    pub changes: Vec<DocumentChange>,
}

impl CodeAction {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            equivalence_key: None,
            changes: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_equivalence_key(mut self, key: impl Into<String>) -> Self {
        self.equivalence_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn with_edits(mut self, document: DocumentId, edits: Vec<TextEdit>) -> Self {
        self.changes.push(DocumentChange { document, edits });
        self
    }

    /// Whether this action is eligible under an optional required key.
    pub fn matches_key(&self, key: Option<&str>) -> bool {
        key.is_none_or(|k| self.equivalence_key.as_deref() == Some(k))
    }

    /// A new project snapshot with every change applied.
    pub fn apply(&self, project: &Project) -> Result<Project, EditError> {
        let mut next = project.clone();
        for change in &self.changes {
            let doc = next
                .document(change.document)
                .ok_or_else(|| EditError::UnknownDocument(format!("#{}", change.document.index())))?;
            let text = apply_edits(&doc.text, &change.edits)?;
            next = next.with_document_text(change.document, text);
        }
        Ok(next)
    }
}

/// A fix offered for one or more diagnostics.
#[derive(Debug, Clone)]
pub struct RegisteredFix {
    pub action: CodeAction,
    pub diagnostics: Vec<Diagnostic>,
}

/// Inputs to [`FixProvider::register_code_fixes`] and the sink for offered
/// actions.
pub struct FixContext<'a> {
    pub compilation: &'a Compilation,
    pub document: &'a Document,
    pub diagnostic: &'a Diagnostic,
    fixes: Vec<RegisteredFix>,
}

impl<'a> FixContext<'a> {
    pub fn new(compilation: &'a Compilation, document: &'a Document, diagnostic: &'a Diagnostic) -> Self {
        Self {
            compilation,
            document,
            diagnostic,
            fixes: Vec::new(),
        }
    }

    pub fn span(&self) -> TextSpan {
        self.diagnostic.span()
    }

    /// Offer `action` as a fix for the context diagnostic.
    pub fn register(&mut self, action: CodeAction) {
        let diagnostic = self.diagnostic.clone();
        self.register_for(action, vec![diagnostic]);
    }

    pub fn register_for(&mut self, action: CodeAction, diagnostics: Vec<Diagnostic>) {
        self.fixes.push(RegisteredFix {
            action,
            diagnostics,
        });
    }

    pub fn into_fixes(self) -> Vec<RegisteredFix> {
        self.fixes
    }
}

pub trait FixProvider: Send + Sync {
    fn fixable_diagnostic_ids(&self) -> &[&str];

    fn register_code_fixes(&self, ctx: &mut FixContext<'_>) -> Result<()>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

/// Inputs to [`RefactoringProvider::compute_refactorings`].
pub struct RefactoringContext<'a> {
    pub compilation: &'a Compilation,
    pub document: &'a Document,
    pub span: TextSpan,
    actions: Vec<CodeAction>,
}

impl<'a> RefactoringContext<'a> {
    pub fn new(compilation: &'a Compilation, document: &'a Document, span: TextSpan) -> Self {
        Self {
            compilation,
            document,
            span,
            actions: Vec::new(),
        }
    }

    pub fn register(&mut self, action: CodeAction) {
        self.actions.push(action);
    }

    pub fn into_actions(self) -> Vec<CodeAction> {
        self.actions
    }
}

pub trait RefactoringProvider: Send + Sync {
    fn compute_refactorings(&self, ctx: &mut RefactoringContext<'_>) -> Result<()>;

    fn name(&self) -> &'static str {
        short_type_name::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workspace::ProjectOptions;
    use std::sync::Arc;

    fn project() -> Project {
        Project::new(Arc::new(ProjectOptions::new("C#", "Test.cs")))
            .with_document("Test.cs", "a + b")
            .with_document("Test2.cs", "x")
    }

    #[test]
    fn apply_edits_across_documents() {
        let project = project();
        let ids: Vec<_> = project.documents().iter().map(|d| d.id).collect();
        let action = CodeAction::new("Swap")
            .with_edits(
                ids[0],
                vec![
                    TextEdit::replace(TextSpan::new(0, 1), "b"),
                    TextEdit::replace(TextSpan::new(4, 5), "a"),
                ],
            )
            .with_edits(ids[1], vec![TextEdit::insert(1, "y")]);

        let next = action.apply(&project).unwrap();
        assert_eq!(next.documents()[0].text, "b + a");
        assert_eq!(next.documents()[1].text, "xy");
        assert_eq!(project.documents()[0].text, "a + b");
    }

    #[test]
    fn invalid_edit_is_reported() {
        let project = project();
        let id = project.documents()[1].id;
        let action = CodeAction::new("Bad").with_edits(id, vec![TextEdit::insert(9, "!")]);
        assert!(matches!(action.apply(&project), Err(EditError::OutOfRange { .. })));
    }

    #[test]
    fn key_matching() {
        let keyed = CodeAction::new("Fix").with_equivalence_key("A");
        assert!(keyed.matches_key(None));
        assert!(keyed.matches_key(Some("A")));
        assert!(!keyed.matches_key(Some("B")));
        assert!(!CodeAction::new("Fix").matches_key(Some("A")));
    }
}
