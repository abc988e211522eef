//! Drivers that run code actions against a materialized project and check
//! the outcome. Each call owns its own project snapshots.

pub(crate) mod compiler_fix;
pub(crate) mod fix;
pub(crate) mod refactoring;

use std::sync::Arc;

use itertools::Itertools;

use crate::action::CodeAction;
use crate::compare::{CompilerCheck, verify_compiler_diagnostics};
use crate::compiler::{Compilation, Compiler};
use crate::diagnostics::Diagnostic;
use crate::error::{VerifyError, VerifyResult};
use crate::fix::format_diff;
use crate::state::TestState;
use crate::telemetry::info_event;
use crate::verify_ensure;
use crate::workspace::{Document, DocumentId, Materialized, Project, ProjectOptions, materialize};

/// Everything a driver needs from its verifier.
pub(crate) struct Session<'a> {
    pub options: &'a Arc<ProjectOptions>,
    pub compiler: &'a dyn Compiler,
}

impl Session<'_> {
    pub fn compile(&self, project: &Project) -> VerifyResult<Compilation> {
        Ok(self.compiler.compile(project)?)
    }

    /// Materialize `state` and compile it, without any policy check.
    pub fn open(&self, state: &TestState) -> VerifyResult<(Materialized, Compilation)> {
        let materialized = materialize(state, Arc::clone(self.options));
        let compilation = self.compile(&materialized.project)?;
        Ok((materialized, compilation))
    }

    /// Like [`Session::open`], also requiring the input to be within the
    /// allowed compiler diagnostic policy.
    pub fn open_checked(&self, state: &TestState) -> VerifyResult<(Materialized, Compilation)> {
        let (materialized, compilation) = self.open(state)?;
        verify_compiler_diagnostics(compilation.diagnostics(), self.options, CompilerCheck::Input)?;
        Ok((materialized, compilation))
    }

    /// Apply `action` after checking its title, and compile the result.
    pub fn apply(
        &self,
        project: &Project,
        action: &CodeAction,
        expected_title: Option<&str>,
    ) -> VerifyResult<Compilation> {
        if let Some(title) = expected_title {
            verify_ensure!(
                action.title == title,
                "Code action title expected to be \"{}\", actual: \"{}\"",
                title,
                action.title
            );
        }

        info_event!(title = %action.title, key = ?action.equivalence_key, "applying code action");
        let project = action.apply(project)?;
        self.compile(&project)
    }

    /// Compare the final primary document, and every auxiliary document
    /// that has an expectation, after normalization.
    pub fn verify_text(
        &self,
        state: &TestState,
        materialized: &Materialized,
        project: &Project,
    ) -> VerifyResult<()> {
        let expected = state
            .expected_source
            .as_deref()
            .ok_or_else(|| VerifyError::precondition("Expected source text is not specified."))?;

        let primary = document(project, materialized, materialized.primary)?;
        self.compare_document(primary, expected)?;

        for doc in &materialized.expected_documents {
            let actual = document(project, materialized, doc.id)?;
            self.compare_document(actual, &doc.expected)?;
        }
        Ok(())
    }

    fn compare_document(&self, actual: &Document, expected: &str) -> VerifyResult<()> {
        let actual_text = self.compiler.normalize(&actual.text);
        let expected_text = self.compiler.normalize(expected);
        verify_ensure!(
            actual_text == expected_text,
            "Text of document \"{}\" does not match the expected text\n\n{}",
            actual.name,
            format_diff(&expected_text, &actual_text, &actual.name)
        );
        Ok(())
    }
}

fn document<'p>(
    project: &'p Project,
    materialized: &Materialized,
    id: DocumentId,
) -> VerifyResult<&'p Document> {
    project.document(id).ok_or_else(|| {
        VerifyError::precondition(format!(
            "Document #{} of {} is missing from the project",
            id.index(),
            materialized.project.name
        ))
    })
}

/// The document a diagnostic is located in, falling back to the primary one.
pub(crate) fn document_for<'p>(
    project: &'p Project,
    materialized: &Materialized,
    path: &str,
) -> VerifyResult<&'p Document> {
    match project.document_by_name(path) {
        Some(doc) => Ok(doc),
        None => document(project, materialized, materialized.primary),
    }
}

/// Whether `a` and `b` hold the same diagnostics, duplicates counted.
pub(crate) fn same_diagnostics(a: &[Diagnostic], b: &[Diagnostic]) -> bool {
    a.len() == b.len() && a.iter().counts() == b.iter().counts()
}
