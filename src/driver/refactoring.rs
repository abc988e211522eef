//! Refactoring driver: invoke a provider at each span of the test source.

use crate::action::{CodeAction, RefactoringContext, RefactoringProvider};
use crate::cancel::CancellationToken;
use crate::compare::{CompilerCheck, verify_compiler_diagnostics, verify_no_new_compiler_diagnostics};
use crate::compiler::Compilation;
use crate::error::{VerifyError, VerifyResult};
use crate::state::TestState;
use crate::text::TextSpan;
use crate::workspace::Materialized;

use super::Session;

const NO_SPAN: &str = "Span on which a refactoring should be invoked was not found.";

fn spans_descending(state: &TestState) -> VerifyResult<Vec<TextSpan>> {
    if state.spans.is_empty() {
        return Err(VerifyError::precondition(NO_SPAN));
    }
    let mut spans: Vec<TextSpan> = state.spans.iter().map(|s| s.span).collect();
    spans.sort();
    spans.reverse();
    Ok(spans)
}

fn request_refactorings(
    provider: &dyn RefactoringProvider,
    compilation: &Compilation,
    materialized: &Materialized,
    span: TextSpan,
) -> VerifyResult<Vec<CodeAction>> {
    let document = compilation
        .project()
        .document(materialized.primary)
        .ok_or_else(|| VerifyError::precondition("Primary document is missing from the project"))?;
    let mut ctx = RefactoringContext::new(compilation, document, span);
    provider.compute_refactorings(&mut ctx)?;
    Ok(ctx.into_actions())
}

/// Apply one refactoring per span, last span first so earlier spans keep
/// their offsets, then compare the text once.
pub(crate) fn verify_refactoring(
    session: &Session<'_>,
    provider: &dyn RefactoringProvider,
    state: &TestState,
    cancel: &CancellationToken,
) -> VerifyResult<()> {
    cancel.check()?;
    let spans = spans_descending(state)?;
    let key = state.equivalence_key.as_deref();

    let (materialized, mut compilation) = session.open_checked(state)?;
    let baseline = compilation.diagnostics().to_vec();

    for span in spans {
        cancel.check()?;

        let action = request_refactorings(provider, &compilation, &materialized, span)?
            .into_iter()
            .find(|a| a.matches_key(key))
            .ok_or_else(|| VerifyError::non_convergence("No code refactoring has been registered."))?;

        let next = session.apply(
            compilation.project(),
            &action,
            state.code_action_title.as_deref(),
        )?;
        verify_no_new_compiler_diagnostics(&baseline, next.diagnostics(), session.options)?;
        verify_compiler_diagnostics(next.diagnostics(), session.options, CompilerCheck::AfterAction)?;
        compilation = next;
    }

    session.verify_text(state, &materialized, compilation.project())
}

/// Fail if the provider offers a matching action at any span.
pub(crate) fn verify_no_refactoring(
    session: &Session<'_>,
    provider: &dyn RefactoringProvider,
    state: &TestState,
    cancel: &CancellationToken,
) -> VerifyResult<()> {
    cancel.check()?;
    let spans = spans_descending(state)?;
    let key = state.equivalence_key.as_deref();

    let (materialized, compilation) = session.open_checked(state)?;

    for span in spans {
        cancel.check()?;
        let actions = request_refactorings(provider, &compilation, &materialized, span)?;
        if actions.iter().any(|a| a.matches_key(key)) {
            return Err(VerifyError::mismatch("No code refactoring expected."));
        }
    }

    Ok(())
}
