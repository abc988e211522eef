//! Fixed-point driver for one compiler diagnostic id.
//!
//! Differs from the analyzer driver in three ways: diagnostics come from
//! the compiler, the occurrence fixed each round is the last one in the
//! document, and regressions are judged against the previous round
//! rather than the input.

use crate::action::FixProvider;
use crate::cancel::CancellationToken;
use crate::compare::verify_no_new_compiler_diagnostics;
use crate::diagnostics::Diagnostic;
use crate::error::{VerifyError, VerifyResult};
use crate::state::TestState;
use crate::telemetry::debug_event;

use super::{Session, same_diagnostics};
use super::fix::{choose_fix, request_fixes};

fn ensure_fixable(diagnostic_id: &str, provider: &dyn FixProvider) -> VerifyResult<()> {
    if provider.fixable_diagnostic_ids().contains(&diagnostic_id) {
        Ok(())
    } else {
        Err(VerifyError::precondition(format!(
            "Code fix provider '{}' cannot fix diagnostic '{diagnostic_id}'.",
            provider.name()
        )))
    }
}

/// The occurrence of `id` that starts last.
fn last_occurrence<'d>(diagnostics: &'d [Diagnostic], id: &str) -> Option<&'d Diagnostic> {
    diagnostics
        .iter()
        .filter(|d| d.id == id)
        .max_by_key(|d| d.location.span.start)
}

pub(crate) fn verify_compiler_fix(
    session: &Session<'_>,
    diagnostic_id: &str,
    provider: &dyn FixProvider,
    state: &TestState,
    cancel: &CancellationToken,
) -> VerifyResult<()> {
    cancel.check()?;
    ensure_fixable(diagnostic_id, provider)?;

    let key = state.equivalence_key.as_deref();
    let (materialized, mut compilation) = session.open(state)?;
    let mut previous: Vec<Diagnostic> = Vec::new();
    let mut fix_registered = false;

    loop {
        cancel.check()?;

        let diagnostics = compilation.diagnostics().to_vec();
        if diagnostics.is_empty() {
            break;
        }

        if !previous.is_empty() {
            verify_no_new_compiler_diagnostics(&previous, &diagnostics, session.options)?;
        }

        if same_diagnostics(&diagnostics, &previous) {
            return Err(VerifyError::non_convergence(
                "Same diagnostics returned before and after the fix was applied.",
            ));
        }

        let Some(selected) = last_occurrence(&diagnostics, diagnostic_id) else {
            break;
        };
        debug_event!(span = %selected.location.span, "selected compiler diagnostic");

        let fixes = request_fixes(provider, &compilation, &materialized, selected)?;
        let Some(action) = choose_fix(fixes, key, selected) else {
            break;
        };

        fix_registered = true;
        compilation = session.apply(
            compilation.project(),
            &action,
            state.code_action_title.as_deref(),
        )?;
        previous = diagnostics;
    }

    if !fix_registered {
        return Err(VerifyError::non_convergence("No code fix has been registered."));
    }

    session.verify_text(state, &materialized, compilation.project())
}

/// Fail if any fixable compiler diagnostic is offered a matching fix.
pub(crate) fn verify_no_compiler_fix(
    session: &Session<'_>,
    provider: &dyn FixProvider,
    state: &TestState,
    cancel: &CancellationToken,
) -> VerifyResult<()> {
    cancel.check()?;

    let key = state.equivalence_key.as_deref();
    let fixable = provider.fixable_diagnostic_ids();
    let (materialized, compilation) = session.open(state)?;

    for diagnostic in compilation.diagnostics() {
        cancel.check()?;
        if !fixable.contains(&diagnostic.id.as_str()) {
            continue;
        }

        let fixes = request_fixes(provider, &compilation, &materialized, diagnostic)?;
        if choose_fix(fixes, key, diagnostic).is_some() {
            return Err(VerifyError::mismatch("No code fix expected."));
        }
    }

    Ok(())
}
