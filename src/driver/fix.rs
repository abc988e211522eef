//! Fixed-point driver for analyzer diagnostics: fix one diagnostic at a
//! time until none of the expected ids remain or no fix is offered.

use std::collections::HashSet;
use std::sync::Arc;

use crate::action::{CodeAction, FixContext, FixProvider, RegisteredFix};
use crate::analysis::{Analyzer, analyzer_diagnostics};
use crate::cancel::CancellationToken;
use crate::compare::{CompilerCheck, verify_compiler_diagnostics, verify_no_new_compiler_diagnostics};
use crate::compiler::Compilation;
use crate::diagnostics::Diagnostic;
use crate::error::{VerifyError, VerifyResult};
use crate::state::TestState;
use crate::telemetry::debug_event;
use crate::workspace::Materialized;

use super::{Session, document_for, same_diagnostics};

#[derive(Debug)]
enum FixPhase {
    ComputeDiagnostics,
    SelectDiagnostic(Vec<Diagnostic>),
    RequestFix {
        diagnostics: Vec<Diagnostic>,
        selected: Diagnostic,
    },
    ApplyFix {
        diagnostics: Vec<Diagnostic>,
        action: CodeAction,
    },
    Done,
}

impl FixPhase {
    #[cfg_attr(not(feature = "telemetry"), allow(dead_code))]
    fn name(&self) -> &'static str {
        match self {
            FixPhase::ComputeDiagnostics => "compute_diagnostics",
            FixPhase::SelectDiagnostic(_) => "select_diagnostic",
            FixPhase::RequestFix { .. } => "request_fix",
            FixPhase::ApplyFix { .. } => "apply_fix",
            FixPhase::Done => "done",
        }
    }
}

pub(crate) fn ensure_fixable(state: &TestState, provider: &dyn FixProvider) -> VerifyResult<()> {
    let fixable = provider.fixable_diagnostic_ids();
    for id in state.expected_ids() {
        if !fixable.contains(&id) {
            return Err(VerifyError::precondition(format!(
                "Diagnostic '{id}' is not fixable by code fix provider '{}'.",
                provider.name()
            )));
        }
    }
    Ok(())
}

pub(crate) fn force_enabled_ids(state: &TestState) -> HashSet<String> {
    state.expected_ids().map(str::to_string).collect()
}

/// First action matching `key` that claims `diagnostic`.
pub(crate) fn choose_fix(fixes: Vec<RegisteredFix>, key: Option<&str>, diagnostic: &Diagnostic) -> Option<CodeAction> {
    fixes
        .into_iter()
        .find(|f| f.action.matches_key(key) && f.diagnostics.contains(diagnostic))
        .map(|f| f.action)
}

pub(crate) fn request_fixes(
    provider: &dyn FixProvider,
    compilation: &Compilation,
    materialized: &Materialized,
    diagnostic: &Diagnostic,
) -> VerifyResult<Vec<RegisteredFix>> {
    let document = document_for(compilation.project(), materialized, &diagnostic.location.path)?;
    let mut ctx = FixContext::new(compilation, document, diagnostic);
    provider.register_code_fixes(&mut ctx)?;
    Ok(ctx.into_fixes())
}

pub(crate) fn verify_fix(
    session: &Session<'_>,
    analyzers: &[Arc<dyn Analyzer>],
    provider: &dyn FixProvider,
    state: &TestState,
    cancel: &CancellationToken,
) -> VerifyResult<()> {
    cancel.check()?;
    ensure_fixable(state, provider)?;

    let force_enabled = force_enabled_ids(state);
    let expected_ids: Vec<&str> = state.expected_ids().collect();
    let key = state.equivalence_key.as_deref();

    let (materialized, mut compilation) = session.open_checked(state)?;
    let baseline = compilation.diagnostics().to_vec();

    let mut previous: Vec<Diagnostic> = Vec::new();
    let mut fix_registered = false;
    let mut phase = FixPhase::ComputeDiagnostics;

    loop {
        debug_event!(phase = phase.name(), "fix driver");
        phase = match phase {
            FixPhase::ComputeDiagnostics => {
                cancel.check()?;
                let diagnostics = analyzer_diagnostics(analyzers, &compilation, &force_enabled);
                if diagnostics.is_empty() {
                    FixPhase::Done
                } else {
                    if same_diagnostics(&diagnostics, &previous) {
                        return Err(VerifyError::non_convergence(
                            "Same diagnostics returned before and after the fix was applied.",
                        ));
                    }
                    FixPhase::SelectDiagnostic(diagnostics)
                }
            }
            FixPhase::SelectDiagnostic(diagnostics) => {
                match diagnostics
                    .iter()
                    .find(|d| expected_ids.contains(&d.id.as_str()))
                {
                    Some(selected) => FixPhase::RequestFix {
                        selected: selected.clone(),
                        diagnostics,
                    },
                    None => FixPhase::Done,
                }
            }
            FixPhase::RequestFix {
                diagnostics,
                selected,
            } => {
                let fixes = request_fixes(provider, &compilation, &materialized, &selected)?;
                match choose_fix(fixes, key, &selected) {
                    Some(action) => FixPhase::ApplyFix {
                        diagnostics,
                        action,
                    },
                    None => FixPhase::Done,
                }
            }
            FixPhase::ApplyFix {
                diagnostics,
                action,
            } => {
                fix_registered = true;
                let next = session.apply(
                    compilation.project(),
                    &action,
                    state.code_action_title.as_deref(),
                )?;
                verify_no_new_compiler_diagnostics(&baseline, next.diagnostics(), session.options)?;
                verify_compiler_diagnostics(next.diagnostics(), session.options, CompilerCheck::AfterAction)?;

                compilation = next;
                previous = diagnostics;
                FixPhase::ComputeDiagnostics
            }
            FixPhase::Done => break,
        };
    }

    if !fix_registered {
        return Err(VerifyError::non_convergence("No code fix has been registered."));
    }

    session.verify_text(state, &materialized, compilation.project())
}

/// Fail if any expected, fixable diagnostic is offered a matching fix.
pub(crate) fn verify_no_fix(
    session: &Session<'_>,
    analyzers: &[Arc<dyn Analyzer>],
    provider: &dyn FixProvider,
    state: &TestState,
    cancel: &CancellationToken,
) -> VerifyResult<()> {
    cancel.check()?;

    let force_enabled = force_enabled_ids(state);
    let expected_ids: Vec<&str> = state.expected_ids().collect();
    let fixable = provider.fixable_diagnostic_ids();
    let key = state.equivalence_key.as_deref();

    let (materialized, compilation) = session.open_checked(state)?;
    let diagnostics = analyzer_diagnostics(analyzers, &compilation, &force_enabled);

    for diagnostic in &diagnostics {
        cancel.check()?;
        let id = diagnostic.id.as_str();
        if !expected_ids.contains(&id) || !fixable.contains(&id) {
            continue;
        }

        let fixes = request_fixes(provider, &compilation, &materialized, diagnostic)?;
        if choose_fix(fixes, key, diagnostic).is_some() {
            return Err(VerifyError::mismatch("No code fix expected."));
        }
    }

    Ok(())
}
