//! Matching of expected against actual diagnostics, and the compiler
//! diagnostic policies applied around code actions.

use std::collections::HashMap;

use crate::diagnostics::{Diagnostic, Location, canonical_order, format_diagnostics};
use crate::error::{VerifyError, VerifyResult};
use crate::text::LinePosition;
use crate::workspace::ProjectOptions;
use crate::{verify_bail, verify_ensure};

/// Optional parts of a diagnostic that are compared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiagnosticChecks {
    pub message: bool,
    pub additional_locations: bool,
}

/// Compare `expected` with `actual` pairwise in canonical order.
///
/// Each pair is checked before counts are, so the first positional
/// difference is what gets reported.
pub fn verify_diagnostics(
    expected: &[Diagnostic],
    actual: &[Diagnostic],
    checks: DiagnosticChecks,
) -> VerifyResult<()> {
    if expected.is_empty() {
        return Err(VerifyError::precondition(
            "Diagnostic's location not found in a source text.",
        ));
    }

    let mut expected: Vec<&Diagnostic> = expected.iter().collect();
    let mut sorted_actual: Vec<&Diagnostic> = actual.iter().collect();
    expected.sort_by(|a, b| canonical_order(a, b));
    sorted_actual.sort_by(|a, b| canonical_order(a, b));

    for (e, a) in expected.iter().zip(&sorted_actual) {
        verify_diagnostic(e, a, checks)?;
    }

    if expected.len() != sorted_actual.len() {
        return Err(count_mismatch(expected.len(), actual));
    }

    Ok(())
}

fn count_mismatch(expected: usize, actual: &[Diagnostic]) -> VerifyError {
    if actual.is_empty() {
        VerifyError::mismatch(format!("No diagnostic found, expected: {expected}."))
    } else {
        VerifyError::mismatch(format!(
            "Mismatch between number of diagnostics, expected: {expected} actual: {}\n\n{}",
            actual.len(),
            format_diagnostics(actual)
        ))
    }
}

fn verify_diagnostic(
    expected: &Diagnostic,
    actual: &Diagnostic,
    checks: DiagnosticChecks,
) -> VerifyResult<()> {
    let context = || format!("\n\nExpected diagnostic:\n  {expected}\n\nActual diagnostic:\n  {actual}");

    verify_ensure!(
        expected.id == actual.id,
        "Diagnostic's ID expected to be \"{}\", actual: \"{}\"{}",
        expected.id,
        actual.id,
        context()
    );

    verify_location(&expected.location, &actual.location).map_err(|m| {
        VerifyError::mismatch(format!("{m}{}", context()))
    })?;

    if checks.additional_locations {
        let (e, a) = (&expected.additional_locations, &actual.additional_locations);
        verify_ensure!(
            e.len() == a.len(),
            "{} additional location(s) expected, actual: {}{}",
            e.len(),
            a.len(),
            context()
        );
        for (el, al) in e.iter().zip(a) {
            verify_location(el, al).map_err(|m| VerifyError::mismatch(format!("{m}{}", context())))?;
        }
    }

    if checks.message {
        verify_ensure!(
            expected.message == actual.message,
            "Diagnostic's message expected to be \"{}\", actual: \"{}\"",
            expected.message,
            actual.message
        );
    }

    Ok(())
}

fn verify_location(expected: &Location, actual: &Location) -> Result<(), String> {
    if expected.path != actual.path {
        return Err(format!(
            "Diagnostic expected to be in file \"{}\", actual: \"{}\"",
            expected.path, actual.path
        ));
    }
    verify_position(expected.line_span.start, actual.line_span.start, "start")?;
    verify_position(expected.line_span.end, actual.line_span.end, "end")
}

fn verify_position(expected: LinePosition, actual: LinePosition, which: &str) -> Result<(), String> {
    if expected.line != actual.line {
        return Err(format!(
            "Diagnostic expected to {which} on line {}, actual: {}",
            expected.line + 1,
            actual.line + 1
        ));
    }
    if expected.column != actual.column {
        return Err(format!(
            "Diagnostic expected to {which} at column {}, actual: {}",
            expected.column + 1,
            actual.column + 1
        ));
    }
    Ok(())
}

/// Fail if any of `actual` carries one of `forbidden_ids`.
pub fn verify_no_diagnostic<'a>(
    actual: &[Diagnostic],
    forbidden_ids: impl IntoIterator<Item = &'a str>,
) -> VerifyResult<()> {
    let forbidden: Vec<&str> = forbidden_ids.into_iter().collect();
    let found: Vec<Diagnostic> = actual
        .iter()
        .filter(|d| forbidden.contains(&d.id.as_str()))
        .cloned()
        .collect();

    if !found.is_empty() {
        verify_bail!("No diagnostic expected\n\n{}", format_diagnostics(&found));
    }
    Ok(())
}

/// Whether a compiler diagnostic is tolerated by the project's policy.
pub fn is_allowed_compiler_diagnostic(diagnostic: &Diagnostic, options: &ProjectOptions) -> bool {
    diagnostic.severity <= options.allowed_compiler_severity
        || options.allowed_compiler_ids.contains(&diagnostic.id)
}

/// When a compiler diagnostic policy is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerCheck {
    /// The test input, before any action ran.
    Input,
    /// The result of applying a code action.
    AfterAction,
}

/// Fail when `diagnostics` contains anything outside the allowed policy.
pub fn verify_compiler_diagnostics(
    diagnostics: &[Diagnostic],
    options: &ProjectOptions,
    check: CompilerCheck,
) -> VerifyResult<()> {
    let unexpected: Vec<Diagnostic> = diagnostics
        .iter()
        .filter(|d| !is_allowed_compiler_diagnostic(d, options))
        .cloned()
        .collect();

    if unexpected.is_empty() {
        return Ok(());
    }

    let dump = format_diagnostics(&unexpected);
    Err(match check {
        CompilerCheck::Input => VerifyError::precondition(format!(
            "Compilation contains unexpected diagnostic(s):\n\n{dump}"
        )),
        CompilerCheck::AfterAction => VerifyError::regression(format!(
            "Code action introduced unexpected compiler diagnostic(s):\n\n{dump}"
        )),
    })
}

/// Fail when `after` has compiler diagnostics that `before` did not.
///
/// Diagnostics allowed by policy are ignored. Positions move when text is
/// edited, so a diagnostic counts as new only when its id occurs more often
/// than before and no earlier diagnostic with that id sat at the same span.
pub fn verify_no_new_compiler_diagnostics(
    before: &[Diagnostic],
    after: &[Diagnostic],
    options: &ProjectOptions,
) -> VerifyResult<()> {
    let mut before_by_id: HashMap<&str, Vec<&Diagnostic>> = HashMap::new();
    for d in before {
        before_by_id.entry(d.id.as_str()).or_default().push(d);
    }
    let mut after_by_id: HashMap<&str, Vec<&Diagnostic>> = HashMap::new();
    for d in after.iter().filter(|d| !is_allowed_compiler_diagnostic(d, options)) {
        after_by_id.entry(d.id.as_str()).or_default().push(d);
    }

    let mut new: Vec<Diagnostic> = Vec::new();
    for (id, found) in after_by_id {
        let previous = before_by_id.get(id).map(Vec::as_slice).unwrap_or_default();
        let all_after = after.iter().filter(|d| d.id == id).count();
        if all_after <= previous.len() {
            continue;
        }

        let moved: Vec<Diagnostic> = found
            .iter()
            .filter(|d| !previous.iter().any(|p| p.location == d.location))
            .map(|d| (*d).clone())
            .collect();
        if moved.is_empty() {
            new.extend(found.into_iter().cloned());
        } else {
            new.extend(moved);
        }
    }

    if new.is_empty() {
        return Ok(());
    }

    new.sort_by(canonical_order);
    Err(VerifyError::regression(format!(
        "Code action introduced new compiler diagnostic(s):\n\n{}",
        format_diagnostics(&new)
    )))
}
