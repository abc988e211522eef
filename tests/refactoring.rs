//! Refactoring driver: one action per span, applied last span first.

mod support;

use std::sync::Arc;

use anyhow::Result;
use lint_verify::fix::TextEdit;
use lint_verify::{
    CodeAction, RefactoringContext, RefactoringProvider, RefactoringVerifier, SupportsRefactoring,
    TestState, VerifyError,
};
use support::harness::recording_verifier;

/// Upper-cases the selection; offers nothing for an empty selection.
struct Uppercase;

impl RefactoringProvider for Uppercase {
    fn compute_refactorings(&self, ctx: &mut RefactoringContext<'_>) -> Result<()> {
        let Some(selected) = ctx.document.text.get(ctx.span.range()) else {
            return Ok(());
        };
        if selected.is_empty() {
            return Ok(());
        }
        let action = CodeAction::new("Uppercase")
            .with_equivalence_key("Uppercase")
            .with_edits(
                ctx.document.id,
                vec![TextEdit::replace(ctx.span, selected.to_uppercase())],
            );
        ctx.register(action);
        Ok(())
    }
}

fn verifier() -> RefactoringVerifier {
    let (core, _) = recording_verifier();
    RefactoringVerifier::new(core, Arc::new(Uppercase))
}

fn state(annotated: &str, expected: &str) -> TestState {
    TestState::from_annotated(annotated, Some(expected)).expect("annotated source should parse")
}

#[test]
fn every_span_is_refactored() {
    verifier()
        .verify_refactoring(&state("[|ab|] cd [|ef|]", "AB cd EF"))
        .expect("both spans upper-cased");
}

#[test]
fn length_changing_edits_keep_earlier_spans_valid() {
    // `ﬁ` (three bytes) upper-cases to `FI` (two bytes).
    verifier()
        .verify_refactoring(&state("[|ﬁ|] x [|ﬁ|]", "FI x FI"))
        .expect("spans are applied back to front");
}

#[test]
fn missing_span_is_a_precondition_failure() {
    let err = verifier()
        .verify_refactoring(&state("ab", "AB"))
        .unwrap_err();
    assert!(matches!(err, VerifyError::Precondition(_)));
    assert_eq!(
        err.to_string(),
        "Span on which a refactoring should be invoked was not found."
    );
}

#[test]
fn no_action_is_reported() {
    let err = verifier()
        .verify_refactoring(&state("a[||]b", "ab"))
        .unwrap_err();
    assert!(matches!(err, VerifyError::NonConvergence(_)));
    assert_eq!(err.to_string(), "No code refactoring has been registered.");
}

#[test]
fn key_and_title_are_checked() {
    let err = verifier()
        .verify_refactoring(&state("[|ab|]", "AB").with_equivalence_key("Lowercase"))
        .unwrap_err();
    assert_eq!(err.to_string(), "No code refactoring has been registered.");

    let err = verifier()
        .verify_refactoring(&state("[|ab|]", "AB").with_code_action_title("Capitalize"))
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Code action title expected to be \"Capitalize\", actual: \"Uppercase\""
    );
}

#[test]
fn refactoring_into_a_compiler_error_is_a_regression() {
    let err = verifier()
        .verify_refactoring(&state("x [|err|]", "x ERR"))
        .unwrap_err();
    assert!(matches!(err, VerifyError::Regression(_)));
    assert!(
        err.to_string()
            .starts_with("Code action introduced new compiler diagnostic(s):\n\n  Test.cs(1,3): error CS1002")
    );
}

#[test]
fn no_refactoring() {
    verifier()
        .verify_no_refactoring(&state("a[||]b", "ab"))
        .expect("empty selection offers nothing");

    let err = verifier()
        .verify_no_refactoring(&state("[|ab|]", "ab"))
        .unwrap_err();
    assert_eq!(err.to_string(), "No code refactoring expected.");
}
