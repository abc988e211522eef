//! Fixed-point fix driver behavior against the toy compiler and analyzer.

mod support;

use lint_verify::{AdditionalFile, CancellationToken, SupportsFix, TestState, VerifyError};
use support::harness::{BrokenFix, NoFix, ReplaceWord, fix_verifier};

fn state(annotated: &str, expected: &str) -> TestState {
    TestState::diagnostic("TV001", annotated, Some(expected)).expect("annotated source should parse")
}

#[test]
fn single_fix_reaches_expected_text() {
    let (verifier, assert) = fix_verifier(ReplaceWord::new("good"));
    verifier
        .verify_fix(&state("x [|bad|] y", "x good y"))
        .expect("fix should converge");
    assert!(assert.failures().is_empty());
}

#[test]
fn fixes_are_applied_until_no_diagnostic_remains() {
    let (verifier, assert) = fix_verifier(ReplaceWord::new("good"));
    verifier
        .verify_fix(&state("[|bad|] and [|bad|]\n", "good and good"))
        .expect("both occurrences should be fixed");
    assert!(assert.failures().is_empty());
}

#[test]
fn diagnostics_with_different_ids_are_all_fixed() {
    let (verifier, assert) = fix_verifier(ReplaceWord::new("good"));
    let state = TestState::from_annotated("[|bad|] and [|meh|]", Some("good and good"))
        .expect("annotated source should parse")
        .with_span_ids(["TV001", "TV002"]);
    verifier
        .verify_diagnostic_and_fix(&state)
        .expect("TV001 and TV002 are reported and fixed");
    assert!(assert.failures().is_empty());
}

#[test]
fn diagnostic_and_fix_checks_the_marked_spans_first() {
    let (verifier, assert) = fix_verifier(ReplaceWord::new("good"));
    let misplaced = state("[|x|] bad", "x good");

    verifier.verify_fix(&misplaced).expect("the fix alone ignores the spans");

    let err = verifier.verify_diagnostic_and_fix(&misplaced).unwrap_err();
    assert!(matches!(err, VerifyError::Mismatch(_)));
    assert!(err.to_string().starts_with("Diagnostic expected to start at column 1, actual: 3"));
    assert_eq!(assert.failures().len(), 1);
}

#[test]
fn diagnostic_and_no_fix() {
    let (verifier, assert) = fix_verifier(NoFix);
    verifier
        .verify_diagnostic_and_no_fix(&state("x [|bad|]", "x bad"))
        .expect("reported but not fixable");
    assert!(assert.failures().is_empty());
}

#[test]
fn allowed_compiler_diagnostics_do_not_fail_the_input() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("good"));
    verifier
        .verify_fix(&state("unused [|bad|]", "unused good"))
        .expect("allowed ids are tolerated");
}

#[test]
fn fix_that_changes_nothing_is_non_convergent() {
    let (verifier, assert) = fix_verifier(ReplaceWord::new("bad"));
    let err = verifier.verify_fix(&state("x [|bad|]", "x good")).unwrap_err();

    assert!(matches!(err, VerifyError::NonConvergence(_)));
    assert_eq!(
        assert.last_failure().as_deref(),
        Some("Same diagnostics returned before and after the fix was applied.")
    );
}

#[test]
fn fix_introducing_compiler_error_is_a_regression() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("ERR"));
    let err = verifier.verify_fix(&state("x [|bad|]", "x ERR")).unwrap_err();

    assert_eq!(err.kind(), "regression");
    insta::assert_snapshot!(err.to_string(), @r"
    Code action introduced new compiler diagnostic(s):

      Test.cs(1,3): error CS1002: 'ERR' is not allowed here
    ");
}

#[test]
fn compiler_error_in_input_is_a_precondition_failure() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("good"));
    let err = verifier.verify_fix(&state("ERR [|bad|]", "ERR good")).unwrap_err();

    assert!(matches!(err, VerifyError::Precondition(_)));
    assert!(err.to_string().starts_with("Compilation contains unexpected diagnostic(s):"));
}

#[test]
fn provider_without_actions_is_reported() {
    let (verifier, assert) = fix_verifier(NoFix);
    let err = verifier.verify_fix(&state("x [|bad|]", "x good")).unwrap_err();

    assert!(matches!(err, VerifyError::NonConvergence(_)));
    assert_eq!(assert.failures(), vec!["No code fix has been registered."]);
}

#[test]
fn unfixable_id_is_a_precondition_failure() {
    let provider = ReplaceWord {
        ids: &["TV002"],
        ..ReplaceWord::new("good")
    };
    let (verifier, _) = fix_verifier(provider);
    let err = verifier.verify_fix(&state("x [|bad|]", "x good")).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Diagnostic 'TV001' is not fixable by code fix provider 'ReplaceWord'."
    );
}

#[test]
fn unsupported_id_is_a_precondition_failure() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("good"));
    let state = TestState::diagnostic("TV999", "x [|bad|]", Some("x good")).unwrap();
    let err = verifier.verify_fix(&state).unwrap_err();

    assert_eq!(
        err.to_string(),
        "Diagnostic \"TV999\" is not supported by analyzer(s) WordAnalyzer."
    );
}

#[test]
fn cancellation_skips_the_assertion_backend() {
    let (verifier, assert) = fix_verifier(ReplaceWord::new("good"));
    let token = CancellationToken::new();
    token.cancel();

    let err = verifier
        .verify_fix_with(&state("x [|bad|]", "x good"), &token)
        .unwrap_err();

    assert!(matches!(err, VerifyError::Cancelled));
    assert!(!err.is_failure());
    assert!(assert.failures().is_empty());
}

#[test]
fn auxiliary_documents_are_fixed_and_compared() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("good"));
    let state = state("x [|bad|]", "x good")
        .with_additional_file(AdditionalFile::with_expected("more bad", "more good"));
    verifier.verify_fix(&state).expect("both documents should be fixed");

    let wrong = state
        .clone()
        .with_additional_file(AdditionalFile::with_expected("bad again", "bad again"));
    let err = verifier.verify_fix(&wrong).unwrap_err();
    assert!(
        err.to_string()
            .starts_with("Text of document \"Test3.cs\" does not match the expected text")
    );
}

#[test]
fn equivalence_key_selects_the_action() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("good"));
    verifier
        .verify_fix(&state("x [|bad|]", "x good").with_equivalence_key("ReplaceWord"))
        .expect("matching key");

    let err = verifier
        .verify_fix(&state("x [|bad|]", "x good").with_equivalence_key("Other"))
        .unwrap_err();
    assert_eq!(err.to_string(), "No code fix has been registered.");
}

#[test]
fn code_action_title_is_checked() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("good"));
    let err = verifier
        .verify_fix(&state("x [|bad|]", "x good").with_code_action_title("Use 'good'"))
        .unwrap_err();

    assert!(matches!(err, VerifyError::Mismatch(_)));
    assert_eq!(
        err.to_string(),
        "Code action title expected to be \"Use 'good'\", actual: \"Replace word\""
    );
}

#[test]
fn text_mismatch_shows_a_diff() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("good"));
    let err = verifier.verify_fix(&state("x [|bad|]", "x fine")).unwrap_err();

    insta::assert_snapshot!(err.to_string().trim_end(), @r#"
    Text of document "Test.cs" does not match the expected text

    --- expected/Test.cs
    +++ actual/Test.cs
    @@ -1,1 +1,1 @@
    -x fine
    +x good
    "#);
}

#[test]
fn missing_expected_text_is_a_precondition_failure() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("good"));
    let state = TestState::diagnostic("TV001", "x [|bad|]", None).unwrap();
    let err = verifier.verify_fix(&state).unwrap_err();
    assert_eq!(err.to_string(), "Expected source text is not specified.");
}

#[test]
fn disabled_by_default_descriptor_is_enabled_for_expected_id() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("fine"));
    let state = TestState::diagnostic("TV002", "x [|meh|]", Some("x fine")).unwrap();
    verifier.verify_fix(&state).expect("TV002 is forced on");
}

#[test]
fn provider_errors_surface_as_collaborator_failures() {
    let (verifier, _) = fix_verifier(BrokenFix);
    let err = verifier.verify_fix(&state("x [|bad|]", "x good")).unwrap_err();
    assert_eq!(err.to_string(), "collaborator failure: provider crashed");
}

#[test]
fn no_fix_passes_when_nothing_is_offered() {
    let (verifier, assert) = fix_verifier(NoFix);
    verifier
        .verify_no_fix(&state("x [|bad|]", "x bad"))
        .expect("NoFix offers nothing");
    assert!(assert.failures().is_empty());
}

#[test]
fn no_fix_fails_when_a_fix_is_offered() {
    let (verifier, _) = fix_verifier(ReplaceWord::new("good"));
    let err = verifier.verify_no_fix(&state("x [|bad|]", "x bad")).unwrap_err();
    assert_eq!(err.to_string(), "No code fix expected.");

    verifier
        .verify_no_fix(&state("x [|bad|]", "x bad").with_equivalence_key("Other"))
        .expect("no action carries the requested key");
}

#[test]
#[should_panic(expected = "No code fix has been registered.")]
fn default_backend_panics() {
    use std::sync::Arc;

    use lint_verify::{DiagnosticVerifier, FixVerifier, Verifier};
    use support::harness::{WordAnalyzer, WordCompiler, options};

    let core = Verifier::new(options(), Arc::new(WordCompiler));
    let verifier = FixVerifier::new(
        DiagnosticVerifier::new(core, Arc::new(WordAnalyzer)),
        Arc::new(NoFix),
    );
    let _ = verifier.verify_fix(&state("x [|bad|]", "x good"));
}
