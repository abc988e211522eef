//! Verification entry points.
//!
//! [`Verifier`] holds what every verification needs: project options, a
//! compiler and an assertion backend. The typed verifiers compose it with
//! the plugins under test and expose their operations through the
//! capability traits.

use std::sync::{Arc, OnceLock};

use itertools::Itertools;

use crate::action::{FixProvider, RefactoringProvider};
use crate::analysis::{Analyzer, analyzer_diagnostics, supported_diagnostics};
use crate::assert::{Assert, PanicAssert};
use crate::cancel::CancellationToken;
use crate::compare::{DiagnosticChecks, verify_diagnostics, verify_no_diagnostic};
use crate::compiler::Compiler;
use crate::diagnostics::DiagnosticDescriptor;
use crate::driver::{Session, compiler_fix, fix, refactoring};
use crate::error::{VerifyError, VerifyResult};
use crate::state::TestState;
use crate::telemetry::{info_event, warn_event};
use crate::workspace::ProjectOptions;

/// Shared core of every verifier.
#[derive(Clone)]
pub struct Verifier {
    options: Arc<ProjectOptions>,
    compiler: Arc<dyn Compiler>,
    assert: Arc<dyn Assert>,
}

impl Verifier {
    /// A verifier that panics on failure.
    pub fn new(options: impl Into<Arc<ProjectOptions>>, compiler: Arc<dyn Compiler>) -> Self {
        Self {
            options: options.into(),
            compiler,
            assert: Arc::new(PanicAssert),
        }
    }

    #[must_use]
    pub fn with_assert(mut self, assert: Arc<dyn Assert>) -> Self {
        self.assert = assert;
        self
    }

    /// The same verifier over different project options.
    #[must_use]
    pub fn with_options(&self, options: impl Into<Arc<ProjectOptions>>) -> Self {
        Self {
            options: options.into(),
            ..self.clone()
        }
    }

    pub fn options(&self) -> &ProjectOptions {
        &self.options
    }

    /// Run one verification, routing failures to the assertion backend.
    /// Cancellation is returned without asserting.
    fn run<T>(
        &self,
        operation: &'static str,
        body: impl FnOnce(&Session<'_>) -> VerifyResult<T>,
    ) -> VerifyResult<T> {
        let session = Session {
            options: &self.options,
            compiler: self.compiler.as_ref(),
        };

        let result = crate::instrument_block!(operation, { body(&session) });
        match &result {
            Ok(_) => info_event!(operation = operation, "verification passed"),
            Err(err) if err.is_failure() => {
                warn_event!(operation = operation, kind = err.kind(), error = %err, "verification failed");
                self.assert.fail(err);
            }
            Err(_) => info_event!(operation = operation, "verification cancelled"),
        }
        result
    }
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Verifier")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

pub trait SupportsDiagnosticOnly {
    /// The diagnostics at the state's spans are exactly what the analyzers report.
    fn verify_diagnostic_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()>;

    /// None of the state's ids is reported.
    fn verify_no_diagnostic_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()>;

    fn verify_diagnostic(&self, state: &TestState) -> VerifyResult<()> {
        self.verify_diagnostic_with(state, &CancellationToken::new())
    }

    fn verify_no_diagnostic(&self, state: &TestState) -> VerifyResult<()> {
        self.verify_no_diagnostic_with(state, &CancellationToken::new())
    }
}

pub trait SupportsFix {
    /// Fixing every expected diagnostic yields the expected text.
    fn verify_fix_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()>;

    /// No matching fix is offered for any expected diagnostic.
    fn verify_no_fix_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()>;

    fn verify_fix(&self, state: &TestState) -> VerifyResult<()> {
        self.verify_fix_with(state, &CancellationToken::new())
    }

    fn verify_no_fix(&self, state: &TestState) -> VerifyResult<()> {
        self.verify_no_fix_with(state, &CancellationToken::new())
    }

    /// The spans match the reported diagnostics, then fixing them yields
    /// the expected text.
    fn verify_diagnostic_and_fix_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()>
    where
        Self: SupportsDiagnosticOnly,
    {
        self.verify_diagnostic_with(state, cancel)?;
        self.verify_fix_with(state, cancel)
    }

    /// The spans match the reported diagnostics and none of them is offered a fix.
    fn verify_diagnostic_and_no_fix_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()>
    where
        Self: SupportsDiagnosticOnly,
    {
        self.verify_diagnostic_with(state, cancel)?;
        self.verify_no_fix_with(state, cancel)
    }

    fn verify_diagnostic_and_fix(&self, state: &TestState) -> VerifyResult<()>
    where
        Self: SupportsDiagnosticOnly,
    {
        self.verify_diagnostic_and_fix_with(state, &CancellationToken::new())
    }

    fn verify_diagnostic_and_no_fix(&self, state: &TestState) -> VerifyResult<()>
    where
        Self: SupportsDiagnosticOnly,
    {
        self.verify_diagnostic_and_no_fix_with(state, &CancellationToken::new())
    }
}

pub trait SupportsRefactoring {
    fn verify_refactoring_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()>;

    fn verify_no_refactoring_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()>;

    fn verify_refactoring(&self, state: &TestState) -> VerifyResult<()> {
        self.verify_refactoring_with(state, &CancellationToken::new())
    }

    fn verify_no_refactoring(&self, state: &TestState) -> VerifyResult<()> {
        self.verify_no_refactoring_with(state, &CancellationToken::new())
    }
}

/// Verifies the diagnostics reported by a set of analyzers.
pub struct DiagnosticVerifier {
    core: Verifier,
    analyzers: Vec<Arc<dyn Analyzer>>,
    supported: OnceLock<Vec<&'static DiagnosticDescriptor>>,
}

impl DiagnosticVerifier {
    pub fn new(core: Verifier, analyzer: Arc<dyn Analyzer>) -> Self {
        Self {
            core,
            analyzers: vec![analyzer],
            supported: OnceLock::new(),
        }
    }

    /// Add an analyzer that can report the same diagnostics.
    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzers.push(analyzer);
        self.supported = OnceLock::new();
        self
    }

    pub fn core(&self) -> &Verifier {
        &self.core
    }

    pub fn supported_diagnostics(&self) -> &[&'static DiagnosticDescriptor] {
        self.supported
            .get_or_init(|| supported_diagnostics(&self.analyzers))
    }

    fn ensure_supported(&self, state: &TestState) -> VerifyResult<()> {
        let supported = self.supported_diagnostics();
        for id in state.expected_ids() {
            if !supported.iter().any(|d| d.id == id) {
                return Err(VerifyError::precondition(format!(
                    "Diagnostic \"{id}\" is not supported by analyzer(s) {}.",
                    self.analyzers.iter().map(|a| a.name()).join(", ")
                )));
            }
        }
        Ok(())
    }
}

impl SupportsDiagnosticOnly for DiagnosticVerifier {
    fn verify_diagnostic_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        self.core.run("verify_diagnostic", |session| {
            cancel.check()?;
            self.ensure_supported(state)?;

            let (materialized, compilation) = session.open_checked(state)?;
            let force_enabled = fix::force_enabled_ids(state);
            let mut actual = analyzer_diagnostics(&self.analyzers, &compilation, &force_enabled);

            if !actual.is_empty() && self.supported_diagnostics().len() > 1 {
                let expected_ids: Vec<&str> = state.expected_ids().collect();
                actual.retain(|d| expected_ids.contains(&d.id.as_str()));
            }

            cancel.check()?;
            let expected = state.expected_diagnostics(&materialized.primary_document().name);
            let checks = DiagnosticChecks {
                message: state.diagnostic_message.is_some(),
                additional_locations: state.verify_additional_locations,
            };
            verify_diagnostics(&expected, &actual, checks)
        })
    }

    fn verify_no_diagnostic_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        self.core.run("verify_no_diagnostic", |session| {
            cancel.check()?;
            self.ensure_supported(state)?;

            let (_, compilation) = session.open_checked(state)?;
            let force_enabled = fix::force_enabled_ids(state);
            let actual = analyzer_diagnostics(&self.analyzers, &compilation, &force_enabled);
            verify_no_diagnostic(&actual, state.expected_ids())
        })
    }
}

/// Verifies analyzer diagnostics and the fixes a provider offers for them.
pub struct FixVerifier {
    diagnostics: DiagnosticVerifier,
    provider: Arc<dyn FixProvider>,
}

impl FixVerifier {
    pub fn new(diagnostics: DiagnosticVerifier, provider: Arc<dyn FixProvider>) -> Self {
        Self {
            diagnostics,
            provider,
        }
    }
}

impl SupportsDiagnosticOnly for FixVerifier {
    fn verify_diagnostic_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        self.diagnostics.verify_diagnostic_with(state, cancel)
    }

    fn verify_no_diagnostic_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        self.diagnostics.verify_no_diagnostic_with(state, cancel)
    }
}

impl SupportsFix for FixVerifier {
    fn verify_fix_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        let inner = &self.diagnostics;
        inner.core.run("verify_fix", |session| {
            inner.ensure_supported(state)?;
            fix::verify_fix(session, &inner.analyzers, self.provider.as_ref(), state, cancel)
        })
    }

    fn verify_no_fix_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        let inner = &self.diagnostics;
        inner.core.run("verify_no_fix", |session| {
            fix::verify_no_fix(session, &inner.analyzers, self.provider.as_ref(), state, cancel)
        })
    }
}

/// Verifies a refactoring provider.
pub struct RefactoringVerifier {
    core: Verifier,
    provider: Arc<dyn RefactoringProvider>,
}

impl RefactoringVerifier {
    pub fn new(core: Verifier, provider: Arc<dyn RefactoringProvider>) -> Self {
        Self { core, provider }
    }
}

impl SupportsRefactoring for RefactoringVerifier {
    fn verify_refactoring_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        self.core.run("verify_refactoring", |session| {
            refactoring::verify_refactoring(session, self.provider.as_ref(), state, cancel)
        })
    }

    fn verify_no_refactoring_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        self.core.run("verify_no_refactoring", |session| {
            refactoring::verify_no_refactoring(session, self.provider.as_ref(), state, cancel)
        })
    }
}

/// Verifies fixes for one compiler diagnostic id.
pub struct CompilerDiagnosticFixVerifier {
    core: Verifier,
    diagnostic_id: String,
    provider: Arc<dyn FixProvider>,
}

impl CompilerDiagnosticFixVerifier {
    pub fn new(core: Verifier, diagnostic_id: impl Into<String>, provider: Arc<dyn FixProvider>) -> Self {
        Self {
            core,
            diagnostic_id: diagnostic_id.into(),
            provider,
        }
    }

    pub fn diagnostic_id(&self) -> &str {
        &self.diagnostic_id
    }

    pub fn verify_no_compiler_fix(&self, state: &TestState) -> VerifyResult<()> {
        self.verify_no_fix(state)
    }
}

impl SupportsFix for CompilerDiagnosticFixVerifier {
    fn verify_fix_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        self.core.run("verify_compiler_fix", |session| {
            compiler_fix::verify_compiler_fix(
                session,
                &self.diagnostic_id,
                self.provider.as_ref(),
                state,
                cancel,
            )
        })
    }

    fn verify_no_fix_with(&self, state: &TestState, cancel: &CancellationToken) -> VerifyResult<()> {
        self.core.run("verify_no_compiler_fix", |session| {
            compiler_fix::verify_no_compiler_fix(session, self.provider.as_ref(), state, cancel)
        })
    }
}
