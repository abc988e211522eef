//! Test-harness engine for diagnostic analyzers, code fixes and refactorings.
//!
//! A test is written as annotated source text (`[|...|]` marks the spans a
//! diagnostic or refactoring is expected at), turned into an in-memory
//! project, compiled, and then driven to an expected result: the analyzer's
//! diagnostics are compared against the marked spans, code fixes are applied
//! until no fixable diagnostic remains, and refactorings are applied at each
//! span. Every failure is reported through an injectable [`Assert`] backend.
//!
//! The [`csharp`] module wires everything to a tree-sitter backed C#
//! compiler; [`rules`] holds a few sample providers built on it.

#![allow(clippy::type_complexity)] // load_config returns Option<(PathBuf, LintVerifyConfig)>

pub mod action;
pub mod analysis;
pub mod assert;
pub mod cancel;
pub mod compare;
pub mod compiler;
pub mod config;
pub mod csharp;
pub mod diagnostics;
pub mod error;
pub mod fix;
pub mod rules;
pub mod severity;
pub mod state;
pub mod telemetry;
pub mod text;
pub mod verifier;
pub mod workspace;

mod driver;

pub use action::{CodeAction, FixContext, FixProvider, RefactoringContext, RefactoringProvider};
pub use analysis::{AnalysisContext, Analyzer};
pub use assert::{Assert, PanicAssert, RecordingAssert};
pub use cancel::CancellationToken;
pub use compiler::{Compilation, Compiler, TreeSitterCompiler};
pub use diagnostics::{Diagnostic, DiagnosticDescriptor, Location};
pub use error::{VerifyError, VerifyResult};
pub use severity::{ReportDiagnostic, Severity};
pub use state::{AdditionalFile, ExpectedDiagnostic, TestState};
pub use text::{LinePositionSpanInfo, SpanParseError, TextSpan};
pub use verifier::{
    CompilerDiagnosticFixVerifier, DiagnosticVerifier, FixVerifier, RefactoringVerifier,
    SupportsDiagnosticOnly, SupportsFix, SupportsRefactoring, Verifier,
};
pub use workspace::{Document, DocumentId, Project, ProjectOptions};
