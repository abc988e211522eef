//! C# project defaults and the tree-sitter backed C# compiler.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};

use crate::compiler::{Compiler, TreeSitterCompiler};
use crate::severity::Severity;
use crate::verifier::Verifier;
use crate::workspace::ProjectOptions;

pub const LANGUAGE: &str = "C#";
pub const DOCUMENT_NAME: &str = "Test.cs";
pub const DEFAULT_LANGUAGE_VERSION: &str = "9";

/// Compiler diagnostics that never fail a C# test: unused variables,
/// fields, events and usings, and missing `Equals`/`GetHashCode`
/// overrides alongside `==`.
pub const ALLOWED_COMPILER_DIAGNOSTIC_IDS: &[&str] = &[
    "CS0067", // event is never used
    "CS0168", // variable is declared but never used
    "CS0169", // field is never used
    "CS0219", // variable is assigned but its value is never used
    "CS0414", // private field is assigned but its value is never used
    "CS0649", // field is never assigned to
    "CS0660", // operator == without Equals
    "CS0661", // operator == without GetHashCode
    "CS8019", // unnecessary using directive
    "CS8321", // local function is declared but never used
];

const REFERENCES: &[&str] = &[
    "System.Private.CoreLib",
    "System.Runtime",
    "System.Collections",
    "System.Collections.Immutable",
    "System.Linq",
    "Microsoft.CodeAnalysis",
    "Microsoft.CodeAnalysis.CSharp",
];

fn create_default() -> ProjectOptions {
    REFERENCES.iter().fold(
        ProjectOptions::new(LANGUAGE, DOCUMENT_NAME)
            .with_language_version(DEFAULT_LANGUAGE_VERSION)
            .with_preprocessor_symbols(["DEBUG"])
            .with_allow_unsafe(true)
            .with_allowed_compiler_severity(Severity::Info)
            .with_allowed_compiler_ids(ALLOWED_COMPILER_DIAGNOSTIC_IDS.iter().copied()),
        |options, reference| options.with_reference(*reference),
    )
}

/// Default C# project options, built once per process.
pub fn default_options() -> Arc<ProjectOptions> {
    static DEFAULT: OnceLock<Arc<ProjectOptions>> = OnceLock::new();
    Arc::clone(DEFAULT.get_or_init(|| Arc::new(create_default())))
}

/// Default options with nullable reference types enabled.
pub fn nullable_options() -> Arc<ProjectOptions> {
    static NULLABLE: OnceLock<Arc<ProjectOptions>> = OnceLock::new();
    Arc::clone(NULLABLE.get_or_init(|| {
        Arc::new(
            default_options()
                .as_ref()
                .clone()
                .with_nullable_reference_types(true),
        )
    }))
}

/// Default options at another language version. Each version is built once.
pub fn options_for_version(version: &str) -> Arc<ProjectOptions> {
    static BY_VERSION: OnceLock<Mutex<HashMap<String, Arc<ProjectOptions>>>> = OnceLock::new();
    let cache = BY_VERSION.get_or_init(Default::default);
    let mut cache = match cache.lock() {
        Ok(cache) => cache,
        Err(poisoned) => poisoned.into_inner(),
    };
    Arc::clone(cache.entry(version.to_string()).or_insert_with(|| {
        Arc::new(
            default_options()
                .as_ref()
                .clone()
                .with_language_version(version),
        )
    }))
}

pub fn compiler() -> Arc<dyn Compiler> {
    Arc::new(TreeSitterCompiler::new(tree_sitter_c_sharp::language))
}

/// A verifier over the default C# options and compiler.
pub fn verifier() -> Verifier {
    Verifier::new(default_options(), compiler())
}
