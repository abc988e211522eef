use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::fix::EditError;
use crate::text::SpanParseError;

/// Result alias for verification outcomes.
pub type VerifyResult<T> = Result<T, VerifyError>;

/// Every way a verification call can end other than success.
///
/// All variants except [`VerifyError::Cancelled`] are test failures and are
/// routed through the verifier's assertion backend.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The annotated test source has unbalanced or missing span markers.
    #[error("malformed test source: {0}")]
    SpanParse(#[from] SpanParseError),

    /// The test cannot meaningfully run (unsupported id, unfixable id,
    /// unexpected compiler diagnostics in the input, missing span).
    #[error("{0}")]
    Precondition(String),

    /// A fix did not make progress, or no fix was ever offered.
    #[error("{0}")]
    NonConvergence(String),

    /// Applying an action introduced compiler diagnostics that were not there before.
    #[error("{0}")]
    Regression(String),

    /// Expected and actual values differ.
    #[error("{0}")]
    Mismatch(String),

    /// An action produced edits that cannot be applied to its document.
    #[error("invalid code action edit: {0}")]
    Edit(#[from] EditError),

    /// The compiler or a provider failed.
    #[error("collaborator failure: {0:#}")]
    Compiler(#[from] AnyhowError),

    #[error("verification was cancelled")]
    Cancelled,
}

impl VerifyError {
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    pub fn non_convergence(msg: impl Into<String>) -> Self {
        Self::NonConvergence(msg.into())
    }

    pub fn regression(msg: impl Into<String>) -> Self {
        Self::Regression(msg.into())
    }

    pub fn mismatch(msg: impl Into<String>) -> Self {
        Self::Mismatch(msg.into())
    }

    /// Whether this outcome is a test failure (as opposed to a cancellation).
    pub fn is_failure(&self) -> bool {
        !matches!(self, VerifyError::Cancelled)
    }

    /// Short stable name of the failure class, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::SpanParse(_) => "span_parse",
            VerifyError::Precondition(_) => "precondition",
            VerifyError::NonConvergence(_) => "non_convergence",
            VerifyError::Regression(_) => "regression",
            VerifyError::Mismatch(_) => "mismatch",
            VerifyError::Edit(_) => "edit",
            VerifyError::Compiler(_) => "compiler",
            VerifyError::Cancelled => "cancelled",
        }
    }
}

/// Mirrors `anyhow::bail!`, returning a [`VerifyError::Mismatch`].
#[macro_export]
macro_rules! verify_bail {
    ($($arg:tt)*) => {
        return Err($crate::error::VerifyError::mismatch(format!($($arg)*)))
    };
}

/// Mirrors `anyhow::ensure!`, returning a [`VerifyError::Mismatch`].
#[macro_export]
macro_rules! verify_ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::verify_bail!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ensure_positive(n: i32) -> VerifyResult<i32> {
        verify_ensure!(n > 0, "expected a positive number, actual: {n}");
        Ok(n)
    }

    #[test]
    fn ensure_macro_produces_mismatch() {
        let err = ensure_positive(-1).unwrap_err();
        assert_eq!(err.kind(), "mismatch");
        assert_eq!(err.to_string(), "expected a positive number, actual: -1");
        assert_eq!(ensure_positive(3).unwrap(), 3);
    }

    #[test]
    fn cancellation_is_not_a_failure() {
        assert!(!VerifyError::Cancelled.is_failure());
        assert!(VerifyError::regression("x").is_failure());
    }

    #[test]
    fn compiler_errors_keep_their_context() {
        let err: VerifyError = anyhow::anyhow!("root cause")
            .context("failed to compile TestProject")
            .into();
        assert_eq!(
            err.to_string(),
            "collaborator failure: failed to compile TestProject: root cause"
        );
    }
}
