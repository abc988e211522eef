//! Assertion backends. Verifiers report every failure through one of these
//! so the harness can run under any test framework, or be tested itself.

use std::sync::Mutex;

use crate::error::VerifyError;

pub trait Assert: Send + Sync {
    /// Called once per failed verification, before the error is returned.
    fn fail(&self, error: &VerifyError);
}

/// Panics with the failure message, which is what `#[test]` functions expect.
#[derive(Debug, Default, Clone, Copy)]
pub struct PanicAssert;

impl Assert for PanicAssert {
    fn fail(&self, error: &VerifyError) {
        panic!("{error}");
    }
}

/// Records failure messages instead of panicking.
#[derive(Debug, Default)]
pub struct RecordingAssert {
    failures: Mutex<Vec<String>>,
}

impl RecordingAssert {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<String> {
        match self.failures.lock() {
            Ok(failures) => failures.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn last_failure(&self) -> Option<String> {
        self.failures().pop()
    }
}

impl Assert for RecordingAssert {
    fn fail(&self, error: &VerifyError) {
        let mut failures = match self.failures.lock() {
            Ok(failures) => failures,
            Err(poisoned) => poisoned.into_inner(),
        };
        failures.push(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_keeps_messages_in_order() {
        let assert = RecordingAssert::new();
        assert.fail(&VerifyError::mismatch("first"));
        assert.fail(&VerifyError::precondition("second"));
        assert_eq!(assert.failures(), vec!["first", "second"]);
        assert_eq!(assert.last_failure().as_deref(), Some("second"));
    }

    #[test]
    #[should_panic(expected = "No code fix has been registered.")]
    fn panic_backend_panics_with_the_message() {
        PanicAssert.fail(&VerifyError::non_convergence("No code fix has been registered."));
    }
}
