use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{VerifyError, VerifyResult};

/// Cooperative cancellation shared between a caller and a running
/// verification. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> VerifyResult<()> {
        if self.is_cancelled() {
            Err(VerifyError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(observer.check().is_ok());
        token.cancel();
        assert!(observer.is_cancelled());
        assert!(matches!(observer.check(), Err(VerifyError::Cancelled)));
    }
}
