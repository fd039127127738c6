//! Cooperative cancellation for long-running analysis

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::{Result, SharplintError};

/// Shared flag checked by semantic queries and the rule engine
///
/// Clones observe the same flag, so a host can keep one handle and give
/// another to the analysis.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Return `Err(SharplintError::Cancelled)` once cancellation was requested
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(SharplintError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let token = CancellationToken::new();
        let handle = token.clone();
        assert!(token.check().is_ok());
        handle.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(SharplintError::Cancelled)));
    }
}
