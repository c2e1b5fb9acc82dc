use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{NautexError, Result};

/// Cooperative cancellation signal threaded through long-running
/// operations. Clones share the same flag; checks happen at queue
/// boundaries, between batch flushes, and between documents.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Bail out with `Canceled` if the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_canceled() {
            Err(NautexError::Canceled)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_propagates_to_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(token.check().is_ok());

        clone.cancel();
        assert!(token.is_canceled());
        assert!(matches!(token.check(), Err(NautexError::Canceled)));
    }
}
