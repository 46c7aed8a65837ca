use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crate::error::{HuffmanError, Result};

/// Cooperative cancellation flag shared between a job and whoever may stop it.
///
/// Every stage polls the token between processing units (symbols, merges,
/// decoded symbols) and bails out with [`HuffmanError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }

    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(HuffmanError::Cancelled);
        }
        Ok(())
    }
}
