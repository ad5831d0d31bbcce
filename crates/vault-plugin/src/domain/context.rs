//! Cancellation for plugin phases.
//!
//! Phases run synchronously; the host may cancel a round from another
//! thread. Long loops poll the context between items.

use super::errors::{PluginError, PluginResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation handle shared between the host and a running phase.
#[derive(Clone, Debug, Default)]
pub struct RoundContext {
    cancelled: Arc<AtomicBool>,
}

impl RoundContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Fail fast if the round was cancelled.
    pub fn check(&self) -> PluginResult<()> {
        if self.is_cancelled() {
            Err(PluginError::Cancelled)
        } else {
            Ok(())
        }
    }
}
