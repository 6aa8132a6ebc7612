//! Connectivity checks performed before any request is attempted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub trait NetworkMonitor: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Reports online unconditionally. Used when the host offers no
/// connectivity signal, so requests are attempted and fail on their own.
#[derive(Debug, Default, Clone, Copy)]
pub struct AssumeOnline;

impl NetworkMonitor for AssumeOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// A shared flag an embedder flips from its own connectivity events.
#[derive(Debug, Clone)]
pub struct OnlineFlag {
    online: Arc<AtomicBool>,
}

impl OnlineFlag {
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for OnlineFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl NetworkMonitor for OnlineFlag {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
