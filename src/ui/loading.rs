//! Busy overlay with reference counting.
//!
//! Nested `show`/`hide` pairs compose: the overlay is visible while at least
//! one caller holds it.

use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

/// Message shown when the caller gives none.
pub const DEFAULT_MESSAGE: &str = "Processing...";

/// A busy indicator the page can raise while waiting on the backend.
pub trait LoadingIndicator: Send + Sync {
    fn show(&self, message: &str);
    fn hide(&self);
    fn hide_all(&self);
    fn is_visible(&self) -> bool;
}

/// Raise `indicator` and hide it again when the guard drops.
pub fn guard(indicator: Arc<dyn LoadingIndicator>, message: &str) -> LoadingGuard {
    indicator.show(message);
    LoadingGuard { indicator }
}

/// Hides its indicator on drop, whichever way the scope is left.
pub struct LoadingGuard {
    indicator: Arc<dyn LoadingIndicator>,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        self.indicator.hide();
    }
}

#[derive(Debug, Default)]
struct OverlayState {
    count: usize,
    message: String,
}

/// Reference-counted loading overlay.
#[derive(Debug, Default)]
pub struct LoadingOverlay {
    state: Mutex<OverlayState>,
}

impl LoadingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding `show` calls.
    pub fn depth(&self) -> usize {
        self.lock().count
    }

    /// Message of the most recent `show`, if visible.
    pub fn message(&self) -> Option<String> {
        let state = self.lock();
        (state.count > 0).then(|| state.message.clone())
    }

    fn lock(&self) -> MutexGuard<'_, OverlayState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LoadingIndicator for LoadingOverlay {
    fn show(&self, message: &str) {
        let mut state = self.lock();
        state.count += 1;
        state.message = if message.is_empty() {
            DEFAULT_MESSAGE.to_string()
        } else {
            message.to_string()
        };
        debug!(depth = state.count, message = %state.message, "Loading shown");
    }

    fn hide(&self) {
        let mut state = self.lock();
        state.count = state.count.saturating_sub(1);
        debug!(depth = state.count, "Loading hidden");
    }

    fn hide_all(&self) {
        self.lock().count = 0;
    }

    fn is_visible(&self) -> bool {
        self.lock().count > 0
    }
}
