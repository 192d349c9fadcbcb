//! Shared utilities for the client engine.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Collapses a burst of triggers into a single winner.
///
/// Each call to [`Debouncer::trigger`] starts the delay window afresh; only
/// the most recent trigger resolves `true` once the window passes quiet.
/// Used to keep free-text search from issuing one request per keystroke.
#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    generation: Arc<AtomicU64>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Register a trigger and wait out the delay window. Resolves `true`
    /// only if no newer trigger arrived in the meantime.
    pub async fn trigger(&self) -> bool {
        let token = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.delay).await;
        self.generation.load(Ordering::SeqCst) == token
    }
}
