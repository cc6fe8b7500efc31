//! Process-wide archive backend state.
//!
//! Every engine instance in the process shares one backend, created on
//! first use. The backend serialises archive operations: decoding a large
//! release archive is memory hungry and two concurrent extractions over
//! the same installation root would interleave writes.

use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Shared state behind every archive engine.
#[derive(Debug, Default)]
pub struct Backend {
    operation: Mutex<()>,
    operations_started: AtomicU64,
}

impl Backend {
    /// Block until no other archive operation is running, then hold the
    /// operation slot until the returned guard is dropped.
    pub fn begin_operation(&self) -> MutexGuard<'_, ()> {
        let guard = self
            .operation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let started = self.operations_started.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("archive operation {started} started");
        guard
    }

    /// Number of archive operations started in this process.
    #[must_use]
    pub fn operations_started(&self) -> u64 {
        self.operations_started.load(Ordering::Relaxed)
    }
}

/// Return the process-wide backend, creating it on first call.
///
/// Initialisation runs exactly once even when several threads race to be
/// first.
pub fn shared() -> &'static Backend {
    static BACKEND: OnceLock<Backend> = OnceLock::new();
    BACKEND.get_or_init(|| {
        debug!("initialising archive backend");
        Backend::default()
    })
}
