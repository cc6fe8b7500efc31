//! Callbacks through which a running pipeline reports to its caller.

use super::state::PipelineState;

/// Progress of a long-running stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Bytes of the archive received so far.
    Download {
        /// Bytes received.
        received: u64,
        /// Advertised size, when known.
        total: Option<u64>,
    },
    /// Bytes extracted so far.
    Extract {
        /// Bytes written.
        processed: u64,
        /// Tested archive size.
        total: u64,
    },
}

impl Progress {
    /// Completion in percent, when the total is known.
    ///
    /// # Examples
    ///
    /// ```
    /// use kfx_installer::pipeline::Progress;
    ///
    /// let progress = Progress::Extract { processed: 50, total: 200 };
    /// assert_eq!(progress.percent(), Some(25));
    /// ```
    #[must_use]
    pub fn percent(&self) -> Option<u8> {
        let (done, total) = match *self {
            Self::Download { received, total } => (received, total?),
            Self::Extract { processed, total } => (processed, total),
        };
        if total == 0 {
            return Some(100);
        }
        let percent = done.min(total).saturating_mul(100) / total;
        u8::try_from(percent).ok()
    }
}

/// Receives state changes, progress and questions from a pipeline run.
///
/// All methods are called on the thread that called
/// [`UpdatePipeline::run`](super::UpdatePipeline::run).
pub trait PipelineObserver {
    /// The pipeline entered `state`.
    fn on_state(&mut self, _state: &PipelineState) {}

    /// A stage made progress.
    fn on_progress(&mut self, _progress: &Progress) {}

    /// A status line for the user.
    fn on_message(&mut self, _message: &str) {}

    /// Ask whether the listed obsolete files may be deleted.
    ///
    /// Defaults to keeping them.
    fn confirm_removal(&mut self, _files: &[String]) -> bool {
        false
    }
}
