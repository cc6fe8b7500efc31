//! The install/update state machine.
//!
//! An [`UpdatePipeline`] resolves a request into release archives, then
//! downloads, tests and extracts each one on worker threads while the
//! calling thread drives [`PipelineState`] through explicit
//! [`PipelineEvent`]s. Once every archive is in place, obsolete files named
//! by the removal manifest are offered to the observer for deletion.
//!
//! # Sub-modules
//!
//! - [`cancel`] - Cooperative cancellation token.
//! - [`event`] - Events fed into the state machine.
//! - [`observer`] - Progress and confirmation callbacks.
//! - [`plan`] - Request resolution into release steps.
//! - [`runner`] - The pipeline driver and its worker hand-off.
//! - [`state`] - States and the pure transition function.

pub mod cancel;
pub mod event;
pub mod observer;
pub mod plan;
pub mod runner;
pub mod state;

pub use cancel::CancellationToken;
pub use event::PipelineEvent;
pub use observer::{PipelineObserver, Progress};
pub use plan::{ReleaseStep, UpdateRequest, resolve_plan};
pub use runner::{PipelineContext, UpdatePipeline};
pub use state::PipelineState;
