//! 7z archive testing and extraction.
//!
//! Game releases ship as 7z archives that are extracted verbatim over the
//! installation root. Every archive is tested in full before anything is
//! written, so a corrupt download never leaves a half-patched install.
//!
//! # Sub-modules
//!
//! - [`backend`] - Process-wide archive backend state.
//! - [`engine`] - The `ArchiveEngine` trait.
//! - [`error`] - Archive error types.
//! - [`path`] - Entry path validation (zip-slip protection).
//! - [`sevenz`] - `sevenz-rust` implementation.

pub mod backend;
pub mod engine;
pub mod error;
pub mod path;
pub mod sevenz;

pub use engine::ArchiveEngine;
pub use error::ArchiveError;
pub use sevenz::SevenZipEngine;
