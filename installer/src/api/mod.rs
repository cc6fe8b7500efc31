//! Release API client.
//!
//! The launcher asks the KeeperFX web API for the latest release of a
//! channel and for the path→checksum file list of a release. Responses
//! that fail schema or echo checks are treated as absent data.
//!
//! # Sub-modules
//!
//! - [`client`] - `ManifestFetcher` trait and its `ureq` implementation.
//! - [`error`] - Fetch errors.
//! - [`response`] - Response parsing and validation.

pub mod client;
pub mod error;
pub mod response;

pub use client::{HttpManifestFetcher, ManifestFetcher};
pub use error::FetchError;
pub use response::FileManifest;
