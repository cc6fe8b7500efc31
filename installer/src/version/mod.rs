//! Release channels, version strings, and version comparison.
//!
//! # Sub-modules
//!
//! - [`channel`] - Release channel enum (`ReleaseChannel`).
//! - [`compare`] - Component-wise comparison of dotted version strings.
//! - [`functionality`] - Features gated on a minimum game version.
//! - [`info`] - Parsed version metadata (`VersionInfo`).

pub mod channel;
pub mod compare;
pub mod functionality;
pub mod info;

pub use channel::ReleaseChannel;
pub use compare::{is_higher_or_equal, is_lower_or_equal, is_newer};
pub use functionality::Functionality;
pub use info::VersionInfo;
