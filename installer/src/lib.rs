//! KeeperFX installer library.
//!
//! This crate provides the install and update pipeline of the KeeperFX
//! launcher: release lookup, archive download, integrity testing,
//! extraction, and removal of files obsoleted by newer releases. It is used
//! by the `kfx-installer` CLI binary and can be consumed programmatically
//! for testing or custom front ends.
//!
//! # Modules
//!
//! - [`api`] - Release API client and response validation
//! - [`archive`] - 7z archive testing and extraction
//! - [`cli`] - Command-line argument definitions
//! - [`commands`] - Subcommand handlers
//! - [`config`] - Launcher configuration file and overrides
//! - [`dirs`] - Directory resolution abstraction for platform-specific paths
//! - [`download`] - Chunked HTTP downloads with progress and cancellation
//! - [`error`] - Error types and failure classification
//! - [`filemap`] - Checksum comparison of installed files
//! - [`installed`] - Record of the installed release
//! - [`lock`] - Exclusive lock on an installation root
//! - [`output`] - Terminal rendering of pipeline progress
//! - [`pipeline`] - The install/update state machine
//! - [`removal`] - Removal manifest parsing and obsolete file deletion
//! - [`update_check`] - Deciding whether a newer release is available
//! - [`version`] - Release channels, version strings, and comparison

pub mod api;
pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod dirs;
pub mod download;
pub mod error;
pub mod filemap;
pub mod installed;
pub mod lock;
pub mod output;
pub mod pipeline;
pub mod removal;
pub mod update_check;
pub mod version;

#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
