//! Verso: version tracking for single files
//!
//! Keeps numbered, timestamped versions of individual files addressed by
//! their absolute path. An append-only log records every version, a content
//! store keeps the bytes, and the version tree is rebuilt from `based_on`
//! links on demand.

pub mod cli;
pub mod config;
pub mod diff;
pub mod engine;
pub mod error;
pub mod hasher;
pub mod logging;
pub mod record;
pub mod store;
pub mod tree;
pub mod version_log;
