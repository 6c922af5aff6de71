//! Core shared library for the Pattern Check plugin.
//!
//! This crate exposes the primitives every other member depends on:
//! the common error type, configuration loading and logging setup.

pub mod config;
pub mod errors;
pub mod logging;

pub use config::{AbsentFieldPolicy, PluginConfig};
pub use errors::{ConfigError, CoreError, Result as CoreResult, UnknownAbsentFieldPolicy};
