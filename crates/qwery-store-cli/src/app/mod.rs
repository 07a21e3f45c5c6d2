//! Application-level utilities for the store CLI.
//!
//! This module provides:
//! - Config file, storage root and vault key resolution
//! - The per-invocation [`AppContext`]
//! - Encryption key prompting

mod context;
mod resolver;
mod secrets;

pub use context::AppContext;
pub use resolver::exit_not_found_with_hint;
