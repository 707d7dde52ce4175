//! CLI command implementations for climate-board.
//!
//! This module provides implementations for all CLI subcommands:
//! - `once`: Single fetch and frame
//! - `parse`: Exposition text dump
//! - `query`: Single sample lookup
//! - `config`: Configuration file generation
//! - `check`: Configuration and source validation

pub mod check;
pub mod config;
pub mod once;
pub mod parse;
pub mod query;

// Re-export command functions
pub use check::command_check;
pub use config::command_config;
pub use once::command_once;
pub use parse::command_parse;
pub use query::command_query;

use std::io::Read;
use std::path::Path;

/// Reads exposition text from a file, or stdin when no path is given.
pub(crate) fn read_input(file: Option<&Path>) -> Result<String, Box<dyn std::error::Error>> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e).into()),
        None => {
            let mut text = String::new();
            std::io::stdin().read_to_string(&mut text)?;
            Ok(text)
        }
    }
}
