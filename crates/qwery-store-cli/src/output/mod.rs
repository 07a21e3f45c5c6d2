//! Output formatting for the store CLI.
//!
//! - `json`: pretty JSON for documents and `--json` listings
//! - `text`: one line per key or entity for humans

mod json;
mod text;

pub use json::print_json;
pub use text::{print_keys, print_summaries, Summary};
