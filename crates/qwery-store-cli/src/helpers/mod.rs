//! Argument parsing and input helpers for the store CLI.

mod input;
mod parsing;

pub use input::read_value;
pub use parsing::{parse_entity, parse_key, parse_prefix};
