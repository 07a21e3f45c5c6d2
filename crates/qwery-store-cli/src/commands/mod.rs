//! Command handlers, one module per command family.

mod documents;
mod entities;
mod ids;
mod misc;
mod secrets;

pub use documents::{handle_get, handle_keys, handle_rm, handle_root};
pub use entities::{handle_list, handle_messages};
pub use ids::{handle_id, handle_id_time};
pub use misc::handle_completions;
pub use secrets::{handle_protect, handle_reveal};
