//! Built-in output handlers.

mod json;
mod text;

pub use json::JsonHandler;
pub use text::{status_label, TextHandler};
