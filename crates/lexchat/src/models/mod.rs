//! Domain models for chat entities

mod message;
mod state;
mod thread;

pub use message::{Message, Role};
pub use state::SessionState;
pub use thread::{ChatThread, NEW_CHAT_TITLE, ThreadId};
