//! User-facing chat actions
//!
//! Provides the handlers that turn UI events (send, upload, record, export)
//! into session mutations and backend calls.

mod dispatcher;
mod export;
mod upload;
mod voice;

pub use dispatcher::{CHAT_ERROR_MESSAGE, MessageDispatcher, SendMode, SendOptions, SendOutcome};
pub use export::{export_file_name, latest_response_export, write_latest_response};
pub use upload::{UPLOAD_ERROR_MESSAGE, UploadCoordinator, UploadOutcome};
pub use voice::VoiceInput;
