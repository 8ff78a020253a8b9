//! LexChat crate - Client core for the legal assistant service
//!
//! This crate provides the UI-independent parts of the chat client:
//! - Domain models (ChatThread, Message, SessionState)
//! - Key-value storage abstractions (in-memory, JSON file, SQLite)
//! - The chat session store: thread lifecycle and persistence
//! - HTTP client for the legal assistant API
//! - Actions: message dispatch, document upload, voice input, export
//!
//! A front end owns one [`ChatSessionStore`] and passes it by `&mut` to
//! each action, so actions on the same session never interleave.

pub mod actions;
pub mod backend;
pub mod config;
pub mod models;
pub mod session;
pub mod storage;

pub use actions::{
    CHAT_ERROR_MESSAGE, MessageDispatcher, SendMode, SendOptions, SendOutcome,
    UPLOAD_ERROR_MESSAGE, UploadCoordinator, UploadOutcome, VoiceInput,
    export_file_name, latest_response_export, write_latest_response,
};
pub use backend::{BackendStatusError, HttpBackend, LegalBackend, UploadFile, api};
pub use config::{ClientSettings, StorageBackend};
pub use models::{ChatThread, Message, NEW_CHAT_TITLE, Role, SessionState, ThreadId};
pub use session::{
    ChatSessionStore, NoActiveThreadError, UploadStatus, ViewState,
    title_from_file_name, title_from_text,
};
pub use storage::{FileStore, InMemoryStore, KeyValueStore, SqliteStore};
