//! Chat session state management
//!
//! All mutation of the thread list and the active-thread pointer goes
//! through [`ChatSessionStore`], which re-persists after every change.

mod store;
mod title;
mod view;

pub use store::{ChatSessionStore, NoActiveThreadError};
pub use title::{TITLE_MAX_CHARS, title_from_file_name, title_from_text};
pub use view::{UPLOAD_STATUS_RESET_SECS, UploadState, UploadStatus, ViewState, reset_elapsed};
