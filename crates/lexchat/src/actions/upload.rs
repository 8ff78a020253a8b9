//! Upload coordinator

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;

use crate::backend::{LegalBackend, UploadFile};
use crate::models::Role;
use crate::session::{ChatSessionStore, UploadStatus, title_from_file_name};

/// Assistant message recorded when an upload fails
pub const UPLOAD_ERROR_MESSAGE: &str =
    "Sorry, there was an error uploading your document. Please try again.";

/// How an upload ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadOutcome {
    Uploaded,
    Failed,
}

/// Uploads documents on behalf of the active thread
pub struct UploadCoordinator {
    backend: Arc<dyn LegalBackend>,
}

impl UploadCoordinator {
    pub fn new(backend: Arc<dyn LegalBackend>) -> Self {
        Self { backend }
    }

    /// Upload `file`, creating a thread first when none is active.
    ///
    /// On success the thread is titled after the file. On failure the upload
    /// status reads `Error` and [`UPLOAD_ERROR_MESSAGE`] is appended.
    pub fn handle_upload(&self, session: &mut ChatSessionStore, file: &UploadFile) -> Result<UploadOutcome> {
        let thread_id = session.ensure_active_thread()?;

        let view = session.view_mut();
        view.upload.set(UploadStatus::Uploading, Utc::now());
        view.upload.set_file_name(file.name.as_str());
        view.loading = true;

        let result = self.backend.upload_document(file);

        let view = session.view_mut();
        view.loading = false;

        match result {
            Ok(_) => {
                view.upload.set(UploadStatus::Success, Utc::now());
                view.features_visible = false;
                session.set_title(&thread_id, title_from_file_name(&file.name))?;
                info!("Uploaded {} into thread {}", file.name, thread_id);
                Ok(UploadOutcome::Uploaded)
            }
            Err(e) => {
                warn!("Upload of {} failed: {:#}", file.name, e);
                view.upload.set(UploadStatus::Error, Utc::now());
                session.append_message(Role::Assistant, UPLOAD_ERROR_MESSAGE)?;
                Ok(UploadOutcome::Failed)
            }
        }
    }
}
