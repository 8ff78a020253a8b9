//! UI-facing flags that live alongside the session
//!
//! None of this is persisted; it describes what the front end should show.

use chrono::{DateTime, Duration, Utc};

/// Seconds a successful upload keeps showing before the status reads idle
pub const UPLOAD_STATUS_RESET_SECS: i64 = 5;

/// Progress of the most recent document upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadStatus {
    #[default]
    Idle,
    Uploading,
    Success,
    Error,
}

/// Upload status plus the file it concerns
#[derive(Debug, Clone, Default)]
pub struct UploadState {
    status: UploadStatus,
    file_name: Option<String>,
    changed_at: Option<DateTime<Utc>>,
}

impl UploadState {
    /// Record a new status at `now`
    pub fn set(&mut self, status: UploadStatus, now: DateTime<Utc>) {
        self.status = status;
        self.changed_at = Some(now);
    }

    /// Record the display name of the file being uploaded
    pub fn set_file_name(&mut self, name: impl Into<String>) {
        self.file_name = Some(name.into());
    }

    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    /// Status as last recorded, ignoring the reset timer
    pub fn raw_status(&self) -> UploadStatus {
        self.status
    }

    /// Status as it should be displayed at `now`.
    ///
    /// A success reads as idle once [`UPLOAD_STATUS_RESET_SECS`] have passed.
    pub fn status_at(&self, now: DateTime<Utc>) -> UploadStatus {
        match self.status {
            UploadStatus::Success if reset_elapsed(self.changed_at, now, UPLOAD_STATUS_RESET_SECS) => {
                UploadStatus::Idle
            }
            status => status,
        }
    }

    /// Status as it should be displayed right now
    pub fn status(&self) -> UploadStatus {
        self.status_at(Utc::now())
    }
}

/// Check whether `delay_secs` have passed since `since`.
///
/// # Returns
/// `true` if enough time has passed (or nothing was ever recorded)
pub fn reset_elapsed(since: Option<DateTime<Utc>>, now: DateTime<Utc>, delay_secs: i64) -> bool {
    match since {
        Some(at) => now - at >= Duration::seconds(delay_secs),
        None => true,
    }
}

/// Visibility and progress flags for the chat view
#[derive(Debug, Clone)]
pub struct ViewState {
    /// Text typed (or transcribed) but not yet sent
    pub pending_input: String,
    /// True while an outbound request is in flight
    pub loading: bool,
    /// Whether the feature overview panel is shown
    pub features_visible: bool,
    pub upload: UploadState,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            pending_input: String::new(),
            loading: false,
            features_visible: true,
            upload: UploadState::default(),
        }
    }
}
