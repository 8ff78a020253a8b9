//! Voice input through the service's recorder

use log::{info, warn};
use std::sync::Arc;

use crate::backend::LegalBackend;
use crate::session::ChatSessionStore;

/// Starts and stops server-side recording
pub struct VoiceInput {
    backend: Arc<dyn LegalBackend>,
}

impl VoiceInput {
    pub fn new(backend: Arc<dyn LegalBackend>) -> Self {
        Self { backend }
    }

    /// Start recording. Returns whether the service started.
    pub fn start(&self) -> bool {
        match self.backend.start_recording() {
            Ok(true) => {
                info!("Voice recording started");
                true
            }
            Ok(false) => {
                warn!("Service declined to start recording");
                false
            }
            Err(e) => {
                warn!("Failed to start recording: {:#}", e);
                false
            }
        }
    }

    /// Stop recording and collect the transcription.
    ///
    /// A usable transcription replaces the pending input and is returned.
    pub fn stop(&self, session: &mut ChatSessionStore) -> Option<String> {
        let reply = match self.backend.stop_recording() {
            Ok(reply) => reply,
            Err(e) => {
                warn!("Failed to stop recording: {:#}", e);
                return None;
            }
        };

        let transcription = reply.transcription.unwrap_or_default();
        let text = match transcription.transcription {
            Some(text) if reply.success && transcription.success && !text.trim().is_empty() => text,
            _ => {
                warn!(
                    "No transcription: {}",
                    transcription.error.as_deref().unwrap_or("nothing recognised")
                );
                return None;
            }
        };

        session.view_mut().pending_input = text.clone();
        Some(text)
    }
}
