//! Legal assistant backend integration
//!
//! This module provides:
//! - The [`LegalBackend`] trait the dispatcher and coordinators talk to
//! - An HTTP implementation over the service's JSON API
//! - Request/response types for every endpoint

mod client;
mod upload;

pub use client::{BackendStatusError, HttpBackend};
pub use upload::UploadFile;

use anyhow::Result;

use api::{AnalyzeDocumentResponse, DocumentsResponse, StopRecordingResponse};

/// Operations offered by the remote legal assistant service
///
/// Every call blocks until the service answers (or the transport gives up).
/// Implementations never retry on their own.
pub trait LegalBackend: Send + Sync {
    /// Ask a legal question; returns the answer text
    fn ask(&self, query: &str) -> Result<String>;

    /// Draft a legal document from a case description; returns its text
    fn generate_document(&self, description: &str, preferred_type: Option<&str>) -> Result<String>;

    /// Upload a document for indexing; returns the service's confirmation
    fn upload_document(&self, file: &UploadFile) -> Result<String>;

    /// Convert text to speech; the payload shape is service-defined
    fn text_to_speech(&self, text: &str, save_audio: bool) -> Result<serde_json::Value>;

    /// Start server-side voice recording; returns whether it started
    fn start_recording(&self) -> Result<bool>;

    /// Stop voice recording and collect the transcription
    fn stop_recording(&self) -> Result<StopRecordingResponse>;

    /// Languages supported for speech recognition (service-defined shape)
    fn speech_languages(&self) -> Result<serde_json::Value>;

    /// Documents the service currently holds for retrieval
    fn list_documents(&self) -> Result<DocumentsResponse>;

    /// Run the service's legal analysis over raw document text
    fn analyze_document(&self, text: &str) -> Result<AnalyzeDocumentResponse>;
}

/// Backend API request and response types
pub mod api {
    use serde::{Deserialize, Serialize};
    use std::collections::BTreeMap;

    /// Body of `POST /ask`
    #[derive(Debug, Serialize)]
    pub struct AskRequest<'a> {
        pub query: &'a str,
    }

    /// Reply from `POST /ask`
    #[derive(Debug, Deserialize)]
    pub struct AskResponse {
        pub response: String,
        #[serde(default)]
        pub analysis: Option<QueryAnalysis>,
    }

    /// Classification the service attaches to an answer
    #[derive(Debug, Deserialize)]
    pub struct QueryAnalysis {
        #[serde(default)]
        pub legal_domain: Option<String>,
        #[serde(default)]
        pub confidence_score: Option<f64>,
        #[serde(default)]
        pub sources: Vec<String>,
    }

    /// Reply from `POST /upload`
    #[derive(Debug, Deserialize)]
    pub struct UploadResponse {
        pub response: String,
        #[serde(default)]
        pub filename: Option<String>,
        #[serde(default)]
        pub extracted_text: Option<String>,
        #[serde(default)]
        pub rag_status: Option<String>,
    }

    /// Body of `POST /text-to-speech`
    #[derive(Debug, Serialize)]
    pub struct TextToSpeechRequest<'a> {
        pub text: &'a str,
        pub save_audio: bool,
    }

    /// Reply from `POST /start-recording`
    #[derive(Debug, Deserialize)]
    pub struct RecordingResponse {
        #[serde(default)]
        pub success: bool,
        #[serde(default)]
        pub error: Option<String>,
    }

    /// Reply from `POST /stop-recording`
    #[derive(Debug, Default, Deserialize)]
    pub struct StopRecordingResponse {
        #[serde(default)]
        pub success: bool,
        #[serde(default)]
        pub transcription: Option<Transcription>,
    }

    /// Speech recognition result embedded in a stop-recording reply
    #[derive(Debug, Default, Deserialize)]
    pub struct Transcription {
        #[serde(default)]
        pub success: bool,
        #[serde(default)]
        pub transcription: Option<String>,
        #[serde(default)]
        pub error: Option<String>,
    }

    /// Body of `POST /generate-document`
    #[derive(Debug, Serialize)]
    pub struct GenerateDocumentRequest<'a> {
        pub description: &'a str,
        pub preferred_type: Option<&'a str>,
    }

    /// Reply from `POST /generate-document`
    #[derive(Debug, Deserialize)]
    pub struct GenerateDocumentResponse {
        pub content: String,
    }

    /// Body of `POST /analyze-document`
    #[derive(Debug, Serialize)]
    pub struct AnalyzeDocumentRequest<'a> {
        pub text: &'a str,
    }

    /// Reply from `POST /analyze-document`
    #[derive(Debug, Deserialize)]
    pub struct AnalyzeDocumentResponse {
        pub analysis: serde_json::Value,
        #[serde(default)]
        pub features_used: Vec<String>,
    }

    /// Reply from `GET /documents`
    #[derive(Debug, Default, Deserialize)]
    pub struct DocumentsResponse {
        #[serde(default)]
        pub documents: Vec<String>,
        #[serde(default)]
        pub count: usize,
        #[serde(default)]
        pub details: BTreeMap<String, DocumentDetail>,
    }

    /// Per-document details in a documents listing
    #[derive(Debug, Deserialize)]
    pub struct DocumentDetail {
        /// Seconds since the Unix epoch
        pub upload_time: f64,
        pub content_length: usize,
        #[serde(default)]
        pub preview: String,
    }

}
