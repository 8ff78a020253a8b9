//! Legal assistant HTTP client
//!
//! Talks to the service's JSON API. Uses synchronous HTTP (ureq) to be
//! executor-agnostic; callers decide which thread blocks on it.

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use super::api::{
    AnalyzeDocumentRequest, AnalyzeDocumentResponse, AskRequest, AskResponse, DocumentsResponse,
    GenerateDocumentRequest, GenerateDocumentResponse, RecordingResponse, StopRecordingResponse,
    TextToSpeechRequest, UploadResponse,
};
use super::{LegalBackend, UploadFile};
use crate::config::ClientSettings;

/// Error indicating the service answered with a non-success status
#[derive(Debug, thiserror::Error)]
#[error("Backend returned HTTP {status} for {endpoint}")]
pub struct BackendStatusError {
    pub endpoint: String,
    pub status: u16,
}

/// HTTP client for the legal assistant service
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
}

impl HttpBackend {
    /// Form field the upload endpoint reads the file from
    const UPLOAD_FIELD: &'static str = "file";

    /// Create a client for the service at `base_url`
    ///
    /// # Arguments
    /// * `base_url` - Service root, e.g. `http://localhost:8000`
    /// * `timeout` - Upper bound for a whole request, including the body
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();

        Self {
            agent: ureq::Agent::new_with_config(config),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Create a client from loaded settings
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self::new(settings.base_url.clone(), settings.timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.agent.get(&self.url(path)).call();
        read_response(path, response)
    }

    fn post_json<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.agent.post(&self.url(path)).send_json(body);
        read_response(path, response)
    }

    fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.agent.post(&self.url(path)).send_empty();
        read_response(path, response)
    }
}

/// Decode a JSON reply, keeping HTTP status failures distinguishable
fn read_response<T: DeserializeOwned>(
    endpoint: &str,
    response: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
) -> Result<T> {
    let mut response = match response {
        Ok(resp) => resp,
        Err(ureq::Error::StatusCode(status)) => {
            return Err(BackendStatusError {
                endpoint: endpoint.to_string(),
                status,
            }
            .into());
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("Failed to send request to {}", endpoint))),
    };

    response
        .body_mut()
        .read_json()
        .with_context(|| format!("Failed to parse response from {}", endpoint))
}

impl LegalBackend for HttpBackend {
    fn ask(&self, query: &str) -> Result<String> {
        info!("Asking backend ({} chars)", query.chars().count());
        let reply: AskResponse = self.post_json("/ask", &AskRequest { query })?;
        Ok(reply.response)
    }

    fn generate_document(&self, description: &str, preferred_type: Option<&str>) -> Result<String> {
        info!(
            "Requesting document generation (type: {})",
            preferred_type.unwrap_or("auto")
        );
        let body = GenerateDocumentRequest {
            description,
            preferred_type,
        };
        let reply: GenerateDocumentResponse = self.post_json("/generate-document", &body)?;
        Ok(reply.content)
    }

    fn upload_document(&self, file: &UploadFile) -> Result<String> {
        info!("Uploading {} ({} bytes)", file.name, file.bytes.len());

        let form = file.multipart_form(Self::UPLOAD_FIELD)?;
        let response = self.agent.post(&self.url("/upload")).send(form);

        let reply: UploadResponse = read_response("/upload", response)?;
        Ok(reply.response)
    }

    fn text_to_speech(&self, text: &str, save_audio: bool) -> Result<serde_json::Value> {
        self.post_json("/text-to-speech", &TextToSpeechRequest { text, save_audio })
    }

    fn start_recording(&self) -> Result<bool> {
        let reply: RecordingResponse = self.post_empty("/start-recording")?;
        Ok(reply.success)
    }

    fn stop_recording(&self) -> Result<StopRecordingResponse> {
        self.post_empty("/stop-recording")
    }

    fn speech_languages(&self) -> Result<serde_json::Value> {
        self.get_json("/speech-languages")
    }

    fn list_documents(&self) -> Result<DocumentsResponse> {
        self.get_json("/documents")
    }

    fn analyze_document(&self, text: &str) -> Result<AnalyzeDocumentResponse> {
        self.post_json("/analyze-document", &AnalyzeDocumentRequest { text })
    }
}
