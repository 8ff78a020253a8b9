//! Integration tests for the lexchat crate
//!
//! These tests drive the session store and actions against real on-disk
//! stores, with a scripted backend standing in for the HTTP service.

use anyhow::{Result, bail};
use lexchat::api::{AnalyzeDocumentResponse, DocumentsResponse, StopRecordingResponse};
use lexchat::storage::{keys, read_json};
use lexchat::{
    CHAT_ERROR_MESSAGE, ChatSessionStore, ChatThread, FileStore, InMemoryStore, KeyValueStore,
    LegalBackend, Message, MessageDispatcher, NEW_CHAT_TITLE, Role, SendMode, SendOptions,
    SendOutcome, SqliteStore, UploadCoordinator, UploadFile, UploadOutcome, UploadStatus,
    title_from_text, write_latest_response,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Backend answering from a queue of canned replies; `Err` entries fail the call
struct QueueBackend {
    replies: Mutex<Vec<std::result::Result<String, String>>>,
    asked: Mutex<Vec<String>>,
}

impl QueueBackend {
    fn new(replies: Vec<std::result::Result<&str, &str>>) -> Arc<Self> {
        let mut replies: Vec<_> = replies
            .into_iter()
            .map(|r| r.map(str::to_string).map_err(str::to_string))
            .collect();
        replies.reverse();
        Arc::new(Self {
            replies: Mutex::new(replies),
            asked: Mutex::new(Vec::new()),
        })
    }

    fn next(&self, request: String) -> Result<String> {
        self.asked.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(e)) => bail!(e),
            None => bail!("no scripted reply left"),
        }
    }

    fn asked(&self) -> Vec<String> {
        self.asked.lock().unwrap().clone()
    }
}

impl LegalBackend for QueueBackend {
    fn ask(&self, query: &str) -> Result<String> {
        self.next(format!("ask {}", query))
    }

    fn generate_document(&self, description: &str, _preferred_type: Option<&str>) -> Result<String> {
        self.next(format!("generate {}", description))
    }

    fn upload_document(&self, file: &UploadFile) -> Result<String> {
        self.next(format!("upload {}", file.name))
    }

    fn text_to_speech(&self, _text: &str, _save_audio: bool) -> Result<serde_json::Value> {
        bail!("no speaker attached")
    }

    fn start_recording(&self) -> Result<bool> {
        Ok(false)
    }

    fn stop_recording(&self) -> Result<StopRecordingResponse> {
        Ok(StopRecordingResponse::default())
    }

    fn speech_languages(&self) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    fn list_documents(&self) -> Result<DocumentsResponse> {
        Ok(DocumentsResponse::default())
    }

    fn analyze_document(&self, _text: &str) -> Result<AnalyzeDocumentResponse> {
        bail!("not scripted")
    }
}

fn file_store(dir: &TempDir) -> Arc<FileStore> {
    Arc::new(FileStore::new(dir.path().join("storage.json")).unwrap())
}

fn persisted_threads(store: &dyn KeyValueStore) -> Vec<ChatThread> {
    read_json(store, keys::CHATS).unwrap().unwrap_or_default()
}

#[test]
fn test_persisted_scenario_on_disk() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);

    let mut session = ChatSessionStore::open(store.clone()).unwrap();
    let id = session.create_thread().unwrap();
    session.append_message(Role::User, "Q").unwrap();
    session.append_message(Role::Assistant, "A").unwrap();
    drop(session);

    // Read back through a fresh handle on the same file
    let reopened = FileStore::new(dir.path().join("storage.json")).unwrap();
    let threads = persisted_threads(&reopened);
    assert_eq!(threads.len(), 1);
    assert_eq!(threads[0].id, id);
    assert_eq!(threads[0].messages, vec![Message::user("Q"), Message::assistant("A")]);
    assert_eq!(reopened.get(keys::ACTIVE_CHAT_ID).unwrap().as_deref(), Some(id.as_str()));

    // The raw layout matches the browser client's
    let raw: serde_json::Value =
        serde_json::from_str(&reopened.get(keys::CHATS).unwrap().unwrap()).unwrap();
    assert_eq!(raw[0]["title"], NEW_CHAT_TITLE);
    assert_eq!(raw[0]["messages"][0], serde_json::json!({"role": "user", "content": "Q"}));
    assert!(raw[0]["createdAt"].is_string());
}

#[test]
fn test_send_without_active_thread() {
    let store = Arc::new(InMemoryStore::new());
    let backend = QueueBackend::new(vec![Ok("Hello! Ask me about Indian law.")]);
    let mut session = ChatSessionStore::open(store.clone()).unwrap();

    let outcome = MessageDispatcher::new(backend.clone())
        .send(&mut session, SendMode::Chat, "hi", &SendOptions::default())
        .unwrap();

    assert_eq!(outcome, SendOutcome::Answered);
    let threads = persisted_threads(store.as_ref());
    assert_eq!(threads.len(), 1);
    assert_eq!(
        threads[0].messages,
        vec![Message::user("hi"), Message::assistant("Hello! Ask me about Indian law.")]
    );
    assert_eq!(backend.asked(), vec!["ask hi"]);
}

#[test]
fn test_failed_chat_call() {
    let store = Arc::new(InMemoryStore::new());
    let backend = QueueBackend::new(vec![Err("HTTP 500")]);
    let mut session = ChatSessionStore::open(store.clone()).unwrap();

    let outcome = MessageDispatcher::new(backend)
        .send(&mut session, SendMode::Chat, "Explain section 420 IPC", &SendOptions::default())
        .unwrap();

    assert_eq!(outcome, SendOutcome::Failed);
    assert!(!session.view().loading);
    let messages = &persisted_threads(store.as_ref())[0].messages;
    let assistant: Vec<_> = messages.iter().filter(|m| m.role == Role::Assistant).collect();
    assert_eq!(assistant.len(), 1);
    assert_eq!(assistant[0].content, CHAT_ERROR_MESSAGE);
}

#[test]
fn test_upload_titles_thread_after_file() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);
    let backend = QueueBackend::new(vec![Ok("Document uploaded and analyzed successfully")]);
    let mut session = ChatSessionStore::open(store.clone()).unwrap();

    let file = UploadFile::new("contract.pdf", b"%PDF-1.4 ...".to_vec());
    let outcome = UploadCoordinator::new(backend)
        .handle_upload(&mut session, &file)
        .unwrap();

    assert_eq!(outcome, UploadOutcome::Uploaded);
    assert_eq!(session.view().upload.raw_status(), UploadStatus::Success);
    assert_eq!(persisted_threads(store.as_ref())[0].title, "contract");
}

#[test]
fn test_conversation_across_restarts_with_sqlite() {
    let dir = TempDir::new().unwrap();
    let db = dir.path().join("lexchat.db");
    let backend = QueueBackend::new(vec![
        Ok("Anticipatory bail is granted under Section 438 CrPC."),
        Ok("LEGAL NOTICE\n\nTo the tenant..."),
    ]);
    let question = "What is anticipatory bail in India?";

    {
        let store = Arc::new(SqliteStore::new(&db).unwrap());
        let mut session = ChatSessionStore::open(store).unwrap();
        MessageDispatcher::new(backend.clone())
            .with_auto_speak(false)
            .send(&mut session, SendMode::Chat, question, &SendOptions::default())
            .unwrap();
    }

    let store = Arc::new(SqliteStore::new(&db).unwrap());
    let mut session = ChatSessionStore::open(store).unwrap();
    assert_eq!(session.threads().len(), 1);
    assert_eq!(session.active_thread().unwrap().title, title_from_text(question));

    // A second thread, then back to the first
    let first = session.active_thread_id().cloned().unwrap();
    session.create_thread().unwrap();
    MessageDispatcher::new(backend.clone())
        .send(
            &mut session,
            SendMode::DocumentGeneration,
            "Notice to a tenant who has not paid rent",
            &SendOptions {
                document_type: Some("legal_notice".to_string()),
            },
        )
        .unwrap();
    assert_eq!(session.threads().len(), 2);
    assert_eq!(session.active_thread().unwrap().title, "Notice to a tenant");

    session.select_thread(&first).unwrap();
    let exported = write_latest_response(&session, dir.path(), chrono::Utc::now())
        .unwrap()
        .unwrap();
    assert!(
        std::fs::read_to_string(exported)
            .unwrap()
            .contains("Section 438")
    );
}

#[test]
fn test_deleting_every_thread_clears_active_pointer() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);
    let mut session = ChatSessionStore::open(store.clone()).unwrap();

    let ids: Vec<_> = (0..3).map(|_| session.create_thread().unwrap()).collect();
    for id in &ids {
        session.delete_thread(id).unwrap();
        if let Some(active) = session.active_thread_id() {
            assert!(session.thread(active).is_some());
        }
    }

    assert!(session.threads().is_empty());
    assert_eq!(store.get(keys::ACTIVE_CHAT_ID).unwrap(), None);

    let reopened = ChatSessionStore::open(store).unwrap();
    assert!(reopened.threads().is_empty());
    assert!(reopened.active_thread_id().is_none());
}

#[test]
fn test_dangling_active_id_is_repaired_on_open() {
    let store = Arc::new(InMemoryStore::new());
    let thread = ChatThread::new();
    store
        .set(keys::CHATS, &serde_json::to_string(&vec![thread.clone()]).unwrap())
        .unwrap();
    store.set(keys::ACTIVE_CHAT_ID, "deleted-elsewhere").unwrap();

    let session = ChatSessionStore::open(store).unwrap();
    assert_eq!(session.active_thread_id(), Some(&thread.id));
}

#[test]
fn test_selecting_unknown_thread_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let store = file_store(&dir);
    let mut session = ChatSessionStore::open(store.clone()).unwrap();
    let id = session.create_thread().unwrap();

    // Re-save compactly so any rewrite would show up as pretty-printed
    let path = store.path().to_path_buf();
    let doc: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let compact = serde_json::to_string(&doc).unwrap();
    std::fs::write(&path, &compact).unwrap();

    session.select_thread(&"no-such-thread".into()).unwrap();

    assert_eq!(session.active_thread_id(), Some(&id));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), compact);
}
