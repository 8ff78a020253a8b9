//! Message dispatcher
//!
//! Turns a line of user input into one backend request and records both
//! sides of the exchange in the active thread.

use anyhow::Result;
use log::{debug, info, warn};
use std::fmt;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::backend::LegalBackend;
use crate::models::Role;
use crate::session::{ChatSessionStore, title_from_text};

/// Assistant message recorded when the backend could not answer
pub const CHAT_ERROR_MESSAGE: &str =
    "Sorry, I encountered an error while processing your request. Please try again.";

/// Which backend endpoint a message is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    Chat,
    DocumentGeneration,
}

impl fmt::Display for SendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chat => write!(f, "chat"),
            Self::DocumentGeneration => write!(f, "document generation"),
        }
    }
}

/// Extra request parameters
#[derive(Debug, Clone, Default)]
pub struct SendOptions {
    /// Preferred document type for generation, e.g. `legal_notice`
    pub document_type: Option<String>,
}

/// How a send ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend answered and the answer was appended
    Answered,
    /// The backend failed; the fixed error message was appended
    Failed,
    /// Blank input; nothing happened
    Ignored,
}

/// Sends user messages to the backend
pub struct MessageDispatcher {
    backend: Arc<dyn LegalBackend>,
    auto_speak: bool,
    /// Most recent text-to-speech call, still running or not yet joined
    speech: Mutex<Option<JoinHandle<()>>>,
}

impl MessageDispatcher {
    pub fn new(backend: Arc<dyn LegalBackend>) -> Self {
        Self {
            backend,
            auto_speak: true,
            speech: Mutex::new(None),
        }
    }

    /// Enable or disable reading answers aloud
    pub fn with_auto_speak(mut self, auto_speak: bool) -> Self {
        self.auto_speak = auto_speak;
        self
    }

    /// Send `text` and wait for the answer.
    ///
    /// Creates a thread first when none is active. Backend failures are
    /// recorded in the thread as [`CHAT_ERROR_MESSAGE`] rather than returned;
    /// only storage failures surface as `Err`. Reading the answer aloud runs
    /// in the background and never delays the return.
    pub fn send(
        &self,
        session: &mut ChatSessionStore,
        mode: SendMode,
        text: &str,
        options: &SendOptions,
    ) -> Result<SendOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SendOutcome::Ignored);
        }

        let thread_id = session.ensure_active_thread()?;
        session.append_message(Role::User, text)?;

        let view = session.view_mut();
        view.pending_input.clear();
        view.features_visible = false;
        view.loading = true;

        info!("Sending {} request for thread {}", mode, thread_id);
        let reply = match mode {
            SendMode::Chat => self.backend.ask(text),
            SendMode::DocumentGeneration => self
                .backend
                .generate_document(text, options.document_type.as_deref()),
        };
        session.view_mut().loading = false;

        match reply {
            Ok(answer) => {
                session.append_message(Role::Assistant, answer.as_str())?;
                session.rename_thread(&thread_id, title_from_text(text))?;
                self.speak(&answer);
                Ok(SendOutcome::Answered)
            }
            Err(e) => {
                warn!("{} request failed: {:#}", mode, e);
                session.append_message(Role::Assistant, CHAT_ERROR_MESSAGE)?;
                Ok(SendOutcome::Failed)
            }
        }
    }

    /// Block until the last answer has been read aloud (or speech failed)
    pub fn wait_for_speech(&self) {
        let handle = match self.speech.lock() {
            Ok(mut speech) => speech.take(),
            Err(_) => return,
        };
        if let Some(handle) = handle {
            if handle.join().is_err() {
                debug!("Text-to-speech thread panicked");
            }
        }
    }

    fn speak(&self, answer: &str) {
        if !self.auto_speak {
            return;
        }

        let backend = Arc::clone(&self.backend);
        let text = answer.to_string();
        let spawned = thread::Builder::new()
            .name("lexchat-speech".to_string())
            .spawn(move || {
                if let Err(e) = backend.text_to_speech(&text, false) {
                    debug!("Text-to-speech failed: {:#}", e);
                }
            });

        match spawned {
            // An earlier call still running is left detached
            Ok(handle) => {
                if let Ok(mut speech) = self.speech.lock() {
                    *speech = Some(handle);
                }
            }
            Err(e) => debug!("Could not start text-to-speech: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions::testing::ScriptedBackend;
    use crate::models::{Message, NEW_CHAT_TITLE};
    use crate::storage::InMemoryStore;
    use std::time::{Duration, Instant};

    fn session() -> ChatSessionStore {
        ChatSessionStore::open(Arc::new(InMemoryStore::new())).unwrap()
    }

    fn dispatcher(backend: &Arc<ScriptedBackend>) -> MessageDispatcher {
        MessageDispatcher::new(backend.clone())
    }

    #[test]
    fn test_send_creates_thread_on_demand() {
        let backend = Arc::new(ScriptedBackend::answering("Hello! How can I help?"));
        let mut session = session();

        let outcome = dispatcher(&backend)
            .send(&mut session, SendMode::Chat, "hi", &SendOptions::default())
            .unwrap();

        assert_eq!(outcome, SendOutcome::Answered);
        assert_eq!(session.threads().len(), 1);
        let thread = session.active_thread().unwrap();
        assert_eq!(
            thread.messages,
            vec![Message::user("hi"), Message::assistant("Hello! How can I help?")]
        );
        assert_eq!(thread.title, "hi");
        assert!(!session.view().loading);
        assert!(!session.view().features_visible);
    }

    #[test]
    fn test_failed_send_appends_error_text() {
        let backend = Arc::new(ScriptedBackend::failing());
        let mut session = session();

        let outcome = dispatcher(&backend)
            .send(&mut session, SendMode::Chat, "What is bail?", &SendOptions::default())
            .unwrap();

        assert_eq!(outcome, SendOutcome::Failed);
        let messages = &session.active_thread().unwrap().messages;
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1], Message::assistant(CHAT_ERROR_MESSAGE));
        assert!(!session.view().loading);
        // Nothing to read aloud
        assert!(!backend.calls().iter().any(|c| c.starts_with("speak:")));
        // A failed exchange leaves the title alone
        assert_eq!(session.active_thread().unwrap().title, NEW_CHAT_TITLE);
    }

    #[test]
    fn test_blank_input_is_ignored() {
        let backend = Arc::new(ScriptedBackend::answering("unused"));
        let mut session = session();

        let outcome = dispatcher(&backend)
            .send(&mut session, SendMode::Chat, "   \n", &SendOptions::default())
            .unwrap();

        assert_eq!(outcome, SendOutcome::Ignored);
        assert!(session.threads().is_empty());
        assert!(backend.calls().is_empty());
    }

    #[test]
    fn test_title_derived_once() {
        let backend = Arc::new(ScriptedBackend::answering("answer"));
        let mut session = session();
        let dispatcher = dispatcher(&backend);

        dispatcher
            .send(
                &mut session,
                SendMode::Chat,
                "What are the grounds for anticipatory bail?",
                &SendOptions::default(),
            )
            .unwrap();
        dispatcher
            .send(&mut session, SendMode::Chat, "And for regular bail?", &SendOptions::default())
            .unwrap();

        let thread = session.active_thread().unwrap();
        assert_eq!(thread.title, "What are the grounds");
        assert_eq!(thread.messages.len(), 4);
    }

    #[test]
    fn test_document_generation_passes_type() {
        let backend = Arc::new(ScriptedBackend::answering("LEGAL NOTICE"));
        let mut session = session();
        let options = SendOptions {
            document_type: Some("legal_notice".to_string()),
        };

        dispatcher(&backend)
            .send(&mut session, SendMode::DocumentGeneration, "unpaid rent", &options)
            .unwrap();

        assert_eq!(backend.calls()[0], "generate:legal_notice:unpaid rent");
        assert_eq!(session.latest_assistant_response(), Some("LEGAL NOTICE"));
    }

    #[test]
    fn test_speech_failure_is_swallowed() {
        let backend = Arc::new(ScriptedBackend {
            speech_fails: true,
            ..ScriptedBackend::answering("spoken answer")
        });
        let mut session = session();
        let dispatcher = dispatcher(&backend);

        let outcome = dispatcher
            .send(&mut session, SendMode::Chat, "read this", &SendOptions::default())
            .unwrap();

        assert_eq!(outcome, SendOutcome::Answered);
        dispatcher.wait_for_speech();
        assert_eq!(backend.calls(), vec!["ask:read this", "speak:spoken answer"]);
        assert_eq!(session.latest_assistant_response(), Some("spoken answer"));
    }

    #[test]
    fn test_auto_speak_can_be_disabled() {
        let backend = Arc::new(ScriptedBackend::answering("quiet"));
        let mut session = session();

        let dispatcher = dispatcher(&backend).with_auto_speak(false);
        dispatcher
            .send(&mut session, SendMode::Chat, "hush", &SendOptions::default())
            .unwrap();
        dispatcher.wait_for_speech();

        assert_eq!(backend.calls(), vec!["ask:hush"]);
    }

    #[test]
    fn test_slow_speech_does_not_delay_answer() {
        let backend = Arc::new(ScriptedBackend {
            speech_delay: Some(Duration::from_secs(3)),
            ..ScriptedBackend::answering("Bail is a right, jail the exception.")
        });
        let mut session = session();
        let dispatcher = dispatcher(&backend);

        let started = Instant::now();
        let outcome = dispatcher
            .send(&mut session, SendMode::Chat, "hi", &SendOptions::default())
            .unwrap();
        let took = started.elapsed();

        assert_eq!(outcome, SendOutcome::Answered);
        assert!(took < Duration::from_secs(1), "send blocked for {:?}", took);
        assert_eq!(
            session.latest_assistant_response(),
            Some("Bail is a right, jail the exception.")
        );

        dispatcher.wait_for_speech();
        assert_eq!(
            backend.calls(),
            vec!["ask:hi", "speak:Bail is a right, jail the exception."]
        );
    }

    #[test]
    fn test_send_clears_pending_input() {
        let backend = Arc::new(ScriptedBackend::answering("ok"));
        let mut session = session();
        session.create_thread().unwrap();
        session.view_mut().pending_input = "draft".to_string();

        dispatcher(&backend)
            .send(&mut session, SendMode::Chat, "draft", &SendOptions::default())
            .unwrap();

        assert!(session.view().pending_input.is_empty());
        assert_eq!(session.threads().len(), 1);
    }
}
