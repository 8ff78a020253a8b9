//! Command implementations shared by one-shot subcommands and the REPL

use anyhow::{Result, bail};
use chrono::{Local, Utc};
use colored::Colorize;
use log::info;
use std::path::Path;
use std::sync::Arc;

use lexchat::{
    ChatSessionStore, ChatThread, ClientSettings, HttpBackend, LegalBackend, MessageDispatcher,
    Role, SendMode, SendOptions, SendOutcome, ThreadId, UploadCoordinator, UploadFile,
    UploadOutcome, VoiceInput, write_latest_response,
};

use crate::args::RecordAction;

/// Characters of a thread id shown in listings
const SHORT_ID_LEN: usize = 8;

/// Everything a command needs, wired from settings
pub struct App {
    pub session: ChatSessionStore,
    backend: Arc<dyn LegalBackend>,
    dispatcher: MessageDispatcher,
    uploads: UploadCoordinator,
    voice: VoiceInput,
}

impl App {
    pub fn open(settings: &ClientSettings) -> Result<Self> {
        let store = settings.open_store()?;
        let session = ChatSessionStore::open(store)?;
        let backend: Arc<dyn LegalBackend> = Arc::new(HttpBackend::from_settings(settings));
        info!("Using legal assistant at {}", settings.base_url);

        Ok(Self {
            session,
            dispatcher: MessageDispatcher::new(backend.clone()).with_auto_speak(settings.auto_speak),
            uploads: UploadCoordinator::new(backend.clone()),
            voice: VoiceInput::new(backend.clone()),
            backend,
        })
    }

    /// Let a pending read-aloud finish before the process exits
    pub fn finish(&self) {
        self.dispatcher.wait_for_speech();
    }

    pub fn new_thread(&mut self) -> Result<()> {
        let id = self.session.create_thread()?;
        println!("{} {}", "Started new chat".bright_green(), short_id(&id).bright_black());
        Ok(())
    }

    pub fn list(&self) {
        if self.session.threads().is_empty() {
            println!("{}", "No chats yet.".bright_black());
            return;
        }

        let active = self.session.active_thread_id();
        for thread in self.session.threads() {
            let marker = if Some(&thread.id) == active { "*" } else { " " };
            let line = format!(
                "{} {}  {}  ({} messages, {})",
                marker,
                short_id(&thread.id),
                thread.title,
                thread.messages.len(),
                thread.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
            );
            if Some(&thread.id) == active {
                println!("{}", line.bright_cyan());
            } else {
                println!("{}", line);
            }
        }
    }

    pub fn select(&mut self, prefix: &str) -> Result<()> {
        let id = resolve_thread(self.session.threads(), prefix)?;
        self.session.select_thread(&id)?;
        self.show();
        Ok(())
    }

    pub fn delete(&mut self, prefix: &str) -> Result<()> {
        let id = resolve_thread(self.session.threads(), prefix)?;
        self.session.delete_thread(&id)?;
        println!("{} {}", "Deleted".yellow(), short_id(&id));
        Ok(())
    }

    pub fn show(&self) {
        match self.session.active_thread() {
            Some(thread) => print_thread(thread),
            None => println!("{}", "No active chat.".bright_black()),
        }
    }

    /// Send a message and print the answer
    pub fn send(&mut self, mode: SendMode, text: &str, document_type: Option<String>) -> Result<()> {
        let options = SendOptions { document_type };
        match self.dispatcher.send(&mut self.session, mode, text, &options)? {
            SendOutcome::Ignored => {}
            SendOutcome::Answered => print_reply(self.session.latest_assistant_response(), false),
            SendOutcome::Failed => print_reply(self.session.latest_assistant_response(), true),
        }
        Ok(())
    }

    pub fn upload(&mut self, path: &Path) -> Result<()> {
        let file = UploadFile::from_path(path)?;
        println!("{} {}", "Uploading".bright_black(), file.name);

        match self.uploads.handle_upload(&mut self.session, &file)? {
            UploadOutcome::Uploaded => {
                println!("{} {}", "Uploaded".bright_green(), file.name);
            }
            UploadOutcome::Failed => print_reply(self.session.latest_assistant_response(), true),
        }
        Ok(())
    }

    pub fn export(&self, dir: &Path) -> Result<()> {
        match write_latest_response(&self.session, dir, Utc::now())? {
            Some(path) => println!("{} {}", "Saved".bright_green(), path.display()),
            None => println!("{}", "Nothing to export yet.".bright_black()),
        }
        Ok(())
    }

    /// Start or stop recording; a transcription is returned for editing
    pub fn record(&mut self, action: RecordAction) -> Option<String> {
        match action {
            RecordAction::Start => {
                if self.voice.start() {
                    println!("{}", "Recording... run `record stop` when done.".bright_yellow());
                } else {
                    println!("{}", "Could not start recording.".red());
                }
                None
            }
            RecordAction::Stop => {
                let text = self.voice.stop(&mut self.session);
                match &text {
                    Some(text) => println!("{} {}", "Heard:".bright_yellow(), text),
                    None => println!("{}", "Nothing was transcribed.".bright_black()),
                }
                text
            }
        }
    }

    pub fn languages(&self) -> Result<()> {
        let languages = self.backend.speech_languages()?;
        println!("{}", serde_json::to_string_pretty(&languages)?);
        Ok(())
    }

    pub fn documents(&self) -> Result<()> {
        let listing = self.backend.list_documents()?;
        if listing.documents.is_empty() {
            println!("{}", "No documents uploaded.".bright_black());
            return Ok(());
        }

        for name in &listing.documents {
            match listing.details.get(name) {
                Some(detail) => println!(
                    "{}  {}",
                    name.bright_cyan(),
                    format!("{} chars", detail.content_length).bright_black()
                ),
                None => println!("{}", name.bright_cyan()),
            }
        }
        Ok(())
    }
}

pub fn short_id(id: &ThreadId) -> String {
    id.as_str().chars().take(SHORT_ID_LEN).collect()
}

/// Find the single thread whose id starts with `prefix`
pub fn resolve_thread(threads: &[ChatThread], prefix: &str) -> Result<ThreadId> {
    let prefix = prefix.trim();
    if prefix.is_empty() {
        bail!("Thread id is empty");
    }

    if let Some(exact) = threads.iter().find(|t| t.id.as_str() == prefix) {
        return Ok(exact.id.clone());
    }

    let matches: Vec<&ChatThread> = threads
        .iter()
        .filter(|t| t.id.as_str().starts_with(prefix))
        .collect();
    match matches.as_slice() {
        [only] => Ok(only.id.clone()),
        [] => bail!("No chat matches '{}'", prefix),
        _ => bail!("'{}' matches {} chats; use more characters", prefix, matches.len()),
    }
}

pub fn print_thread(thread: &ChatThread) {
    println!("{}", format!("== {} ==", thread.title).bright_magenta().bold());
    for message in &thread.messages {
        match message.role {
            Role::User => println!("{} {}", "You:".green().bold(), message.content),
            Role::Assistant => {
                println!("{}", "Assistant:".bright_blue().bold());
                for line in message.content.lines() {
                    println!("{}", line.bright_blue());
                }
            }
        }
        println!();
    }
}

fn print_reply(reply: Option<&str>, failed: bool) {
    let Some(reply) = reply else { return };
    for line in reply.lines() {
        if failed {
            println!("{}", line.red());
        } else {
            println!("{}", line.bright_blue());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(id: &str) -> ChatThread {
        ChatThread::with_id(ThreadId::new(id), Utc::now())
    }

    #[test]
    fn test_resolve_by_prefix() {
        let threads = vec![thread("abc123"), thread("abd456"), thread("ff")];

        assert_eq!(resolve_thread(&threads, "abc").unwrap(), ThreadId::new("abc123"));
        assert_eq!(resolve_thread(&threads, "ff").unwrap(), ThreadId::new("ff"));
        assert!(resolve_thread(&threads, "ab").is_err());
        assert!(resolve_thread(&threads, "zz").is_err());
        assert!(resolve_thread(&threads, " ").is_err());
    }

    #[test]
    fn test_exact_id_wins_over_prefix() {
        let threads = vec![thread("ab"), thread("abc")];
        assert_eq!(resolve_thread(&threads, "ab").unwrap(), ThreadId::new("ab"));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id(&ThreadId::new("0123456789abcdef")), "01234567");
        assert_eq!(short_id(&ThreadId::new("abc")), "abc");
    }
}
