//! The chat session store
//!
//! Owns the thread list and the active-thread pointer. Each public mutation
//! is one atomic read-modify-write against the persistent store: the
//! persisted state is re-read, the change is applied to it, and both keys
//! are written back together. Another process sharing the same storage
//! therefore never has its threads overwritten by a stale copy.

use anyhow::{Context, Result, anyhow};
use log::{debug, info, warn};
use std::sync::Arc;

use super::ViewState;
use crate::models::{ChatThread, Message, Role, SessionState, ThreadId};
use crate::storage::{Entries, KeyValueStore, keys};

/// Keys read and written together by every session mutation
const SESSION_KEYS: &[&str] = &[keys::CHATS, keys::ACTIVE_CHAT_ID, keys::CHATS_BACKUP];

/// Error returned when a message is appended while no thread is active
#[derive(Debug, thiserror::Error)]
#[error("No active chat thread to append to")]
pub struct NoActiveThreadError;

/// Manager for all chat threads and the active-thread pointer
///
/// State is kept in memory for reads and persisted after every change.
pub struct ChatSessionStore {
    store: Arc<dyn KeyValueStore>,
    state: SessionState,
    view: ViewState,
}

impl ChatSessionStore {
    /// Open the session, rehydrating threads and the active id from `store`.
    ///
    /// Absent or unreadable data yields an empty session.
    pub fn open(store: Arc<dyn KeyValueStore>) -> Result<Self> {
        let state = load_state(store.as_ref(), &SessionState::default())?;
        info!(
            "Loaded {} chat thread(s), active: {}",
            state.threads.len(),
            state.active_thread_id.as_ref().map_or("none", |id| id.as_str())
        );

        Ok(Self {
            store,
            state,
            view: ViewState::default(),
        })
    }

    /// Re-read persisted state, picking up changes made by other handles
    pub fn reload(&mut self) -> Result<()> {
        self.state = load_state(self.store.as_ref(), &self.state)?;
        Ok(())
    }

    // === Queries ===

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// All threads, most recently created first
    pub fn threads(&self) -> &[ChatThread] {
        &self.state.threads
    }

    pub fn thread(&self, id: &ThreadId) -> Option<&ChatThread> {
        self.state.get(id)
    }

    pub fn active_thread_id(&self) -> Option<&ThreadId> {
        self.state.active_thread_id.as_ref()
    }

    pub fn active_thread(&self) -> Option<&ChatThread> {
        self.state.active()
    }

    /// Content of the newest assistant message in the active thread
    pub fn latest_assistant_response(&self) -> Option<&str> {
        self.active_thread()
            .and_then(|t| t.last_assistant_message())
            .map(|m| m.content.as_str())
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    // === Mutations ===

    /// Create a new empty thread, put it first and make it active.
    ///
    /// Clears any pending input. Returns the new thread's id.
    pub fn create_thread(&mut self) -> Result<ThreadId> {
        let id = self.transact(|state| Ok(insert_new_thread(state)))?;
        self.view.pending_input.clear();
        info!("Created chat thread {}", id);
        Ok(id)
    }

    /// Return the active thread's id, creating a thread first if none is active.
    ///
    /// Check and creation happen in one storage transaction, so the caller
    /// always gets a thread that exists by the time this returns.
    pub fn ensure_active_thread(&mut self) -> Result<ThreadId> {
        let (id, created) = self.transact(|state| {
            if let Some(active) = state.active() {
                return Ok((active.id.clone(), false));
            }
            Ok((insert_new_thread(state), true))
        })?;

        if created {
            self.view.pending_input.clear();
            info!("Created chat thread {} on demand", id);
        }
        Ok(id)
    }

    /// Make `id` the active thread. Unknown ids are ignored.
    ///
    /// Returns whether the thread exists.
    pub fn select_thread(&mut self, id: &ThreadId) -> Result<bool> {
        let found = self.transact(|state| {
            if state.contains(id) {
                state.active_thread_id = Some(id.clone());
                Ok(true)
            } else {
                Ok(false)
            }
        })?;

        if found {
            info!("Selected chat thread {}", id);
        } else {
            debug!("Ignoring selection of unknown thread {}", id);
        }
        Ok(found)
    }

    /// Delete a thread.
    ///
    /// Deleting the active thread makes the new first thread active, or
    /// leaves no thread active if none remain. Returns whether it existed.
    pub fn delete_thread(&mut self, id: &ThreadId) -> Result<bool> {
        let removed = self.transact(|state| {
            let before = state.threads.len();
            state.threads.retain(|t| &t.id != id);
            let removed = state.threads.len() != before;

            if state.active_thread_id.as_ref() == Some(id) {
                state.active_thread_id = state.threads.first().map(|t| t.id.clone());
            }
            Ok(removed)
        })?;

        if removed {
            info!("Deleted chat thread {}", id);
        }
        Ok(removed)
    }

    /// Append a message to the active thread.
    ///
    /// Fails with [`NoActiveThreadError`] when no thread is active; nothing
    /// is changed or persisted in that case. Returns the thread appended to.
    pub fn append_message(&mut self, role: Role, content: impl Into<String>) -> Result<ThreadId> {
        let message = Message::new(role, content);

        let result = self.transact(|state| {
            let id = state.active_thread_id.clone().ok_or(NoActiveThreadError)?;
            let thread = state.get_mut(&id).ok_or(NoActiveThreadError)?;
            thread.messages.push(message.clone());
            Ok(id)
        });

        match &result {
            Ok(id) => debug!("Appended {} message to thread {}", role, id),
            Err(e) if e.is::<NoActiveThreadError>() => {
                warn!("Dropped {} message: no active chat thread", role)
            }
            Err(_) => {}
        }
        result
    }

    /// Set a thread's title, but only while it still has the sentinel title.
    ///
    /// Returns whether the title changed.
    pub fn rename_thread(&mut self, id: &ThreadId, title: impl Into<String>) -> Result<bool> {
        let title = title.into();
        self.transact(|state| match state.get_mut(id) {
            Some(thread) if thread.has_sentinel_title() => {
                thread.title = title.clone();
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    /// Set a thread's title unconditionally. Returns whether the thread exists.
    pub fn set_title(&mut self, id: &ThreadId, title: impl Into<String>) -> Result<bool> {
        let title = title.into();
        self.transact(|state| match state.get_mut(id) {
            Some(thread) => {
                thread.title = title.clone();
                Ok(true)
            }
            None => Ok(false),
        })
    }

    /// Apply `op` to freshly persisted state and write the result back.
    ///
    /// The in-memory copy is only replaced once the write has succeeded.
    fn transact<R>(&mut self, mut op: impl FnMut(&mut SessionState) -> Result<R>) -> Result<R> {
        let cached = &self.state;
        let mut outcome = None;

        self.store.update(SESSION_KEYS, &mut |entries| {
            let (mut state, unreadable) = decode_state(entries, cached);
            let result = op(&mut state)?;
            state.normalize();
            if let Some(raw) = unreadable {
                warn!("Moving unreadable stored chats to '{}'", keys::CHATS_BACKUP);
                entries.insert(keys::CHATS_BACKUP.to_string(), Some(raw));
            }
            encode_state(&state, entries)?;
            outcome = Some((result, state));
            Ok(())
        })?;

        let (result, state) = outcome.ok_or_else(|| anyhow!("Storage update did not run"))?;
        self.state = state;
        Ok(result)
    }
}

/// Prepend a fresh thread, make it active and return its id
fn insert_new_thread(state: &mut SessionState) -> ThreadId {
    let thread = ChatThread::new();
    let id = thread.id.clone();
    state.threads.insert(0, thread);
    state.active_thread_id = Some(id.clone());
    id
}

fn load_state(store: &dyn KeyValueStore, fallback: &SessionState) -> Result<SessionState> {
    let mut entries = Entries::new();
    for key in [keys::CHATS, keys::ACTIVE_CHAT_ID] {
        let value = store
            .get(key)
            .with_context(|| format!("Failed to read '{}' from storage", key))?;
        entries.insert(key.to_string(), value);
    }
    let (state, _) = decode_state(&entries, fallback);
    Ok(state)
}

/// Decode persisted entries.
///
/// An unreadable thread list keeps `fallback`'s threads and is handed back
/// raw so the caller can preserve it.
fn decode_state(entries: &Entries, fallback: &SessionState) -> (SessionState, Option<String>) {
    let mut unreadable = None;
    let threads = match entries.get(keys::CHATS).and_then(|v| v.as_deref()) {
        None => Vec::new(),
        Some(raw) if raw.trim().is_empty() => Vec::new(),
        Some(raw) => match serde_json::from_str::<Vec<ChatThread>>(raw) {
            Ok(threads) => threads,
            Err(e) => {
                warn!("Ignoring unreadable stored chats: {}", e);
                unreadable = Some(raw.to_string());
                fallback.threads.clone()
            }
        },
    };

    let active = entries
        .get(keys::ACTIVE_CHAT_ID)
        .and_then(|v| v.as_deref())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ThreadId::from);

    (SessionState::new(threads, active), unreadable)
}

fn encode_state(state: &SessionState, entries: &mut Entries) -> Result<()> {
    let chats = serde_json::to_string(&state.threads).context("Failed to serialize chats")?;
    entries.insert(keys::CHATS.to_string(), Some(chats));
    entries.insert(
        keys::ACTIVE_CHAT_ID.to_string(),
        state.active_thread_id.as_ref().map(|id| id.as_str().to_string()),
    );
    Ok(())
}
