//! The process-wide list of threads plus the active-thread pointer

use serde::{Deserialize, Serialize};

use super::{ChatThread, ThreadId};

/// All chat threads, most recently created first, and which one is active
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub threads: Vec<ChatThread>,
    pub active_thread_id: Option<ThreadId>,
}

impl SessionState {
    pub fn new(threads: Vec<ChatThread>, active_thread_id: Option<ThreadId>) -> Self {
        let mut state = Self {
            threads,
            active_thread_id,
        };
        state.normalize();
        state
    }

    pub fn contains(&self, id: &ThreadId) -> bool {
        self.threads.iter().any(|t| &t.id == id)
    }

    pub fn get(&self, id: &ThreadId) -> Option<&ChatThread> {
        self.threads.iter().find(|t| &t.id == id)
    }

    pub fn get_mut(&mut self, id: &ThreadId) -> Option<&mut ChatThread> {
        self.threads.iter_mut().find(|t| &t.id == id)
    }

    pub fn active(&self) -> Option<&ChatThread> {
        self.active_thread_id.as_ref().and_then(|id| self.get(id))
    }

    /// Repair the active pointer so it never dangles.
    ///
    /// A pointer to a missing thread moves to the first thread, or to none
    /// when there are no threads. Duplicate ids keep their first occurrence.
    pub fn normalize(&mut self) {
        let mut seen = std::collections::HashSet::new();
        self.threads.retain(|t| seen.insert(t.id.clone()));

        let dangling = match &self.active_thread_id {
            Some(id) => !self.contains(id),
            None => false,
        };
        if dangling {
            self.active_thread_id = self.threads.first().map(|t| t.id.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn thread(id: &str) -> ChatThread {
        ChatThread::with_id(ThreadId::new(id), Utc::now())
    }

    #[test]
    fn test_dangling_active_moves_to_first() {
        let state = SessionState::new(vec![thread("a"), thread("b")], Some(ThreadId::new("zzz")));
        assert_eq!(state.active_thread_id, Some(ThreadId::new("a")));
    }

    #[test]
    fn test_dangling_active_with_no_threads_is_none() {
        let state = SessionState::new(Vec::new(), Some(ThreadId::new("zzz")));
        assert_eq!(state.active_thread_id, None);
    }

    #[test]
    fn test_valid_active_is_kept() {
        let state = SessionState::new(vec![thread("a"), thread("b")], Some(ThreadId::new("b")));
        assert_eq!(state.active().unwrap().id.as_str(), "b");
    }

    #[test]
    fn test_duplicate_ids_are_dropped() {
        let mut first = thread("a");
        first.title = "first".to_string();
        let mut second = thread("a");
        second.title = "second".to_string();

        let state = SessionState::new(vec![first, second], None);
        assert_eq!(state.threads.len(), 1);
        assert_eq!(state.threads[0].title, "first");
    }
}
