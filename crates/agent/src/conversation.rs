use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use tia_core::profile::{CustomerProfile, ProfileUpdate};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Speaker {
    Customer,
    Tia,
}

impl Speaker {
    fn label(self) -> &'static str {
        match self {
            Self::Customer => "Customer",
            Self::Tia => "TIA",
        }
    }
}

/// Bounded buffer of the most recent exchanges, rendered into every prompt.
/// Older messages fall off the front; the profile record is the long-term
/// memory, not this window.
#[derive(Clone, Debug)]
pub struct ConversationWindow {
    capacity: usize,
    messages: Vec<(Speaker, String)>,
}

impl ConversationWindow {
    pub fn new(capacity: usize) -> Self {
        Self { capacity: capacity.max(1), messages: Vec::new() }
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.messages.push((speaker, text.into()));
        if self.messages.len() > self.capacity {
            let overflow = self.messages.len() - self.capacity;
            self.messages.drain(..overflow);
        }
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// `Role: text` lines, oldest first, for prompt interpolation.
    pub fn transcript(&self) -> String {
        self.messages
            .iter()
            .map(|(speaker, text)| format!("{}: {}", speaker.label(), text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Per-customer conversational state: the recent-message window, the evolving
/// profile, and running token accounting.
#[derive(Clone, Debug)]
pub struct ChatSession {
    pub window: ConversationWindow,
    pub profile: CustomerProfile,
    pub total_input_tokens: u64,
    pub total_output_tokens: u64,
}

impl ChatSession {
    pub fn new(history_window: usize) -> Self {
        Self {
            window: ConversationWindow::new(history_window),
            profile: CustomerProfile::default(),
            total_input_tokens: 0,
            total_output_tokens: 0,
        }
    }

    pub fn record_customer(&mut self, text: impl Into<String>) {
        self.window.push(Speaker::Customer, text);
    }

    pub fn record_assistant(&mut self, text: impl Into<String>) {
        self.window.push(Speaker::Tia, text);
    }

    pub fn merge_profile(&mut self, update: ProfileUpdate) {
        self.profile.apply(update);
    }
}

/// Sessions keyed by the messaging-channel user id (a phone number for
/// WhatsApp). Each session sits behind its own mutex; a turn holds that lock
/// end to end, so concurrent deliveries for one user run in sequence instead
/// of overwriting each other's state.
#[derive(Clone)]
pub struct SessionStore {
    history_window: usize,
    sessions: Arc<RwLock<HashMap<String, Arc<Mutex<ChatSession>>>>>,
}

impl SessionStore {
    pub fn new(history_window: usize) -> Self {
        Self { history_window, sessions: Arc::new(RwLock::new(HashMap::new())) }
    }

    /// Handle for `user_id`, created on first contact. Callers lock the
    /// handle for the whole turn.
    pub async fn session(&self, user_id: &str) -> Arc<Mutex<ChatSession>> {
        let mut sessions = self.sessions.write().await;
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(ChatSession::new(self.history_window))))
            .clone()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_drops_oldest_beyond_capacity() {
        let mut window = ConversationWindow::new(3);
        for index in 1..=5 {
            window.push(Speaker::Customer, format!("message {index}"));
        }
        assert_eq!(window.len(), 3);
        let transcript = window.transcript();
        assert!(!transcript.contains("message 1"));
        assert!(!transcript.contains("message 2"));
        assert!(transcript.contains("message 5"));
    }

    #[test]
    fn transcript_labels_both_speakers() {
        let mut window = ConversationWindow::new(5);
        window.push(Speaker::Customer, "hi");
        window.push(Speaker::Tia, "hello! shall we talk term insurance?");
        assert_eq!(window.transcript(), "Customer: hi\nTIA: hello! shall we talk term insurance?");
    }

    #[tokio::test]
    async fn store_creates_then_reuses_sessions() {
        let store = SessionStore::new(5);
        assert_eq!(store.len().await, 0);

        store.session("+911234567890").await.lock().await.record_customer("hello");

        let again = store.session("+911234567890").await;
        assert_eq!(again.lock().await.window.len(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn handles_for_one_user_share_state() {
        let store = SessionStore::new(5);

        // Two deliveries fetch their handles before either records anything.
        let first = store.session("+919999999999").await;
        let second = store.session("+919999999999").await;
        first.lock().await.record_customer("first delivery");
        second.lock().await.record_customer("second delivery");

        let session = store.session("+919999999999").await;
        assert_eq!(session.lock().await.window.len(), 2);
        assert_eq!(store.len().await, 1);
    }
}
