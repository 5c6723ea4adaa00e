//! Client-side session state.
//!
//! Everything a single chat window needs lives in [`ChatSession`]: the
//! rendered message list, the context turns resent to the relay, and the UI
//! flags. Nothing here outlives the session; `new_chat` drops it all.

use crate::models::chat::ContextTurn;
use chrono::{ DateTime, Utc };
use serde::{ Deserialize, Serialize };
use uuid::Uuid;

pub type MessageId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(sender: Sender, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        }
    }
}

/// Microphone permission as last observed by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PermissionState {
    #[default]
    Unknown,
    Granted,
    Denied,
}

/// Where the pending user input came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOrigin {
    Typed,
    Voice,
}

#[derive(Debug, Clone)]
pub struct ChatSession {
    messages: Vec<Message>,
    context: Vec<ContextTurn>,
    draft: String,
    dark_mode: bool,
    connecting: bool,
    voice_enabled: bool,
    last_origin: InputOrigin,
    microphone: PermissionState,
    /// Transient system line (listening / speech detected), at most one.
    notice: Option<MessageId>,
}

impl Default for ChatSession {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            context: Vec::new(),
            draft: String::new(),
            dark_mode: false,
            connecting: false,
            voice_enabled: true,
            last_origin: InputOrigin::Typed,
            microphone: PermissionState::Unknown,
            notice: None,
        }
    }
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn context(&self) -> &[ContextTurn] {
        &self.context
    }

    /// Replaces the context with the relay's returned sequence.
    pub fn set_context(&mut self, context: Vec<ContextTurn>) {
        self.context = context;
    }

    pub fn push(&mut self, sender: Sender, text: impl Into<String>) -> MessageId {
        let message = Message::new(sender, text);
        let id = message.id;
        self.messages.push(message);
        id
    }

    pub fn push_user(&mut self, text: impl Into<String>) -> MessageId {
        self.push(Sender::User, text)
    }

    pub fn push_bot(&mut self, text: impl Into<String>) -> MessageId {
        self.push(Sender::Bot, text)
    }

    pub fn push_system(&mut self, text: impl Into<String>) -> MessageId {
        self.push(Sender::System, text)
    }

    /// Shows `text` as the transient notice, replacing any previous one.
    pub fn show_notice(&mut self, text: impl Into<String>) -> MessageId {
        self.dismiss_notice();
        let id = self.push_system(text);
        self.notice = Some(id);
        id
    }

    pub fn dismiss_notice(&mut self) {
        if let Some(id) = self.notice.take() {
            self.messages.retain(|m| m.id != id);
        }
    }

    pub fn notice(&self) -> Option<&Message> {
        self.notice.and_then(|id| self.message(id))
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    pub fn take_draft(&mut self) -> String {
        std::mem::take(&mut self.draft)
    }

    pub fn is_connecting(&self) -> bool {
        self.connecting
    }

    pub fn set_connecting(&mut self, connecting: bool) {
        self.connecting = connecting;
    }

    /// Send controls are disabled while a reply is pending.
    pub fn can_send(&self) -> bool {
        !self.connecting
    }

    pub fn is_dark_mode(&self) -> bool {
        self.dark_mode
    }

    pub fn toggle_dark_mode(&mut self) -> bool {
        self.dark_mode = !self.dark_mode;
        self.dark_mode
    }

    pub fn voice_enabled(&self) -> bool {
        self.voice_enabled
    }

    pub fn toggle_voice(&mut self) -> bool {
        self.voice_enabled = !self.voice_enabled;
        self.voice_enabled
    }

    pub fn set_last_origin(&mut self, origin: InputOrigin) {
        self.last_origin = origin;
    }

    pub fn last_input_was_voice(&self) -> bool {
        self.last_origin == InputOrigin::Voice
    }

    pub fn microphone(&self) -> PermissionState {
        self.microphone
    }

    pub fn set_microphone(&mut self, state: PermissionState) {
        self.microphone = state;
    }

    /// Starts over: messages, context and draft are dropped, preferences stay.
    pub fn new_chat(&mut self) {
        self.messages.clear();
        self.context.clear();
        self.draft.clear();
        self.notice = None;
    }
}
