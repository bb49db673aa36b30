//! Conversation state and its transitions.
//!
//! `Conversation` never performs I/O. Each transition that needs the backend hands
//! back the payload to send, and the caller reports the outcome through
//! `thread_started`/`thread_failed` or `reply_received`/`reply_failed`.

use iced::keyboard::{key::Named, Key, Modifiers};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactInfo {
    pub name: String,
    pub email: String,
}

/// Backend-issued handle for a conversation thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadId(String);

impl ThreadId {
    pub fn new(id: impl Into<String>) -> Self {
        ThreadId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ThreadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub sender: Sender,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Intake,
    /// Thread creation is in flight.
    Starting,
    Chat { thread_id: ThreadId },
}

/// A message accepted for delivery to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub thread_id: ThreadId,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct Conversation {
    phase: Phase,
    contact: Option<ContactInfo>,
    messages: Vec<ChatMessage>,
    draft: String,
    busy: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Conversation {
            phase: Phase::Intake,
            contact: None,
            messages: Vec::new(),
            draft: String::new(),
            busy: false,
        }
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn contact(&self) -> Option<&ContactInfo> {
        self.contact.as_ref()
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Accepts the intake form. Returns the contact to start a thread with, or
    /// `None` if a thread is already starting or open.
    pub fn submit_contact(&mut self, contact: ContactInfo) -> Option<ContactInfo> {
        if self.phase != Phase::Intake {
            return None;
        }
        self.phase = Phase::Starting;
        self.contact = Some(contact.clone());
        Some(contact)
    }

    pub fn thread_started(&mut self, thread_id: ThreadId) {
        if self.phase == Phase::Starting {
            self.phase = Phase::Chat { thread_id };
        }
    }

    pub fn thread_failed(&mut self) {
        if self.phase == Phase::Starting {
            self.phase = Phase::Intake;
            self.contact = None;
        }
    }

    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// Moves the draft into the message log and returns it for delivery.
    ///
    /// Blank drafts, drafts sent while a reply is outstanding, and drafts sent
    /// before a thread exists are rejected and left untouched.
    pub fn submit_message(&mut self) -> Option<Outgoing> {
        if self.busy || self.draft.trim().is_empty() {
            return None;
        }
        let thread_id = match &self.phase {
            Phase::Chat { thread_id } => thread_id.clone(),
            _ => return None,
        };

        let text = std::mem::take(&mut self.draft);
        self.messages.push(ChatMessage {
            sender: Sender::User,
            text: text.clone(),
        });
        self.busy = true;

        Some(Outgoing { thread_id, text })
    }

    pub fn reply_received(&mut self, text: impl Into<String>) {
        if !self.busy {
            return;
        }
        self.messages.push(ChatMessage {
            sender: Sender::Bot,
            text: text.into(),
        });
        self.busy = false;
    }

    pub fn reply_failed(&mut self) {
        self.busy = false;
    }
}

/// Enter sends; Shift+Enter falls through to the editor as a line break.
pub fn is_send_key(key: &Key, modifiers: Modifiers) -> bool {
    matches!(key, Key::Named(Named::Enter)) && !modifiers.shift()
}
