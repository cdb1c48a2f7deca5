//! UI-agnostic chat state
//!
//! This module contains the session that owns the message history, the
//! draft being edited, and the in-flight flag. It doesn't depend on any
//! specific UI framework; the TUI drives it through `begin_send` and
//! `finish_send` so the request itself can run on a spawned task.

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

use crate::client::ChatClient;
use crate::error::SendError;

/// User message text used when only a file is being sent.
pub const FILE_ATTACHED_LABEL: &str = "File attached";

/// A chat message in the conversation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub text: String,
    pub author: Author,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: Author::User,
        }
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: Author::Bot,
        }
    }
}

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Author {
    User,
    Bot,
}

/// A file picked for upload, kept in memory until it is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    file_name: String,
    bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read a file from disk, keeping only the last path component as its name.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow!("Not a file path: {}", path.display()))?;

        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Could not read {}", path.display()))?;

        Ok(Self::new(file_name, bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Not-yet-sent user input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub text: String,
    pub attachment: Option<Attachment>,
}

impl Draft {
    /// Whether this draft is worth sending: non-blank text or a file.
    pub fn is_sendable(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment.is_some()
    }

    /// Text for the user's own bubble. The label only replaces text that is
    /// exactly empty; whitespace next to a file is shown as typed.
    pub fn display_text(&self) -> &str {
        if self.text.is_empty() && self.attachment.is_some() {
            FILE_ATTACHED_LABEL
        } else {
            &self.text
        }
    }
}

/// History, draft, and in-flight flag for one conversation
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    draft: Draft,
    in_flight: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    pub fn draft_text(&self) -> &str {
        &self.draft.text
    }

    /// Mutable access for editors that insert at a cursor.
    pub fn draft_text_mut(&mut self) -> &mut String {
        &mut self.draft.text
    }

    pub fn set_draft_text(&mut self, text: impl Into<String>) {
        self.draft.text = text.into();
    }

    /// Attach a file, replacing any file already attached.
    pub fn attach(&mut self, attachment: Attachment) {
        self.draft.attachment = Some(attachment);
    }

    pub fn detach(&mut self) -> Option<Attachment> {
        self.draft.attachment.take()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.draft.attachment.as_ref()
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// True when `begin_send` would start a request.
    pub fn can_send(&self) -> bool {
        !self.in_flight && self.draft.is_sendable()
    }

    /// Start a send: append the user's message, take the draft, raise the
    /// in-flight flag, and hand back what has to go over the wire.
    ///
    /// Returns `None` without touching any state when there is nothing to
    /// send, or when a request is already outstanding.
    pub fn begin_send(&mut self) -> Option<Draft> {
        if self.in_flight {
            debug!("Send ignored, a request is already in flight");
            return None;
        }
        if !self.draft.is_sendable() {
            return None;
        }

        self.messages.push(Message::user(self.draft.display_text()));
        let outgoing = std::mem::take(&mut self.draft);
        self.in_flight = true;
        Some(outgoing)
    }

    /// Resolve the outstanding send with the endpoint's outcome.
    pub fn finish_send(&mut self, outcome: Result<String, SendError>) {
        let reply = match outcome {
            Ok(text) => Message::bot(text),
            Err(err) => {
                if let SendError::Transport(ref cause) = err {
                    warn!(error = %cause, "Error connecting to the server");
                } else {
                    debug!(error = %err, "Endpoint returned an error status");
                }
                Message::bot(err.user_message())
            }
        };

        self.messages.push(reply);
        self.in_flight = false;
    }

    /// Run a whole send cycle against `client`. Returns false when the
    /// draft was not sendable (or a request was already running).
    pub async fn send(&mut self, client: &ChatClient) -> bool {
        let Some(outgoing) = self.begin_send() else {
            return false;
        };
        let outcome = client.send(&outgoing).await;
        self.finish_send(outcome);
        true
    }
}
