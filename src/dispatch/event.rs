//! Inbound event model
//!
//! The minimum the gate and the event logger need to know about an update
//! delivered by the bot framework.

use serde::{Deserialize, Serialize};

/// The user an event came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: u64,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
}

impl Sender {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            username: None,
            first_name: None,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = Some(first_name.into());
        self
    }
}

/// A chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEvent {
    pub from: Option<Sender>,
    #[serde(default = "default_chat_type")]
    pub chat_type: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default = "default_content_type")]
    pub content_type: String,
}

fn default_chat_type() -> String {
    "private".to_string()
}

fn default_content_type() -> String {
    "text".to_string()
}

impl MessageEvent {
    /// Plain text message in a private chat
    pub fn text(from: Sender, text: impl Into<String>) -> Self {
        Self {
            from: Some(from),
            chat_type: default_chat_type(),
            text: Some(text.into()),
            caption: None,
            content_type: default_content_type(),
        }
    }

    /// Text if present, otherwise the caption
    pub fn body(&self) -> &str {
        self.text
            .as_deref()
            .or(self.caption.as_deref())
            .unwrap_or_default()
    }
}

/// A press on an inline keyboard button
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackEvent {
    pub from: Option<Sender>,
    #[serde(default)]
    pub data: Option<String>,
}

impl CallbackEvent {
    pub fn new(from: Sender, data: impl Into<String>) -> Self {
        Self {
            from: Some(from),
            data: Some(data.into()),
        }
    }
}

/// Any event the middleware chain sees
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InboundEvent {
    Message(MessageEvent),
    Callback(CallbackEvent),
}

impl InboundEvent {
    pub fn sender(&self) -> Option<&Sender> {
        match self {
            InboundEvent::Message(m) => m.from.as_ref(),
            InboundEvent::Callback(c) => c.from.as_ref(),
        }
    }

    pub fn user_id(&self) -> Option<u64> {
        self.sender().map(|s| s.id)
    }

    pub fn username(&self) -> Option<&str> {
        self.sender().and_then(|s| s.username.as_deref())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            InboundEvent::Message(_) => "message",
            InboundEvent::Callback(_) => "callback",
        }
    }
}

impl From<MessageEvent> for InboundEvent {
    fn from(event: MessageEvent) -> Self {
        InboundEvent::Message(event)
    }
}

impl From<CallbackEvent> for InboundEvent {
    fn from(event: CallbackEvent) -> Self {
        InboundEvent::Callback(event)
    }
}
