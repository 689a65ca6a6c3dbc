//! Replying to the originator of an event

use crate::dispatch::event::InboundEvent;
use crate::error::DispatchError;
// async_trait required for dyn-compatibility with &dyn Responder
use async_trait::async_trait;

/// Notice sent in reply to a denied message
pub const ACCESS_DENIED_NOTICE: &str = "🚫 <b>Access Denied</b>\n\n\
     This bot is available only for authorized users.\n\
     Contact administrator for access.";

/// Alert shown for a denied button press
pub const ACCESS_DENIED_ALERT: &str = "Access denied";

/// Fixed, non-revealing denial reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReply {
    /// Reply in the chat the message came from
    Notice(&'static str),
    /// Popup answer to a callback query
    Alert { text: &'static str, show_alert: bool },
}

impl DenialReply {
    /// The reply matching the kind of event
    pub fn for_event(event: &InboundEvent) -> Self {
        match event {
            InboundEvent::Message(_) => DenialReply::Notice(ACCESS_DENIED_NOTICE),
            InboundEvent::Callback(_) => DenialReply::Alert {
                text: ACCESS_DENIED_ALERT,
                show_alert: true,
            },
        }
    }

    pub fn text(&self) -> &'static str {
        match self {
            DenialReply::Notice(text) => text,
            DenialReply::Alert { text, .. } => text,
        }
    }
}

/// Capability to answer whoever sent the current event
///
/// Implemented by the bot framework adapter; the gate only decides what to say.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, reply: DenialReply) -> Result<(), DispatchError>;
}
