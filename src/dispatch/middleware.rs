//! Middleware run before business handlers
//!
//! `AccessMiddleware` enforces the allow-list and `EventLogger` records each
//! event with credentials scrubbed. A typical chain is
//! access check → event log → handler.

use crate::access::AccessGate;
use crate::dispatch::event::{CallbackEvent, InboundEvent, MessageEvent, Sender};
use crate::dispatch::reply::{DenialReply, Responder};
use crate::error::ConfigError;
use crate::util::{MAX_LOGGED_TEXT, Redactor, truncate_for_log};
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Result of passing an event through the access middleware
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome<T> {
    /// The handler ran and produced `T`
    Handled(T),
    /// The sender was denied; the handler did not run
    Denied,
}

impl<T> GateOutcome<T> {
    pub fn is_denied(&self) -> bool {
        matches!(self, GateOutcome::Denied)
    }

    pub fn handled(self) -> Option<T> {
        match self {
            GateOutcome::Handled(value) => Some(value),
            GateOutcome::Denied => None,
        }
    }
}

/// Access check in front of every handler
#[derive(Debug, Clone)]
pub struct AccessMiddleware {
    gate: Arc<AccessGate>,
}

impl AccessMiddleware {
    /// Wrap a shared gate, logging the mode it starts in
    pub fn new(gate: Arc<AccessGate>) -> Self {
        let users = gate.allowed_users();
        if users.is_open() {
            info!("Open access mode - bot available for all users");
        } else {
            info!(allowed = users.len(), "Access control enabled");
        }
        Self { gate }
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Run `handler` if the sender of `event` is allowed.
    ///
    /// On denial the fixed reply for the event kind goes to `responder` and
    /// the handler is dropped without being polled. A failing responder is
    /// logged; the event stays denied.
    #[instrument(skip_all, fields(kind = event.kind(), user_id = event.user_id()))]
    pub async fn handle<F, Fut, T>(
        &self,
        event: &InboundEvent,
        responder: &dyn Responder,
        handler: F,
    ) -> GateOutcome<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let allowed = match event.user_id() {
            Some(user_id) => self.gate.check(user_id, event.username()).is_allowed(),
            None => {
                let allowed = !self.gate.is_access_restricted();
                if allowed {
                    info!("Access granted for event without sender");
                } else {
                    warn!("Access denied for event without sender");
                }
                allowed
            }
        };

        if !allowed {
            let reply = DenialReply::for_event(event);
            if let Err(e) = responder.respond(reply).await {
                error!(error = %e, "Failed to send access denied reply");
            }
            return GateOutcome::Denied;
        }

        GateOutcome::Handled(handler().await)
    }
}

/// Logs inbound events without leaking credentials
#[derive(Debug)]
pub struct EventLogger {
    redactor: Redactor,
}

impl EventLogger {
    /// Logger with the built-in redaction rules
    pub fn new() -> Result<Self, ConfigError> {
        Ok(Self {
            redactor: Redactor::standard()?,
        })
    }

    /// Logger with custom redaction rules
    pub fn with_redactor(redactor: Redactor) -> Self {
        Self { redactor }
    }

    /// Log the event, run the handler and log its error if it fails
    pub async fn handle<F, Fut, T, E>(&self, event: &InboundEvent, handler: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.log_event(event);

        let result = handler().await;
        if let Err(e) = &result {
            let message = self.redactor.sanitize(&e.to_string());
            error!(error = %message, "Error in handler");
        }
        result
    }

    /// Log a single event
    pub fn log_event(&self, event: &InboundEvent) {
        match event {
            InboundEvent::Message(message) => self.log_message(message),
            InboundEvent::Callback(callback) => self.log_callback(callback),
        }
    }

    /// Safe text to log for a message: sanitised, then truncated
    pub fn message_text(&self, message: &MessageEvent) -> String {
        truncate_for_log(&self.redactor.sanitize(message.body()), MAX_LOGGED_TEXT)
    }

    fn log_message(&self, message: &MessageEvent) {
        let text = self.message_text(message);
        info!(
            user = %user_info(message.from.as_ref()),
            chat_type = %message.chat_type,
            text = %text,
            content_type = %message.content_type,
            "Message received"
        );
    }

    fn log_callback(&self, callback: &CallbackEvent) {
        let data = self
            .redactor
            .sanitize(callback.data.as_deref().unwrap_or_default());
        info!(
            user = %user_info(callback.from.as_ref()),
            data = %data,
            "Callback received"
        );
    }
}

/// `user_id=.., username=@.., name=..` for the log
pub fn user_info(sender: Option<&Sender>) -> String {
    let Some(sender) = sender else {
        return "unknown_user".to_string();
    };

    let mut info = format!("user_id={}", sender.id);
    if let Some(username) = sender.username.as_deref().filter(|u| !u.is_empty()) {
        info.push_str(&format!(", username=@{username}"));
    }
    if let Some(name) = sender.first_name.as_deref().filter(|n| !n.is_empty()) {
        info.push_str(&format!(", name={name}"));
    }
    info
}
