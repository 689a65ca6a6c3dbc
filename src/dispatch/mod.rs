//! Event dispatch glue
//!
//! Thin layer between the bot framework and business handlers: every event
//! passes the access check, then the secure event log, then the handler.

pub mod event;
pub mod middleware;
pub mod reply;

pub use event::{CallbackEvent, InboundEvent, MessageEvent, Sender};
pub use middleware::{AccessMiddleware, EventLogger, GateOutcome, user_info};
pub use reply::{ACCESS_DENIED_ALERT, ACCESS_DENIED_NOTICE, DenialReply, Responder};
