//! Dispatch middleware tests
//!
//! End-to-end runs of inbound events through the access middleware and the
//! secure event logger.

mod common;

use async_trait::async_trait;
use common::capture_logs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use watchdog_guard::access::{AccessGate, StaticAllowList};
use watchdog_guard::dispatch::{
    ACCESS_DENIED_ALERT, ACCESS_DENIED_NOTICE, AccessMiddleware, CallbackEvent, DenialReply,
    EventLogger, GateOutcome, InboundEvent, MessageEvent, Responder, Sender,
};
use watchdog_guard::error::DispatchError;

// =============================================================================
// Test Helpers
// =============================================================================

#[derive(Default)]
struct RecordingResponder {
    replies: Mutex<Vec<DenialReply>>,
}

impl RecordingResponder {
    fn replies(&self) -> Vec<DenialReply> {
        self.replies.lock().unwrap().clone()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn respond(&self, reply: DenialReply) -> Result<(), DispatchError> {
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }
}

struct FailingResponder;

#[async_trait]
impl Responder for FailingResponder {
    async fn respond(&self, _reply: DenialReply) -> Result<(), DispatchError> {
        Err(DispatchError::Reply("chat not found".into()))
    }
}

fn middleware(raw: &str) -> AccessMiddleware {
    AccessMiddleware::new(Arc::new(AccessGate::new(StaticAllowList::new(raw))))
}

fn message_from(user_id: u64) -> InboundEvent {
    MessageEvent::text(Sender::new(user_id), "/start").into()
}

// =============================================================================
// Access middleware
// =============================================================================

mod access_middleware {
    use super::*;

    #[tokio::test]
    async fn test_allowed_user_reaches_handler() {
        let middleware = middleware("100,200");
        let responder = RecordingResponder::default();

        let outcome = middleware
            .handle(&message_from(100), &responder, || async { "handled" })
            .await;

        assert_eq!(outcome, GateOutcome::Handled("handled"));
        assert!(responder.replies().is_empty());
    }

    #[tokio::test]
    async fn test_denied_user_gets_notice_and_handler_skipped() {
        let middleware = middleware("100,200");
        let responder = RecordingResponder::default();
        let ran = AtomicBool::new(false);

        let outcome = middleware
            .handle(&message_from(300), &responder, || async {
                ran.store(true, Ordering::SeqCst);
            })
            .await;

        assert!(outcome.is_denied());
        assert!(!ran.load(Ordering::SeqCst));
        assert_eq!(
            responder.replies(),
            vec![DenialReply::Notice(ACCESS_DENIED_NOTICE)]
        );
    }

    #[tokio::test]
    async fn test_denied_callback_gets_alert() {
        let middleware = middleware("100");
        let responder = RecordingResponder::default();
        let event: InboundEvent = CallbackEvent::new(Sender::new(5), "sort:1").into();

        let outcome = middleware.handle(&event, &responder, || async {}).await;

        assert!(outcome.is_denied());
        assert_eq!(
            responder.replies(),
            vec![DenialReply::Alert {
                text: ACCESS_DENIED_ALERT,
                show_alert: true
            }]
        );
    }

    #[tokio::test]
    async fn test_open_mode_lets_everyone_through() {
        let middleware = middleware("");
        let responder = RecordingResponder::default();

        for user_id in [1, 300, u64::MAX] {
            let outcome = middleware
                .handle(&message_from(user_id), &responder, || async { user_id })
                .await;
            assert_eq!(outcome, GateOutcome::Handled(user_id));
        }
        assert!(responder.replies().is_empty());
    }

    #[tokio::test]
    async fn test_event_without_sender() {
        let event = InboundEvent::Callback(CallbackEvent {
            from: None,
            data: None,
        });
        let responder = RecordingResponder::default();
        let (logs, _guard) = capture_logs();

        let open = middleware("").handle(&event, &responder, || async {}).await;
        assert!(!open.is_denied());
        assert!(logs.contents().contains("Access granted for event without sender"));

        let restricted = middleware("1")
            .handle(&event, &responder, || async {})
            .await;
        assert!(restricted.is_denied());
        assert_eq!(responder.replies().len(), 1);
        assert!(logs.contents().contains("Access denied for event without sender"));
    }

    #[tokio::test]
    async fn test_failing_responder_still_blocks() {
        let (logs, _guard) = capture_logs();
        let ran = AtomicBool::new(false);

        let outcome = middleware("100")
            .handle(&message_from(300), &FailingResponder, || async {
                ran.store(true, Ordering::SeqCst);
            })
            .await;

        assert!(outcome.is_denied());
        assert!(!ran.load(Ordering::SeqCst));
        assert!(logs.contents().contains("Failed to send access denied reply"));
    }

    #[tokio::test]
    async fn test_decision_logged_before_handler_output() {
        let (logs, _guard) = capture_logs();
        let responder = RecordingResponder::default();

        middleware("100")
            .handle(&message_from(100), &responder, || async {
                tracing::info!("handler body");
            })
            .await;

        let output = logs.contents();
        let granted = output.find("Access granted").unwrap();
        let body = output.find("handler body").unwrap();
        assert!(granted < body);
        assert_eq!(output.matches("Access granted").count(), 1);
    }

    #[tokio::test]
    async fn test_denial_logged_once_with_username() {
        let (logs, _guard) = capture_logs();
        let responder = RecordingResponder::default();
        let event: InboundEvent =
            MessageEvent::text(Sender::new(300).with_username("mallory"), "/start").into();

        middleware("100,200")
            .handle(&event, &responder, || async {})
            .await;

        let output = logs.contents();
        assert_eq!(output.matches("Access denied").count(), 1);
        assert!(output.contains("user_id=300"));
        assert!(output.contains("@mallory"));
    }

    #[tokio::test]
    async fn test_malformed_list_fails_open_end_to_end() {
        let responder = RecordingResponder::default();
        let outcome = middleware("12, abc, 34")
            .handle(&message_from(999), &responder, || async { "ok" })
            .await;
        assert_eq!(outcome.handled(), Some("ok"));
    }

    #[test]
    fn test_startup_mode_logged() {
        let (logs, _guard) = capture_logs();

        middleware("");
        middleware("1,2");

        let output = logs.contents();
        assert!(output.contains("Open access mode"));
        assert!(output.contains("Access control enabled"));
        assert!(output.contains("allowed=2"));
    }

    #[tokio::test]
    async fn test_concurrent_events() {
        let middleware = Arc::new(middleware("100,200"));

        let tasks: Vec<_> = [100u64, 300, 200, 400]
            .into_iter()
            .map(|user_id| {
                let middleware = Arc::clone(&middleware);
                tokio::spawn(async move {
                    let responder = RecordingResponder::default();
                    let outcome = middleware
                        .handle(&message_from(user_id), &responder, || async { user_id })
                        .await;
                    (user_id, outcome)
                })
            })
            .collect();

        for task in tasks {
            let (user_id, outcome) = task.await.unwrap();
            let expected_allowed = user_id == 100 || user_id == 200;
            assert_eq!(!outcome.is_denied(), expected_allowed, "user {user_id}");
        }
    }
}

// =============================================================================
// Event logger
// =============================================================================

mod event_logger {
    use super::*;

    #[tokio::test]
    async fn test_message_logged_without_credentials() {
        let (logs, _guard) = capture_logs();
        let logger = EventLogger::new().unwrap();

        let sender = Sender::new(42).with_username("alice").with_first_name("Alice");
        let event: InboundEvent =
            MessageEvent::text(sender, "my secret=hunter2 please store it").into();

        let result: Result<u8, String> = logger.handle(&event, || async { Ok(1) }).await;
        assert_eq!(result, Ok(1));

        let output = logs.contents();
        assert!(output.contains("Message received"));
        assert!(output.contains("user_id=42, username=@alice, name=Alice"));
        assert!(!output.contains("hunter2"));
    }

    #[tokio::test]
    async fn test_callback_data_sanitised() {
        let (logs, _guard) = capture_logs();
        let logger = EventLogger::new().unwrap();
        let event: InboundEvent = CallbackEvent::new(Sender::new(1), "token:abc.def").into();

        let _: Result<(), String> = logger.handle(&event, || async { Ok(()) }).await;

        let output = logs.contents();
        assert!(output.contains("Callback received"));
        assert!(!output.contains("abc.def"));
    }

    #[tokio::test]
    async fn test_handler_error_sanitised_and_returned() {
        let (logs, _guard) = capture_logs();
        let logger = EventLogger::new().unwrap();

        let result: Result<(), String> = logger
            .handle(&message_from(1), || async {
                Err("refresh failed: password=topsecret".to_string())
            })
            .await;

        assert_eq!(
            result,
            Err("refresh failed: password=topsecret".to_string())
        );
        let output = logs.contents();
        assert!(output.contains("Error in handler"));
        assert!(!output.contains("topsecret"));
    }
}
