//! Access decision engine
//!
//! Decides, per inbound interaction, whether a user may proceed.
//!
//! The allow-list is re-read from its source on every query. A malformed
//! list is logged and treated as empty, which puts the bot in open mode;
//! `validate_allow_list` exposes the strict parse for startup checks that
//! want to refuse that fallback.

use crate::access::allow_set::AllowSet;
use crate::access::source::{AllowListSource, EnvAllowList};
use crate::error::AllowListError;
use serde::Serialize;
use std::fmt;
use tracing::{error, info, warn};

/// Outcome of a single access check
///
/// Produced per request and only used for logging and short-circuiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessDecision {
    pub allowed: bool,
    pub user_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl AccessDecision {
    pub fn is_allowed(&self) -> bool {
        self.allowed
    }

    pub fn is_denied(&self) -> bool {
        !self.allowed
    }
}

/// Current access policy, derived from the allow-set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Empty allow-set: everyone may proceed
    Open,
    /// Only the listed users may proceed
    Restricted { allowed: usize },
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Open => f.write_str("open access for all users"),
            AccessMode::Restricted { allowed } => {
                write!(f, "restricted access: {} users allowed", allowed)
            }
        }
    }
}

/// Access gate
///
/// Holds no mutable state; share it behind an `Arc` across concurrent events.
pub struct AccessGate {
    source: Box<dyn AllowListSource>,
}

impl AccessGate {
    /// Create a gate reading from `source`
    pub fn new(source: impl AllowListSource + 'static) -> Self {
        Self {
            source: Box::new(source),
        }
    }

    /// Create a gate from an already boxed source
    pub fn from_boxed(source: Box<dyn AllowListSource>) -> Self {
        Self { source }
    }

    /// Gate over the `ALLOWED_USERS` environment variable
    pub fn from_env() -> Self {
        Self::new(EnvAllowList::new())
    }

    /// Current allow-set.
    ///
    /// Absent or blank configuration yields the empty set. So does a
    /// malformed one: the parse error is logged and the gate fails open.
    pub fn allowed_users(&self) -> AllowSet {
        let Some(raw) = self.source.raw_allow_list() else {
            return AllowSet::open();
        };

        match AllowSet::parse(&raw) {
            Ok(set) => set,
            Err(e) => {
                error!(
                    error = %e,
                    source = self.source.describe(),
                    "Invalid ALLOWED_USERS format, falling back to open access"
                );
                AllowSet::open()
            }
        }
    }

    /// Strict parse of the current allow-list, for startup validation
    pub fn validate_allow_list(&self) -> Result<AllowSet, AllowListError> {
        match self.source.raw_allow_list() {
            Some(raw) => AllowSet::parse(&raw),
            None => Ok(AllowSet::open()),
        }
    }

    /// True iff the allow-set is non-empty
    pub fn is_access_restricted(&self) -> bool {
        !self.allowed_users().is_open()
    }

    /// Whether `user_id` may proceed; always true in open mode
    pub fn is_user_allowed(&self, user_id: u64) -> bool {
        self.allowed_users().permits(user_id)
    }

    /// Current access mode
    pub fn mode(&self) -> AccessMode {
        let users = self.allowed_users();
        if users.is_open() {
            AccessMode::Open
        } else {
            AccessMode::Restricted {
                allowed: users.len(),
            }
        }
    }

    /// Log an access attempt: `info` on grant, `warn` on denial
    pub fn log_access_attempt(&self, user_id: u64, username: Option<&str>, allowed: bool) {
        log_access_attempt(user_id, username, allowed);
    }

    /// Decide and log in one step.
    ///
    /// The caller short-circuits its handler when the decision is a denial.
    pub fn check(&self, user_id: u64, username: Option<&str>) -> AccessDecision {
        let users = self.allowed_users();
        let allowed = users.permits(user_id);
        log_access_attempt(user_id, username, allowed);

        AccessDecision {
            allowed,
            user_id,
            username: username.map(str::to_string),
        }
    }
}

impl fmt::Debug for AccessGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessGate")
            .field("source", &self.source.describe())
            .finish()
    }
}

/// Log an access attempt without consulting any gate
pub fn log_access_attempt(user_id: u64, username: Option<&str>, allowed: bool) {
    let username = username.filter(|u| !u.is_empty()).map(|u| format!("@{u}"));

    if allowed {
        info!(user_id, username = username.as_deref(), "Access granted");
    } else {
        warn!(user_id, username = username.as_deref(), "Access denied");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::StaticAllowList;

    fn gate(raw: &str) -> AccessGate {
        AccessGate::new(StaticAllowList::new(raw))
    }

    #[test]
    fn test_empty_config_is_open() {
        let gate = gate("");
        assert!(!gate.is_access_restricted());
        assert!(gate.is_user_allowed(1));
        assert_eq!(gate.mode(), AccessMode::Open);
    }

    #[test]
    fn test_restricted_membership() {
        let gate = gate("100,200");
        assert!(gate.is_access_restricted());
        assert!(gate.is_user_allowed(100));
        assert!(!gate.is_user_allowed(300));
        assert_eq!(gate.mode(), AccessMode::Restricted { allowed: 2 });
    }

    #[test]
    fn test_malformed_fails_open() {
        let gate = gate("12, abc, 34");
        assert!(gate.allowed_users().is_open());
        assert!(!gate.is_access_restricted());
        assert!(gate.is_user_allowed(999));
        assert!(gate.validate_allow_list().is_err());
    }

    #[test]
    fn test_check_builds_decision() {
        let gate = gate("100");
        let decision = gate.check(100, Some("alice"));
        assert!(decision.is_allowed());
        assert_eq!(decision.username.as_deref(), Some("alice"));

        let decision = gate.check(5, None);
        assert!(decision.is_denied());
        assert_eq!(decision.user_id, 5);
    }

    #[test]
    fn test_decision_serializes() {
        let decision = AccessDecision {
            allowed: false,
            user_id: 300,
            username: None,
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert_eq!(json, r#"{"allowed":false,"user_id":300}"#);
    }

    #[test]
    fn test_mode_display() {
        assert_eq!(AccessMode::Open.to_string(), "open access for all users");
        assert_eq!(
            AccessMode::Restricted { allowed: 3 }.to_string(),
            "restricted access: 3 users allowed"
        );
    }
}
