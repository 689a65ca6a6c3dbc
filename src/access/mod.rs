//! Access control module
//!
//! Decides whether a user may interact with the bot.
//!
//! ## Model
//!
//! The allow-set is a comma-separated list of user ids read from
//! `ALLOWED_USERS` (or `access.allowed_users` in the config file):
//!
//! - empty or absent: **open mode**, every user may proceed
//! - non-empty: **restricted mode**, only listed users may proceed
//! - malformed: logged as an error and treated as empty (open mode)
//!
//! ```toml
//! [access]
//! allowed_users = "100, 200"
//! live_reload = true   # re-read ALLOWED_USERS on every query
//! strict = false       # true: refuse to start on a malformed list
//! ```

pub mod allow_set;
pub mod gate;
pub mod source;

pub use allow_set::AllowSet;
pub use gate::{AccessDecision, AccessGate, AccessMode, log_access_attempt};
pub use source::{AllowListSource, EnvAllowList, StaticAllowList, source_from_config};
