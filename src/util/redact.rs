//! Log sanitisation
//!
//! Strips credential-looking values out of user-supplied text before it is
//! written to the log.

use crate::error::ConfigError;
use regex::Regex;

/// Maximum number of characters of user text kept in a log line
pub const MAX_LOGGED_TEXT: usize = 100;

/// Built-in rules: `(pattern, replacement)`
const DEFAULT_RULES: &[(&str, &str)] = &[
    (r#"(?i)token["\s]*[:=]["\s]*([a-zA-Z0-9._-]+)"#, r#"token="***""#),
    (r#"(?i)secret["\s]*[:=]["\s]*([a-zA-Z0-9._-]+)"#, r#"secret="***""#),
    (r#"(?i)password["\s]*[:=]["\s]*([a-zA-Z0-9._-]+)"#, r#"password="***""#),
    (r#"(?i)key["\s]*[:=]["\s]*([a-zA-Z0-9._-]+)"#, r#"key="***""#),
    (
        r#"(?i)(?:bearer|authorization)["\s]*[:=]["\s]*([a-zA-Z0-9._-]+)"#,
        r#"authorization="***""#,
    ),
];

#[derive(Debug)]
struct Rule {
    regex: Regex,
    replacement: String,
}

/// Compiled set of redaction rules
#[derive(Debug)]
pub struct Redactor {
    rules: Vec<Rule>,
}

impl Redactor {
    /// Compile a redactor from `(pattern, replacement)` pairs
    pub fn new<P, R>(rules: &[(P, R)]) -> Result<Self, ConfigError>
    where
        P: AsRef<str>,
        R: AsRef<str>,
    {
        let mut compiled = Vec::with_capacity(rules.len());

        for (pattern, replacement) in rules {
            let regex = Regex::new(pattern.as_ref()).map_err(|e| ConfigError::InvalidPattern {
                pattern: pattern.as_ref().to_string(),
                reason: e.to_string(),
            })?;

            compiled.push(Rule {
                regex,
                replacement: replacement.as_ref().to_string(),
            });
        }

        Ok(Self { rules: compiled })
    }

    /// Redactor with the built-in credential rules
    pub fn standard() -> Result<Self, ConfigError> {
        Self::new(DEFAULT_RULES)
    }

    /// Remove sensitive values from `text`
    pub fn sanitize(&self, text: &str) -> String {
        let mut sanitized = text.to_string();
        for rule in &self.rules {
            sanitized = rule
                .regex
                .replace_all(&sanitized, rule.replacement.as_str())
                .into_owned();
        }
        sanitized
    }

    /// Number of compiled rules
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`
pub fn truncate_for_log(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}
