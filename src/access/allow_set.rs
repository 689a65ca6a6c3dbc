//! Allow-set parsing
//!
//! Turns the `ALLOWED_USERS` string into a set of user ids.

use crate::error::AllowListError;
use std::collections::HashSet;

/// Set of user ids permitted to use the bot
///
/// An empty set means open mode: everyone is allowed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowSet {
    users: HashSet<u64>,
}

impl AllowSet {
    /// The empty set (open mode)
    pub fn open() -> Self {
        Self::default()
    }

    /// Parse a comma-separated list of user ids.
    ///
    /// Whitespace around the whole value and around each entry is ignored,
    /// as are empty entries (`"1,,2"`, trailing commas). Any other entry that
    /// is not an unsigned integer fails the whole parse.
    pub fn parse(raw: &str) -> Result<Self, AllowListError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::open());
        }

        let mut users = HashSet::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let id = entry
                .parse::<u64>()
                .map_err(|e| AllowListError::new(entry, e))?;
            users.insert(id);
        }

        Ok(Self { users })
    }

    /// True when no restriction applies
    pub fn is_open(&self) -> bool {
        self.users.is_empty()
    }

    /// Membership test, ignoring open mode
    pub fn contains(&self, user_id: u64) -> bool {
        self.users.contains(&user_id)
    }

    /// Whether `user_id` may proceed under this set
    pub fn permits(&self, user_id: u64) -> bool {
        self.is_open() || self.contains(user_id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        self.users.iter().copied()
    }
}

impl FromIterator<u64> for AllowSet {
    fn from_iter<I: IntoIterator<Item = u64>>(iter: I) -> Self {
        Self {
            users: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", 0)]
    #[case("   ", 0)]
    #[case("100", 1)]
    #[case("100,200", 2)]
    #[case(" 100 , 200 ", 2)]
    #[case("100,100", 1)]
    #[case("100,,200,", 2)]
    fn test_parse_valid(#[case] raw: &str, #[case] expected_len: usize) {
        let set = AllowSet::parse(raw).unwrap();
        assert_eq!(set.len(), expected_len);
    }

    #[rstest]
    #[case("12, abc, 34", "abc")]
    #[case("-5", "-5")]
    #[case("1.5", "1.5")]
    #[case("99999999999999999999999", "99999999999999999999999")]
    fn test_parse_invalid(#[case] raw: &str, #[case] bad: &str) {
        let err = AllowSet::parse(raw).unwrap_err();
        assert_eq!(err.entry, bad);
    }

    #[test]
    fn test_open_permits_everyone() {
        let set = AllowSet::open();
        assert!(set.is_open());
        assert!(set.permits(0));
        assert!(set.permits(u64::MAX));
        assert!(!set.contains(0));
    }

    #[test]
    fn test_restricted_permits_members_only() {
        let set = AllowSet::parse("100,200").unwrap();
        assert!(!set.is_open());
        assert!(set.permits(100));
        assert!(set.permits(200));
        assert!(!set.permits(300));
    }

    #[test]
    fn test_from_iterator() {
        let set: AllowSet = [1, 2, 3].into_iter().collect();
        let mut ids: Vec<u64> = set.iter().collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
