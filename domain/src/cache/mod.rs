//! Thought cache keys.
//!
//! A key is the SHA-256 fingerprint of `(role, normalized messages)`.
//! Normalization makes the key insensitive to whitespace noise and to the
//! order of the message list; every field is length-prefixed so that
//! different splits of the same text never collide.

use crate::util::collapse_whitespace;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// One message of a conversation as seen by the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// `system`, `user` or `assistant`
    pub role: String,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new("assistant", content)
    }
}

/// Hex SHA-256 cache fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for `role` and `messages`.
    ///
    /// ```
    /// use swarm_domain::cache::{CacheKey, ConversationTurn};
    ///
    /// let a = CacheKey::derive("specialist:qa", &[
    ///     ConversationTurn::system("Review"),
    ///     ConversationTurn::user("Draft  v1"),
    /// ]);
    /// let b = CacheKey::derive(" Specialist:QA ", &[
    ///     ConversationTurn::user("Draft v1 "),
    ///     ConversationTurn::system("Review"),
    /// ]);
    /// assert_eq!(a, b);
    /// ```
    pub fn derive(role: &str, messages: &[ConversationTurn]) -> Self {
        let mut normalized: Vec<(String, String)> = messages
            .iter()
            .map(|m| (m.role.trim().to_lowercase(), collapse_whitespace(&m.content)))
            .collect();
        normalized.sort();

        let mut hasher = Sha256::new();
        write_field(&mut hasher, &role.trim().to_lowercase());
        hasher.update((normalized.len() as u64).to_le_bytes());
        for (role, content) in &normalized {
            write_field(&mut hasher, role);
            write_field(&mut hasher, content);
        }
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn write_field(hasher: &mut Sha256, field: &str) {
    hasher.update((field.len() as u64).to_le_bytes());
    hasher.update(field.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_hex_sha256() {
        let key = CacheKey::derive("planner", &[ConversationTurn::user("goal")]);
        assert_eq!(key.as_str().len(), 64);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_order_insensitive() {
        let a = [ConversationTurn::user("one"), ConversationTurn::user("two")];
        let b = [ConversationTurn::user("two"), ConversationTurn::user("one")];
        assert_eq!(CacheKey::derive("r", &a), CacheKey::derive("r", &b));
    }

    #[test]
    fn test_role_separates_keys() {
        let messages = [ConversationTurn::user("same")];
        assert_ne!(
            CacheKey::derive("specialist:research", &messages),
            CacheKey::derive("specialist:strategy", &messages)
        );
    }

    #[test]
    fn test_message_role_matters() {
        assert_ne!(
            CacheKey::derive("r", &[ConversationTurn::user("x")]),
            CacheKey::derive("r", &[ConversationTurn::system("x")])
        );
    }

    #[test]
    fn test_splits_do_not_collide() {
        let a = [ConversationTurn::user("ab"), ConversationTurn::user("c")];
        let b = [ConversationTurn::user("a"), ConversationTurn::user("bc")];
        assert_ne!(CacheKey::derive("r", &a), CacheKey::derive("r", &b));
    }

    #[test]
    fn test_content_changes_key() {
        assert_ne!(
            CacheKey::derive("r", &[ConversationTurn::user("launch in May")]),
            CacheKey::derive("r", &[ConversationTurn::user("launch in June")])
        );
    }
}
