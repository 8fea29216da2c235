//! Retry key derivation.
//!
//! A retry key identifies "this job content on this queue" across attempts:
//! `<namespace>:<component>:<queue>:<sha256 of the joined arguments>`.
//! Two jobs with identical queue and arguments share a key, and therefore an
//! attempt counter.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Default key namespace, shared with resque clients.
pub const DEFAULT_KEY_NAMESPACE: &str = "resque";

/// Default component segment, shared with resque-retry.
pub const DEFAULT_KEY_COMPONENT: &str = "resque-retry";

const ARG_SEPARATOR: &str = "-";

/// Builds retry keys under a fixed prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryKeyBuilder {
    namespace: String,
    component: String,
}

impl Default for RetryKeyBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_NAMESPACE, DEFAULT_KEY_COMPONENT)
    }
}

impl RetryKeyBuilder {
    /// Create a builder with a custom prefix.
    pub fn new(namespace: impl Into<String>, component: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            component: component.into(),
        }
    }

    /// Retry key for a job on `queue` with `args`.
    pub fn key(&self, queue: &str, args: &[Value]) -> String {
        [
            self.namespace.as_str(),
            self.component.as_str(),
            queue,
            identifier(args).as_str(),
        ]
        .join(":")
    }
}

/// Hex SHA-256 digest of the canonical rendering of `args`.
///
/// Strings are rendered without quotes and arguments are joined with `-`, so
/// the rendering is not injective: `["a-b"]` and `["a", "b"]` share a digest,
/// as do `["1"]` and `[1]`. Such jobs share one attempt counter. Keys stay
/// compatible with other resque-retry clients that render arguments the same
/// way.
pub fn identifier(args: &[Value]) -> String {
    let joined = args
        .iter()
        .map(canonical)
        .collect::<Vec<_>>()
        .join(ARG_SEPARATOR);

    hex::encode(Sha256::digest(joined.as_bytes()))
}

// Strings render bare, everything else as compact JSON.
fn canonical(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_layout() {
        let key = RetryKeyBuilder::default().key("mailers", &[json!("a@example.com")]);
        let parts: Vec<&str> = key.split(':').collect();

        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "resque");
        assert_eq!(parts[1], "resque-retry");
        assert_eq!(parts[2], "mailers");
        assert_eq!(parts[3].len(), 64);
        assert!(parts[3].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_identical_content_same_key() {
        let keys = RetryKeyBuilder::default();
        let a = keys.key("q", &[json!(1), json!("two"), json!({"three": 3})]);
        let b = keys.key("q", &[json!(1), json!("two"), json!({"three": 3})]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_content_different_key() {
        let keys = RetryKeyBuilder::default();
        let base = keys.key("q", &[json!(1), json!(2)]);

        assert_ne!(base, keys.key("q", &[json!(2), json!(1)]));
        assert_ne!(base, keys.key("q", &[json!(1), json!(3)]));
        assert_ne!(base, keys.key("other", &[json!(1), json!(2)]));
    }

    #[test]
    fn test_ambiguous_renderings_collide() {
        assert_eq!(
            identifier(&[json!("a-b")]),
            identifier(&[json!("a"), json!("b")])
        );
        assert_eq!(identifier(&[json!("1")]), identifier(&[json!(1)]));
    }

    #[test]
    fn test_known_digest() {
        // sha256("a-1")
        assert_eq!(
            identifier(&[json!("a"), json!(1)]),
            "2f8fe63a6224321de5d0a24cf30067d37a358706b1ed38b015282ab68dc69ae9"
        );
    }

    #[test]
    fn test_empty_args() {
        assert_eq!(
            identifier(&[]),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_custom_prefix() {
        let key = RetryKeyBuilder::new("app", "retries").key("q", &[]);
        assert!(key.starts_with("app:retries:q:"));
    }
}
