//! Deterministic cache keys
//!
//! A fingerprint is a SHA-256 hex digest over a normalized request. Env var
//! names enter only as a digest of the sorted, de-duplicated name set; their
//! values never reach this module.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::types::normalize_key;

const SEPARATOR: &[u8] = b"|";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Key for a generation request.
    ///
    /// Identifiers are trimmed and lowercased, env names trimmed and
    /// uppercased; blank entries are dropped. `enhancement` is appended only
    /// when present, so plain requests hash over exactly
    /// `provider | template | framework | features | env-digest`.
    pub fn for_request<'a>(
        provider_id: &str,
        template_id: Option<&str>,
        framework: &str,
        features: impl IntoIterator<Item = &'a String>,
        env_var_names: impl IntoIterator<Item = &'a String>,
        enhancement: Option<&str>,
    ) -> Self {
        let features: BTreeSet<String> = features
            .into_iter()
            .map(|f| normalize_key(f))
            .filter(|f| !f.is_empty())
            .collect();

        let mut hasher = Sha256::new();
        hasher.update(normalize_key(provider_id).as_bytes());
        hasher.update(SEPARATOR);
        hasher.update(template_id.map(normalize_key).unwrap_or_default().as_bytes());
        hasher.update(SEPARATOR);
        hasher.update(normalize_key(framework).as_bytes());
        hasher.update(SEPARATOR);
        hasher.update(join(&features).as_bytes());
        hasher.update(SEPARATOR);
        hasher.update(env_names_digest(env_var_names).as_bytes());
        if let Some(enhancement) = enhancement {
            hasher.update(SEPARATOR);
            hasher.update(normalize_key(enhancement).as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Key for auxiliary memoization (enhancement output, documentation lookups).
    ///
    /// `namespace` keeps unrelated callers from colliding on equal parts.
    pub fn for_parts<S: AsRef<str>>(namespace: &str, parts: &[S]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(namespace.as_bytes());
        for part in parts {
            hasher.update(SEPARATOR);
            let part = part.as_ref();
            // Length prefix keeps ["a|b"] distinct from ["a", "b"]
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part.as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex characters, for log lines
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Content hash of the normalized env var name set
fn env_names_digest<'a>(names: impl IntoIterator<Item = &'a String>) -> String {
    let names: BTreeSet<String> = names
        .into_iter()
        .map(|n| n.trim().to_uppercase())
        .filter(|n| !n.is_empty())
        .collect();
    format!("{:x}", Sha256::digest(join(&names).as_bytes()))
}

fn join(set: &BTreeSet<String>) -> String {
    set.iter().map(String::as_str).collect::<Vec<_>>().join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn request(features: &[&str], env: &[&str]) -> Fingerprint {
        Fingerprint::for_request(
            "stripe",
            Some("stripe-checkout"),
            "nextjs",
            &set(features),
            &set(env),
            None,
        )
    }

    #[test]
    fn test_normalization() {
        let a = request(&["webhooks", "checkout"], &["STRIPE_SECRET_KEY", "STRIPE_WEBHOOK_SECRET"]);
        let b = Fingerprint::for_request(
            " Stripe ",
            Some("STRIPE-CHECKOUT"),
            "NextJS",
            &set(&["Checkout", "webhooks", "webhooks"]),
            &set(&["stripe_webhook_secret", "STRIPE_SECRET_KEY", " "]),
            None,
        );
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_inputs_change_key() {
        let base = request(&["webhooks"], &["STRIPE_SECRET_KEY"]);
        assert_ne!(base, request(&["webhooks", "checkout"], &["STRIPE_SECRET_KEY"]));
        assert_ne!(base, request(&["webhooks"], &["STRIPE_PUBLISHABLE_KEY"]));
        let enhanced = Fingerprint::for_request(
            "stripe",
            Some("stripe-checkout"),
            "nextjs",
            &set(&["webhooks"]),
            &set(&["STRIPE_SECRET_KEY"]),
            Some("documentation"),
        );
        assert_ne!(base, enhanced);
    }

    #[test]
    fn test_missing_template_differs_from_empty_features() {
        let without = Fingerprint::for_request("stripe", None, "nextjs", &set(&[]), &set(&[]), None);
        let with = Fingerprint::for_request(
            "stripe",
            Some("stripe-checkout"),
            "nextjs",
            &set(&[]),
            &set(&[]),
            None,
        );
        assert_ne!(without, with);
    }

    #[test]
    fn test_for_parts_namespaced() {
        let a = Fingerprint::for_parts("enhance", &["x", "y"]);
        assert_eq!(a, Fingerprint::for_parts("enhance", &["x", "y"]));
        assert_ne!(a, Fingerprint::for_parts("docs", &["x", "y"]));
        assert_ne!(
            Fingerprint::for_parts("enhance", &["x|y"]),
            Fingerprint::for_parts("enhance", &["x", "y"])
        );
        assert_eq!(a.short().len(), 12);
    }
}
