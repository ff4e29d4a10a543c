//! Process-wide cache for upstream vault tokens.
//!
//! Keyed two levels deep: vault kind, then a cache key derived
//! deterministically from the credential bundle. Entries are checked for
//! freshness on read with a safety skew; stale entries read as absent and
//! are overwritten by the next successful refresh. Two workers refreshing
//! the same key may race; the later write wins, which is fine because both
//! tokens are independently valid.

use crate::domain::VaultKind;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Tokens within this many seconds of expiry are treated as already expired.
pub const EXPIRY_SKEW_SECS: i64 = 60;

/// An upstream bearer token with its absolute expiration (unix seconds).
/// Never mutated in place; replaced wholesale on refresh.
#[derive(Debug, Clone)]
pub struct UpstreamToken {
    pub token: String,
    pub expiration: i64,
}

impl UpstreamToken {
    pub fn new(token: impl Into<String>, expiration: i64) -> Self {
        Self { token: token.into(), expiration }
    }

    fn is_fresh(&self, now: i64) -> bool {
        self.expiration - EXPIRY_SKEW_SECS > now
    }
}

/// Concurrent (vault kind, cache key) -> token map.
#[derive(Debug, Default)]
pub struct TokenCache {
    inner: RwLock<HashMap<VaultKind, HashMap<String, UpstreamToken>>>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached token if present and fresh. Absent covers both "no
    /// entry" and "entry inside the expiry skew"; callers treat absent as
    /// "must refresh" either way.
    pub async fn get(&self, kind: VaultKind, key: &str) -> Option<String> {
        let now = Utc::now().timestamp();
        let cache = self.inner.read().await;
        let entry = cache.get(&kind)?.get(key)?;
        if entry.is_fresh(now) {
            debug!(vault_kind = %kind, "cached token found and not expired");
            Some(entry.token.clone())
        } else {
            debug!(vault_kind = %kind, "cached token has expired");
            None
        }
    }

    /// Stores (or replaces) the token for a cache key.
    pub async fn put(&self, kind: VaultKind, key: &str, token: UpstreamToken) {
        let mut cache = self.inner.write().await;
        cache.entry(kind).or_default().insert(key.to_string(), token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_token_is_returned() {
        let cache = TokenCache::new();
        let exp = Utc::now().timestamp() + 3600;
        cache
            .put(VaultKind::AzureKeyVault, "client~secret~tenant", UpstreamToken::new("tok", exp))
            .await;
        assert_eq!(
            cache.get(VaultKind::AzureKeyVault, "client~secret~tenant").await.as_deref(),
            Some("tok")
        );
    }

    #[tokio::test]
    async fn token_inside_skew_reads_as_absent() {
        let cache = TokenCache::new();
        // Expires in 30s: not technically expired, but inside the 60s skew.
        let exp = Utc::now().timestamp() + 30;
        cache
            .put(VaultKind::IbmCloudSecretsManager, "api-key", UpstreamToken::new("tok", exp))
            .await;
        assert!(cache.get(VaultKind::IbmCloudSecretsManager, "api-key").await.is_none());
    }

    #[tokio::test]
    async fn keys_are_scoped_per_vault_kind() {
        let cache = TokenCache::new();
        let exp = Utc::now().timestamp() + 3600;
        cache.put(VaultKind::AzureKeyVault, "shared-key", UpstreamToken::new("azure", exp)).await;
        assert!(cache.get(VaultKind::IbmCloudSecretsManager, "shared-key").await.is_none());
    }

    #[tokio::test]
    async fn refresh_replaces_stale_entry() {
        let cache = TokenCache::new();
        let kind = VaultKind::IbmCloudSecretsManager;
        cache.put(kind, "k", UpstreamToken::new("old", Utc::now().timestamp() + 10)).await;
        assert!(cache.get(kind, "k").await.is_none());
        cache.put(kind, "k", UpstreamToken::new("new", Utc::now().timestamp() + 3600)).await;
        assert_eq!(cache.get(kind, "k").await.as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn concurrent_refreshes_last_writer_wins() {
        use std::sync::Arc;

        let cache = Arc::new(TokenCache::new());
        let exp = Utc::now().timestamp() + 3600;
        let mut handles = Vec::new();
        for i in 0..8 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .put(VaultKind::AzureKeyVault, "k", UpstreamToken::new(format!("t{}", i), exp))
                    .await;
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        // Exactly one live token remains, whichever write landed last.
        let token = cache.get(VaultKind::AzureKeyVault, "k").await.unwrap();
        assert!(token.starts_with('t'));
    }
}
