use std::time::{Duration as StdDuration, Instant};

use tokio::sync::Mutex;

use crate::error::TokenError;
use crate::jwks::JwksDocument;
use crate::keys::{KeySet, PublicKey};

const DEFAULT_MAX_AGE: StdDuration = StdDuration::from_secs(300);

struct Cache {
    keys: KeySet,
    fetched_at: Instant,
    max_age: StdDuration,
}

impl Cache {
    fn is_stale(&self) -> bool {
        self.fetched_at.elapsed() >= self.max_age
    }
}

/// Fetches and caches a remote issuer's published key set (spec.md §4.A /
/// §6: verifiers that don't hold the signing key resolve `kid` via the
/// issuer's JWKS endpoint). Refreshes are serialized behind a mutex so a
/// burst of unknown-`kid` lookups triggers at most one in-flight fetch,
/// mirroring the single-flight behavior the gateway uses elsewhere
/// (spec.md Orchestration row).
pub struct RemoteJwksClient {
    url: String,
    http: reqwest::Client,
    cache: Mutex<Option<Cache>>,
}

impl RemoteJwksClient {
    pub fn new(url: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            http,
            cache: Mutex::new(None),
        }
    }

    /// Resolves `kid`, fetching (or refetching if the cache's `max-age`
    /// has elapsed) at most once even when several callers race in.
    pub async fn resolve(&self, kid: &str) -> Result<PublicKey, TokenError> {
        {
            let guard = self.cache.lock().await;
            if let Some(cache) = guard.as_ref() {
                if !cache.is_stale() {
                    if let Some(key) = cache.keys.find(kid) {
                        return Ok(key.clone());
                    }
                }
            }
        }

        self.force_refresh().await?;

        let guard = self.cache.lock().await;
        let cache = guard.as_ref().expect("force_refresh populates the cache");
        cache
            .keys
            .find(kid)
            .cloned()
            .ok_or_else(|| TokenError::UnknownKid(kid.to_string()))
    }

    /// Unconditionally refetches, holding the mutex for the whole
    /// round-trip so concurrent unknown-`kid` lookups collapse into one
    /// request instead of each firing their own.
    async fn force_refresh(&self) -> Result<(), TokenError> {
        let mut guard = self.cache.lock().await;
        if let Some(cache) = guard.as_ref() {
            if !cache.is_stale() {
                return Ok(());
            }
        }

        let response = self.http.get(&self.url).send().await.map_err(|e| {
            tracing::warn!(url = %self.url, error = %e, "failed to fetch remote jwks document");
            TokenError::RemoteFetch(e.into())
        })?;

        let max_age = response
            .headers()
            .get(reqwest::header::CACHE_CONTROL)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_max_age)
            .unwrap_or(DEFAULT_MAX_AGE);

        let document: JwksDocument = response
            .json()
            .await
            .map_err(|e| TokenError::RemoteFetch(e.into()))?;

        let mut keys = KeySet::new();
        for key in &document.keys {
            keys.add(key.to_public_key());
        }

        tracing::info!(url = %self.url, key_count = document.keys.len(), "refreshed remote jwks cache");
        *guard = Some(Cache {
            keys,
            fetched_at: Instant::now(),
            max_age,
        });
        Ok(())
    }
}

fn parse_max_age(cache_control: &str) -> Option<StdDuration> {
    cache_control.split(',').find_map(|directive| {
        let directive = directive.trim();
        let seconds = directive.strip_prefix("max-age=")?;
        seconds.parse::<u64>().ok().map(StdDuration::from_secs)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_max_age_directive() {
        assert_eq!(parse_max_age("public, max-age=120"), Some(StdDuration::from_secs(120)));
        assert_eq!(parse_max_age("no-store"), None);
        assert_eq!(parse_max_age(""), None);
    }
}
