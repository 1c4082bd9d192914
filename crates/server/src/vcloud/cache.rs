use parking_lot::RwLock;
use std::collections::HashMap;
use std::future::Future;
use vcloud_common::prelude::{Error, Result};

/// Process-wide cache of vCloud session tokens.
///
/// Keys combine the login URL and the encoded credential, so a token is never
/// shared between two endpoint/credential pairs. Entries live until they are
/// invalidated or the whole cache is cleared; there is no expiry of its own.
///
/// Racing callers on the same key may all run the login; the last one to
/// finish wins. The lock is never held while a login is in flight.
///
#[derive(Debug, Default)]
pub struct TokenCache {
    tokens: RwLock<HashMap<String, String>>,
}

impl TokenCache {
    /// Creates an empty cache.
    ///
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the token cached under `key`, if any.
    ///
    pub fn get(&self, key: &str) -> Option<String> {
        self.tokens.read().get(key).cloned()
    }

    /// Returns the token cached under `key`, or produces a new one.
    ///
    /// # Arguments
    ///
    /// * `key`: Cache key.
    /// * `retries`: Additional attempts after a first failed production.
    /// * `producer`: Login attempt, `None` when the attempt failed.
    /// * `error`: Builds the error returned once every attempt failed.
    ///
    /// # Returns
    ///
    /// The cached or freshly produced token.
    ///
    pub async fn get_or_create<P, F, E>(
        &self,
        key: &str,
        retries: u32,
        mut producer: P,
        error: E,
    ) -> Result<String>
    where
        P: FnMut() -> F,
        F: Future<Output = Option<String>>,
        E: FnOnce() -> Error,
    {
        if let Some(token) = self.get(key) {
            tracing::trace!(target: "cache", "Token served from cache");
            return Ok(token);
        }

        for attempt in 0..=retries {
            match producer().await {
                Some(token) => {
                    self.tokens.write().insert(key.to_owned(), token.clone());
                    tracing::debug!(target: "cache", attempt, "New token cached");
                    return Ok(token);
                }
                None => tracing::warn!(target: "cache", attempt, retries, "Token production failed"),
            }
        }

        Err(error())
    }

    /// Drops the token cached under `key`.
    ///
    /// # Returns
    ///
    /// `true` when a token was removed.
    ///
    pub fn invalidate(&self, key: &str) -> bool {
        self.tokens.write().remove(key).is_some()
    }

    /// Drops every cached token.
    ///
    /// # Returns
    ///
    /// The number of removed tokens.
    ///
    pub fn clear(&self) -> usize {
        let mut tokens = self.tokens.write();
        let count = tokens.len();
        tokens.clear();
        tracing::info!(target: "cache", count, "Token cache cleared");

        count
    }

    pub fn len(&self) -> usize {
        self.tokens.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.read().is_empty()
    }
}
