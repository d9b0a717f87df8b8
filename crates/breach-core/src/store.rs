//! Result Store: typed cache mapping opaque tokens to pipeline results
//!
//! Entries are immutable once stored and leave the store either through a
//! consuming read or through an explicit sweep. Nothing else evicts them, so
//! memory grows with every result that is never read back. Callers that need
//! a bound run [`ResultStore::sweep_older_than`] periodically.
use crate::data_model::{ResultVariant, StoredResult, VariantKind};
use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Opaque handle to a cached result. Random, never derived from content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for Token {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Token {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl Borrow<str> for Token {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub token: Token,
    pub variant: ResultVariant,
    pub created_at: DateTime<Utc>,
}

/// Concurrency-safe token -> result map.
///
/// Backed by a sharded map: lookups of distinct tokens rarely contend, and a
/// consuming read removes the entry under the shard lock so at most one
/// caller ever receives it.
#[derive(Debug, Default)]
pub struct ResultStore {
    entries: DashMap<Token, CacheEntry>,
}

impl ResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `variant` under a fresh token and returns the token.
    pub fn store(&self, variant: impl Into<ResultVariant>) -> Token {
        let variant = variant.into();
        loop {
            let token = Token::generate();
            match self.entries.entry(token.clone()) {
                Entry::Occupied(_) => continue,
                Entry::Vacant(slot) => {
                    debug!(token = %token, kind = %variant.kind(), "result stored");
                    slot.insert(CacheEntry {
                        token: token.clone(),
                        variant,
                        created_at: Utc::now(),
                    });
                    return token;
                }
            }
        }
    }

    /// Looks up `token` expecting a `kind` result.
    ///
    /// Unknown tokens and kind mismatches both return `None`; a mismatched
    /// entry is left in place even when `consume` is set.
    pub fn get(&self, token: &str, kind: VariantKind, consume: bool) -> Option<ResultVariant> {
        let found = if consume {
            self.entries
                .remove_if(token, |_, entry| entry.variant.kind() == kind)
                .map(|(_, entry)| entry.variant)
        } else {
            self.entries
                .get(token)
                .filter(|entry| entry.variant.kind() == kind)
                .map(|entry| entry.variant.clone())
        };

        debug!(token, %kind, consume, hit = found.is_some(), "result lookup");
        found
    }

    /// Typed form of [`ResultStore::get`].
    pub fn fetch<T: StoredResult>(&self, token: &str, consume: bool) -> Option<T> {
        self.get(token, T::KIND, consume).and_then(T::from_variant)
    }

    /// Drops every entry created before `cutoff`. Returns how many were removed.
    pub fn sweep_created_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut removed = 0;
        self.entries.retain(|_, entry| {
            let keep = entry.created_at >= cutoff;
            if !keep {
                removed += 1;
            }
            keep
        });
        removed
    }

    /// Drops every entry older than `max_age`.
    pub fn sweep_older_than(&self, max_age: Duration) -> usize {
        let cutoff = chrono::Duration::from_std(max_age)
            .ok()
            .and_then(|age| Utc::now().checked_sub_signed(age));

        match cutoff {
            Some(cutoff) => self.sweep_created_before(cutoff),
            None => 0,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
