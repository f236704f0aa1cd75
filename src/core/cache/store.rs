//! In-memory audio cache backed by moka.
//!
//! Entries are weighed so that one budget enforces both limits: each entry
//! costs `max(size, max_bytes / max_entries)` against a capacity of
//! `max_bytes`. At most `max_entries` entries fit, and their total size never
//! exceeds `max_bytes`. Eviction is least-recently-used.
//!
//! Values are `Arc<CacheEntry>` holding refcounted [`Bytes`], so evicting an
//! entry never invalidates audio a request is still sending.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use moka::future::Cache;
use moka::policy::EvictionPolicy;
use tokio::time::Instant;

use super::key::CacheKey;
use crate::core::audio::OutputFormat;
use crate::errors::{SpeechError, SpeechResult};

/// One rendered track. Never mutated after creation.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub audio: Bytes,
    pub format: OutputFormat,
    pub created_at: Instant,
    /// Number of synthesized segments the track was assembled from
    pub segments: usize,
}

impl CacheEntry {
    pub fn new(audio: Bytes, format: OutputFormat, segments: usize) -> Self {
        Self {
            audio,
            format,
            created_at: Instant::now(),
            segments,
        }
    }

    #[inline]
    pub fn size(&self) -> usize {
        self.audio.len()
    }

    /// Returns whether the entry is older than `stale_after`.
    ///
    /// Entries never go stale when `stale_after` is `None`.
    pub fn is_stale(&self, stale_after: Option<Duration>) -> bool {
        stale_after.is_some_and(|limit| self.created_at.elapsed() >= limit)
    }
}

/// Bounded, concurrency-safe map from [`CacheKey`] to rendered audio.
#[derive(Clone)]
pub struct AudioCache {
    inner: Cache<CacheKey, Arc<CacheEntry>>,
    max_entries: u64,
    max_bytes: u64,
}

impl AudioCache {
    /// Creates an empty cache.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` when either budget is zero.
    pub fn new(max_entries: u64, max_bytes: u64) -> SpeechResult<Self> {
        if max_entries == 0 || max_bytes == 0 {
            return Err(SpeechError::InvalidConfiguration(
                "cache budgets must be greater than zero".to_string(),
            ));
        }

        let slot = (max_bytes / max_entries).max(1);
        let inner = Cache::builder()
            .max_capacity(max_bytes)
            .weigher(move |_key: &CacheKey, entry: &Arc<CacheEntry>| -> u32 {
                let weight = (entry.size() as u64).max(slot);
                u32::try_from(weight).unwrap_or(u32::MAX)
            })
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Ok(Self {
            inner,
            max_entries,
            max_bytes,
        })
    }

    #[inline]
    pub fn max_entries(&self) -> u64 {
        self.max_entries
    }

    #[inline]
    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub async fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.inner.get(key).await
    }

    pub async fn insert(&self, key: CacheKey, entry: Arc<CacheEntry>) {
        self.inner.insert(key, entry).await;
        self.inner.run_pending_tasks().await;
    }

    pub async fn invalidate(&self, key: &CacheKey) {
        self.inner.invalidate(key).await;
    }

    /// Returns the cached entry or runs `init` to produce it.
    ///
    /// Concurrent callers for the same key share one `init` run; the others
    /// wait for its result. The flag is `true` when this caller ran `init`.
    /// A failed `init` stores nothing and every waiter receives the error.
    pub async fn get_or_try_insert<F>(
        &self,
        key: CacheKey,
        init: F,
    ) -> SpeechResult<(Arc<CacheEntry>, bool)>
    where
        F: Future<Output = SpeechResult<Arc<CacheEntry>>>,
    {
        let entry = self
            .inner
            .entry(key)
            .or_try_insert_with(init)
            .await
            .map_err(|e: Arc<SpeechError>| (*e).clone())?;

        let inserted = entry.is_fresh();
        if inserted {
            self.inner.run_pending_tasks().await;
        }
        Ok((entry.into_value(), inserted))
    }

    /// Applies pending evictions.
    pub async fn run_pending_tasks(&self) {
        self.inner.run_pending_tasks().await;
    }

    /// Approximate number of live entries.
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Total audio bytes held by live entries.
    pub fn total_bytes(&self) -> u64 {
        self.inner
            .iter()
            .map(|(_, entry)| entry.size() as u64)
            .sum()
    }

    /// Drops every entry.
    pub async fn clear(&self) {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
    }
}

impl std::fmt::Debug for AudioCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioCache")
            .field("entries", &self.inner.entry_count())
            .field("max_entries", &self.max_entries)
            .field("max_bytes", &self.max_bytes)
            .finish()
    }
}
