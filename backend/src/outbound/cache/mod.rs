//! In-process page cache backed by `moka`.
//!
//! Entries expire a fixed time after insertion. Nothing invalidates them on
//! writes, so a cached index page keeps showing deleted posts until expiry.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::domain::ports::{PageCache, PageCacheError, PageCacheKey};

/// Default lifetime of a cached page.
pub const DEFAULT_PAGE_TTL: Duration = Duration::from_secs(20);

const MAX_ENTRIES: u64 = 1_000;

/// Time-to-live cache of rendered HTML bodies.
#[derive(Clone)]
pub struct MokaPageCache {
    inner: Cache<String, String>,
}

impl MokaPageCache {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(MAX_ENTRIES)
                .time_to_live(ttl)
                .build(),
        }
    }
}

impl Default for MokaPageCache {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_TTL)
    }
}

#[async_trait]
impl PageCache for MokaPageCache {
    async fn get(&self, key: &PageCacheKey) -> Result<Option<String>, PageCacheError> {
        Ok(self.inner.get(key.as_str()).await)
    }

    async fn insert(&self, key: PageCacheKey, body: String) -> Result<(), PageCacheError> {
        self.inner.insert(key.as_str().to_owned(), body).await;
        Ok(())
    }

    async fn clear(&self) -> Result<(), PageCacheError> {
        self.inner.invalidate_all();
        self.inner.run_pending_tasks().await;
        Ok(())
    }
}
