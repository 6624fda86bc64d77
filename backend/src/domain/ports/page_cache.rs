//! Port interface for caching rendered HTML pages.
use async_trait::async_trait;

use super::{PageCacheKey, define_port_error};

define_port_error! {
    /// Errors surfaced by the caching adapter.
    pub enum PageCacheError {
        /// Cache backend is unavailable or timing out.
        Backend { message: String } => "page cache backend failure: {message}",
    }
}

/// Time-limited store of rendered pages.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageCache: Send + Sync {
    /// Read a cached page body.
    async fn get(&self, key: &PageCacheKey) -> Result<Option<String>, PageCacheError>;

    /// Store a rendered page body until it expires.
    async fn insert(&self, key: PageCacheKey, body: String) -> Result<(), PageCacheError>;

    /// Drop every cached page.
    async fn clear(&self) -> Result<(), PageCacheError>;
}
