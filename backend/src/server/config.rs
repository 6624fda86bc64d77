//! Application settings loaded via OrthoConfig, and the assembled server
//! configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use ortho_config::OrthoConfig;
use postboard::domain::DEFAULT_POSTS_PER_PAGE;
use postboard::inbound::http::session_config::SessionSettings;
use postboard::outbound::persistence::DbPool;
use serde::Deserialize;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MEDIA_ROOT: &str = "media";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_INDEX_CACHE_TTL_SECS: u64 = 20;

/// Settings read from `POSTBOARD_*` variables, config files and flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "POSTBOARD")]
pub struct AppSettings {
    /// Listen address.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; the in-memory store is used when absent.
    pub database_url: Option<String>,
    /// Upper bound of pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Directory holding uploaded images.
    pub media_root: Option<PathBuf>,
    /// Posts shown on each listing page.
    pub posts_per_page: Option<u64>,
    /// Lifetime of a cached index page.
    pub index_cache_ttl_secs: Option<u64>,
}

/// Errors raised while interpreting [`AppSettings`].
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// `bind_addr` is not a socket address.
    #[error("invalid bind address {value:?}: {source}")]
    BindAddr {
        /// Raw configured value.
        value: String,
        /// Parse failure.
        source: std::net::AddrParseError,
    },
    /// `posts_per_page` is zero.
    #[error("posts_per_page must be at least 1")]
    PerPage,
}

impl AppSettings {
    /// Parsed listen address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::BindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    /// Pool size for the database.
    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections.unwrap_or(DEFAULT_DB_MAX_CONNECTIONS)
    }

    /// Media directory.
    pub fn media_root(&self) -> PathBuf {
        self.media_root
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MEDIA_ROOT))
    }

    /// Listing page size.
    pub fn posts_per_page(&self) -> Result<u64, SettingsError> {
        match self.posts_per_page.unwrap_or(DEFAULT_POSTS_PER_PAGE) {
            0 => Err(SettingsError::PerPage),
            n => Ok(n),
        }
    }

    /// Index cache lifetime.
    pub fn index_cache_ttl(&self) -> Duration {
        Duration::from_secs(
            self.index_cache_ttl_secs
                .unwrap_or(DEFAULT_INDEX_CACHE_TTL_SECS),
        )
    }
}

/// Everything [`super::create_server`] needs.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: Option<DbPool>,
    pub(crate) media_root: PathBuf,
    pub(crate) posts_per_page: u64,
    pub(crate) index_cache_ttl: Duration,
}

impl ServerConfig {
    /// Combine validated settings with the session configuration.
    pub fn new(settings: &AppSettings, session: SessionSettings) -> Result<Self, SettingsError> {
        Ok(Self {
            session,
            bind_addr: settings.bind_addr()?,
            db_pool: None,
            media_root: settings.media_root(),
            posts_per_page: settings.posts_per_page()?,
            index_cache_ttl: settings.index_cache_ttl(),
        })
    }

    /// Attach a database pool; repositories then use PostgreSQL.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }
}
