//! Builders choosing PostgreSQL or in-memory adapters for the HTTP state.

use std::io;
use std::sync::Arc;

use mockable::DefaultClock;
use tracing::{info, warn};

use postboard::domain::ports::{
    CommentRepository, FollowRepository, GroupRepository, PostRepository, UserRepository,
};
use postboard::inbound::http::state::{HttpState, HttpStatePorts};
use postboard::outbound::cache::MokaPageCache;
use postboard::outbound::media::FsMediaStore;
use postboard::outbound::memory::MemoryStore;
use postboard::outbound::persistence::{
    DbPool, DieselCommentRepository, DieselFollowRepository, DieselGroupRepository,
    DieselPostRepository, DieselUserRepository,
};
use postboard::outbound::security::Argon2PasswordHasher;

use super::ServerConfig;

/// Repository ports sharing one backing store.
struct Repositories {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    fn diesel(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            groups: Arc::new(DieselGroupRepository::new(pool.clone())),
            posts: Arc::new(DieselPostRepository::new(pool.clone())),
            comments: Arc::new(DieselCommentRepository::new(pool.clone())),
            follows: Arc::new(DieselFollowRepository::new(pool.clone())),
        }
    }

    fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            users: store.clone(),
            groups: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            follows: store,
        }
    }

    fn for_pool(pool: Option<&DbPool>) -> Self {
        match pool {
            Some(pool) => {
                info!("using PostgreSQL repositories");
                Self::diesel(pool)
            }
            None => {
                warn!("no database configured; posts live in memory and vanish on restart");
                Self::memory()
            }
        }
    }
}

/// Build the shared handler state for `config`.
///
/// # Errors
/// Fails when the media root cannot be created or opened.
pub(crate) fn build_http_state(config: &ServerConfig) -> io::Result<HttpState> {
    let Repositories {
        users,
        groups,
        posts,
        comments,
        follows,
    } = Repositories::for_pool(config.db_pool.as_ref());
    let media = FsMediaStore::open(&config.media_root).map_err(|err| {
        io::Error::other(format!(
            "open media root {}: {err}",
            config.media_root.display()
        ))
    })?;
    Ok(HttpState::new(
        HttpStatePorts {
            users,
            groups,
            posts,
            comments,
            follows,
            media: Arc::new(media),
            hasher: Arc::new(Argon2PasswordHasher::new()),
            page_cache: Arc::new(MokaPageCache::new(config.index_cache_ttl)),
            clock: Arc::new(DefaultClock),
        },
        config.posts_per_page,
    ))
}
