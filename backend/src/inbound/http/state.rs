//! Shared HTTP adapter state.
//!
//! Handlers receive [`HttpState`] through `actix_web::web::Data`, so they only
//! talk to domain services and ports and stay testable against the in-memory
//! adapters.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    CommentRepository, FollowRepository, GroupRepository, MediaStore, PageCache, PasswordHasher,
    PostRepository, UserRepository,
};
use crate::domain::{AccountService, FollowService, PostService, PostServicePorts};

/// Parameter object bundling every adapter the HTTP layer needs.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub media: Arc<dyn MediaStore>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub page_cache: Arc<dyn PageCache>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub accounts: AccountService,
    pub posts: PostService,
    pub follows: FollowService,
    pub media: Arc<dyn MediaStore>,
    pub page_cache: Arc<dyn PageCache>,
}

impl HttpState {
    /// Wire the services over `ports`, listing `per_page` posts per page.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use mockable::DefaultClock;
    /// use postboard::inbound::http::state::{HttpState, HttpStatePorts};
    /// use postboard::outbound::cache::MokaPageCache;
    /// use postboard::outbound::media::FsMediaStore;
    /// use postboard::outbound::memory::MemoryStore;
    /// use postboard::outbound::security::Argon2PasswordHasher;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = Arc::new(MemoryStore::new());
    /// let state = HttpState::new(
    ///     HttpStatePorts {
    ///         users: store.clone(),
    ///         groups: store.clone(),
    ///         posts: store.clone(),
    ///         comments: store.clone(),
    ///         follows: store,
    ///         media: Arc::new(FsMediaStore::open(dir.path()).unwrap()),
    ///         hasher: Arc::new(Argon2PasswordHasher::new()),
    ///         page_cache: Arc::new(MokaPageCache::default()),
    ///         clock: Arc::new(DefaultClock),
    ///     },
    ///     10,
    /// );
    /// assert_eq!(state.posts.per_page(), 10);
    /// ```
    pub fn new(ports: HttpStatePorts, per_page: u64) -> Self {
        let HttpStatePorts {
            users,
            groups,
            posts,
            comments,
            follows,
            media,
            hasher,
            page_cache,
            clock,
        } = ports;
        let accounts = AccountService::new(users, hasher);
        let post_service = PostService::new(
            PostServicePorts {
                posts,
                groups,
                comments,
                follows: Arc::clone(&follows),
                media: Arc::clone(&media),
                clock,
            },
            accounts.clone(),
            per_page,
        );
        Self {
            follows: FollowService::new(accounts.clone(), follows),
            accounts,
            posts: post_service,
            media,
            page_cache,
        }
    }
}
