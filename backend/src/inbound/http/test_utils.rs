//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::ServiceResponse;
use mockable::DefaultClock;
use tempfile::TempDir;

use crate::inbound::http::session_config::SESSION_COOKIE_NAME;
use crate::inbound::http::state::{HttpState, HttpStatePorts};
use crate::outbound::cache::MokaPageCache;
use crate::outbound::media::FsMediaStore;
use crate::outbound::memory::MemoryStore;
use crate::outbound::security::Argon2PasswordHasher;

/// Session middleware with a throwaway key and no `Secure` flag.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name(SESSION_COOKIE_NAME.to_owned())
        .cookie_secure(false)
        .build()
}

/// Session cookie set by `res`, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
}

/// Handler state over the in-memory store and a temporary media root.
pub fn memory_state() -> (TempDir, MemoryStore, HttpState) {
    let media_root = tempfile::tempdir().expect("temp media root");
    let store = MemoryStore::new();
    let shared = Arc::new(store.clone());
    let state = HttpState::new(
        HttpStatePorts {
            users: shared.clone(),
            groups: shared.clone(),
            posts: shared.clone(),
            comments: shared.clone(),
            follows: shared,
            media: Arc::new(FsMediaStore::open(media_root.path()).expect("media store")),
            hasher: Arc::new(Argon2PasswordHasher::new()),
            page_cache: Arc::new(MokaPageCache::default()),
            clock: Arc::new(DefaultClock),
        },
        10,
    );
    (media_root, store, state)
}
