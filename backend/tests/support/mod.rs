//! Shared harness for end-to-end page tests over the in-memory adapters.

use std::sync::Arc;

use actix_http::Request;
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::header;
use actix_web::test;
use mockable::DefaultClock;
use tempfile::TempDir;

use postboard::domain::ports::GroupRepository;
use postboard::domain::{
    Group, ImageChange, NewGroup, Post, PostDraft, PostText, SignupInput, SignupRequest, User,
};
use postboard::inbound::http::session_config::SESSION_COOKIE_NAME;
use postboard::inbound::http::state::{HttpState, HttpStatePorts};
use postboard::outbound::cache::MokaPageCache;
use postboard::outbound::media::FsMediaStore;
use postboard::outbound::memory::MemoryStore;
use postboard::outbound::security::Argon2PasswordHasher;

pub const PASSWORD: &str = "Sup3rSecret";

/// A board backed by memory with a throwaway media root.
pub struct Board {
    _media: TempDir,
    pub store: MemoryStore,
    pub state: HttpState,
    key: Key,
}

impl Board {
    pub fn new() -> Self {
        let media = tempfile::tempdir().expect("temp media root");
        let store = MemoryStore::new();
        let shared = Arc::new(store.clone());
        let state = HttpState::new(
            HttpStatePorts {
                users: shared.clone(),
                groups: shared.clone(),
                posts: shared.clone(),
                comments: shared.clone(),
                follows: shared,
                media: Arc::new(FsMediaStore::open(media.path()).expect("media store")),
                hasher: Arc::new(Argon2PasswordHasher::new()),
                page_cache: Arc::new(MokaPageCache::default()),
                clock: Arc::new(DefaultClock),
            },
            10,
        );
        Self {
            _media: media,
            store,
            state,
            key: Key::generate(),
        }
    }

    pub fn session(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_secure(false)
            .build()
    }

    pub async fn user(&self, username: &str) -> User {
        let request = SignupRequest::try_from_input(&SignupInput {
            username,
            first_name: "Test",
            last_name: username,
            password1: PASSWORD,
            password2: PASSWORD,
            ..SignupInput::default()
        })
        .expect("valid signup");
        self.state.accounts.signup(&request).await.expect("signup")
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        let group = NewGroup::new(title, slug, "Test description").expect("valid group");
        self.store.create(&group).await.expect("group stored")
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        let draft = PostDraft {
            text: PostText::new(text).expect("valid text"),
            group: group.map(Group::id),
            image: ImageChange::Keep,
        };
        self.state
            .posts
            .create_post(author.id(), draft)
            .await
            .expect("post stored")
    }
}

/// Build the full page app for a [`Board`].
#[macro_export]
macro_rules! board_app {
    ($board:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($board.state.clone()))
                .wrap(postboard::inbound::http::error::viewer_error_pages())
                .wrap($board.session())
                .wrap(postboard::Trace)
                .configure(postboard::inbound::http::configure),
        )
        .await
    };
}

pub fn form_post(uri: &str, body: &str) -> test::TestRequest {
    test::TestRequest::post()
        .uri(uri)
        .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
        .set_payload(body.to_owned())
}

pub fn location<B>(res: &ServiceResponse<B>) -> Option<String> {
    res.headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(ToOwned::to_owned)
}

pub async fn body_text<B: MessageBody>(res: ServiceResponse<B>) -> String {
    let bytes = test::read_body(res).await;
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

pub fn card_count(body: &str) -> usize {
    body.matches("<article class=\"post\">").count()
}

/// Sign `username` in through the login form and return the session cookie.
pub async fn log_in<S, B>(app: &S, username: &str) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        form_post(
            "/auth/login/",
            &format!("username={username}&password={PASSWORD}"),
        )
        .to_request(),
    )
    .await;
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(Cookie::into_owned)
        .expect("login sets a session cookie")
}
