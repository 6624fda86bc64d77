//! Who is making the request.
//!
//! [`Viewer`] resolves the optional signed-in user for public pages;
//! [`CurrentUser`] demands one and otherwise bounces the visitor to the login
//! form with `next` set to the page they wanted.

use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web};
use futures_util::future::LocalBoxFuture;
use tracing::debug;

use crate::domain::{Error, ErrorCode, User};
use crate::inbound::http::error::login_required;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// The signed-in user, if any.
#[derive(Debug, Clone)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    /// Borrow the user.
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

/// A signed-in user; anonymous requests are redirected to log in.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

fn state_of(req: &HttpRequest) -> Result<web::Data<HttpState>, Error> {
    req.app_data::<web::Data<HttpState>>()
        .cloned()
        .ok_or_else(|| Error::internal("HTTP state not configured"))
}

async fn resolve(session: SessionContext, state: web::Data<HttpState>) -> Result<Option<User>, Error> {
    let Some(id) = session.user_id()? else {
        return Ok(None);
    };
    match state.accounts.find_by_id(&id).await {
        Ok(user) => Ok(Some(user)),
        Err(err) if err.code() == ErrorCode::NotFound => {
            debug!(user_id = %id, "session refers to a deleted user");
            session.log_out();
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Resolve the viewer once per request and keep it in the request
/// extensions, where error pages pick it up.
async fn resolve_viewer(req: &HttpRequest) -> Result<Viewer, Error> {
    if let Some(viewer) = req.extensions().get::<Viewer>().cloned() {
        return Ok(viewer);
    }
    let session = SessionContext::from_http_request(req);
    let viewer = Viewer(resolve(session, state_of(req)?).await?);
    req.extensions_mut().insert(viewer.clone());
    Ok(viewer)
}

/// Path and query of `req`, used as the post-login destination.
pub fn requested_path(req: &HttpRequest) -> String {
    req.uri()
        .path_and_query()
        .map_or_else(|| req.path().to_owned(), |pq| pq.as_str().to_owned())
}

impl FromRequest for Viewer {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move { resolve_viewer(&req).await })
    }
}

impl FromRequest for CurrentUser {
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let req = req.clone();
        Box::pin(async move {
            resolve_viewer(&req)
                .await?
                .0
                .map(CurrentUser)
                .ok_or_else(|| login_required(&requested_path(&req)))
        })
    }
}

/// `next` if it is a local path, `/` otherwise.
///
/// # Examples
/// ```
/// use postboard::inbound::http::auth::safe_next;
///
/// assert_eq!(safe_next(Some("/follow/")), "/follow/");
/// assert_eq!(safe_next(Some("https://evil.example/")), "/");
/// assert_eq!(safe_next(Some("//evil.example/")), "/");
/// assert_eq!(safe_next(None), "/");
/// ```
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.contains('\\')
                && !path.chars().any(char::is_control) =>
        {
            path
        }
        _ => "/",
    }
}
