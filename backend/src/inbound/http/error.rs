//! HTTP mapping for domain errors.
//!
//! Failures surface as rendered error pages, except `Unauthorized`, which
//! sends the visitor to the login form with a `next` parameter pointing back
//! at the page they asked for.

use actix_web::dev::ServiceResponse;
use actix_web::http::{StatusCode, header};
use actix_web::middleware::{ErrorHandlerResponse, ErrorHandlers};
use actix_web::{HttpMessage, HttpRequest, HttpResponse, HttpResponseBuilder, ResponseError};
use serde_json::Value;
use tera::Context;
use tracing::error;

use crate::domain::{Error, ErrorCode, TRACE_ID_HEADER, User};
use crate::inbound::http::auth::Viewer;
use crate::inbound::http::templates::{self, page_context};

/// Login page visitors are sent to when a page needs a session.
pub const LOGIN_PATH: &str = "/auth/login/";

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest | ErrorCode::Conflict => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::FOUND,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn template_for(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "core/400.html",
        403 => "core/403.html",
        404 => "core/404.html",
        _ => "core/500.html",
    }
}

fn visible_message(error: &Error) -> Option<&str> {
    match error.code() {
        ErrorCode::InternalError | ErrorCode::ServiceUnavailable => None,
        _ => Some(error.message()),
    }
}

/// Login URL that returns to `next` after signing in.
///
/// # Examples
/// ```
/// use postboard::inbound::http::error::login_url;
///
/// assert_eq!(login_url("/create/"), "/auth/login/?next=%2Fcreate%2F");
/// ```
pub fn login_url(next: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(next.as_bytes()).collect();
    format!("{LOGIN_PATH}?next={encoded}")
}

/// Error asking the visitor to sign in before retrying `next`.
pub fn login_required(next: &str) -> Error {
    Error::unauthorized("login required").with_details(serde_json::json!({ "next": next }))
}

fn redirect_target(error: &Error) -> String {
    let next = error
        .details()
        .and_then(|details| details.get("next"))
        .and_then(Value::as_str)
        .unwrap_or("/");
    login_url(next)
}

fn error_page(status: StatusCode, error: &Error, viewer: Option<&User>) -> HttpResponse {
    let name = template_for(status);
    let mut context = page_context(viewer);
    context.insert("message", &visible_message(error));
    context.insert("trace_id", &error.trace_id());
    context.insert("path", &Option::<&str>::None);
    match templates::render(name, &context) {
        Ok(body) => templates::html_response(status, name, body),
        Err(render_error) => {
            error!(error = %render_error, "error page failed to render");
            HttpResponseBuilder::new(status)
                .content_type("text/plain; charset=utf-8")
                .body(status.canonical_reason().unwrap_or("error"))
        }
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        render_error(self, None)
    }
}

fn render_error(error: &Error, viewer: Option<&User>) -> HttpResponse {
    let status = error.status_code();
    let mut response = if error.code() == ErrorCode::Unauthorized {
        HttpResponse::Found()
            .insert_header((header::LOCATION, redirect_target(error)))
            .finish()
    } else {
        if status.is_server_error() && viewer.is_none() {
            error!(code = ?error.code(), message = error.message(), "request failed");
        }
        error_page(status, error, viewer)
    };
    if let Some(id) = error.trace_id() {
        if let Ok(value) = header::HeaderValue::from_str(id) {
            response
                .headers_mut()
                .insert(header::HeaderName::from_static(TRACE_ID_HEADER), value);
        }
    }
    response
}

/// Middleware giving error pages the signed-in navigation.
///
/// [`ResponseError::error_response`] cannot see the request, so pages built
/// from domain errors start out anonymous. When the request's extractors
/// resolved a signed-in [`Viewer`], the page is rendered again for them.
pub fn viewer_error_pages<B: 'static>() -> ErrorHandlers<B> {
    ErrorHandlers::new().default_handler(with_viewer)
}

fn with_viewer<B>(res: ServiceResponse<B>) -> actix_web::Result<ErrorHandlerResponse<B>> {
    let user = res
        .request()
        .extensions()
        .get::<Viewer>()
        .and_then(|viewer| viewer.0.clone());
    let error = res
        .response()
        .error()
        .and_then(|err| err.as_error::<Error>())
        .cloned();
    let (Some(user), Some(error)) = (user, error) else {
        return Ok(ErrorHandlerResponse::Response(res.map_into_left_body()));
    };
    let (req, _anonymous) = res.into_parts();
    let page = render_error(&error, Some(&user));
    Ok(ErrorHandlerResponse::Response(
        ServiceResponse::new(req, page).map_into_right_body(),
    ))
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Self::internal("Internal server error")
    }
}

/// Fallback for unmatched routes: 404 with the requested path.
pub async fn not_found(req: HttpRequest, viewer: Viewer) -> HttpResponse {
    let mut context: Context = page_context(viewer.user());
    context.insert("message", &Option::<&str>::None);
    context.insert("trace_id", &crate::domain::TraceId::current().map(|id| id.to_string()));
    context.insert("path", req.path());
    match templates::render_page(StatusCode::NOT_FOUND, "core/404.html", &context) {
        Ok(response) => response,
        Err(err) => err.error_response(),
    }
}

#[cfg(test)]
mod tests;
