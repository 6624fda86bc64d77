//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use actix_web::http::StatusCode;
use rstest::{fixture, rstest};
use serde_json::json;

use crate::inbound::http::templates::RenderedTemplate;

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn internal_error() -> Error {
    Error::internal("connection string postgres://secret@db")
        .with_trace_id(TRACE_ID)
        .with_details(json!({ "secret": "x" }))
}

async fn body_text(response: HttpResponse) -> String {
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST, "core/400.html")]
#[case(Error::conflict("taken"), StatusCode::BAD_REQUEST, "core/400.html")]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN, "core/403.html")]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND, "core/404.html")]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE, "core/500.html")]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR, "core/500.html")]
fn errors_render_matching_pages(
    #[case] error: Error,
    #[case] status: StatusCode,
    #[case] template: &'static str,
) {
    let response = error.error_response();
    assert_eq!(response.status(), status);
    assert_eq!(
        response.extensions().get::<RenderedTemplate>(),
        Some(&RenderedTemplate(template))
    );
}

#[rstest]
#[actix_web::test]
async fn internal_details_are_redacted(internal_error: Error) {
    let response = internal_error.error_response();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .expect("trace id header")
        .to_str()
        .expect("ascii header")
        .to_owned();
    assert_eq!(header, TRACE_ID);

    let body = body_text(response).await;
    assert!(!body.contains("postgres://"));
    assert!(body.contains(TRACE_ID));
}

#[rstest]
#[actix_web::test]
async fn client_errors_show_their_message() {
    let body = body_text(Error::forbidden("only the author may edit").error_response()).await;
    assert!(body.contains("only the author may edit"));
}

#[rstest]
fn unauthorized_redirects_to_login_with_next() {
    let response = login_required("/posts/3/edit/").error_response();
    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/auth/login/?next=%2Fposts%2F3%2Fedit%2F")
    );
}

#[rstest]
fn unauthorized_without_next_returns_home_after_login() {
    let response = Error::unauthorized("login required").error_response();
    assert_eq!(
        response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok()),
        Some("/auth/login/?next=%2F")
    );
}

#[rstest]
#[case("/", "/auth/login/?next=%2F")]
#[case("/follow/?page=2", "/auth/login/?next=%2Ffollow%2F%3Fpage%3D2")]
fn login_urls_encode_next(#[case] next: &str, #[case] expected: &str) {
    assert_eq!(login_url(next), expected);
}

#[actix_web::test]
async fn unknown_paths_render_not_found_page() {
    let req = actix_web::test::TestRequest::get()
        .uri("/unexisting_page/")
        .to_http_request();
    let response = not_found(req, Viewer(None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.extensions().get::<RenderedTemplate>(),
        Some(&RenderedTemplate("core/404.html"))
    );
    assert!(body_text(response).await.contains("unexisting_page"));
}
