//! Static "about" pages.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, web};

use crate::domain::ApiResult;
use crate::inbound::http::auth::Viewer;
use crate::inbound::http::templates::{page_context, render_page};

/// Who runs the board.
#[get("/about/author/")]
pub async fn author(viewer: Viewer) -> ApiResult<HttpResponse> {
    render_page(StatusCode::OK, "about/author.html", &page_context(viewer.user()))
}

/// What the board is built with.
#[get("/about/tech/")]
pub async fn tech(viewer: Viewer) -> ApiResult<HttpResponse> {
    render_page(StatusCode::OK, "about/tech.html", &page_context(viewer.user()))
}

/// Register the about pages on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(author).service(tech);
}
