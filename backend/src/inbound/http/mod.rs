//! HTTP inbound adapter rendering the board's HTML pages.

pub mod about;
pub mod auth;
pub mod cache_control;
pub mod error;
pub mod forms;
pub mod health;
pub mod media;
pub mod posts;
pub mod session;
pub mod session_config;
pub mod state;
pub mod templates;
#[cfg(test)]
pub mod test_utils;
pub mod users;

use actix_web::web;

pub use crate::domain::ApiResult;

/// Register every page and the 404 fallback on `cfg`.
///
/// Callers add [`state::HttpState`] as app data and wrap the app in session
/// middleware.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(posts::configure)
        .configure(users::configure)
        .configure(about::configure)
        .service(media::media_file)
        .default_service(web::to(error::not_found));
}
