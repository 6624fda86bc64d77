//! Cache-control policies shared by handlers.

use actix_web::http::header::{CACHE_CONTROL, HeaderName};

/// Uploaded images never change once stored; each upload gets a fresh name.
pub const MEDIA_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Probe answers must always reach the orchestrator fresh.
pub const NO_STORE: &str = "no-store";

/// Header tuple for stored media.
pub const fn media_header() -> (HeaderName, &'static str) {
    (CACHE_CONTROL, MEDIA_IMMUTABLE)
}

/// Header tuple for health probes.
pub const fn no_store_header() -> (HeaderName, &'static str) {
    (CACHE_CONTROL, NO_STORE)
}
