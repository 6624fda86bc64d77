//! Serves uploaded post images from the media store.
//!
//! ```text
//! GET /media/posts/3f2c9a.png
//! ```

use actix_web::{HttpResponse, get, web};
use tracing::debug;

use crate::domain::{ApiResult, Error, ImagePath};
use crate::inbound::http::cache_control::media_header;
use crate::inbound::http::state::HttpState;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Stream a stored image; anything outside the image directory is a 404.
#[get("/media/{path:.*}")]
pub async fn media_file(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let raw = path.into_inner();
    let image = ImagePath::new(raw.as_str()).map_err(|err| {
        debug!(path = %raw, error = %err, "rejected media path");
        Error::not_found(format!("media file {raw} not found"))
    })?;
    let bytes = state.media.open(&image).await?;
    let content_type = image.format().map_or(FALLBACK_CONTENT_TYPE, |format| format.mime());
    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header(media_header())
        .body(bytes))
}
