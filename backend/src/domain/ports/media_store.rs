//! Port for storing uploaded post images.
use async_trait::async_trait;

use crate::domain::{ImagePath, ImageUpload};

use super::define_port_error;

define_port_error! {
    /// Errors raised by media storage adapters.
    pub enum MediaStoreError {
        /// The file does not exist.
        NotFound { path: String } => "media file {path} not found",
        /// Reading or writing failed.
        Io { message: String } => "media storage failed: {message}",
    }
}

/// Port for the media directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaStore: Send + Sync {
    /// Persist an upload under a fresh unique name.
    async fn save(&self, upload: &ImageUpload) -> Result<ImagePath, MediaStoreError>;

    /// Read a stored file.
    async fn open(&self, path: &ImagePath) -> Result<Vec<u8>, MediaStoreError>;

    /// Remove a stored file; missing files are ignored.
    async fn delete(&self, path: &ImagePath) -> Result<(), MediaStoreError>;
}
