//! Filesystem media store rooted at a capability directory.
//!
//! All paths are resolved relative to the configured media root through
//! `cap_std`, so a stored [`ImagePath`] can never escape it. Uploads are
//! staged under a hidden name and renamed into place once fully written.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{MediaStore, MediaStoreError};
use crate::domain::{ImagePath, ImageUpload, POST_IMAGE_DIR};

/// Media store writing post images below `<root>/posts/`.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: Arc<Dir>,
}

impl FsMediaStore {
    /// Open (creating if needed) the media root and its image directory.
    pub fn open(root: impl AsRef<Path>) -> io::Result<Self> {
        let root = root.as_ref();
        Dir::create_ambient_dir_all(root, ambient_authority())?;
        let dir = Dir::open_ambient_dir(root, ambient_authority())?;
        dir.create_dir_all(POST_IMAGE_DIR)?;
        Ok(Self {
            root: Arc::new(dir),
        })
    }

    async fn run<T, F>(&self, op: F) -> Result<T, MediaStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Dir) -> Result<T, MediaStoreError> + Send + 'static,
    {
        let root = Arc::clone(&self.root);
        tokio::task::spawn_blocking(move || op(&root))
            .await
            .map_err(|err| MediaStoreError::io(err.to_string()))?
    }
}

fn io_error(path: &str, error: &io::Error) -> MediaStoreError {
    if error.kind() == io::ErrorKind::NotFound {
        MediaStoreError::not_found(path)
    } else {
        MediaStoreError::io(format!("{path}: {error}"))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn save(&self, upload: &ImageUpload) -> Result<ImagePath, MediaStoreError> {
        let stem = Uuid::new_v4().simple().to_string();
        let path = ImagePath::for_upload(&stem, upload.format())
            .map_err(|err| MediaStoreError::io(err.to_string()))?;
        let bytes = upload.bytes().to_vec();
        let target = path.clone();
        self.run(move |dir| {
            let staged = format!("{POST_IMAGE_DIR}/.tmp-{}", target.file_name());
            dir.write(&staged, &bytes)
                .map_err(|err| io_error(&staged, &err))?;
            if let Err(err) = dir.rename(&staged, dir, target.as_str()) {
                let _cleanup = dir.remove_file(&staged);
                return Err(io_error(target.as_str(), &err));
            }
            Ok(())
        })
        .await?;
        debug!(path = %path, size = upload.bytes().len(), "stored image");
        Ok(path)
    }

    async fn open(&self, path: &ImagePath) -> Result<Vec<u8>, MediaStoreError> {
        let target = path.clone();
        self.run(move |dir| dir.read(target.as_str()).map_err(|err| io_error(target.as_str(), &err)))
            .await
    }

    async fn delete(&self, path: &ImagePath) -> Result<(), MediaStoreError> {
        let target = path.clone();
        self.run(move |dir| match dir.remove_file(target.as_str()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(io_error(target.as_str(), &err)),
        })
        .await
    }
}
