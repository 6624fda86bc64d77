//! Uploaded post illustrations.
//!
//! Uploads are accepted only when their bytes decode as a supported raster
//! format; the client-supplied file name and content type are never trusted
//! for that decision.

use std::fmt;

use serde::Serialize;
use tracing::debug;

/// Largest accepted upload in bytes (5 MiB).
pub const IMAGE_MAX_BYTES: usize = 5 * 1024 * 1024;

/// Directory, relative to the media root, that holds post images.
pub const POST_IMAGE_DIR: &str = "posts";

/// Reasons an upload or stored path is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageValidationError {
    /// The upload contained no bytes.
    #[error("the submitted file is empty")]
    Empty,
    /// The upload exceeded [`IMAGE_MAX_BYTES`].
    #[error("image must be at most {max} bytes")]
    TooLarge {
        /// Maximum number of bytes.
        max: usize,
    },
    /// The bytes did not decode as a supported image.
    #[error("upload a valid image; the file you uploaded was either not an image or a corrupted image")]
    UnsupportedFormat,
    /// A stored path escaped the media directory or had an odd shape.
    #[error("invalid media path")]
    InvalidPath,
}

/// Supported image encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    /// Graphics Interchange Format.
    Gif,
    /// Portable Network Graphics.
    Png,
    /// JPEG/JFIF.
    Jpeg,
    /// WebP inside a RIFF container.
    Webp,
}

impl ImageFormat {
    /// Identify the format from the file's signature and decode it in full.
    ///
    /// Anything the decoder rejects, including a valid signature followed by
    /// garbage, is reported as [`ImageValidationError::UnsupportedFormat`].
    ///
    /// # Examples
    /// ```
    /// use postboard::domain::{ImageFormat, ImageValidationError};
    ///
    /// assert_eq!(
    ///     ImageFormat::detect(b"GIF89a<script>alert(1)</script>"),
    ///     Err(ImageValidationError::UnsupportedFormat)
    /// );
    /// ```
    pub fn detect(bytes: &[u8]) -> Result<Self, ImageValidationError> {
        let codec = image::guess_format(bytes)
            .map_err(|_| ImageValidationError::UnsupportedFormat)?;
        let format = Self::from_codec(codec).ok_or(ImageValidationError::UnsupportedFormat)?;
        image::load_from_memory_with_format(bytes, codec).map_err(|err| {
            debug!(error = %err, ?format, "upload failed to decode");
            ImageValidationError::UnsupportedFormat
        })?;
        Ok(format)
    }

    fn from_codec(codec: image::ImageFormat) -> Option<Self> {
        match codec {
            image::ImageFormat::Gif => Some(Self::Gif),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::WebP => Some(Self::Webp),
            _ => None,
        }
    }

    fn codec(self) -> image::ImageFormat {
        match self {
            Self::Gif => image::ImageFormat::Gif,
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Webp => image::ImageFormat::WebP,
        }
    }

    /// Extension used for stored files.
    pub fn extension(self) -> &'static str {
        self.codec()
            .extensions_str()
            .first()
            .copied()
            .unwrap_or_default()
    }

    /// Recover the format from a stored extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        image::ImageFormat::from_extension(ext).and_then(Self::from_codec)
    }

    /// MIME type served for this format.
    pub fn mime(self) -> &'static str {
        self.codec().to_mime_type()
    }
}

/// Smallest decodable GIF: one transparent pixel.
#[cfg(test)]
pub(crate) const TINY_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x80\x00\x00\x00\x00\x00\xff\xff\xff!\xf9\x04\x01\x00\x00\x00\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02D\x01\x00;";

/// A validated image upload awaiting storage.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageUpload {
    file_name: String,
    format: ImageFormat,
    bytes: Vec<u8>,
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("format", &self.format)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl ImageUpload {
    /// Validate the raw upload.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Result<Self, ImageValidationError> {
        if bytes.is_empty() {
            return Err(ImageValidationError::Empty);
        }
        if bytes.len() > IMAGE_MAX_BYTES {
            return Err(ImageValidationError::TooLarge {
                max: IMAGE_MAX_BYTES,
            });
        }
        let format = ImageFormat::detect(&bytes)?;
        Ok(Self {
            file_name: file_name.into(),
            format,
            bytes,
        })
    }

    /// File name supplied by the client, for logging only.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Detected format.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// File contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Path of a stored image relative to the media root, e.g. `posts/<uuid>.png`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ImagePath(String);

impl ImagePath {
    /// Validate a stored relative path.
    ///
    /// Only single-level paths below [`POST_IMAGE_DIR`] with a known image
    /// extension are accepted.
    pub fn new(raw: impl Into<String>) -> Result<Self, ImageValidationError> {
        let raw = raw.into();
        let Some(name) = raw
            .strip_prefix(POST_IMAGE_DIR)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Err(ImageValidationError::InvalidPath);
        };
        let valid_name = !name.is_empty()
            && !name.starts_with('.')
            && name
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.'));
        if !valid_name || name.contains("..") {
            return Err(ImageValidationError::InvalidPath);
        }
        if ImagePath::extension_of(name).and_then(ImageFormat::from_extension).is_none() {
            return Err(ImageValidationError::InvalidPath);
        }
        Ok(Self(raw))
    }

    /// Build the path for a freshly stored upload.
    pub fn for_upload(stem: &str, format: ImageFormat) -> Result<Self, ImageValidationError> {
        Self::new(format!("{POST_IMAGE_DIR}/{stem}.{}", format.extension()))
    }

    /// Borrow the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name below [`POST_IMAGE_DIR`].
    pub fn file_name(&self) -> &str {
        self.0
            .rsplit_once('/')
            .map_or(self.0.as_str(), |(_, name)| name)
    }

    /// Format implied by the extension.
    pub fn format(&self) -> Option<ImageFormat> {
        Self::extension_of(self.file_name()).and_then(ImageFormat::from_extension)
    }

    fn extension_of(name: &str) -> Option<&str> {
        name.rsplit_once('.').map(|(_, ext)| ext)
    }
}

impl AsRef<str> for ImagePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImagePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
