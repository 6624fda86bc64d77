//! Key type for cached rendered pages.
use thiserror::Error;

use crate::domain::UserId;

/// Identifies one rendered page for one audience.
///
/// The key combines the request path and query with the viewer, so guests and
/// each signed-in user get separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageCacheKey(String);

impl PageCacheKey {
    /// Construct a key from a raw string after validating that it is non-empty
    /// and trimmed.
    pub fn new(value: impl Into<String>) -> Result<Self, PageCacheKeyValidationError> {
        let raw = value.into();
        if raw.trim().is_empty() {
            return Err(PageCacheKeyValidationError::Empty);
        }
        if raw.trim() != raw {
            return Err(PageCacheKeyValidationError::ContainsWhitespace);
        }
        Ok(Self(raw))
    }

    /// Key for `path_and_query` as seen by `viewer`.
    ///
    /// # Examples
    /// ```
    /// use postboard::domain::ports::PageCacheKey;
    ///
    /// let key = PageCacheKey::for_page("/?page=2", None).unwrap();
    /// assert_eq!(key.as_str(), "page:anonymous:/?page=2");
    /// ```
    pub fn for_page(
        path_and_query: &str,
        viewer: Option<&UserId>,
    ) -> Result<Self, PageCacheKeyValidationError> {
        let audience = viewer.map_or_else(|| "anonymous".to_owned(), ToString::to_string);
        Self::new(format!("page:{audience}:{path_and_query}"))
    }

    /// Borrow the underlying key as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for PageCacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for PageCacheKey {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Validation errors returned when constructing [`PageCacheKey`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PageCacheKeyValidationError {
    /// Key is empty after trimming whitespace.
    #[error("page cache key must not be empty")]
    Empty,
    /// Key contains leading or trailing whitespace.
    #[error("page cache key must not contain surrounding whitespace")]
    ContainsWhitespace,
}

#[cfg(test)]
mod tests {
    //! Validates cache key parsing and audience separation.
    use super::{PageCacheKey, PageCacheKeyValidationError};
    use crate::domain::UserId;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn cache_key_rejects_blank(#[case] value: &str) {
        let err = PageCacheKey::new(value).expect_err("blank keys rejected");
        assert_eq!(err, PageCacheKeyValidationError::Empty);
    }

    #[rstest]
    #[case(" leading")]
    #[case("trailing ")]
    fn cache_key_rejects_whitespace_padding(#[case] value: &str) {
        let err = PageCacheKey::new(value).expect_err("padded key rejected");
        assert_eq!(err, PageCacheKeyValidationError::ContainsWhitespace);
    }

    #[rstest]
    fn viewers_get_distinct_keys() {
        let viewer = UserId::random();
        let guest = PageCacheKey::for_page("/", None).expect("guest key");
        let member = PageCacheKey::for_page("/", Some(&viewer)).expect("member key");
        assert_ne!(guest, member);
        assert_eq!(member.to_string(), format!("page:{viewer}:/"));
    }
}
