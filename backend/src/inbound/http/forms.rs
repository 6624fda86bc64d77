//! HTML form parsing and per-field validation.
//!
//! Invalid submissions never turn into error statuses: handlers re-render the
//! form with the submitted values and a [`FormErrors`] map keyed by field
//! name. Errors not tied to a field live under [`NON_FIELD`].

use std::collections::BTreeMap;

use actix_multipart::Multipart;
use actix_web::http::header::{self, HeaderMap};
use actix_web::web;
use futures_util::{StreamExt as _, TryStreamExt as _};
use serde::Serialize;

use crate::domain::{
    CommentText, Error, GroupId, IMAGE_MAX_BYTES, ImageChange, ImageUpload, Post, PostDraft,
    PostText,
};

/// Key for errors that belong to the form as a whole.
pub const NON_FIELD: &str = "__all__";

/// Largest accepted url-encoded body.
const FORM_BODY_LIMIT: usize = 64 * 1024;

/// Message shown when a group id does not match any group.
pub const INVALID_GROUP: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Validation messages keyed by field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    /// Record `message` against `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(message.into());
    }

    /// Single-error map.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    /// Whether no field failed.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for `field`.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map_or(&[], Vec::as_slice)
    }

    /// Turn a service error naming a form field into a form error.
    ///
    /// Errors without a field are handed back unchanged.
    pub fn from_service_error(error: Error) -> Result<Self, Error> {
        match error.field() {
            Some(field) => Ok(Self::single(field, capitalise(error.message()))),
            None => Err(error),
        }
    }
}

pub(crate) fn capitalise(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        let mut text: String = first.to_uppercase().collect();
        text.push_str(chars.as_str());
        if !text.ends_with('.') {
            text.push('.');
        }
        text
    })
}

/// Submitted text fields of a form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormFields(BTreeMap<String, String>);

impl FormFields {
    /// Parse an `application/x-www-form-urlencoded` body.
    ///
    /// Later duplicates win.
    ///
    /// # Examples
    /// ```
    /// use postboard::inbound::http::forms::FormFields;
    ///
    /// let fields = FormFields::parse_urlencoded(b"text=Hello+world&group=");
    /// assert_eq!(fields.get("text"), "Hello world");
    /// assert_eq!(fields.get("group"), "");
    /// assert_eq!(fields.get("missing"), "");
    /// ```
    pub fn parse_urlencoded(body: &[u8]) -> Self {
        Self(
            url::form_urlencoded::parse(body)
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect(),
        )
    }

    /// Fields named `names`, all empty.
    pub fn blank(names: &[&str]) -> Self {
        Self(
            names
                .iter()
                .map(|name| ((*name).to_owned(), String::new()))
                .collect(),
        )
    }

    /// Copy of these fields with `names` present, missing ones empty.
    pub fn with_defaults(mut self, names: &[&str]) -> Self {
        for name in names {
            self.0.entry((*name).to_owned()).or_default();
        }
        self
    }

    /// Value of `name`, or the empty string.
    pub fn get(&self, name: &str) -> &str {
        self.0.get(name).map_or("", String::as_str)
    }

    /// Set `name` to `value`.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        self.0.insert(name.to_owned(), value.into());
    }

    /// Whether a checkbox-like field was ticked.
    pub fn is_checked(&self, name: &str) -> bool {
        matches!(self.get(name), "on" | "true" | "1")
    }
}

/// Read a url-encoded form body.
pub async fn read_urlencoded(mut payload: web::Payload) -> Result<FormFields, Error> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|err| Error::invalid_request(format!("unreadable form: {err}")))?;
        if body.len() + chunk.len() > FORM_BODY_LIMIT {
            return Err(Error::invalid_request("form body too large"));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(FormFields::parse_urlencoded(&body))
}

/// A file part of a multipart form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilePart {
    /// Client-supplied file name.
    pub file_name: String,
    /// Contents, truncated one byte past the upload limit.
    pub bytes: Vec<u8>,
}

/// Text fields plus the optional `image` file of a post form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PostForm {
    /// Text inputs.
    pub fields: FormFields,
    /// Uploaded image, if a non-empty one was sent.
    pub image: Option<FilePart>,
}

fn is_multipart(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"))
}

impl PostForm {
    /// Form pre-filled from an existing post.
    pub fn from_post(post: &Post) -> Self {
        let mut fields = FormFields::default();
        fields.set("text", post.text());
        fields.set(
            "group",
            post.group().map(|group| group.id().to_string()).unwrap_or_default(),
        );
        Self {
            fields,
            image: None,
        }
    }

    /// Read either a multipart or a url-encoded post form.
    pub async fn read(headers: &HeaderMap, payload: web::Payload) -> Result<Self, Error> {
        if is_multipart(headers) {
            Self::read_multipart(Multipart::new(headers, payload)).await
        } else {
            Ok(Self {
                fields: read_urlencoded(payload).await?,
                image: None,
            })
        }
    }

    async fn read_multipart(mut multipart: Multipart) -> Result<Self, Error> {
        let malformed = |err: actix_multipart::MultipartError| {
            Error::invalid_request(format!("malformed multipart form: {err}"))
        };
        let mut form = Self::default();
        while let Some(mut field) = multipart.try_next().await.map_err(malformed)? {
            let name = field.name().unwrap_or_default().to_owned();
            let file_name = field
                .content_disposition()
                .and_then(|cd| cd.get_filename())
                .map(ToOwned::to_owned);
            let mut bytes = Vec::new();
            while let Some(chunk) = field.try_next().await.map_err(malformed)? {
                let room = (IMAGE_MAX_BYTES + 1).saturating_sub(bytes.len());
                bytes.extend_from_slice(chunk.get(..room.min(chunk.len())).unwrap_or_default());
            }
            match file_name {
                Some(file_name) if name == "image" => {
                    if !bytes.is_empty() {
                        form.image = Some(FilePart { file_name, bytes });
                    }
                }
                Some(_) => {}
                None => form.fields.set(&name, String::from_utf8_lossy(&bytes)),
            }
        }
        Ok(form)
    }

    /// Validate every field into a draft.
    pub fn validate(&self) -> Result<PostDraft, FormErrors> {
        let mut errors = FormErrors::default();
        let text = PostText::new(self.fields.get("text"))
            .map_err(|err| errors.add("text", capitalise(&err.to_string())))
            .ok();
        let raw_group = self.fields.get("group").trim();
        let group = if raw_group.is_empty() {
            Some(None)
        } else {
            GroupId::parse(raw_group)
                .map(Some)
                .map_err(|_| errors.add("group", INVALID_GROUP))
                .ok()
        };
        let image = match &self.image {
            Some(part) => ImageUpload::new(part.file_name.clone(), part.bytes.clone())
                .map(ImageChange::Replace)
                .map_err(|err| errors.add("image", capitalise(&err.to_string())))
                .ok(),
            None if self.fields.is_checked("image-clear") => Some(ImageChange::Clear),
            None => Some(ImageChange::Keep),
        };
        match (text, group, image) {
            (Some(text), Some(group), Some(image)) if errors.is_empty() => {
                Ok(PostDraft { text, group, image })
            }
            _ => Err(errors),
        }
    }
}

/// Validate a comment body.
pub fn validate_comment(fields: &FormFields) -> Result<CommentText, FormErrors> {
    CommentText::new(fields.get("text"))
        .map_err(|err| FormErrors::single("text", capitalise(&err.to_string())))
}

/// Context value rendering a form: submitted values plus errors.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FormView {
    /// Values to put back into the inputs.
    pub values: FormFields,
    /// Validation messages.
    pub errors: FormErrors,
}

impl FormView {
    /// View of `values` with `errors`.
    pub fn new(values: FormFields, errors: FormErrors) -> Self {
        Self { values, errors }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::domain::TINY_GIF as GIF;

    fn form(text: &str, group: &str) -> PostForm {
        let mut fields = FormFields::default();
        fields.set("text", text);
        fields.set("group", group);
        PostForm {
            fields,
            image: None,
        }
    }

    #[rstest]
    fn valid_forms_become_drafts() {
        let draft = form("Hello", "3").validate().expect("valid form");
        assert_eq!(draft.text.as_str(), "Hello");
        assert_eq!(draft.group.map(GroupId::get), Some(3));
        assert_eq!(draft.image, ImageChange::Keep);
    }

    #[rstest]
    #[case("", "", "text")]
    #[case("   ", "", "text")]
    #[case("Hello", "cats", "group")]
    #[case("Hello", "-1", "group")]
    fn invalid_fields_are_reported(#[case] text: &str, #[case] group: &str, #[case] field: &str) {
        let errors = form(text, group).validate().expect_err("invalid form");
        assert!(!errors.get(field).is_empty(), "{field} not flagged: {errors:?}");
    }

    #[rstest]
    fn overly_long_text_is_rejected() {
        let errors = form(&"x".repeat(2001), "").validate().expect_err("too long");
        assert_eq!(errors.get("text").len(), 1);
    }

    #[rstest]
    fn images_must_decode() {
        let mut valid = form("Hello", "");
        valid.image = Some(FilePart {
            file_name: "small.gif".to_owned(),
            bytes: GIF.to_vec(),
        });
        assert!(matches!(
            valid.validate().expect("gif accepted").image,
            ImageChange::Replace(_)
        ));

        let mut invalid = form("Hello", "");
        invalid.image = Some(FilePart {
            file_name: "notes.gif".to_owned(),
            bytes: b"GIF89a<script>alert(1)</script>".to_vec(),
        });
        let errors = invalid.validate().expect_err("markup rejected");
        assert_eq!(errors.get("image").len(), 1);
    }

    #[rstest]
    fn clearing_the_image_is_explicit() {
        let mut cleared = form("Hello", "");
        cleared.fields.set("image-clear", "on");
        assert_eq!(cleared.validate().expect("valid").image, ImageChange::Clear);
    }

    #[rstest]
    fn service_errors_with_fields_become_form_errors() {
        let error = Error::invalid_request("select a valid choice")
            .with_details(serde_json::json!({ "field": "group" }));
        let errors = FormErrors::from_service_error(error).expect("field error");
        assert_eq!(errors.get("group"), ["Select a valid choice."]);

        let unrelated = Error::internal("boom");
        assert!(FormErrors::from_service_error(unrelated).is_err());
    }

    #[rstest]
    fn comments_must_not_be_blank() {
        let fields = FormFields::parse_urlencoded(b"text=+");
        assert!(validate_comment(&fields).is_err());
        let fields = FormFields::parse_urlencoded(b"text=Nice+post");
        assert_eq!(validate_comment(&fields).expect("valid").as_str(), "Nice post");
    }
}
