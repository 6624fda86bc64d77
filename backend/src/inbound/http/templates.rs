//! HTML rendering through Tera.
//!
//! Templates are compiled into the binary and parsed once on first use. Every
//! rendered response records the template it used as a
//! [`RenderedTemplate`] response extension.

use std::sync::LazyLock;

use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, HttpResponseBuilder};
use tera::{Context, Tera};
use tracing::error;

use crate::domain::{Error, User};

macro_rules! embedded_templates {
    ($($name:literal),+ $(,)?) => {
        [$(($name, include_str!(concat!("../../../templates/", $name)))),+]
    };
}

const SOURCES: [(&str, &str); 19] = embedded_templates![
    "base.html",
    "includes/paginator.html",
    "includes/post_card.html",
    "includes/field_errors.html",
    "posts/index.html",
    "posts/group_list.html",
    "posts/profile.html",
    "posts/post_detail.html",
    "posts/post_create.html",
    "posts/follow.html",
    "users/signup.html",
    "users/login.html",
    "users/logged_out.html",
    "about/author.html",
    "about/tech.html",
    "core/400.html",
    "core/403.html",
    "core/404.html",
    "core/500.html",
];

static ENGINE: LazyLock<Result<Tera, String>> = LazyLock::new(|| {
    let mut tera = Tera::default();
    tera.add_raw_templates(SOURCES)
        .map(|()| tera)
        .map_err(|err| format!("{err:?}"))
});

/// Template name attached to a rendered response.
///
/// # Examples
/// ```
/// use actix_web::http::StatusCode;
/// use postboard::inbound::http::templates::{RenderedTemplate, page_context, render_page};
///
/// let response = render_page(StatusCode::OK, "about/tech.html", &page_context(None)).unwrap();
/// assert_eq!(
///     response.extensions().get::<RenderedTemplate>(),
///     Some(&RenderedTemplate("about/tech.html"))
/// );
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderedTemplate(pub &'static str);

fn engine() -> Result<&'static Tera, Error> {
    ENGINE.as_ref().map_err(|message| {
        error!(%message, "templates failed to compile");
        Error::internal("templates unavailable")
    })
}

/// Render `name` with `context` into a string.
pub fn render(name: &'static str, context: &Context) -> Result<String, Error> {
    engine()?.render(name, context).map_err(|err| {
        error!(template = name, error = ?err, "template rendering failed");
        Error::internal(format!("failed to render {name}"))
    })
}

/// Wrap an already rendered body as an HTML response.
pub fn html_response(status: StatusCode, name: &'static str, body: String) -> HttpResponse {
    let mut response = HttpResponseBuilder::new(status)
        .content_type(ContentType::html())
        .body(body);
    response.extensions_mut().insert(RenderedTemplate(name));
    response
}

/// Render `name` and wrap it as an HTML response.
pub fn render_page(
    status: StatusCode,
    name: &'static str,
    context: &Context,
) -> Result<HttpResponse, Error> {
    let body = render(name, context)?;
    Ok(html_response(status, name, body))
}

/// Context every page starts from: the signed-in user, if any.
pub fn page_context(viewer: Option<&User>) -> Context {
    let mut context = Context::new();
    context.insert("viewer", &viewer);
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn every_template_compiles() {
        let tera = engine().expect("templates compile");
        for (name, _) in SOURCES {
            assert!(
                tera.get_template_names().any(|known| known == name),
                "{name} missing"
            );
        }
    }

    #[rstest]
    #[case("about/author.html")]
    #[case("about/tech.html")]
    #[case("users/logged_out.html")]
    fn static_pages_render_for_guests(#[case] name: &'static str) {
        let response =
            render_page(StatusCode::OK, name, &page_context(None)).expect("page renders");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.extensions().get::<RenderedTemplate>(),
            Some(&RenderedTemplate(name))
        );
    }

    #[rstest]
    fn unknown_templates_are_internal_errors() {
        let err = render("missing.html", &Context::new()).expect_err("unknown template");
        assert_eq!(err.code(), crate::domain::ErrorCode::InternalError);
    }
}
