//! Account pages.
//!
//! ```text
//! GET/POST /auth/signup/
//! GET/POST /auth/login/?next=/follow/
//! GET      /auth/logout/
//! ```

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, get, post, web};
use serde::Deserialize;
use tera::Context;
use tracing::info;

use crate::domain::{
    ApiResult, ErrorCode, LoginCredentials, LoginValidationError, SignupInput, SignupRequest,
};
use crate::inbound::http::auth::{Viewer, safe_next};
use crate::inbound::http::forms::{
    FormErrors, FormFields, FormView, NON_FIELD, capitalise, read_urlencoded,
};
use crate::inbound::http::posts::redirect;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::templates::{page_context, render_page};

const SIGNUP_FIELDS: [&str; 4] = ["username", "first_name", "last_name", "email"];
const LOGIN_FIELDS: [&str; 1] = ["username"];
const BAD_CREDENTIALS: &str = "Please enter a correct username and password. \
Note that both fields may be case-sensitive.";
const USERNAME_TAKEN: &str = "A user with that username already exists.";

/// `?next=` query parameter of the login page.
#[derive(Debug, Default, Deserialize)]
pub struct NextQuery {
    next: Option<String>,
}

fn form_page(
    template: &'static str,
    viewer: &Viewer,
    form: &FormView,
    extra: impl FnOnce(&mut Context),
) -> ApiResult<HttpResponse> {
    let mut context = page_context(viewer.user());
    context.insert("form", form);
    extra(&mut context);
    render_page(StatusCode::OK, template, &context)
}

/// Visible values of a submitted form; passwords are never echoed.
fn echo(fields: &FormFields, names: &[&str]) -> FormFields {
    let mut echoed = FormFields::blank(names);
    for name in names {
        echoed.set(name, fields.get(name));
    }
    echoed
}

/// Empty signup form.
#[get("/auth/signup/")]
pub async fn signup_form(viewer: Viewer) -> ApiResult<HttpResponse> {
    let form = FormView::new(FormFields::blank(&SIGNUP_FIELDS), FormErrors::default());
    form_page("users/signup.html", &viewer, &form, |_| {})
}

/// Register, sign in and go to the front page.
#[post("/auth/signup/")]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    viewer: Viewer,
    payload: web::Payload,
) -> ApiResult<HttpResponse> {
    let fields = read_urlencoded(payload).await?;
    let input = SignupInput {
        username: fields.get("username"),
        first_name: fields.get("first_name"),
        last_name: fields.get("last_name"),
        email: fields.get("email"),
        password1: fields.get("password1"),
        password2: fields.get("password2"),
    };
    let errors = match SignupRequest::try_from_input(&input) {
        Ok(request) => match state.accounts.signup(&request).await {
            Ok(user) => {
                session.persist_user(user.id())?;
                return Ok(redirect("/"));
            }
            Err(err) if err.code() == ErrorCode::Conflict => {
                FormErrors::single("username", USERNAME_TAKEN)
            }
            Err(err) => return Err(err),
        },
        Err(err) => {
            FormErrors::single(err.field(), capitalise(&err.to_string()))
        }
    };
    let form = FormView::new(echo(&fields, &SIGNUP_FIELDS), errors);
    form_page("users/signup.html", &viewer, &form, |_| {})
}

/// Login form, remembering where to go afterwards.
#[get("/auth/login/")]
pub async fn login_form(viewer: Viewer, query: web::Query<NextQuery>) -> ApiResult<HttpResponse> {
    let next = safe_next(query.next.as_deref()).to_owned();
    let form = FormView::new(FormFields::blank(&LOGIN_FIELDS), FormErrors::default());
    form_page("users/login.html", &viewer, &form, |context| {
        context.insert("next", &next);
    })
}

/// Check credentials; on success sign in and follow `next`.
#[post("/auth/login/")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    viewer: Viewer,
    payload: web::Payload,
) -> ApiResult<HttpResponse> {
    let fields = read_urlencoded(payload).await?;
    let next = safe_next(Some(fields.get("next"))).to_owned();
    let errors = match LoginCredentials::try_from_parts(fields.get("username"), fields.get("password"))
    {
        Ok(credentials) => match state.accounts.authenticate(&credentials).await {
            Ok(user_id) => {
                session.persist_user(&user_id)?;
                info!(%user_id, "user logged in");
                return Ok(redirect(&next));
            }
            Err(err) if err.code() == ErrorCode::Unauthorized => {
                FormErrors::single(NON_FIELD, BAD_CREDENTIALS)
            }
            Err(err) => return Err(err),
        },
        Err(LoginValidationError::EmptyUsername) => {
            FormErrors::single("username", "This field is required.")
        }
        Err(LoginValidationError::EmptyPassword) => {
            FormErrors::single("password", "This field is required.")
        }
    };
    let form = FormView::new(echo(&fields, &LOGIN_FIELDS), errors);
    form_page("users/login.html", &viewer, &form, |context| {
        context.insert("next", &next);
    })
}

/// End the session.
#[get("/auth/logout/")]
pub async fn logout(session: SessionContext) -> ApiResult<HttpResponse> {
    session.log_out();
    render_page(StatusCode::OK, "users/logged_out.html", &page_context(None))
}

/// Register every account page on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(signup_form)
        .service(signup)
        .service(login_form)
        .service(login)
        .service(logout);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header;
    use actix_web::{App, test};
    use rstest::rstest;

    use crate::inbound::http::templates::RenderedTemplate;
    use crate::inbound::http::test_utils::{memory_state, session_cookie, test_session_middleware};

    macro_rules! users_app {
        ($state:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($state))
                    .wrap(test_session_middleware())
                    .configure(configure),
            )
            .await
        };
    }

    fn form_post(uri: &str, body: &str) -> test::TestRequest {
        test::TestRequest::post()
            .uri(uri)
            .insert_header((header::CONTENT_TYPE, "application/x-www-form-urlencoded"))
            .set_payload(body.to_owned())
    }

    fn location<B>(res: &actix_web::dev::ServiceResponse<B>) -> Option<String> {
        res.headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(ToOwned::to_owned)
    }

    #[rstest]
    #[case("/auth/signup/", "users/signup.html")]
    #[case("/auth/login/", "users/login.html")]
    #[case("/auth/logout/", "users/logged_out.html")]
    #[actix_web::test]
    async fn account_pages_render(#[case] uri: &str, #[case] template: &'static str) {
        let (_media, _store, state) = memory_state();
        let app = users_app!(state);
        let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.response().extensions().get::<RenderedTemplate>(),
            Some(&RenderedTemplate(template))
        );
    }

    #[actix_web::test]
    async fn signup_signs_in_and_redirects_home() {
        let (_media, _store, state) = memory_state();
        let accounts = state.accounts.clone();
        let app = users_app!(state);
        let res = test::call_service(
            &app,
            form_post(
                "/auth/signup/",
                "username=reader&first_name=Ann&password1=Sup3rSecret&password2=Sup3rSecret",
            )
            .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(location(&res).as_deref(), Some("/"));
        assert!(session_cookie(&res).is_some());
        let user = accounts.find_by_username("reader").await.expect("stored");
        assert_eq!(user.profile().first_name(), "Ann");
    }

    #[actix_web::test]
    async fn signup_errors_rerender_the_form() {
        let (_media, _store, state) = memory_state();
        let app = users_app!(state);
        let res = test::call_service(
            &app,
            form_post(
                "/auth/signup/",
                "username=reader&password1=Sup3rSecret&password2=different1",
            )
            .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        let body = std::str::from_utf8(&body).expect("utf8");
        assert!(body.contains("didn&#x27;t match"), "{body}");
        assert!(body.contains("value=\"reader\""));
    }

    #[actix_web::test]
    async fn login_follows_local_next() {
        let (_media, _store, state) = memory_state();
        state
            .accounts
            .signup(
                &SignupRequest::try_from_input(&SignupInput {
                    username: "reader",
                    password1: "Sup3rSecret",
                    password2: "Sup3rSecret",
                    ..SignupInput::default()
                })
                .expect("valid"),
            )
            .await
            .expect("signup");
        let app = users_app!(state);

        let res = test::call_service(
            &app,
            form_post(
                "/auth/login/",
                "username=reader&password=Sup3rSecret&next=%2Ffollow%2F",
            )
            .to_request(),
        )
        .await;
        assert_eq!(location(&res).as_deref(), Some("/follow/"));

        let res = test::call_service(
            &app,
            form_post(
                "/auth/login/",
                "username=reader&password=Sup3rSecret&next=https%3A%2F%2Fevil.example%2F",
            )
            .to_request(),
        )
        .await;
        assert_eq!(location(&res).as_deref(), Some("/"));
    }

    #[actix_web::test]
    async fn wrong_password_rerenders_login() {
        let (_media, _store, state) = memory_state();
        let app = users_app!(state);
        let res = test::call_service(
            &app,
            form_post("/auth/login/", "username=ghost&password=whatever").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(session_cookie(&res).is_none());
        let body = test::read_body(res).await;
        assert!(std::str::from_utf8(&body).expect("utf8").contains("correct username"));
    }
}
