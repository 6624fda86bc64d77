//! Post pages: listings, detail, authoring, comments and follows.
//!
//! ```text
//! GET  /                       latest posts (cached)
//! GET  /group/{slug}/          posts in a group
//! GET  /profile/{username}/    posts by an author
//! GET  /posts/{id}/            one post with comments
//! GET  /create/  POST /create/ new post form
//! GET  /posts/{id}/edit/  POST edit form (author only)
//! POST /posts/{id}/comment/    add a comment
//! GET  /follow/                posts by followed authors
//! GET  /profile/{username}/follow/ and /unfollow/
//! ```

use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, get, post, web};
use pagination::PageRequest;
use serde::Deserialize;
use tera::Context;
use tracing::{debug, warn};

use crate::domain::ports::PageCacheKey;
use crate::domain::{ApiResult, Error, Post, PostDetail, PostId, User};
use crate::inbound::http::auth::{CurrentUser, Viewer, requested_path};
use crate::inbound::http::forms::{
    FormErrors, FormFields, FormView, PostForm, read_urlencoded, validate_comment,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::templates::{self, page_context, render_page};

const INDEX_TEMPLATE: &str = "posts/index.html";
const POST_FORM_TEMPLATE: &str = "posts/post_create.html";
const POST_FIELDS: [&str; 2] = ["text", "group"];

/// `?page=` query parameter.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    page: Option<String>,
}

impl PageQuery {
    fn request(&self) -> PageRequest {
        PageRequest::parse(self.page.as_deref())
    }
}

pub(crate) fn redirect(location: &str) -> HttpResponse {
    HttpResponse::Found()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn parse_post_id(raw: &str) -> Result<PostId, Error> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .map(PostId::new)
        .ok_or_else(|| Error::not_found(format!("post {raw} not found")))
}

fn detail_url(id: PostId) -> String {
    format!("/posts/{id}/")
}

fn profile_url(user: &User) -> String {
    format!("/profile/{}/", user.username())
}

/// Latest posts across the site.
///
/// Whole rendered pages are cached per path, query and viewer; cache failures
/// only cost a re-render.
#[get("/")]
pub async fn index(
    req: HttpRequest,
    state: web::Data<HttpState>,
    viewer: Viewer,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let key = PageCacheKey::for_page(&requested_path(&req), viewer.user().map(User::id)).ok();
    if let Some(key) = &key {
        match state.page_cache.get(key).await {
            Ok(Some(body)) => {
                return Ok(templates::html_response(StatusCode::OK, INDEX_TEMPLATE, body));
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "page cache read failed"),
        }
    }

    let page = state.posts.index_page(query.request()).await?;
    let mut context = page_context(viewer.user());
    context.insert("page", &page);
    let body = templates::render(INDEX_TEMPLATE, &context)?;

    if let Some(key) = key {
        if let Err(err) = state.page_cache.insert(key, body.clone()).await {
            warn!(error = %err, "page cache write failed");
        }
    }
    Ok(templates::html_response(StatusCode::OK, INDEX_TEMPLATE, body))
}

/// Posts filed under one group.
#[get("/group/{slug}/")]
pub async fn group_list(
    state: web::Data<HttpState>,
    viewer: Viewer,
    slug: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let group_page = state.posts.group_page(&slug, query.request()).await?;
    let mut context = page_context(viewer.user());
    context.insert("group", &group_page.group);
    context.insert("page", &group_page.page);
    render_page(StatusCode::OK, "posts/group_list.html", &context)
}

/// An author's posts.
#[get("/profile/{username}/")]
pub async fn profile(
    state: web::Data<HttpState>,
    viewer: Viewer,
    username: web::Path<String>,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let profile = state
        .posts
        .profile_page(&username, query.request(), viewer.user().map(User::id))
        .await?;
    let mut context = page_context(viewer.user());
    context.insert("author", &profile.author);
    context.insert("page", &profile.page);
    context.insert("post_count", &profile.post_count);
    context.insert("following", &profile.following);
    context.insert("can_follow", &profile.can_follow);
    render_page(StatusCode::OK, "posts/profile.html", &context)
}

fn detail_context(
    viewer: Option<&User>,
    detail: &PostDetail,
    comment_form: &FormView,
) -> Context {
    let mut context = page_context(viewer);
    context.insert("post", &detail.post);
    context.insert("excerpt", detail.post.excerpt());
    context.insert("comments", &detail.comments);
    context.insert("author_post_count", &detail.author_post_count);
    context.insert(
        "is_author",
        &viewer.is_some_and(|user| user.id() == detail.post.author().id()),
    );
    context.insert("comment_form", comment_form);
    context
}

/// One post with its comments.
#[get("/posts/{post_id}/")]
pub async fn post_detail(
    state: web::Data<HttpState>,
    viewer: Viewer,
    post_id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let detail = state.posts.post_detail(parse_post_id(&post_id)?).await?;
    let form = FormView::new(FormFields::blank(&["text"]), FormErrors::default());
    let context = detail_context(viewer.user(), &detail, &form);
    render_page(StatusCode::OK, "posts/post_detail.html", &context)
}

async fn post_form_page(
    state: &HttpState,
    user: &User,
    editing: Option<&Post>,
    form: FormView,
) -> ApiResult<HttpResponse> {
    let groups = state.posts.groups().await?;
    let mut context = page_context(Some(user));
    context.insert("is_edit", &editing.is_some());
    context.insert("post", &editing);
    context.insert("groups", &groups);
    context.insert("form", &form);
    render_page(StatusCode::OK, POST_FORM_TEMPLATE, &context)
}

/// Empty form for a new post.
#[get("/create/")]
pub async fn post_create_form(
    state: web::Data<HttpState>,
    user: CurrentUser,
) -> ApiResult<HttpResponse> {
    let form = FormView::new(FormFields::blank(&POST_FIELDS), FormErrors::default());
    post_form_page(&state, &user.0, None, form).await
}

/// Publish a new post and go to the author's profile.
#[post("/create/")]
pub async fn post_create(
    req: HttpRequest,
    state: web::Data<HttpState>,
    user: CurrentUser,
    payload: web::Payload,
) -> ApiResult<HttpResponse> {
    let form = PostForm::read(req.headers(), payload).await?;
    let outcome = match form.validate() {
        Ok(draft) => match state.posts.create_post(user.0.id(), draft).await {
            Ok(_) => return Ok(redirect(&profile_url(&user.0))),
            Err(err) => FormErrors::from_service_error(err)?,
        },
        Err(errors) => errors,
    };
    let view = FormView::new(form.fields.with_defaults(&POST_FIELDS), outcome);
    post_form_page(&state, &user.0, None, view).await
}

async fn editable_post(
    state: &HttpState,
    user: &User,
    raw_id: &str,
) -> Result<Result<Post, HttpResponse>, Error> {
    let post = state.posts.find_post(parse_post_id(raw_id)?).await?;
    if post.author().id() == user.id() {
        Ok(Ok(post))
    } else {
        Ok(Err(redirect(&detail_url(post.id()))))
    }
}

/// Edit form pre-filled from the post; other users go back to the post.
#[get("/posts/{post_id}/edit/")]
pub async fn post_edit_form(
    state: web::Data<HttpState>,
    user: CurrentUser,
    post_id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let post = match editable_post(&state, &user.0, &post_id).await? {
        Ok(post) => post,
        Err(bounce) => return Ok(bounce),
    };
    let form = FormView::new(PostForm::from_post(&post).fields, FormErrors::default());
    post_form_page(&state, &user.0, Some(&post), form).await
}

/// Save an edited post and go back to it.
#[post("/posts/{post_id}/edit/")]
pub async fn post_edit(
    req: HttpRequest,
    state: web::Data<HttpState>,
    user: CurrentUser,
    post_id: web::Path<String>,
    payload: web::Payload,
) -> ApiResult<HttpResponse> {
    let post = match editable_post(&state, &user.0, &post_id).await? {
        Ok(post) => post,
        Err(bounce) => return Ok(bounce),
    };
    let form = PostForm::read(req.headers(), payload).await?;
    let outcome = match form.validate() {
        Ok(draft) => match state.posts.edit_post(user.0.id(), post.id(), draft).await {
            Ok(saved) => return Ok(redirect(&detail_url(saved.id()))),
            Err(err) => FormErrors::from_service_error(err)?,
        },
        Err(errors) => errors,
    };
    let view = FormView::new(form.fields.with_defaults(&POST_FIELDS), outcome);
    post_form_page(&state, &user.0, Some(&post), view).await
}

/// Comments are only posted; a stray GET goes back to the post.
#[get("/posts/{post_id}/comment/")]
pub async fn add_comment_form(
    _user: CurrentUser,
    post_id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    Ok(redirect(&detail_url(parse_post_id(&post_id)?)))
}

/// Store a comment when valid, then show the post.
#[post("/posts/{post_id}/comment/")]
pub async fn add_comment(
    state: web::Data<HttpState>,
    user: CurrentUser,
    post_id: web::Path<String>,
    payload: web::Payload,
) -> ApiResult<HttpResponse> {
    let id = parse_post_id(&post_id)?;
    let fields = read_urlencoded(payload).await?;
    match validate_comment(&fields) {
        Ok(text) => {
            state.posts.add_comment(user.0.id(), id, text).await?;
        }
        Err(errors) => {
            // Unknown posts still 404 rather than silently redirecting.
            state.posts.find_post(id).await?;
            debug!(post_id = %id, ?errors, "rejected blank comment");
        }
    }
    Ok(redirect(&detail_url(id)))
}

/// Posts by every author the user follows.
#[get("/follow/")]
pub async fn follow_index(
    state: web::Data<HttpState>,
    user: CurrentUser,
    query: web::Query<PageQuery>,
) -> ApiResult<HttpResponse> {
    let page = state.posts.follow_page(user.0.id(), query.request()).await?;
    let mut context = page_context(Some(&user.0));
    context.insert("page", &page);
    render_page(StatusCode::OK, "posts/follow.html", &context)
}

/// Follow an author and return to their profile.
#[get("/profile/{username}/follow/")]
pub async fn profile_follow(
    state: web::Data<HttpState>,
    user: CurrentUser,
    username: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let author = state.follows.follow(user.0.id(), &username).await?;
    Ok(redirect(&profile_url(&author)))
}

/// Stop following an author and return to their profile.
#[get("/profile/{username}/unfollow/")]
pub async fn profile_unfollow(
    state: web::Data<HttpState>,
    user: CurrentUser,
    username: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let author = state.follows.unfollow(user.0.id(), &username).await?;
    Ok(redirect(&profile_url(&author)))
}

/// Register every post page on `cfg`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(index)
        .service(group_list)
        .service(post_create_form)
        .service(post_create)
        .service(follow_index)
        .service(profile_follow)
        .service(profile_unfollow)
        .service(profile)
        .service(post_edit_form)
        .service(post_edit)
        .service(add_comment_form)
        .service(add_comment)
        .service(post_detail);
}

#[cfg(test)]
#[path = "posts_tests.rs"]
mod tests;
