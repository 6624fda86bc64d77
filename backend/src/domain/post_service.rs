//! Post use-cases: paginated listings, detail pages, authoring and comments.
//!
//! Listings are built in two steps: count the matching posts, then fetch only
//! the window the requested page needs. Page numbers outside the valid range
//! are clamped rather than rejected.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageRequest, Paginator};
use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use super::ports::{
    CommentRepository, FollowRepository, GroupRepository, MediaStore, PostRepository,
};
use super::{
    Comment, CommentText, Error, Group, GroupId, GroupSlug, ImageChange, ImagePath, NewComment,
    NewGroup, NewPost, Post, PostDraft, PostFilter, PostId, PostUpdate, User, UserId,
};
use super::account_service::AccountService;

/// Default number of posts per listing page.
pub const DEFAULT_POSTS_PER_PAGE: u64 = 10;

/// A group and one page of its posts.
#[derive(Debug, Clone, Serialize)]
pub struct GroupPage {
    /// The group being browsed.
    pub group: Group,
    /// Posts filed under it.
    pub page: Page<Post>,
}

/// An author's profile with one page of their posts.
#[derive(Debug, Clone, Serialize)]
pub struct ProfilePage {
    /// The profile owner.
    pub author: User,
    /// Their posts.
    pub page: Page<Post>,
    /// Total number of posts they have written.
    pub post_count: u64,
    /// Whether the viewer follows this author.
    pub following: bool,
    /// Whether the viewer may follow this author (signed in and not self).
    pub can_follow: bool,
}

/// A post with its comments.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    /// The post.
    pub post: Post,
    /// Comments, oldest first.
    pub comments: Vec<Comment>,
    /// Total number of posts by the same author.
    pub author_post_count: u64,
}

/// Adapters the post service depends on.
#[derive(Clone)]
pub struct PostServicePorts {
    /// Post storage.
    pub posts: Arc<dyn PostRepository>,
    /// Group storage.
    pub groups: Arc<dyn GroupRepository>,
    /// Comment storage.
    pub comments: Arc<dyn CommentRepository>,
    /// Follow storage.
    pub follows: Arc<dyn FollowRepository>,
    /// Uploaded images.
    pub media: Arc<dyn MediaStore>,
    /// Source of publication timestamps.
    pub clock: Arc<dyn Clock>,
}

/// Reads and writes posts on behalf of page handlers.
#[derive(Clone)]
pub struct PostService {
    ports: PostServicePorts,
    accounts: AccountService,
    per_page: u64,
}

impl PostService {
    /// Create a service listing `per_page` posts per page.
    ///
    /// A zero page size falls back to [`DEFAULT_POSTS_PER_PAGE`].
    pub fn new(ports: PostServicePorts, accounts: AccountService, per_page: u64) -> Self {
        let per_page = if per_page == 0 {
            DEFAULT_POSTS_PER_PAGE
        } else {
            per_page
        };
        Self {
            ports,
            accounts,
            per_page,
        }
    }

    /// Number of posts per listing page.
    pub fn per_page(&self) -> u64 {
        self.per_page
    }

    async fn page_of(&self, filter: PostFilter, request: PageRequest) -> Result<Page<Post>, Error> {
        let total = self.ports.posts.count(filter).await?;
        let paginator = Paginator::new(total, self.per_page)
            .map_err(|err| Error::internal(format!("invalid page size: {err}")))?;
        let window = paginator.window(request);
        let items = self
            .ports
            .posts
            .list(filter, window.offset(), window.limit())
            .await?;
        Ok(Page::new(items, window, &paginator))
    }

    /// Newest posts across the whole site.
    pub async fn index_page(&self, request: PageRequest) -> Result<Page<Post>, Error> {
        self.page_of(PostFilter::All, request).await
    }

    /// Posts filed under the group with `slug`.
    pub async fn group_page(&self, slug: &str, request: PageRequest) -> Result<GroupPage, Error> {
        let group = self.group_by_slug(slug).await?;
        let page = self.page_of(PostFilter::Group(group.id()), request).await?;
        Ok(GroupPage { group, page })
    }

    /// Posts by `username`, plus whether `viewer` follows them.
    pub async fn profile_page(
        &self,
        username: &str,
        request: PageRequest,
        viewer: Option<&UserId>,
    ) -> Result<ProfilePage, Error> {
        let author = self.accounts.find_by_username(username).await?;
        let page = self.page_of(PostFilter::Author(*author.id()), request).await?;
        let (following, can_follow) = match viewer {
            Some(viewer) if viewer != author.id() => (
                self.ports.follows.is_following(viewer, author.id()).await?,
                true,
            ),
            _ => (false, false),
        };
        Ok(ProfilePage {
            post_count: page.total(),
            author,
            page,
            following,
            can_follow,
        })
    }

    /// Posts by every author `viewer` follows.
    pub async fn follow_page(
        &self,
        viewer: &UserId,
        request: PageRequest,
    ) -> Result<Page<Post>, Error> {
        self.page_of(PostFilter::FollowedBy(*viewer), request).await
    }

    /// A single post with its comments.
    pub async fn post_detail(&self, id: PostId) -> Result<PostDetail, Error> {
        let post = self.find_post(id).await?;
        let comments = self.ports.comments.list_for_post(id).await?;
        let author_post_count = self
            .ports
            .posts
            .count(PostFilter::Author(*post.author().id()))
            .await?;
        Ok(PostDetail {
            post,
            comments,
            author_post_count,
        })
    }

    /// Fetch a post or fail with `NotFound`.
    pub async fn find_post(&self, id: PostId) -> Result<Post, Error> {
        self.ports
            .posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| Error::not_found(format!("post {id} not found")))
    }

    /// Every group, for the post form's selector.
    pub async fn groups(&self) -> Result<Vec<Group>, Error> {
        Ok(self.ports.groups.list().await?)
    }

    /// Publish a new post authored by `author`.
    pub async fn create_post(&self, author: &UserId, draft: PostDraft) -> Result<Post, Error> {
        self.ensure_group_exists(draft.group).await?;
        let image = match &draft.image {
            ImageChange::Replace(upload) => Some(self.ports.media.save(upload).await?),
            ImageChange::Keep | ImageChange::Clear => None,
        };
        let new_post = NewPost {
            text: draft.text,
            author: *author,
            group: draft.group,
            image,
            pub_date: self.ports.clock.utc(),
        };
        let post = match self.ports.posts.create(&new_post).await {
            Ok(post) => post,
            Err(err) => {
                if let Some(saved) = &new_post.image {
                    self.discard_image(saved).await;
                }
                return Err(err.into());
            }
        };
        info!(post_id = %post.id(), author = %author, "post created");
        Ok(post)
    }

    /// Apply `draft` to an existing post written by `editor`.
    ///
    /// The author and publication date never change.
    pub async fn edit_post(
        &self,
        editor: &UserId,
        id: PostId,
        draft: PostDraft,
    ) -> Result<Post, Error> {
        let current = self.find_post(id).await?;
        if current.author().id() != editor {
            return Err(Error::forbidden("only the author may edit this post")
                .with_details(json!({ "postId": id.get() })));
        }
        self.ensure_group_exists(draft.group).await?;

        let previous_image = current.image().cloned();
        let uploaded = match &draft.image {
            ImageChange::Replace(upload) => Some(self.ports.media.save(upload).await?),
            ImageChange::Keep | ImageChange::Clear => None,
        };
        let image = match &draft.image {
            ImageChange::Keep => previous_image.clone(),
            ImageChange::Replace(_) => uploaded.clone(),
            ImageChange::Clear => None,
        };
        let update = PostUpdate {
            text: draft.text,
            group: draft.group,
            image: image.clone(),
        };
        let post = match self.ports.posts.update(id, &update).await {
            Ok(Some(post)) => post,
            outcome => {
                if let Some(saved) = &uploaded {
                    self.discard_image(saved).await;
                }
                return Err(match outcome {
                    Err(err) => err.into(),
                    Ok(_) => Error::not_found(format!("post {id} not found")),
                });
            }
        };

        if let Some(old) = previous_image.filter(|old| Some(old) != image.as_ref()) {
            self.discard_image(&old).await;
        }
        info!(post_id = %id, "post edited");
        Ok(post)
    }

    /// Comment on a post.
    pub async fn add_comment(
        &self,
        author: &UserId,
        post: PostId,
        text: CommentText,
    ) -> Result<Comment, Error> {
        self.find_post(post).await?;
        let comment = self
            .ports
            .comments
            .create(&NewComment {
                post,
                author: *author,
                text,
                created: self.ports.clock.utc(),
            })
            .await?;
        info!(post_id = %post, comment_id = %comment.id(), "comment added");
        Ok(comment)
    }

    /// Delete a post, its comments and its image file.
    pub async fn delete_post(&self, id: PostId) -> Result<(), Error> {
        let post = self.find_post(id).await?;
        if !self.ports.posts.delete(id).await? {
            return Err(Error::not_found(format!("post {id} not found")));
        }
        if let Some(image) = post.image() {
            self.discard_image(image).await;
        }
        info!(post_id = %id, "post deleted");
        Ok(())
    }

    /// Register a new group; duplicate slugs are a `Conflict`.
    pub async fn create_group(&self, group: &NewGroup) -> Result<Group, Error> {
        let created = self.ports.groups.create(group).await?;
        info!(slug = %created.slug(), "group created");
        Ok(created)
    }

    /// Remove a group; its posts stay without one.
    pub async fn delete_group(&self, slug: &str) -> Result<(), Error> {
        let group = self.group_by_slug(slug).await?;
        if !self.ports.groups.delete(group.slug()).await? {
            return Err(Error::not_found(format!("group {slug} not found")));
        }
        info!(%slug, "group deleted");
        Ok(())
    }

    /// Resolve a group slug or fail with `NotFound`.
    pub async fn group_by_slug(&self, slug: &str) -> Result<Group, Error> {
        let not_found = || Error::not_found(format!("group {slug} not found"));
        let slug = GroupSlug::new(slug).map_err(|_| not_found())?;
        self.ports
            .groups
            .find_by_slug(&slug)
            .await?
            .ok_or_else(not_found)
    }

    async fn ensure_group_exists(&self, group: Option<GroupId>) -> Result<(), Error> {
        let Some(id) = group else {
            return Ok(());
        };
        if self.ports.groups.find_by_id(id).await?.is_none() {
            return Err(Error::invalid_request(
                "select a valid choice; that choice is not one of the available choices",
            )
            .with_details(json!({ "field": "group", "code": "invalid_choice" })));
        }
        Ok(())
    }

    async fn discard_image(&self, image: &ImagePath) {
        if let Err(err) = self.ports.media.delete(image).await {
            warn!(path = %image, error = %err, "failed to delete image file");
        }
    }
}

#[cfg(test)]
#[path = "post_service_tests.rs"]
mod tests;
