//! In-process store implementing every repository port.
//!
//! Used when no database is configured and by integration tests. Rows live
//! behind one `RwLock` so cascades (user, post) and `SET NULL` on group
//! deletion behave like the PostgreSQL schema.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::ports::{
    CommentPersistenceError, CommentRepository, FollowPersistenceError, FollowRepository,
    GroupPersistenceError, GroupRepository, PostPersistenceError, PostRepository,
    StoredCredentials, UserPersistenceError, UserRepository,
};
use crate::domain::{
    Comment, CommentId, CommentText, Follow, Group, GroupId, GroupSlug, ImagePath, NewComment,
    NewGroup, NewPost, NewUser, Post, PostFilter, PostId, PostText, PostUpdate, User, UserId,
    Username,
};

#[derive(Debug, Clone)]
struct UserRecord {
    user: User,
    password_hash: String,
}

#[derive(Debug, Clone)]
struct PostRecord {
    text: PostText,
    pub_date: DateTime<Utc>,
    author: Uuid,
    group: Option<GroupId>,
    image: Option<ImagePath>,
}

#[derive(Debug, Clone)]
struct CommentRecord {
    post: i64,
    author: Uuid,
    text: CommentText,
    created: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<Uuid, UserRecord>,
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, PostRecord>,
    comments: BTreeMap<i64, CommentRecord>,
    /// `(follower, author)` pairs.
    follows: BTreeSet<(Uuid, Uuid)>,
    last_group_id: i64,
    last_post_id: i64,
    last_comment_id: i64,
}

impl Tables {
    fn user(&self, id: &Uuid) -> Option<&User> {
        self.users.get(id).map(|record| &record.user)
    }

    fn assemble_post(&self, id: i64, record: &PostRecord) -> Option<Post> {
        let author = self.user(&record.author)?.clone();
        let group = record
            .group
            .and_then(|group| self.groups.get(&group.get()))
            .cloned();
        Some(Post::new(
            PostId::new(id),
            record.text.clone(),
            record.pub_date,
            author,
            group,
            record.image.clone(),
        ))
    }

    fn matches(&self, record: &PostRecord, filter: PostFilter) -> bool {
        match filter {
            PostFilter::All => true,
            PostFilter::Group(group) => record.group == Some(group),
            PostFilter::Author(author) => record.author == *author.as_uuid(),
            PostFilter::FollowedBy(user) => self
                .follows
                .contains(&(*user.as_uuid(), record.author)),
        }
    }

    /// Posts matching `filter`, newest first.
    fn listing(&self, filter: PostFilter) -> Vec<(i64, &PostRecord)> {
        let mut rows: Vec<(i64, &PostRecord)> = self
            .posts
            .iter()
            .filter(|(_, record)| self.matches(record, filter))
            .map(|(id, record)| (*id, record))
            .collect();
        rows.sort_by(|(left_id, left), (right_id, right)| {
            right
                .pub_date
                .cmp(&left.pub_date)
                .then_with(|| right_id.cmp(left_id))
        });
        rows
    }

    fn check_group(&self, group: Option<GroupId>) -> Result<(), PostPersistenceError> {
        match group {
            Some(group) if !self.groups.contains_key(&group.get()) => Err(
                PostPersistenceError::missing_reference(format!("group {group} does not exist")),
            ),
            _ => Ok(()),
        }
    }

    fn delete_post(&mut self, id: i64) -> bool {
        let removed = self.posts.remove(&id).is_some();
        if removed {
            self.comments.retain(|_, comment| comment.post != id);
        }
        removed
    }
}

/// Shared in-memory tables; clones see the same data.
///
/// # Examples
/// ```
/// use postboard::outbound::memory::MemoryStore;
///
/// let store = MemoryStore::new();
/// let same = store.clone();
/// # let _ = same;
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn usize_to_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

fn u64_to_usize(value: u64) -> usize {
    usize::try_from(value).unwrap_or(usize::MAX)
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User, UserPersistenceError> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|record| record.user.username() == &user.username);
        if taken {
            return Err(UserPersistenceError::duplicate_username(
                user.username.as_str(),
            ));
        }
        let created = user.to_user();
        tables.users.insert(
            *user.id.as_uuid(),
            UserRecord {
                user: created.clone(),
                password_hash: user.password_hash.clone(),
            },
        );
        Ok(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.tables.read().await.user(id.as_uuid()).cloned())
    }

    async fn find_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, UserPersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|record| record.user.username() == username)
            .map(|record| record.user.clone()))
    }

    async fn find_credentials(
        &self,
        username: &str,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|record| record.user.username().as_str() == username)
            .map(|record| StoredCredentials {
                user_id: *record.user.id(),
                password_hash: record.password_hash.clone(),
            }))
    }

    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut tables = self.tables.write().await;
        let uuid = *id.as_uuid();
        if tables.users.remove(&uuid).is_none() {
            return Ok(false);
        }
        let owned: Vec<i64> = tables
            .posts
            .iter()
            .filter(|(_, post)| post.author == uuid)
            .map(|(post_id, _)| *post_id)
            .collect();
        for post_id in owned {
            tables.delete_post(post_id);
        }
        tables.comments.retain(|_, comment| comment.author != uuid);
        tables
            .follows
            .retain(|(follower, author)| *follower != uuid && *author != uuid);
        Ok(true)
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create(&self, group: &NewGroup) -> Result<Group, GroupPersistenceError> {
        let mut tables = self.tables.write().await;
        if tables
            .groups
            .values()
            .any(|existing| existing.slug() == group.slug())
        {
            return Err(GroupPersistenceError::duplicate_slug(
                group.slug().as_str(),
            ));
        }
        tables.last_group_id += 1;
        let id = GroupId::new(tables.last_group_id)
            .map_err(|err| GroupPersistenceError::query(err.to_string()))?;
        let created = group.clone().into_group(id);
        tables.groups.insert(id.get(), created.clone());
        Ok(created)
    }

    async fn find_by_slug(&self, slug: &GroupSlug) -> Result<Option<Group>, GroupPersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .values()
            .find(|group| group.slug() == slug)
            .cloned())
    }

    async fn find_by_id(&self, id: GroupId) -> Result<Option<Group>, GroupPersistenceError> {
        Ok(self.tables.read().await.groups.get(&id.get()).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>, GroupPersistenceError> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|left, right| {
            left.title()
                .cmp(right.title())
                .then_with(|| left.id().get().cmp(&right.id().get()))
        });
        Ok(groups)
    }

    async fn delete(&self, slug: &GroupSlug) -> Result<bool, GroupPersistenceError> {
        let mut tables = self.tables.write().await;
        let Some(id) = tables
            .groups
            .values()
            .find(|group| group.slug() == slug)
            .map(Group::id)
        else {
            return Ok(false);
        };
        tables.groups.remove(&id.get());
        for post in tables.posts.values_mut() {
            if post.group == Some(id) {
                post.group = None;
            }
        }
        Ok(true)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, post: &NewPost) -> Result<Post, PostPersistenceError> {
        let mut tables = self.tables.write().await;
        if tables.user(post.author.as_uuid()).is_none() {
            return Err(PostPersistenceError::missing_reference(format!(
                "author {} does not exist",
                post.author
            )));
        }
        tables.check_group(post.group)?;
        tables.last_post_id += 1;
        let id = tables.last_post_id;
        let record = PostRecord {
            text: post.text.clone(),
            pub_date: post.pub_date,
            author: *post.author.as_uuid(),
            group: post.group,
            image: post.image.clone(),
        };
        let created = tables
            .assemble_post(id, &record)
            .ok_or_else(|| PostPersistenceError::query("author vanished during insert"))?;
        tables.posts.insert(id, record);
        Ok(created)
    }

    async fn update(
        &self,
        id: PostId,
        update: &PostUpdate,
    ) -> Result<Option<Post>, PostPersistenceError> {
        let mut tables = self.tables.write().await;
        tables.check_group(update.group)?;
        let Some(record) = tables.posts.get_mut(&id.get()) else {
            return Ok(None);
        };
        record.text = update.text.clone();
        record.group = update.group;
        record.image = update.image.clone();
        let record = record.clone();
        Ok(tables.assemble_post(id.get(), &record))
    }

    async fn find_by_id(&self, id: PostId) -> Result<Option<Post>, PostPersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts
            .get(&id.get())
            .and_then(|record| tables.assemble_post(id.get(), record)))
    }

    async fn delete(&self, id: PostId) -> Result<bool, PostPersistenceError> {
        Ok(self.tables.write().await.delete_post(id.get()))
    }

    async fn count(&self, filter: PostFilter) -> Result<u64, PostPersistenceError> {
        let tables = self.tables.read().await;
        Ok(usize_to_u64(tables.listing(filter).len()))
    }

    async fn list(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, PostPersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .listing(filter)
            .into_iter()
            .skip(u64_to_usize(offset))
            .take(u64_to_usize(limit))
            .filter_map(|(id, record)| tables.assemble_post(id, record))
            .collect())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, comment: &NewComment) -> Result<Comment, CommentPersistenceError> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&comment.post.get()) {
            return Err(CommentPersistenceError::missing_reference(format!(
                "post {} does not exist",
                comment.post
            )));
        }
        let author = tables
            .user(comment.author.as_uuid())
            .cloned()
            .ok_or_else(|| {
                CommentPersistenceError::missing_reference(format!(
                    "author {} does not exist",
                    comment.author
                ))
            })?;
        tables.last_comment_id += 1;
        let id = tables.last_comment_id;
        tables.comments.insert(
            id,
            CommentRecord {
                post: comment.post.get(),
                author: *comment.author.as_uuid(),
                text: comment.text.clone(),
                created: comment.created,
            },
        );
        Ok(Comment::new(
            CommentId::new(id),
            comment.post,
            author,
            comment.text.clone(),
            comment.created,
        ))
    }

    async fn list_for_post(&self, post: PostId) -> Result<Vec<Comment>, CommentPersistenceError> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .iter()
            .filter(|(_, record)| record.post == post.get())
            .filter_map(|(id, record)| {
                let author = tables.user(&record.author)?.clone();
                Some(Comment::new(
                    CommentId::new(*id),
                    post,
                    author,
                    record.text.clone(),
                    record.created,
                ))
            })
            .collect();
        comments.sort_by(|left, right| {
            left.created()
                .cmp(&right.created())
                .then_with(|| left.id().get().cmp(&right.id().get()))
        });
        Ok(comments)
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn follow(&self, follow: &Follow) -> Result<(), FollowPersistenceError> {
        let mut tables = self.tables.write().await;
        let follower = *follow.user().as_uuid();
        let author = *follow.author().as_uuid();
        if tables.users.contains_key(&follower) && tables.users.contains_key(&author) {
            tables.follows.insert((follower, author));
        }
        Ok(())
    }

    async fn unfollow(&self, user: &UserId, author: &UserId) -> Result<bool, FollowPersistenceError> {
        let mut tables = self.tables.write().await;
        Ok(tables.follows.remove(&(*user.as_uuid(), *author.as_uuid())))
    }

    async fn is_following(
        &self,
        user: &UserId,
        author: &UserId,
    ) -> Result<bool, FollowPersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables.follows.contains(&(*user.as_uuid(), *author.as_uuid())))
    }
}

#[cfg(test)]
mod tests;
