//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions back into domain types
//! re-validate every column so a hand-edited row surfaces as a query error
//! instead of an invalid entity.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    Comment, CommentId, CommentText, Group, GroupId, ImagePath, NewGroup, Post, PostId, PostText,
    User, UserId, UserProfile, Username,
};

use super::schema::{comments, follows, groups, posts, users};

/// Row struct for reading public user columns.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: Option<&'a str>,
    pub password_hash: &'a str,
}

/// Row struct for reading from the groups table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = groups)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct GroupRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// Insertable struct for creating groups.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = groups)]
pub(crate) struct NewGroupRow<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub description: &'a str,
}

/// Row struct for reading from the posts table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    #[expect(dead_code, reason = "author is loaded through the users join")]
    pub author_id: Uuid,
    #[expect(dead_code, reason = "group is loaded through the groups join")]
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

/// Insertable struct for creating posts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub text: &'a str,
    pub pub_date: DateTime<Utc>,
    pub author_id: Uuid,
    pub group_id: Option<i64>,
    pub image: Option<&'a str>,
}

/// Changeset for editing posts; `None` values are written as NULL.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = posts)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct PostChangeset<'a> {
    pub text: &'a str,
    pub group_id: Option<i64>,
    pub image: Option<&'a str>,
}

/// Row struct for reading from the comments table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
}

/// Insertable struct for creating comments.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub post_id: i64,
    pub author_id: Uuid,
    pub text: &'a str,
    pub created: DateTime<Utc>,
}

/// Insertable struct for follow edges.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = follows)]
pub(crate) struct NewFollowRow {
    pub user_id: Uuid,
    pub author_id: Uuid,
}

/// A stored row failed domain validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stored {table} row {id} is invalid: {reason}")]
pub(crate) struct CorruptRow {
    table: &'static str,
    id: String,
    reason: String,
}

impl CorruptRow {
    fn new(table: &'static str, id: impl ToString, reason: impl ToString) -> Self {
        Self {
            table,
            id: id.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl TryFrom<UserRow> for User {
    type Error = CorruptRow;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let invalid = |err: crate::domain::UserValidationError| CorruptRow::new("users", row.id, err);
        let username = Username::new(row.username.as_str()).map_err(invalid)?;
        let profile = UserProfile::new(
            row.first_name.as_str(),
            row.last_name.as_str(),
            row.email.clone(),
        )
        .map_err(invalid)?;
        Ok(User::new(UserId::from_uuid(row.id), username, profile))
    }
}

impl TryFrom<GroupRow> for Group {
    type Error = CorruptRow;

    fn try_from(row: GroupRow) -> Result<Self, Self::Error> {
        let invalid = |err: crate::domain::GroupValidationError| CorruptRow::new("groups", row.id, err);
        let id = GroupId::new(row.id).map_err(invalid)?;
        let group = NewGroup::new(&row.title, &row.slug, &row.description).map_err(invalid)?;
        Ok(group.into_group(id))
    }
}

/// Assemble a post from its row and joined author/group rows.
pub(crate) fn post_from_rows(
    row: PostRow,
    author: UserRow,
    group: Option<GroupRow>,
) -> Result<Post, CorruptRow> {
    let text = PostText::new(&row.text).map_err(|err| CorruptRow::new("posts", row.id, err))?;
    let image = row
        .image
        .map(ImagePath::new)
        .transpose()
        .map_err(|err| CorruptRow::new("posts", row.id, err))?;
    let author = User::try_from(author)?;
    let group = group.map(Group::try_from).transpose()?;
    Ok(Post::new(
        PostId::new(row.id),
        text,
        row.pub_date,
        author,
        group,
        image,
    ))
}

/// Assemble a comment from its row and joined author row.
pub(crate) fn comment_from_rows(row: CommentRow, author: UserRow) -> Result<Comment, CorruptRow> {
    let text =
        CommentText::new(&row.text).map_err(|err| CorruptRow::new("comments", row.id, err))?;
    Ok(Comment::new(
        CommentId::new(row.id),
        PostId::new(row.post_id),
        User::try_from(author)?,
        text,
        row.created,
    ))
}
