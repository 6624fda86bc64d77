//! Tests for the post service.

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use mockall::predicate::eq;
use pagination::PageRequest;
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    GroupPersistenceError, MediaStoreError, MockCommentRepository, MockFollowRepository,
    MockGroupRepository, MockMediaStore, MockPasswordHasher, MockPostRepository,
    MockUserRepository, PostPersistenceError,
};
use crate::domain::{
    ErrorCode, ImageUpload, NewGroup, PostText, TINY_GIF as GIF, UserProfile, Username,
};

struct FixtureClock {
    utc_now: DateTime<Utc>,
}

impl Clock for FixtureClock {
    fn local(&self) -> DateTime<Local> {
        self.utc_now.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.utc_now
    }
}

fn fixture_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53)
        .single()
        .expect("valid fixture timestamp")
}

#[derive(Default)]
struct Mocks {
    posts: MockPostRepository,
    groups: MockGroupRepository,
    comments: MockCommentRepository,
    follows: MockFollowRepository,
    media: MockMediaStore,
    users: MockUserRepository,
}

impl Mocks {
    fn into_service(self) -> PostService {
        let accounts = AccountService::new(Arc::new(self.users), Arc::new(MockPasswordHasher::new()));
        PostService::new(
            PostServicePorts {
                posts: Arc::new(self.posts),
                groups: Arc::new(self.groups),
                comments: Arc::new(self.comments),
                follows: Arc::new(self.follows),
                media: Arc::new(self.media),
                clock: Arc::new(FixtureClock {
                    utc_now: fixture_timestamp(),
                }),
            },
            accounts,
            DEFAULT_POSTS_PER_PAGE,
        )
    }
}

#[fixture]
fn author() -> User {
    User::new(
        UserId::random(),
        Username::new("auth").expect("valid username"),
        UserProfile::default(),
    )
}

fn group() -> Group {
    NewGroup::new("Тестовая группа", "test-slug", "Тестовое описание")
        .expect("valid group")
        .into_group(GroupId::new(1).expect("valid id"))
}

fn post(id: i64, author: &User, image: Option<&str>) -> Post {
    Post::new(
        PostId::new(id),
        PostText::new(format!("Тестовый пост {id}")).expect("valid text"),
        fixture_timestamp(),
        author.clone(),
        None,
        image.map(|raw| ImagePath::new(raw).expect("valid path")),
    )
}

fn draft(text: &str, group: Option<i64>, image: ImageChange) -> PostDraft {
    PostDraft {
        text: PostText::new(text).expect("valid text"),
        group: group.map(|id| GroupId::new(id).expect("valid id")),
        image,
    }
}

#[rstest]
#[case("1", 1, 0)]
#[case("2", 2, 10)]
#[case("99", 2, 10)]
#[case("abc", 1, 0)]
#[tokio::test]
async fn index_page_clamps_requested_page(
    author: User,
    #[case] raw: &str,
    #[case] expected_number: u64,
    #[case] expected_offset: u64,
) {
    let mut mocks = Mocks::default();
    mocks.posts.expect_count().returning(|_| Ok(13));
    let listed = author.clone();
    mocks
        .posts
        .expect_list()
        .with(eq(PostFilter::All), eq(expected_offset), eq(10))
        .times(1)
        .returning(move |_, offset, _| {
            let len = if offset == 0 { 10 } else { 3 };
            Ok((0..len).map(|i| post(i, &listed, None)).collect())
        });

    let page = mocks
        .into_service()
        .index_page(PageRequest::parse(Some(raw)))
        .await
        .expect("page");
    assert_eq!(page.number(), expected_number);
    assert_eq!(page.num_pages(), 2);
    assert_eq!(page.len(), if expected_number == 1 { 10 } else { 3 });
}

#[rstest]
#[tokio::test]
async fn group_page_rejects_unknown_slug() {
    let mut mocks = Mocks::default();
    mocks.groups.expect_find_by_slug().returning(|_| Ok(None));
    let err = mocks
        .into_service()
        .group_page("missing", PageRequest::FIRST)
        .await
        .expect_err("unknown group");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn profile_page_reports_following_for_other_viewers(author: User) {
    let viewer = UserId::random();
    let author_id = *author.id();
    let mut mocks = Mocks::default();
    let found = author.clone();
    mocks
        .users
        .expect_find_by_username()
        .returning(move |_| Ok(Some(found.clone())));
    mocks.posts.expect_count().returning(|_| Ok(1));
    let listed = author.clone();
    mocks
        .posts
        .expect_list()
        .returning(move |_, _, _| Ok(vec![post(1, &listed, None)]));
    mocks
        .follows
        .expect_is_following()
        .withf(move |user, followed| *user == viewer && *followed == author_id)
        .returning(|_, _| Ok(true));

    let profile = mocks
        .into_service()
        .profile_page("auth", PageRequest::FIRST, Some(&viewer))
        .await
        .expect("profile");
    assert!(profile.following);
    assert!(profile.can_follow);
    assert_eq!(profile.post_count, 1);
}

#[rstest]
#[tokio::test]
async fn profile_page_never_offers_self_follow(author: User) {
    let viewer = *author.id();
    let mut mocks = Mocks::default();
    let found = author.clone();
    mocks
        .users
        .expect_find_by_username()
        .returning(move |_| Ok(Some(found.clone())));
    mocks.posts.expect_count().returning(|_| Ok(0));
    mocks.posts.expect_list().returning(|_, _, _| Ok(Vec::new()));
    mocks.follows.expect_is_following().never();

    let profile = mocks
        .into_service()
        .profile_page("auth", PageRequest::FIRST, Some(&viewer))
        .await
        .expect("profile");
    assert!(!profile.following);
    assert!(!profile.can_follow);
    assert_eq!(profile.page.num_pages(), 1);
}

#[rstest]
#[tokio::test]
async fn create_post_stamps_clock_and_stores_image(author: User) {
    let author_id = *author.id();
    let mut mocks = Mocks::default();
    mocks
        .groups
        .expect_find_by_id()
        .returning(|_| Ok(Some(group())));
    mocks
        .media
        .expect_save()
        .times(1)
        .returning(|upload| ImagePath::for_upload("fresh", upload.format()).map_err(|err| {
            MediaStoreError::io(err.to_string())
        }));
    let stored_author = author.clone();
    mocks
        .posts
        .expect_create()
        .withf(move |new_post| {
            new_post.pub_date == fixture_timestamp()
                && new_post.author == author_id
                && new_post.group.map(GroupId::get) == Some(1)
                && new_post.image.as_ref().map(ImagePath::as_str) == Some("posts/fresh.gif")
        })
        .times(1)
        .returning(move |new_post| {
            Ok(Post::new(
                PostId::new(1),
                new_post.text.clone(),
                new_post.pub_date,
                stored_author.clone(),
                Some(group()),
                new_post.image.clone(),
            ))
        });

    let upload = ImageUpload::new("small.gif", GIF.to_vec()).expect("valid gif");
    let post = mocks
        .into_service()
        .create_post(&author_id, draft("Новый пост", Some(1), ImageChange::Replace(upload)))
        .await
        .expect("created");
    assert_eq!(post.group().map(Group::title), Some("Тестовая группа"));
}

#[rstest]
#[tokio::test]
async fn create_post_rejects_unknown_group(author: User) {
    let mut mocks = Mocks::default();
    mocks.groups.expect_find_by_id().returning(|_| Ok(None));
    mocks.posts.expect_create().never();
    mocks.media.expect_save().never();

    let err = mocks
        .into_service()
        .create_post(author.id(), draft("text", Some(42), ImageChange::Keep))
        .await
        .expect_err("invalid group");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.field(), Some("group"));
}

#[rstest]
#[tokio::test]
async fn edit_post_forbids_other_users(author: User) {
    let mut mocks = Mocks::default();
    let stored = post(7, &author, None);
    mocks
        .posts
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    mocks.posts.expect_update().never();

    let err = mocks
        .into_service()
        .edit_post(&UserId::random(), PostId::new(7), draft("hijack", None, ImageChange::Keep))
        .await
        .expect_err("forbidden");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[rstest]
#[case(ImageChange::Keep, Some("posts/old.gif"), false)]
#[case(ImageChange::Clear, None, true)]
#[case(
    ImageChange::Replace(ImageUpload::new("new.gif", GIF.to_vec()).expect("valid gif")),
    Some("posts/new.gif"),
    true
)]
#[tokio::test]
async fn edit_post_applies_image_change(
    author: User,
    #[case] change: ImageChange,
    #[case] expected_image: Option<&'static str>,
    #[case] deletes_old: bool,
) {
    let mut mocks = Mocks::default();
    let stored = post(7, &author, Some("posts/old.gif"));
    mocks
        .posts
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    mocks.media.expect_save().returning(|upload| {
        ImagePath::for_upload("new", upload.format())
            .map_err(|err| MediaStoreError::io(err.to_string()))
    });
    mocks
        .media
        .expect_delete()
        .withf(|path| path.as_str() == "posts/old.gif")
        .times(usize::from(deletes_old))
        .returning(|_| Ok(()));
    let updated_author = author.clone();
    mocks
        .posts
        .expect_update()
        .withf(move |id, update| {
            *id == PostId::new(7) && update.image.as_ref().map(ImagePath::as_str) == expected_image
        })
        .times(1)
        .returning(move |id, update| {
            Ok(Some(Post::new(
                id,
                update.text.clone(),
                fixture_timestamp(),
                updated_author.clone(),
                None,
                update.image.clone(),
            )))
        });

    let edited = mocks
        .into_service()
        .edit_post(author.id(), PostId::new(7), draft("Изменённый текст", None, change))
        .await
        .expect("edited");
    assert_eq!(edited.text(), "Изменённый текст");
    assert_eq!(edited.pub_date(), fixture_timestamp());
}

#[rstest]
#[tokio::test]
async fn create_post_removes_the_upload_when_the_insert_fails(author: User) {
    let mut mocks = Mocks::default();
    mocks.media.expect_save().times(1).returning(|upload| {
        ImagePath::for_upload("orphan", upload.format())
            .map_err(|err| MediaStoreError::io(err.to_string()))
    });
    mocks
        .posts
        .expect_create()
        .times(1)
        .returning(|_| Err(PostPersistenceError::query("insert failed")));
    mocks
        .media
        .expect_delete()
        .withf(|path| path.as_str() == "posts/orphan.gif")
        .times(1)
        .returning(|_| Ok(()));

    let upload = ImageUpload::new("small.gif", GIF.to_vec()).expect("valid gif");
    let err = mocks
        .into_service()
        .create_post(author.id(), draft("text", None, ImageChange::Replace(upload)))
        .await
        .expect_err("insert failed");
    assert_eq!(err.code(), ErrorCode::InternalError);
}

#[rstest]
#[case(Err(PostPersistenceError::query("update failed")), ErrorCode::InternalError)]
#[case(Ok(None), ErrorCode::NotFound)]
#[tokio::test]
async fn edit_post_removes_the_upload_when_the_update_fails(
    author: User,
    #[case] outcome: Result<Option<Post>, PostPersistenceError>,
    #[case] expected: ErrorCode,
) {
    let mut mocks = Mocks::default();
    let stored = post(7, &author, Some("posts/old.gif"));
    mocks
        .posts
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    mocks.media.expect_save().times(1).returning(|upload| {
        ImagePath::for_upload("orphan", upload.format())
            .map_err(|err| MediaStoreError::io(err.to_string()))
    });
    mocks
        .posts
        .expect_update()
        .times(1)
        .return_once(move |_, _| outcome);
    mocks
        .media
        .expect_delete()
        .withf(|path| path.as_str() == "posts/orphan.gif")
        .times(1)
        .returning(|_| Ok(()));

    let upload = ImageUpload::new("new.gif", GIF.to_vec()).expect("valid gif");
    let err = mocks
        .into_service()
        .edit_post(author.id(), PostId::new(7), draft("text", None, ImageChange::Replace(upload)))
        .await
        .expect_err("update failed");
    assert_eq!(err.code(), expected);
}

#[rstest]
#[tokio::test]
async fn add_comment_requires_existing_post(author: User) {
    let mut mocks = Mocks::default();
    mocks.posts.expect_find_by_id().returning(|_| Ok(None));
    mocks.comments.expect_create().never();

    let err = mocks
        .into_service()
        .add_comment(
            author.id(),
            PostId::new(404),
            CommentText::new("Тестовый комментарий").expect("valid text"),
        )
        .await
        .expect_err("missing post");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn post_detail_collects_comments_and_author_count(author: User) {
    let mut mocks = Mocks::default();
    let stored = post(3, &author, None);
    let author_id = *author.id();
    mocks
        .posts
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    mocks
        .posts
        .expect_count()
        .with(eq(PostFilter::Author(author_id)))
        .returning(|_| Ok(5));
    let commenter = author.clone();
    mocks.comments.expect_list_for_post().returning(move |post_id| {
        Ok(vec![Comment::new(
            crate::domain::CommentId::new(1),
            post_id,
            commenter.clone(),
            CommentText::new("Тестовый комментарий").expect("valid text"),
            fixture_timestamp(),
        )])
    });

    let detail = mocks
        .into_service()
        .post_detail(PostId::new(3))
        .await
        .expect("detail");
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.author_post_count, 5);
}

#[rstest]
#[tokio::test]
async fn delete_post_removes_image(author: User) {
    let mut mocks = Mocks::default();
    let stored = post(9, &author, Some("posts/old.gif"));
    mocks
        .posts
        .expect_find_by_id()
        .returning(move |_| Ok(Some(stored.clone())));
    mocks.posts.expect_delete().times(1).returning(|_| Ok(true));
    mocks.media.expect_delete().times(1).returning(|_| Ok(()));

    mocks
        .into_service()
        .delete_post(PostId::new(9))
        .await
        .expect("deleted");
}

#[tokio::test]
async fn create_group_surfaces_duplicate_slugs() {
    let mut mocks = Mocks::default();
    mocks.groups.expect_create().times(1).returning(|group| {
        Err(GroupPersistenceError::duplicate_slug(group.slug().as_str()))
    });
    let new_group = NewGroup::new("Cats", "cats", "All about cats").expect("valid group");

    let err = mocks
        .into_service()
        .create_group(&new_group)
        .await
        .expect_err("duplicate slug");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn delete_group_requires_an_existing_slug() {
    let mut mocks = Mocks::default();
    mocks
        .groups
        .expect_find_by_slug()
        .returning(|slug| Ok((slug.as_str() == "test-slug").then(group)));
    mocks.groups.expect_delete().times(1).returning(|_| Ok(true));
    let service = mocks.into_service();

    service.delete_group("test-slug").await.expect("deleted");
    let err = service
        .delete_group("missing")
        .await
        .expect_err("unknown group");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
