//! Behaviour of the in-memory store: ordering, uniqueness and cascades.

use chrono::{Duration, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::UserProfile;

#[fixture]
fn store() -> MemoryStore {
    MemoryStore::new()
}

fn new_user(name: &str) -> NewUser {
    NewUser {
        id: UserId::random(),
        username: Username::new(name).expect("username"),
        profile: UserProfile::new("", "", None).expect("profile"),
        password_hash: String::from("hash"),
    }
}

fn new_post(author: &User, group: Option<GroupId>, minutes: i64) -> NewPost {
    let base = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).single().expect("date");
    NewPost {
        text: PostText::new(format!("post at {minutes}")).expect("text"),
        author: *author.id(),
        group,
        image: None,
        pub_date: base + Duration::minutes(minutes),
    }
}

async fn seed_group(store: &MemoryStore, slug: &str) -> Group {
    let group = NewGroup::new("Test group", slug, "Description").expect("group");
    GroupRepository::create(store, &group).await.expect("group stored")
}

#[rstest]
#[tokio::test]
async fn duplicate_usernames_are_rejected(store: MemoryStore) {
    UserRepository::create(&store, &new_user("leo"))
        .await
        .expect("first user");
    let err = UserRepository::create(&store, &new_user("leo"))
        .await
        .expect_err("duplicate");
    assert!(matches!(err, UserPersistenceError::DuplicateUsername { .. }));
}

#[rstest]
#[tokio::test]
async fn duplicate_group_slugs_are_rejected(store: MemoryStore) {
    let first = seed_group(&store, "cats").await;
    let clash = NewGroup::new("Other cats", "cats", "Same slug").expect("group");
    let err = GroupRepository::create(&store, &clash)
        .await
        .expect_err("duplicate slug");
    assert!(matches!(err, GroupPersistenceError::DuplicateSlug { .. }));

    let stored = GroupRepository::find_by_slug(&store, first.slug())
        .await
        .expect("lookup")
        .expect("group kept");
    assert_eq!(stored.title(), "Test group");
}

#[rstest]
#[tokio::test]
async fn listings_are_newest_first_and_windowed(store: MemoryStore) {
    let author = UserRepository::create(&store, &new_user("leo"))
        .await
        .expect("user");
    for minutes in 0..5 {
        PostRepository::create(&store, &new_post(&author, None, minutes))
            .await
            .expect("post");
    }

    let page = PostRepository::list(&store, PostFilter::All, 1, 2).await.expect("list");
    let texts: Vec<&str> = page.iter().map(Post::text).collect();
    assert_eq!(texts, vec!["post at 3", "post at 2"]);
    assert_eq!(store.count(PostFilter::All).await.expect("count"), 5);
}

#[rstest]
#[tokio::test]
async fn follow_feed_only_shows_followed_authors(store: MemoryStore) {
    let reader = UserRepository::create(&store, &new_user("reader"))
        .await
        .expect("reader");
    let followed = UserRepository::create(&store, &new_user("followed"))
        .await
        .expect("followed");
    let other = UserRepository::create(&store, &new_user("other"))
        .await
        .expect("other");
    PostRepository::create(&store, &new_post(&followed, None, 1))
        .await
        .expect("post");
    PostRepository::create(&store, &new_post(&other, None, 2))
        .await
        .expect("post");

    let edge = Follow::new(*reader.id(), *followed.id()).expect("follow");
    store.follow(&edge).await.expect("follow");
    store.follow(&edge).await.expect("follow twice");

    let feed = PostFilter::FollowedBy(*reader.id());
    assert_eq!(store.count(feed).await.expect("count"), 1);
    assert_eq!(
        store.count(PostFilter::FollowedBy(*other.id())).await.expect("count"),
        0
    );
    assert!(store.unfollow(reader.id(), followed.id()).await.expect("unfollow"));
    assert_eq!(store.count(feed).await.expect("count"), 0);
}

#[rstest]
#[tokio::test]
async fn deleting_a_group_keeps_its_posts(store: MemoryStore) {
    let author = UserRepository::create(&store, &new_user("leo"))
        .await
        .expect("user");
    let group = seed_group(&store, "cats").await;
    let post = PostRepository::create(&store, &new_post(&author, Some(group.id()), 0))
        .await
        .expect("post");

    assert!(GroupRepository::delete(&store, group.slug()).await.expect("delete"));

    let reloaded = PostRepository::find_by_id(&store, post.id())
        .await
        .expect("find")
        .expect("post survives");
    assert!(reloaded.group().is_none());
}

#[rstest]
#[tokio::test]
async fn deleting_a_post_drops_its_comments(store: MemoryStore) {
    let author = UserRepository::create(&store, &new_user("leo"))
        .await
        .expect("user");
    let post = PostRepository::create(&store, &new_post(&author, None, 0))
        .await
        .expect("post");
    CommentRepository::create(
        &store,
        &NewComment {
            post: post.id(),
            author: *author.id(),
            text: CommentText::new("nice").expect("text"),
            created: post.pub_date(),
        },
    )
    .await
    .expect("comment");

    assert!(PostRepository::delete(&store, post.id()).await.expect("delete"));
    assert!(store.list_for_post(post.id()).await.expect("list").is_empty());
}

#[rstest]
#[tokio::test]
async fn posts_need_existing_groups(store: MemoryStore) {
    let author = UserRepository::create(&store, &new_user("leo"))
        .await
        .expect("user");
    let missing = GroupId::new(42).expect("id");
    let err = PostRepository::create(&store, &new_post(&author, Some(missing), 0))
        .await
        .expect_err("missing group");
    assert!(matches!(err, PostPersistenceError::MissingReference { .. }));
}

#[rstest]
#[tokio::test]
async fn deleting_a_user_cascades(store: MemoryStore) {
    let author = UserRepository::create(&store, &new_user("leo"))
        .await
        .expect("user");
    PostRepository::create(&store, &new_post(&author, None, 0))
        .await
        .expect("post");

    assert!(UserRepository::delete(&store, author.id()).await.expect("delete"));
    assert_eq!(store.count(PostFilter::All).await.expect("count"), 0);
}
