//! Port-level behaviour shared by every adapter: error rendering and the
//! shape of the generated mocks.
use super::*;
use crate::domain::{PostFilter, PostId};
use mockall::predicate::eq;
use rstest::rstest;

#[rstest]
#[case(UserPersistenceError::duplicate_username("hater").to_string(), "username hater is already taken")]
#[case(GroupPersistenceError::duplicate_slug("cats").to_string(), "group slug cats is already in use")]
#[case(PostPersistenceError::connection("refused").to_string(), "post repository connection failed: refused")]
#[case(MediaStoreError::not_found("posts/a.gif").to_string(), "media file posts/a.gif not found")]
#[case(PageCacheError::backend("down").to_string(), "page cache backend failure: down")]
fn port_errors_render_messages(#[case] rendered: String, #[case] expected: &str) {
    assert_eq!(rendered, expected);
}

#[tokio::test]
async fn post_repository_mock_honours_filters() {
    let mut repo = MockPostRepository::new();
    repo.expect_count()
        .with(eq(PostFilter::All))
        .times(1)
        .returning(|_| Ok(13));
    repo.expect_find_by_id()
        .with(eq(PostId::new(99)))
        .returning(|_| Ok(None));

    let repo: &dyn PostRepository = &repo;
    assert_eq!(repo.count(PostFilter::All).await.expect("count"), 13);
    assert!(repo.find_by_id(PostId::new(99)).await.expect("lookup").is_none());
}

#[rstest]
fn password_hasher_mock_is_synchronous() {
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .returning(|password, hash| Ok(password == "pw" && hash == "stored"));
    assert!(hasher.verify("pw", "stored").expect("verify"));
    assert!(!hasher.verify("other", "stored").expect("verify"));
}
