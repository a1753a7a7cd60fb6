//! End-to-end repository tests over the file-backed store.

use std::collections::HashSet;

use chrono::{TimeZone, Utc};
use futures_util::TryStreamExt;
use tempfile::TempDir;
use userbase_core::{
    Datasource, Filter, Keyspace, NewUser, PageToken, Patch, UserId, UserPatch, UserRepository,
};
use userbase_file::{FileClient, FileCluster};

async fn setup() -> (TempDir, Datasource<FileClient>, UserRepository<FileClient>) {
    let dir = TempDir::new().unwrap();
    let cluster = FileCluster::new(dir.path(), Keyspace::new("userbase_test").unwrap());
    let datasource = Datasource::init(&cluster).await.unwrap();
    let repo = UserRepository::from_datasource(&datasource);
    repo.init_schema().await.unwrap();
    (dir, datasource, repo)
}

fn user(n: usize) -> NewUser {
    NewUser::new(format!("user{}", n), format!("user{}@x.com", n))
}

#[tokio::test]
async fn end_to_end_create_find_list() {
    let (_dir, _ds, repo) = setup().await;

    let created = repo
        .create(NewUser::new("A", "a@x.com").with_age(1))
        .await
        .unwrap();
    assert_eq!(created.name, "A");
    assert_eq!(created.age, Some(1));

    let found = repo.find_by_id(&created.id).await.unwrap();
    assert_eq!(found, created);

    let filter: Filter = serde_json::from_str(r#"{"where": {"name": "A"}}"#).unwrap();
    let page = repo.list(Some(&filter), None).await.unwrap();
    assert_eq!(page.users, vec![created]);
    assert!(page.next_page_state.is_none());
}

#[tokio::test]
async fn create_assigns_distinct_ids() {
    let (_dir, _ds, repo) = setup().await;
    let a = repo.create(user(1)).await.unwrap();
    let b = repo.create(user(1)).await.unwrap();
    assert_ne!(a.id, b.id);
    assert!(!a.id.to_string().is_empty());
}

#[tokio::test]
async fn create_keeps_supplied_timestamp_at_millisecond_precision() {
    let (_dir, _ds, repo) = setup().await;
    let at = Utc.timestamp_opt(1_700_000_000, 987_654_321).unwrap();

    let created = repo
        .create(user(1).with_created_at(at))
        .await
        .unwrap();
    assert_eq!(created.created_at.timestamp_millis(), at.timestamp_millis());

    let found = repo.find_by_id(&created.id).await.unwrap();
    assert_eq!(found.created_at, created.created_at);
}

#[tokio::test]
async fn pages_of_two_cover_five_users_without_overlap() {
    let (_dir, _ds, repo) = setup().await;
    let mut expected = HashSet::new();
    for n in 0..5 {
        expected.insert(repo.create(user(n)).await.unwrap().id);
    }

    let filter = Filter::new().with_limit(2);
    let mut seen = HashSet::new();
    let mut token: Option<PageToken> = None;
    let mut sizes = Vec::new();
    loop {
        let page = repo.list(Some(&filter), token.as_ref()).await.unwrap();
        sizes.push(page.users.len());
        for u in &page.users {
            assert!(seen.insert(u.id), "user {} returned twice", u.id);
        }
        match page.next_page_state {
            Some(next) => token = Some(next),
            None => break,
        }
    }

    assert_eq!(sizes, [2, 2, 1]);
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn stream_yields_every_user() {
    let (_dir, _ds, repo) = setup().await;
    for n in 0..5 {
        repo.create(user(n)).await.unwrap();
    }

    let users: Vec<_> = repo
        .stream(Some(Filter::new().with_limit(2)))
        .try_collect()
        .await
        .unwrap();
    assert_eq!(users.len(), 5);
}

#[tokio::test]
async fn count_after_three_creates_and_one_delete() {
    let (_dir, _ds, repo) = setup().await;
    assert_eq!(repo.count().await.unwrap(), 0);

    let first = repo.create(user(1)).await.unwrap();
    repo.create(user(2)).await.unwrap();
    repo.create(user(3)).await.unwrap();
    repo.delete_by_id(&first.id).await.unwrap();

    assert_eq!(repo.count().await.unwrap(), 2);
}

#[tokio::test]
async fn find_unknown_id_is_not_found() {
    let (_dir, _ds, repo) = setup().await;
    let err = repo.find_by_id(&UserId::generate()).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn delete_then_find_is_not_found() {
    let (_dir, _ds, repo) = setup().await;
    let created = repo.create(user(1)).await.unwrap();

    repo.delete_by_id(&created.id).await.unwrap();
    assert!(repo.find_by_id(&created.id).await.unwrap_err().is_not_found());
    assert!(!repo.exists_by_id(&created.id).await.unwrap());
}

#[tokio::test]
async fn age_only_update_keeps_other_fields() {
    let (_dir, _ds, repo) = setup().await;
    let created = repo.create(user(1)).await.unwrap();

    let patch = UserPatch {
        age: Patch::Set(44),
        ..Default::default()
    };
    repo.update_by_id(&created.id, patch).await.unwrap();

    let found = repo.find_by_id(&created.id).await.unwrap();
    assert_eq!(found.age, Some(44));
    assert_eq!(found.name, created.name);
    assert_eq!(found.email, created.email);
    assert_eq!(found.created_at, created.created_at);
}

#[tokio::test]
async fn filters_by_range_and_membership() {
    let (_dir, _ds, repo) = setup().await;
    for (n, age) in [(0, 17), (1, 18), (2, 40), (3, 65)] {
        repo.create(user(n).with_age(age)).await.unwrap();
    }

    let adults: Filter =
        serde_json::from_str(r#"{"where": {"age": {"gte": 18, "lt": 65}}}"#).unwrap();
    let page = repo.list(Some(&adults), None).await.unwrap();
    let mut names: Vec<_> = page.users.into_iter().map(|u| u.name).collect();
    names.sort();
    assert_eq!(names, ["user1", "user2"]);

    let chosen: Filter = serde_json::from_str(
        r#"{"where": {"and": [{"name": {"inq": ["user0", "user3"]}}, {"age": {"gt": 20}}]}}"#,
    )
    .unwrap();
    let page = repo.list(Some(&chosen), None).await.unwrap();
    assert_eq!(page.users.len(), 1);
    assert_eq!(page.users[0].name, "user3");
}

#[tokio::test]
async fn stopped_datasource_is_unavailable() {
    let (_dir, datasource, repo) = setup().await;
    datasource.stop().await.unwrap();

    let err = repo.count().await.unwrap_err();
    assert!(err.is_unavailable());
}
