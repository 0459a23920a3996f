//! Cursor pagination behavior of the liker listings.

mod support;

use std::sync::Arc;

use time::macros::datetime;

use smitten::application::decisions::DecisionError;
use smitten::application::pagination::PaginationError;
use smitten::application::repos::RepoError;
use smitten::domain::decisions::UserId;
use smitten::domain::error::DomainError;

use support::{InMemoryDecisions, new_service};

async fn seed_likers(service: &smitten::application::decisions::DecisionService, count: u64) {
    for actor in 2..(2 + count) {
        service.put_decision(actor, 1, true).await.expect("seed like");
    }
}

#[tokio::test]
async fn pages_are_stable_and_strictly_ordered() {
    let repo = Arc::new(InMemoryDecisions::new());
    let service = new_service(&repo);
    seed_likers(&service, 25).await;

    let mut seen: Vec<UserId> = Vec::new();
    let mut cursor: Option<String> = None;
    let mut sizes = Vec::new();

    loop {
        let page = service
            .list_likers(1, cursor.as_deref(), Some(7))
            .await
            .expect("page");
        sizes.push(page.items.len());
        seen.extend(page.items.iter().map(|liker| liker.actor_id));

        // Strictly descending within and across pages.
        for pair in page.items.windows(2) {
            assert!(
                (pair[0].updated_at, pair[0].actor_id) > (pair[1].updated_at, pair[1].actor_id)
            );
        }

        match page.next_cursor {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    assert_eq!(sizes, vec![7, 7, 7, 4]);
    assert_eq!(seen.len(), 25);
    let mut deduped = seen.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), 25, "no liker may appear twice");
    // Writes happened in actor order, so the newest decision wins.
    assert_eq!(seen.first(), Some(&26));
    assert_eq!(seen.last(), Some(&2));
}

#[tokio::test]
async fn single_item_pages_walk_the_whole_set() {
    let repo = Arc::new(InMemoryDecisions::new());
    let service = new_service(&repo);
    seed_likers(&service, 2).await;

    let first = service.list_likers(1, None, Some(1)).await.expect("page 1");
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.items[0].actor_id, 3);
    let cursor = first.next_cursor.expect("cursor after first page");

    let second = service
        .list_likers(1, Some(&cursor), Some(1))
        .await
        .expect("page 2");
    assert_eq!(second.items.len(), 1);
    assert_eq!(second.items[0].actor_id, 2);
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn timestamp_ties_break_on_actor_id() {
    let repo = Arc::new(InMemoryDecisions::new());
    let service = new_service(&repo);

    let at = datetime!(2025-06-01 12:00:00.000 UTC);
    repo.insert_raw(5, 1, true, at);
    repo.insert_raw(6, 1, true, at);
    repo.insert_raw(7, 1, true, at);

    let first = service.list_likers(1, None, Some(2)).await.expect("page 1");
    let actors: Vec<UserId> = first.items.iter().map(|liker| liker.actor_id).collect();
    assert_eq!(actors, vec![7, 6]);

    let cursor = first.next_cursor.expect("cursor into the tie");
    let second = service
        .list_likers(1, Some(&cursor), Some(2))
        .await
        .expect("page 2");
    let actors: Vec<UserId> = second.items.iter().map(|liker| liker.actor_id).collect();
    assert_eq!(actors, vec![5]);
    assert!(second.next_cursor.is_none());
}

#[tokio::test]
async fn garbage_cursors_are_rejected() {
    let repo = Arc::new(InMemoryDecisions::new());
    let service = new_service(&repo);
    seed_likers(&service, 3).await;

    let err = service
        .list_likers(1, Some("!!not-a-cursor!!"), None)
        .await
        .expect_err("invalid cursor");
    assert!(matches!(
        err,
        DecisionError::Repo(RepoError::Pagination(PaginationError::InvalidCursor(_)))
    ));
}

#[tokio::test]
async fn non_positive_limits_are_rejected() {
    let repo = Arc::new(InMemoryDecisions::new());
    let service = new_service(&repo);
    seed_likers(&service, 3).await;

    for limit in [0, -1, -20] {
        let err = service
            .list_likers(1, None, Some(limit))
            .await
            .expect_err("invalid limit");
        assert!(matches!(
            err,
            DecisionError::Domain(DomainError::Validation { .. })
        ));
    }
}

#[tokio::test]
async fn missing_token_means_first_page() {
    let repo = Arc::new(InMemoryDecisions::new());
    let service = new_service(&repo);
    seed_likers(&service, 3).await;

    let explicit_empty = service.list_likers(1, Some(""), None).await.expect("page");
    let absent = service.list_likers(1, None, None).await.expect("page");
    assert_eq!(explicit_empty.items, absent.items);
    assert_eq!(absent.items.len(), 3);
}
