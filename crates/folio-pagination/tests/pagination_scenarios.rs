//! End-to-end pagination over an in-memory collection.

mod common;

use common::{article, doc, ids, TestCollection};
use folio_config::PaginationConfig;
use folio_core::{Accumulator, Filter, FolioError, SortSpec, Stage};
use folio_pagination::{AggregateOptions, KeysetOptions, OffsetOptions, PaginationEngine};
use serde_json::json;
use std::collections::HashSet;

fn newest_first(limit: u64, after: Option<String>) -> KeysetOptions {
    KeysetOptions {
        sort: Some(SortSpec::new().desc("createdAt")),
        limit: Some(limit),
        after,
        ..KeysetOptions::default()
    }
}

#[tokio::test]
async fn test_keyset_pages_through_collection() {
    let collection = TestCollection::articles(25);
    let engine = collection.engine();

    let first = engine.stream(&newest_first(10, None)).await.expect("first page");
    assert_eq!(first.docs().len(), 10);
    assert!(first.has_more());
    assert_eq!(ids(first.docs())[0], "a24");

    let second = engine
        .stream(&newest_first(10, first.next().map(str::to_string)))
        .await
        .expect("second page");
    assert_eq!(second.docs().len(), 10);
    assert!(second.has_more());
    assert_eq!(ids(second.docs())[0], "a14");

    let third = engine
        .stream(&newest_first(10, second.next().map(str::to_string)))
        .await
        .expect("third page");
    assert_eq!(ids(third.docs()), vec!["a04", "a03", "a02", "a01", "a00"]);
    assert!(!third.has_more());
    assert!(third.next().is_none());
}

fn oldest_first(limit: u64, after: Option<String>) -> KeysetOptions {
    KeysetOptions {
        sort: Some(SortSpec::new().asc("createdAt")),
        limit: Some(limit),
        after,
        ..KeysetOptions::default()
    }
}

#[tokio::test]
async fn test_keyset_ascending_splits_ten_ten_five() {
    let collection = TestCollection::articles(25);
    let engine = collection.engine();

    let first = engine.stream(&oldest_first(10, None)).await.expect("first page");
    assert_eq!(ids(first.docs())[0], "a00");
    assert!(first.has_more());

    let second = engine
        .stream(&oldest_first(10, first.next().map(str::to_string)))
        .await
        .expect("second page");
    assert_eq!(ids(second.docs())[0], "a10");
    assert_eq!(second.docs().len(), 10);
    assert!(second.has_more());

    let third = engine
        .stream(&oldest_first(10, second.next().map(str::to_string)))
        .await
        .expect("third page");
    assert_eq!(ids(third.docs()), vec!["a20", "a21", "a22", "a23", "a24"]);
    assert!(!third.has_more());
    assert!(third.next().is_none());
}

#[tokio::test]
async fn test_keyset_exact_multiple_ends_without_cursor() {
    let collection = TestCollection::articles(20);
    let engine = collection.engine();

    let first = engine.stream(&oldest_first(10, None)).await.expect("first page");
    assert_eq!(first.docs().len(), 10);
    assert!(first.has_more());

    let second = engine
        .stream(&oldest_first(10, first.next().map(str::to_string)))
        .await
        .expect("second page");
    assert_eq!(second.docs().len(), 10);
    assert_eq!(ids(second.docs()).last().map(String::as_str), Some("a19"));
    assert!(!second.has_more());
    assert!(second.next().is_none());
}

#[tokio::test]
async fn test_keyset_traversal_with_ties_has_no_gaps_or_duplicates() {
    // Four documents share each score, so pages split ties.
    let docs = (0..30)
        .map(|n| {
            doc(json!({
                "_id": format!("d{:02}", n),
                "score": n / 4,
            }))
        })
        .collect();
    let collection = TestCollection::new(docs);

    let mut seen = Vec::new();
    let mut after = None;
    loop {
        let page = collection
            .engine()
            .stream(&KeysetOptions {
                sort: Some(SortSpec::new().asc("score")),
                limit: Some(7),
                after: after.clone(),
                ..KeysetOptions::default()
            })
            .await
            .expect("page");
        seen.extend(ids(page.docs()));
        match page.next() {
            Some(next) => after = Some(next.to_string()),
            None => break,
        }
    }

    assert_eq!(seen.len(), 30);
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), 30);
    let expected: Vec<String> = (0..30).map(|n| format!("d{:02}", n)).collect();
    assert_eq!(seen, expected);
}

#[tokio::test]
async fn test_keyset_respects_base_filter() {
    let collection = TestCollection::articles(10);
    let options = KeysetOptions {
        filter: Filter::eq("category", "even"),
        sort: Some(SortSpec::new().asc("createdAt")),
        limit: Some(3),
        ..KeysetOptions::default()
    };

    let first = collection.engine().stream(&options).await.unwrap();
    assert_eq!(ids(first.docs()), vec!["a00", "a02", "a04"]);

    let second = collection
        .engine()
        .stream(&KeysetOptions {
            after: first.next().map(str::to_string),
            ..options
        })
        .await
        .unwrap();
    assert_eq!(ids(second.docs()), vec!["a06", "a08"]);
    assert!(!second.has_more());
}

#[tokio::test]
async fn test_cursor_from_another_sort_is_rejected() {
    let collection = TestCollection::articles(5);
    let page = collection.engine().stream(&newest_first(2, None)).await.unwrap();
    let token = page.next().unwrap().to_string();

    let err = collection
        .engine()
        .stream(&KeysetOptions {
            sort: Some(SortSpec::new().asc("createdAt")),
            after: Some(token),
            limit: Some(2),
            ..KeysetOptions::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::CursorSortMismatch));
    assert_eq!(err.status_code(), 400);
}

#[tokio::test]
async fn test_cursor_from_older_format_version_is_rejected() {
    let collection = TestCollection::articles(5);
    let page = collection.engine().stream(&newest_first(2, None)).await.unwrap();
    let token = page.next().unwrap().to_string();

    let upgraded = PaginationEngine::new(
        collection.store(),
        PaginationConfig {
            cursor_version: 2,
            ..PaginationConfig::default()
        },
    );
    let err = upgraded
        .stream(&newest_first(2, Some(token)))
        .await
        .unwrap_err();
    assert!(matches!(err, FolioError::CursorVersionMismatch { expected: 2, found: 1 }));
}

#[tokio::test]
async fn test_offset_pages_do_not_overlap() {
    let collection = TestCollection::articles(25);
    let mut all = Vec::new();
    for page in 1..=3 {
        let result = collection
            .engine()
            .paginate(&OffsetOptions {
                sort: Some(SortSpec::new().asc("createdAt")),
                page: Some(page),
                limit: Some(10),
                ..OffsetOptions::default()
            })
            .await
            .expect("offset page");
        assert_eq!(result.total(), 25);
        assert_eq!(result.pages(), 3);
        all.extend(ids(result.docs()));
    }

    assert_eq!(all.len(), 25);
    assert_eq!(all.iter().collect::<HashSet<_>>().len(), 25);
}

#[tokio::test]
async fn test_offset_beyond_last_page_is_empty() {
    let collection = TestCollection::articles(5);
    let result = collection
        .engine()
        .paginate(&OffsetOptions {
            page: Some(4),
            limit: Some(2),
            ..OffsetOptions::default()
        })
        .await
        .unwrap();
    assert!(result.docs().is_empty());
    assert_eq!(result.total(), 5);
    assert!(!result.has_next());
    assert!(result.has_prev());
}

#[tokio::test]
async fn test_aggregate_paginate_groups() {
    let mut docs = Vec::new();
    for (customer, count) in [("A", 5), ("B", 3), ("C", 2)] {
        for i in 0..count {
            docs.push(doc(json!({"_id": format!("{}{}", customer, i), "customer": customer})));
        }
    }
    let collection = TestCollection::new(docs);

    let options = AggregateOptions {
        pipeline: vec![
            Stage::Group {
                by: Some("customer".to_string()),
                accumulators: vec![("count".to_string(), Accumulator::Count)],
            },
            Stage::Sort(SortSpec::new().desc("count")),
        ],
        page: Some(1),
        limit: Some(2),
    };

    let first = collection.engine().aggregate_paginate(&options).await.unwrap();
    assert_eq!(first.docs().len(), 2);
    assert_eq!(first.total(), 3);
    assert_eq!(first.pages(), 2);
    assert!(first.has_next());
    assert_eq!(first.docs()[0].get("_id"), Some(&json!("A")));
    assert_eq!(first.docs()[0].get("count"), Some(&json!(5)));

    let second = collection
        .engine()
        .aggregate_paginate(&AggregateOptions {
            page: Some(2),
            ..options
        })
        .await
        .unwrap();
    assert_eq!(second.docs().len(), 1);
    assert_eq!(second.docs()[0].get("_id"), Some(&json!("C")));
}

#[tokio::test]
async fn test_missing_sort_field_orders_first_ascending() {
    let collection = TestCollection::new(vec![
        article(1),
        doc(json!({"_id": "draft", "title": "No date"})),
        article(2),
    ]);
    let page = collection
        .engine()
        .stream(&KeysetOptions {
            sort: Some(SortSpec::new().asc("createdAt")),
            limit: Some(1),
            ..KeysetOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(page.docs()), vec!["draft"]);

    let rest = collection
        .engine()
        .stream(&KeysetOptions {
            sort: Some(SortSpec::new().asc("createdAt")),
            limit: Some(5),
            after: page.next().map(str::to_string),
            ..KeysetOptions::default()
        })
        .await
        .unwrap();
    assert_eq!(ids(rest.docs()), vec!["a01", "a02"]);
}
