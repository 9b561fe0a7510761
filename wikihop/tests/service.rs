//! Search, explore, and cache-admin service behavior.

mod common;

use std::sync::Arc;

use common::{StubLinkSource, memory};
use pretty_assertions::assert_eq;
use wikihop::{BfsPathFinder, CacheAdmin, ExploreService, SearchService};
use wikihop_core::{Error, ExploreRequest, JsonStore, SearchRequest, Store, keys};

fn search_service(
    source: Arc<StubLinkSource>,
    store: &Arc<wikihop_memory::MemoryStore>,
) -> SearchService {
    let finder = BfsPathFinder::new(source.clone(), store.clone(), store.clone());
    SearchService::new(Arc::new(finder), store.clone(), source)
}

#[tokio::test]
async fn successful_results_are_cached_and_reused() {
    let store = memory();
    let source = Arc::new(StubLinkSource::from_graph(&[("A", &["B"])]));
    let service = search_service(source.clone(), &store);

    let first = service.find_path(&SearchRequest::new("A", "B")).await.unwrap();
    assert_eq!(first.path, vec!["A", "B"]);
    assert_eq!(first.length, 2);
    assert!(first.is_valid());
    assert_eq!(source.call_count(), 1);

    // Second request is served from path:{start}:{end} without the engine.
    let second = service.find_path(&SearchRequest::new("A", "B")).await.unwrap();
    assert_eq!(second, first);
    assert_eq!(source.call_count(), 1);

    let cached = store
        .get_json::<wikihop_core::PathResult>(&keys::path_result("A", "B"))
        .await
        .unwrap();
    assert_eq!(cached, Some(first));
}

#[tokio::test]
async fn equal_or_empty_titles_are_rejected() {
    let store = memory();
    let source = Arc::new(StubLinkSource::from_graph(&[("A", &["B"])]));
    let service = search_service(source, &store);

    let err = service
        .find_path(&SearchRequest::new("Same", "Same"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPage(_)), "got {err:?}");

    let err = service.find_path(&SearchRequest::new("", "B")).await.unwrap_err();
    assert!(matches!(err, Error::InvalidPage(_)), "got {err:?}");
}

#[tokio::test]
async fn titles_are_trimmed_before_searching() {
    let store = memory();
    let source = Arc::new(StubLinkSource::from_graph(&[("A", &["B"])]));
    let service = search_service(source, &store);

    let result = service
        .find_path(&SearchRequest::new("  A  ", " B "))
        .await
        .unwrap();
    assert_eq!(result.start_page, "A");
    assert_eq!(result.end_page, "B");
    assert_eq!(result.path, vec!["A", "B"]);
}

#[tokio::test]
async fn path_not_found_is_not_cached() {
    let store = memory();
    let source = Arc::new(StubLinkSource::from_graph(&[("A", &["X"]), ("X", &[])]));
    let service = search_service(source.clone(), &store);

    let request = SearchRequest::new("A", "B");
    assert!(matches!(
        service.find_path(&request).await.unwrap_err(),
        Error::PathNotFound { .. }
    ));
    let calls_after_first = source.call_count();

    // A negative outcome is recomputed, not served from cache.
    assert!(matches!(
        service.find_path(&request).await.unwrap_err(),
        Error::PathNotFound { .. }
    ));
    assert!(source.call_count() > calls_after_first);
    assert!(!store.exists(&keys::path_result("A", "B")).await.unwrap());
}

#[tokio::test]
async fn validate_pages_probes_both_endpoints() {
    let store = memory();
    let source = Arc::new(StubLinkSource::from_graph(&[]).with_missing(&["Ghost"]));
    let service = search_service(source, &store);

    assert_eq!(service.validate_pages("Real", "Ghost").await, (true, false));
    assert_eq!(service.validate_pages("Ghost", "Real").await, (false, true));
}

#[tokio::test]
async fn explore_builds_a_capped_star_graph() {
    let store = memory();
    let source = Arc::new(StubLinkSource::from_graph(&[(
        "Hub",
        &["A", "B", "C", "D", "E"],
    )]));
    let service = ExploreService::new(source.clone(), store.clone());

    let result = service
        .explore(&ExploreRequest {
            start: "Hub".into(),
            max_links: 3,
        })
        .await
        .unwrap();

    assert_eq!(result.start_page, "Hub");
    assert_eq!(result.nodes, vec!["Hub", "A", "B", "C"]);
    assert_eq!(
        result.edges,
        vec![
            ("Hub".to_owned(), "A".to_owned()),
            ("Hub".to_owned(), "B".to_owned()),
            ("Hub".to_owned(), "C".to_owned()),
        ]
    );
    assert_eq!(result.total_links, 5);

    // Served from explore:{start}:{max_links} the second time.
    let again = service
        .explore(&ExploreRequest {
            start: "Hub".into(),
            max_links: 3,
        })
        .await
        .unwrap();
    assert_eq!(again, result);
    assert_eq!(source.call_count(), 1);
}

#[tokio::test]
async fn explore_rejects_missing_or_invalid_pages() {
    let store = memory();
    let source = Arc::new(StubLinkSource::from_graph(&[]).with_missing(&["Ghost"]));
    let service = ExploreService::new(source, store);

    let err = service
        .explore(&ExploreRequest {
            start: "Ghost".into(),
            max_links: 10,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPage(_)), "got {err:?}");

    let err = service
        .explore(&ExploreRequest {
            start: "  ".into(),
            max_links: 10,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidPage(_)), "got {err:?}");
}

#[tokio::test]
async fn explore_of_a_leaf_page_returns_the_bare_node() {
    let store = memory();
    let source = Arc::new(StubLinkSource::from_graph(&[("Leaf", &[])]));
    let service = ExploreService::new(source, store);

    let result = service
        .explore(&ExploreRequest {
            start: "Leaf".into(),
            max_links: 10,
        })
        .await
        .unwrap();
    assert_eq!(result.nodes, vec!["Leaf"]);
    assert!(result.edges.is_empty());
    assert_eq!(result.total_links, 0);
}

#[tokio::test]
async fn cache_admin_clears_by_pattern() {
    let store = memory();
    store
        .set_json(&keys::wiki_links("A"), &vec!["B".to_owned()], None)
        .await
        .unwrap();
    store
        .set_json(&keys::wiki_links("B"), &Vec::<String>::new(), None)
        .await
        .unwrap();
    store
        .set_json(&keys::path_result("A", "B"), &"other", None)
        .await
        .unwrap();

    let admin = CacheAdmin::new(store.clone());
    assert_eq!(admin.clear("wiki_links:*").await.unwrap(), 2);
    assert!(!store.exists(&keys::wiki_links("A")).await.unwrap());
    assert!(store.exists(&keys::path_result("A", "B")).await.unwrap());
}
