//! Engine behavior over synthetic link graphs.

mod common;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common::{StubLinkSource, memory};
use pretty_assertions::assert_eq;
use wikihop::{BfsPathFinder, CancelFlag, PathFinder};
use wikihop_core::{Error, ProgressSink, SearchProgress};

fn finder(source: StubLinkSource, store: &Arc<wikihop_memory::MemoryStore>) -> BfsPathFinder {
    BfsPathFinder::new(Arc::new(source), store.clone(), store.clone()).max_depth(6)
}

#[tokio::test]
async fn direct_link_is_found_in_one_pop() {
    let store = memory();
    let finder = finder(StubLinkSource::from_graph(&[("A", &["B", "C"])]), &store);

    let outcome = finder.find("A", "B").await.unwrap();
    assert_eq!(outcome.path, vec!["A", "B"]);
    assert_eq!(outcome.nodes_explored, 1);
}

#[tokio::test]
async fn two_hop_path_is_shortest() {
    let store = memory();
    let finder = finder(
        StubLinkSource::from_graph(&[("A", &["X", "Y"]), ("X", &["B", "Z"]), ("Y", &["Z"])]),
        &store,
    );

    let outcome = finder.find("A", "B").await.unwrap();
    assert_eq!(outcome.path, vec!["A", "X", "B"]);
}

#[tokio::test]
async fn shorter_branch_wins_over_longer() {
    let store = memory();
    let finder = finder(
        StubLinkSource::from_graph(&[
            ("A", &["B", "C"]),
            ("B", &["X"]),
            ("X", &["T"]),
            ("C", &["T"]),
        ]),
        &store,
    );

    let outcome = finder.find("A", "T").await.unwrap();
    assert_eq!(outcome.path, vec!["A", "C", "T"]);
}

#[tokio::test]
async fn equal_depth_tie_resolves_to_first_in_link_order() {
    let store = memory();
    let finder = finder(
        StubLinkSource::from_graph(&[("A", &["P", "Q"]), ("P", &["T"]), ("Q", &["T"])]),
        &store,
    );

    let outcome = finder.find("A", "T").await.unwrap();
    assert_eq!(outcome.path, vec!["A", "P", "T"]);
}

#[tokio::test]
async fn cycles_do_not_revisit_pages() {
    let store = memory();
    let finder = finder(
        StubLinkSource::from_graph(&[
            ("A", &["B"]),
            ("B", &["A", "C"]),
            ("C", &["A", "B", "T"]),
        ]),
        &store,
    );

    let outcome = finder.find("A", "T").await.unwrap();
    assert_eq!(outcome.path, vec!["A", "B", "C", "T"]);

    let mut unique = outcome.path.clone();
    unique.dedup();
    assert_eq!(unique, outcome.path, "path must be simple");
}

#[tokio::test]
async fn unreachable_target_raises_path_not_found() {
    let store = memory();
    let finder = finder(
        StubLinkSource::from_graph(&[
            ("A", &["X"]),
            ("X", &["A"]),
            ("B", &["Y"]),
            ("Y", &["B"]),
        ]),
        &store,
    )
    .max_depth(3);

    let err = finder.find("A", "B").await.unwrap_err();
    assert!(matches!(err, Error::PathNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn depth_cap_stops_the_search() {
    let store = memory();
    let finder = finder(
        StubLinkSource::from_graph(&[
            ("A", &["1"]),
            ("1", &["2"]),
            ("2", &["3"]),
            ("3", &["4"]),
            ("4", &["B"]),
        ]),
        &store,
    )
    .max_depth(2);

    let err = finder.find("A", "B").await.unwrap_err();
    assert!(matches!(err, Error::PathNotFound { .. }), "got {err:?}");
}

#[tokio::test]
async fn same_page_short_circuits_without_store_writes() {
    let store = memory();
    let source = StubLinkSource::from_graph(&[("A", &["B"])]);
    let finder = BfsPathFinder::new(Arc::new(source), store.clone(), store.clone());

    let outcome = finder.find("A", "A").await.unwrap();
    assert_eq!(outcome.path, vec!["A"]);
    assert_eq!(outcome.nodes_explored, 1);
    assert_eq!(store.key_count(), 0, "same-page search must not touch the store");
}

#[tokio::test]
async fn empty_titles_are_invalid() {
    let store = memory();
    let finder = finder(StubLinkSource::from_graph(&[("A", &["B"])]), &store);

    assert!(matches!(
        finder.find("", "B").await.unwrap_err(),
        Error::InvalidPage(_)
    ));
    assert!(matches!(
        finder.find("A", "   ").await.unwrap_err(),
        Error::InvalidPage(_)
    ));
}

#[tokio::test]
async fn nonexistent_endpoints_are_invalid() {
    let store = memory();
    let source = StubLinkSource::from_graph(&[("A", &["B"])]).with_missing(&["Ghost"]);
    let finder = BfsPathFinder::new(Arc::new(source), store.clone(), store.clone());

    assert!(matches!(
        finder.find("Ghost", "B").await.unwrap_err(),
        Error::InvalidPage(_)
    ));
    assert!(matches!(
        finder.find("A", "Ghost").await.unwrap_err(),
        Error::InvalidPage(_)
    ));
}

#[tokio::test]
async fn session_state_is_cleaned_after_success() {
    let store = memory();
    let finder = finder(
        StubLinkSource::from_graph(&[("A", &["X"]), ("X", &["B"])]),
        &store,
    );

    finder.find("A", "B").await.unwrap();
    assert_eq!(store.keys_matching("bfs_*"), Vec::<String>::new());
}

#[tokio::test]
async fn session_state_is_cleaned_after_failure() {
    let store = memory();
    let finder = finder(StubLinkSource::from_graph(&[("A", &["X"]), ("X", &[])]), &store);

    finder.find("A", "B").await.unwrap_err();
    assert_eq!(store.keys_matching("bfs_*"), Vec::<String>::new());
}

#[tokio::test]
async fn upstream_errors_propagate_and_still_clean_up() {
    let store = memory();
    let source = StubLinkSource::from_graph(&[("A", &["B"])]).with_failures(1);
    let finder = BfsPathFinder::new(Arc::new(source), store.clone(), store.clone());

    let err = finder.find("A", "B").await.unwrap_err();
    assert!(matches!(err, Error::Upstream(_)), "got {err:?}");
    assert_eq!(store.keys_matching("bfs_*"), Vec::<String>::new());
}

#[tokio::test]
async fn cancelled_search_exits_with_soft_timeout() {
    let store = memory();
    let cancel = CancelFlag::new();
    cancel.cancel();
    let finder = finder(StubLinkSource::from_graph(&[("A", &["B"])]), &store)
        .cancel_flag(cancel);

    let err = finder.find("A", "C").await.unwrap_err();
    assert!(matches!(err, Error::SoftTimeout), "got {err:?}");
    assert_eq!(store.keys_matching("bfs_*"), Vec::<String>::new());
}

struct RecordingSink(Mutex<Vec<SearchProgress>>);

#[async_trait]
impl ProgressSink for RecordingSink {
    async fn report(&self, progress: &SearchProgress) {
        self.0.lock().unwrap().push(progress.clone());
    }
}

#[tokio::test]
async fn progress_is_reported_every_three_pops() {
    let store = memory();
    let sink = Arc::new(RecordingSink(Mutex::new(Vec::new())));
    let source = StubLinkSource::from_graph(&[
        ("A", &["B"]),
        ("B", &["C"]),
        ("C", &["D"]),
        ("D", &["T"]),
    ]);
    let finder = BfsPathFinder::new(Arc::new(source), store.clone(), store.clone())
        .progress(sink.clone());

    finder.find("A", "T").await.unwrap();

    let reports = sink.0.lock().unwrap();
    assert_eq!(reports.len(), 1, "4 pops -> one report at pop 3");
    assert_eq!(reports[0].nodes_explored, 3);
    assert_eq!(reports[0].last_node, "C");
    assert_eq!(reports[0].current_depth, 2);
}
