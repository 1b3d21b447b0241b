use idstore_table::{OperationKind, TableOperation, TableQuery, TableStore};
use idstore_testing::fault::Fault;
use idstore_testing::fixture;

use crate::helpers::{USERNAME_INDEX, USERS, rows, store_with_page_size};

#[tokio::test]
async fn should_rebuild_username_index_across_pages() {
    let store = store_with_page_size(9).await;
    let mut ids = Vec::new();
    for i in 0..230 {
        let identity = fixture::identity(&format!("user-{i}"));
        store.create(&identity).await.unwrap();
        ids.push(identity.id);
    }

    // Wipe the index table.
    let entries = store.tables().inner().rows(USERNAME_INDEX);
    for entry in entries {
        let op = TableOperation::delete(entry.partition_key, entry.row_key);
        store.tables().execute(USERNAME_INDEX, &op).await.unwrap();
    }
    assert_eq!(rows(&store, USERNAME_INDEX), 0);

    let report = store.index_builder().build_indexes().await.unwrap();

    assert_eq!(report.scanned, 230);
    assert_eq!(report.written, 230);
    assert_eq!(rows(&store, USERNAME_INDEX), 230);
    for (i, id) in ids.iter().enumerate() {
        let found = store
            .find_by_username(&format!("user-{i}"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, *id);
    }
}

#[tokio::test]
async fn should_be_repeatable() {
    let store = store_with_page_size(1000).await;
    store.create(&fixture::identity("alice")).await.unwrap();

    let first = store.index_builder().build_indexes().await.unwrap();
    let second = store.index_builder().build_indexes().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(rows(&store, USERNAME_INDEX), 1);
}

#[tokio::test]
async fn should_fail_run_on_write_error() {
    let store = store_with_page_size(1000).await;
    store.create(&fixture::identity("alice")).await.unwrap();
    store
        .tables()
        .inject(Fault::on(USERNAME_INDEX, OperationKind::InsertOrReplace));

    let err = store.index_builder().build_indexes().await.unwrap_err();
    assert_eq!(err.kind(), "TRANSPORT");
}

#[tokio::test]
async fn should_scan_only_primary_records() {
    let store = store_with_page_size(3).await;
    for name in ["a", "b", "c", "d"] {
        store.create(&fixture::identity(name)).await.unwrap();
    }
    let segment = store
        .tables()
        .query_segment(USERS, &TableQuery::all(), None)
        .await
        .unwrap();
    assert_eq!(segment.results.len(), 3);
    assert!(segment.continuation.is_some());

    let report = store.index_builder().build_indexes().await.unwrap();
    assert_eq!(report.scanned, 4);
}
