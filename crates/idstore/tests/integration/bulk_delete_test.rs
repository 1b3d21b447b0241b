use idstore::{StoreConfig, StoreError};
use idstore::records::owner_key;
use idstore_domain::id::IdentityId;
use idstore_domain::key::{LoginKey, encode_key};
use idstore_table::OperationKind;
use idstore_testing::fault::Fault;
use idstore_testing::fixture;

use crate::helpers::{
    CLAIMS, LOGIN_INDEX, LOGINS, Tables, rows, store, store_with_config,
    store_with_page_size,
};

const N: usize = 250;

fn claim_type(i: usize) -> String {
    format!("c{i:04}")
}

async fn with_claims(store: &idstore::IdentityStore<Tables>, owner: IdentityId) {
    for i in 0..N {
        store
            .add_claim(owner, &fixture::claim(&claim_type(i), "v"))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn should_remove_all_children_in_bounded_batches() {
    let store = store().await;
    let owner = IdentityId::new();
    with_claims(&store, owner).await;

    let report = store.remove_all_claims(owner).await.unwrap();

    assert_eq!(report.attempted, N);
    assert_eq!(report.batches_committed, 3);
    assert_eq!(store.tables().count(CLAIMS, OperationKind::Batch), 3);
    assert_eq!(rows(&store, CLAIMS), 0);
}

#[tokio::test]
async fn should_remove_all_children_when_every_batch_fails() {
    let store = store().await;
    let owner = IdentityId::new();
    with_claims(&store, owner).await;
    store.tables().inject(Fault::on(CLAIMS, OperationKind::Batch));

    let report = store.remove_all_claims(owner).await.unwrap();

    assert_eq!(report.fallbacks, 3);
    assert_eq!(report.batches_committed, 0);
    assert_eq!(store.tables().count(CLAIMS, OperationKind::Delete), N);
    assert_eq!(rows(&store, CLAIMS), 0);
}

#[tokio::test]
async fn should_report_partial_failure_and_keep_other_deletes() {
    let store = store().await;
    let owner = IdentityId::new();
    with_claims(&store, owner).await;
    store.tables().inject(Fault::on(CLAIMS, OperationKind::Batch));
    store.tables().inject(
        Fault::on(CLAIMS, OperationKind::Delete)
            .for_row(owner_key(owner), encode_key(&claim_type(42))),
    );

    let result = store.remove_all_claims(owner).await;

    assert!(
        matches!(
            result,
            Err(StoreError::PartialBulkFailure {
                failed: 1,
                attempted: N
            })
        ),
        "expected partial failure, got {result:?}"
    );
    let left = store.get_claims(owner).await.unwrap();
    assert_eq!(left, [fixture::claim(&claim_type(42), "v")]);
}

#[tokio::test]
async fn should_stream_deletes_across_small_pages() {
    let store = store_with_page_size(7).await;
    let owner = IdentityId::new();
    let other = IdentityId::new();
    with_claims(&store, owner).await;
    store
        .add_claim(other, &fixture::claim("keep", "v"))
        .await
        .unwrap();

    let report = store.remove_all_claims(owner).await.unwrap();

    assert_eq!(report.attempted, N);
    assert_eq!(rows(&store, CLAIMS), 1);
    assert!(store.tables().count(CLAIMS, OperationKind::Query) > N / 7);
}

#[tokio::test]
async fn should_delete_login_index_entries_individually() {
    let store = store().await;
    let owner = IdentityId::new();
    for i in 0..120 {
        store
            .add_login(owner, &fixture::login("p", &format!("{i}")))
            .await
            .unwrap();
    }
    store.tables().inject(Fault::on(LOGINS, OperationKind::Batch));
    store.tables().clear_calls();

    let report = store.remove_all_logins(owner).await.unwrap();

    assert_eq!(report.attempted, 240);
    assert_eq!(store.tables().count(LOGIN_INDEX, OperationKind::Batch), 0);
    assert_eq!(store.tables().count(LOGIN_INDEX, OperationKind::Delete), 120);
    assert_eq!(rows(&store, LOGINS), 0);
    assert_eq!(rows(&store, LOGIN_INDEX), 0);
}

#[tokio::test]
async fn should_surface_partial_failure_in_delete_report() {
    let store = store().await;
    let identity = fixture::identity("alice");
    store.create(&identity).await.unwrap();
    with_claims(&store, identity.id).await;
    store.tables().inject(Fault::on(CLAIMS, OperationKind::Batch));
    store.tables().inject(
        Fault::on(CLAIMS, OperationKind::Delete)
            .for_row(owner_key(identity.id), encode_key(&claim_type(7))),
    );

    let report = store.delete(&identity).await.unwrap();

    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].label, "claims");
    assert_eq!(
        failed[0].error.as_ref().map(StoreError::kind),
        Some("PARTIAL_BULK_FAILURE")
    );
    assert_eq!(rows(&store, CLAIMS), 1);
    assert!(store.find_by_id(identity.id).await.unwrap().is_none());
}

#[tokio::test]
async fn should_keep_login_index_reachable_when_scan_is_interrupted() {
    let config = StoreConfig {
        batch_size: 2,
        ..StoreConfig::default()
    };
    let store = store_with_config(2, config).await;
    let owner = IdentityId::new();
    for i in 0..4 {
        store
            .add_login(owner, &fixture::login("p", &i.to_string()))
            .await
            .unwrap();
    }
    store
        .tables()
        .inject(Fault::on(LOGINS, OperationKind::Query).after(1).times(1));

    let err = store.remove_all_logins(owner).await.unwrap_err();
    assert_eq!(err.kind(), "TRANSPORT");
    // The first page went out whole: index entries and rows together.
    assert_eq!(rows(&store, LOGINS), 2);
    assert_eq!(rows(&store, LOGIN_INDEX), 2);
    for login in store.get_logins(owner).await.unwrap() {
        let found = store.find_by_login(&login).await.unwrap().unwrap();
        assert_eq!(found.id, owner);
    }

    let report = store.remove_all_logins(owner).await.unwrap();
    assert_eq!(report.attempted, 4);
    assert_eq!(rows(&store, LOGINS), 0);
    assert_eq!(rows(&store, LOGIN_INDEX), 0);
}

#[tokio::test]
async fn should_keep_login_row_when_its_index_entry_survives() {
    let store = store().await;
    let owner = IdentityId::new();
    let stuck = fixture::login("p", "stuck");
    store.add_login(owner, &stuck).await.unwrap();
    store.add_login(owner, &fixture::login("p", "ok")).await.unwrap();
    store.tables().inject(
        Fault::on(LOGIN_INDEX, OperationKind::Delete)
            .for_partition(LoginKey::from(&stuck).encode())
            .times(1),
    );

    let err = store.remove_all_logins(owner).await.unwrap_err();
    assert!(matches!(err, StoreError::PartialBulkFailure { failed: 1, .. }));
    assert_eq!(store.get_logins(owner).await.unwrap(), vec![stuck]);
    assert_eq!(rows(&store, LOGIN_INDEX), 1);

    store.remove_all_logins(owner).await.unwrap();
    assert_eq!(rows(&store, LOGINS), 0);
    assert_eq!(rows(&store, LOGIN_INDEX), 0);
}
