use idstore::records::index_entry;
use idstore_domain::id::IdentityId;
use idstore_table::{OperationKind, TableOperation, TableStore};
use idstore_testing::fault::Fault;
use idstore_testing::fixture;

use crate::helpers::{
    CLAIMS, EMAIL_INDEX, LOGIN_INDEX, LOGINS, ROLES, USERNAME_INDEX, USERS, rows, store,
};

#[tokio::test]
async fn should_remove_identity_and_everything_attached() {
    let store = store().await;
    let mut identity = fixture::identity_with_email("alice", "alice@example.com");
    identity.logins = vec![fixture::login("github", "1"), fixture::login("google", "2")];
    store.create(&identity).await.unwrap();
    store.add_to_role(identity.id, "admin").await.unwrap();
    store
        .add_claim(identity.id, &fixture::claim("scope", "all"))
        .await
        .unwrap();

    let report = store.delete(&identity).await.unwrap();

    assert!(report.is_clean(), "unexpected failures: {report:?}");
    assert!(store.find_by_id(identity.id).await.unwrap().is_none());
    for table in [
        USERS,
        USERNAME_INDEX,
        EMAIL_INDEX,
        LOGINS,
        LOGIN_INDEX,
        CLAIMS,
        ROLES,
    ] {
        assert_eq!(rows(&store, table), 0, "rows left in {table}");
    }
}

#[tokio::test]
async fn should_delete_primary_record_even_when_cleanup_fails() {
    let store = store().await;
    let identity = fixture::identity("alice");
    store.create(&identity).await.unwrap();
    store.add_to_role(identity.id, "admin").await.unwrap();
    store.tables().inject(Fault::on(ROLES, OperationKind::Query));
    store.tables().inject(Fault::on(USERNAME_INDEX, OperationKind::Delete));

    let report = store.delete(&identity).await.unwrap();

    assert!(store.find_by_id(identity.id).await.unwrap().is_none());
    let failed: Vec<_> = report.failures().map(|o| o.label).collect();
    assert_eq!(failed, ["roles", "indexes"]);
    // Claims and logins passes still ran.
    assert_eq!(store.tables().count(CLAIMS, OperationKind::Query), 1);
    assert_eq!(store.tables().count(LOGINS, OperationKind::Query), 1);
    assert_eq!(rows(&store, ROLES), 1);
}

#[tokio::test]
async fn should_fail_when_primary_record_delete_fails() {
    let store = store().await;
    let identity = fixture::identity("alice");
    store.create(&identity).await.unwrap();
    store.add_to_role(identity.id, "admin").await.unwrap();
    store.tables().inject(Fault::on(USERS, OperationKind::Delete));

    let err = store.delete(&identity).await.unwrap_err();

    assert_eq!(err.kind(), "TRANSPORT");
    assert_eq!(rows(&store, ROLES), 1);
    assert_eq!(rows(&store, USERNAME_INDEX), 1);
}

#[tokio::test]
async fn should_keep_index_entry_claimed_by_another_identity() {
    let store = store().await;
    let identity = fixture::identity("alice");
    store.create(&identity).await.unwrap();

    // The name now points at somebody else, e.g. after a repair.
    let stranger = IdentityId::new();
    let reassigned = TableOperation::InsertOrReplace(index_entry("alice", stranger));
    store
        .tables()
        .execute(USERNAME_INDEX, &reassigned)
        .await
        .unwrap();

    let report = store.delete(&identity).await.unwrap();

    assert!(report.is_clean(), "unexpected failures: {report:?}");
    assert_eq!(rows(&store, USERNAME_INDEX), 1);
}
