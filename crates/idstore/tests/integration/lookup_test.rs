use idstore_domain::id::IdentityId;
use idstore_table::{OperationKind, TableOperation, TableStore};
use idstore_testing::fault::Fault;
use idstore_testing::fixture;

use idstore::records::owner_key;

use crate::helpers::{USERS, store};

#[tokio::test]
async fn should_return_none_for_unknown_keys() {
    let store = store().await;
    assert!(store.find_by_id(IdentityId::new()).await.unwrap().is_none());
    assert!(store.find_by_username("nobody").await.unwrap().is_none());
    assert!(store.find_by_email("nobody@example.com").await.unwrap().is_none());
    assert!(
        store
            .find_by_login(&fixture::login("github", "404"))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn should_not_touch_the_store_for_blank_email() {
    let store = store().await;
    store.tables().clear_calls();
    assert!(store.find_by_email("").await.unwrap().is_none());
    assert!(store.tables().calls().is_empty());
}

#[tokio::test]
async fn should_report_not_found_for_orphaned_index_entry() {
    let store = store().await;
    let identity = fixture::identity_with_email("alice", "alice@example.com");
    store.create(&identity).await.unwrap();

    // Remove the primary record behind the indexes' back.
    let key = owner_key(identity.id);
    store
        .tables()
        .execute(USERS, &TableOperation::delete(&key, &key))
        .await
        .unwrap();

    assert!(store.find_by_username("alice").await.unwrap().is_none());
    assert!(
        store
            .find_by_email("alice@example.com")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn should_resolve_keys_with_reserved_characters() {
    let store = store().await;
    let identity = fixture::identity_with_email("a/b#c?d\\e", "odd+/@example.com");
    store.create(&identity).await.unwrap();

    let by_name = store.find_by_username("a/b#c?d\\e").await.unwrap().unwrap();
    let by_email = store
        .find_by_email("odd+/@example.com")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_name.id, identity.id);
    assert_eq!(by_email.id, identity.id);
}

#[tokio::test]
async fn should_propagate_transport_failure_from_lookup() {
    let store = store().await;
    store.create(&fixture::identity("alice")).await.unwrap();
    store
        .tables()
        .inject(Fault::on(USERS, OperationKind::Retrieve).times(1));

    let err = store.find_by_username("alice").await.unwrap_err();
    assert_eq!(err.kind(), "TRANSPORT");
    assert!(store.find_by_username("alice").await.unwrap().is_some());
}

#[tokio::test]
async fn should_load_relations_lazily() {
    let store = store().await;
    let mut identity = fixture::identity("alice");
    identity.logins = vec![fixture::login("github", "1")];
    store.create(&identity).await.unwrap();
    store
        .add_claim(identity.id, &fixture::claim("scope", "read"))
        .await
        .unwrap();

    let loaded = store.find_by_username("alice").await.unwrap().unwrap();
    assert_eq!(store.tables().count("claims", OperationKind::Query), 0);

    assert_eq!(loaded.logins().await.unwrap(), [fixture::login("github", "1")]);
    assert_eq!(loaded.claims().await.unwrap(), [fixture::claim("scope", "read")]);
    assert!(loaded.roles().await.unwrap().is_empty());
    assert_eq!(store.tables().count("claims", OperationKind::Query), 1);
}
