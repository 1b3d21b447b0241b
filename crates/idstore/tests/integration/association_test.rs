use idstore_domain::id::IdentityId;
use idstore_table::OperationKind;
use idstore_testing::fault::Fault;
use idstore_testing::fixture;

use crate::helpers::{LOGIN_INDEX, LOGINS, rows, store};

#[tokio::test]
async fn should_return_both_logins_of_one_identity() {
    let store = store().await;
    let identity = fixture::identity("alice");
    store.create(&identity).await.unwrap();
    store
        .add_login(identity.id, &fixture::login("github", "gh-1"))
        .await
        .unwrap();
    store
        .add_login(identity.id, &fixture::login("google", "g-1"))
        .await
        .unwrap();

    let loaded = store.find_by_id(identity.id).await.unwrap().unwrap();
    let logins = loaded.logins().await.unwrap();
    assert_eq!(logins.len(), 2, "expected both logins, got {logins:?}");

    for login in logins {
        let found = store.find_by_login(login).await.unwrap().unwrap();
        assert_eq!(found.id, identity.id);
    }
}

#[tokio::test]
async fn should_stop_resolving_removed_login() {
    let store = store().await;
    let identity = fixture::identity("alice");
    let login = fixture::login("github", "gh-1");
    store.create(&identity).await.unwrap();
    store.add_login(identity.id, &login).await.unwrap();

    store.remove_login(identity.id, &login).await.unwrap();

    assert!(store.find_by_login(&login).await.unwrap().is_none());
    assert_eq!(rows(&store, LOGIN_INDEX), 0);
}

#[tokio::test]
async fn should_track_role_membership() {
    let store = store().await;
    let owner = IdentityId::new();
    store.add_to_role(owner, "admin").await.unwrap();

    assert!(store.is_in_role(owner, "admin").await.unwrap());
    store.remove_from_role(owner, "admin").await.unwrap();
    assert!(!store.is_in_role(owner, "admin").await.unwrap());
}

#[tokio::test]
async fn should_persist_profile_changes_through_update() {
    let store = store().await;
    let identity = fixture::identity("alice");
    store.create(&identity).await.unwrap();

    let mut loaded = store.find_by_id(identity.id).await.unwrap().unwrap();
    loaded.email_confirmed = true;
    loaded.two_factor_enabled = true;
    loaded.increment_access_failed_count();
    loaded.increment_access_failed_count();
    store.update(&loaded).await.unwrap();

    let reloaded = store.find_by_id(identity.id).await.unwrap().unwrap();
    assert!(reloaded.email_confirmed);
    assert!(reloaded.two_factor_enabled);
    assert_eq!(reloaded.access_failed_count, 2);

    let mut reset = reloaded.into_identity();
    reset.reset_access_failed_count();
    store.update(&reset).await.unwrap();
    let reloaded = store.find_by_id(identity.id).await.unwrap().unwrap();
    assert_eq!(reloaded.access_failed_count, 0);
}

#[tokio::test]
async fn should_finish_login_removal_on_retry() {
    let store = store().await;
    let owner = IdentityId::new();
    let login = fixture::login("github", "gh-1");
    store.add_login(owner, &login).await.unwrap();
    store
        .tables()
        .inject(Fault::on(LOGIN_INDEX, OperationKind::Delete).times(1));

    let err = store.remove_login(owner, &login).await.unwrap_err();
    assert_eq!(err.kind(), "TRANSPORT");
    assert_eq!(rows(&store, LOGINS), 1);

    store.remove_login(owner, &login).await.unwrap();
    assert_eq!(rows(&store, LOGINS), 0);
    assert_eq!(rows(&store, LOGIN_INDEX), 0);
    assert!(store.find_by_login(&login).await.unwrap().is_none());
}
