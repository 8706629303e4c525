//! Integration tests for account creation and lookup.

use account_store::{AccountSelector, NewAccount, SecurityConfig, Store, StoreError};

async fn temp_store() -> Store {
    let db_path =
        std::env::temp_dir().join(format!("account-store-test-{}.db", uuid::Uuid::new_v4()));

    // Cheap Argon2 params keep the test suite fast; production defaults are
    // exercised by the unit tests in the repository module.
    let security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
    };

    Store::new(&format!("sqlite:{}", db_path.display()), security)
        .await
        .expect("failed to create store")
}

fn alice() -> NewAccount {
    NewAccount {
        username: "alice".to_string(),
        first_name: "Alice".to_string(),
        last_name: "Liddell".to_string(),
        password: "wonderland".to_string(),
        email: "Alice.Liddell@Example.COM".to_string(),
    }
}

#[tokio::test]
async fn test_create_then_query_by_each_selector() {
    let store = temp_store().await;
    let created = store.create_account(alice()).await.unwrap();

    assert_eq!(created.username, "alice");
    assert_eq!(created.first_name, "Alice");
    assert_eq!(created.last_name, "Liddell");

    // Stored email is the normalized form, not the input bytes.
    assert_eq!(created.email, "Alice.Liddell@example.com");

    // Password is stored only as a bounded hash, never verbatim.
    assert_ne!(created.password_hash, "wonderland");
    assert!(created.password_hash.len() <= 128);

    // registered_on is a real per-record timestamp.
    chrono::DateTime::parse_from_rfc3339(&created.registered_on).unwrap();

    let by_username = store
        .find_account(AccountSelector::Username("alice".to_string()))
        .await
        .unwrap()
        .expect("missing by username");
    assert_eq!(by_username, created);

    let by_id = store
        .find_account(AccountSelector::Id(created.id))
        .await
        .unwrap()
        .expect("missing by id");
    assert_eq!(by_id, created);

    let by_email = store
        .find_account(AccountSelector::Email(
            "Alice.Liddell@example.com".to_string(),
        ))
        .await
        .unwrap()
        .expect("missing by email");
    assert_eq!(by_email, created);
}

#[tokio::test]
async fn test_query_miss_is_none_not_error() {
    let store = temp_store().await;

    let found = store
        .find_account(AccountSelector::Username("nobody".to_string()))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_password_verification_contract() {
    let store = temp_store().await;
    store.create_account(alice()).await.unwrap();

    assert!(
        store
            .verify_account_password("alice", "wonderland")
            .await
            .unwrap()
    );
    assert!(
        !store
            .verify_account_password("alice", "looking-glass")
            .await
            .unwrap()
    );
    // Unknown user verifies false rather than erroring.
    assert!(
        !store
            .verify_account_password("nobody", "wonderland")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn test_malformed_email_fails_before_persistence() {
    let store = temp_store().await;

    let mut bad = alice();
    bad.email = "not-an-email".to_string();

    let err = store.create_account(bad).await.unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let found = store
        .find_account(AccountSelector::Username("alice".to_string()))
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_duplicate_username_rolls_back_second_insert() {
    let store = temp_store().await;
    let first = store.create_account(alice()).await.unwrap();

    let mut dup = alice();
    dup.first_name = "Imposter".to_string();
    dup.email = "other@example.com".to_string();

    let err = store.create_account(dup).await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));

    // First account is intact, nothing from the loser survives.
    let survivor = store
        .find_account(AccountSelector::Username("alice".to_string()))
        .await
        .unwrap()
        .expect("first account lost");
    assert_eq!(survivor, first);

    let leaked = store
        .find_account(AccountSelector::Email("other@example.com".to_string()))
        .await
        .unwrap();
    assert!(leaked.is_none());
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let store = temp_store().await;
    store.create_account(alice()).await.unwrap();

    let mut dup = alice();
    dup.username = "alice2".to_string();

    let err = store.create_account(dup).await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
}

#[tokio::test]
async fn test_ping() {
    let store = temp_store().await;
    store.ping().await.unwrap();
}
