//! Postgres credential store against a real database
//!
//! Each test creates and migrates a fresh database named after a random
//! UUID. They need the server described by `configuration.yaml`:
//! `cargo test -- --ignored`.

use chrono::{Duration, Utc};
use sessionkeeper::auth::{hash_password, RefreshToken};
use sessionkeeper::configuration::{get_configuration, DatabaseSettings};
use sessionkeeper::error::{AppError, AuthError, DatabaseError};
use sessionkeeper::store::{Account, CredentialStore, PgCredentialStore};
use sqlx::{Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;

struct TestStore {
    store: PgCredentialStore,
    db_pool: PgPool,
}

async fn spawn_store() -> TestStore {
    let mut configuration = get_configuration().expect("Failed to read configuration.");
    configuration.database.database_name = Uuid::new_v4().to_string();

    let db_pool = configure_database(&configuration.database).await;
    let store = PgCredentialStore::new(db_pool.clone());
    store.migrate().await.expect("Failed to migrate the database.");

    TestStore { store, db_pool }
}

async fn configure_database(config: &DatabaseSettings) -> PgPool {
    let mut connection = PgConnection::connect(&config.connection_string_without_db())
        .await
        .expect("Failed to connect to Postgres");
    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, config.database_name))
        .await
        .expect("Failed to create database.");

    PgPool::connect(&config.connection_string())
        .await
        .expect("Failed to connect to Postgres.")
}

fn account(username: &str, password: &str) -> Account {
    let digest = hash_password(password).expect("Failed to hash password");
    Account::new(username.to_string(), digest.hash, digest.salt)
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn insert_then_find_round_trips_the_account() {
    let app = spawn_store().await;
    let alice = account("alice", "pw1");

    app.store.insert(&alice).await.expect("insert");

    let stored = app
        .store
        .find_by_username("alice")
        .await
        .expect("lookup")
        .expect("Account missing");
    assert_eq!(stored, alice);
    assert!(app.store.find_by_username("Alice").await.expect("lookup").is_none());
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn duplicate_insert_is_username_taken() {
    let app = spawn_store().await;

    app.store.insert(&account("alice", "pw1")).await.expect("insert");
    let result = app.store.insert(&account("alice", "pw2")).await;

    assert!(matches!(
        result,
        Err(AppError::Auth(AuthError::UsernameTaken))
    ));
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn update_persists_refresh_state() {
    let app = spawn_store().await;
    let mut alice = account("alice", "pw1");
    app.store.insert(&alice).await.expect("insert");

    // Postgres keeps microseconds; truncate so the comparison is exact.
    let issued_at = Utc::now()
        .date_naive()
        .and_hms_opt(12, 0, 0)
        .expect("valid time")
        .and_utc();
    alice.refresh = Some(RefreshToken {
        token: "opaque-token".to_string(),
        issued_at,
        expires_at: issued_at + Duration::days(7),
    });
    app.store.update(&alice).await.expect("update");

    let stored = app
        .store
        .find_by_username("alice")
        .await
        .expect("lookup")
        .expect("Account missing");
    assert_eq!(stored.refresh, alice.refresh);
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn update_of_missing_account_fails() {
    let app = spawn_store().await;

    let result = app.store.update(&account("ghost", "pw1")).await;

    assert!(matches!(
        result,
        Err(AppError::Database(DatabaseError::NotFound(_)))
    ));
}

#[tokio::test]
#[ignore = "requires a running Postgres"]
async fn partial_refresh_state_is_rejected_by_the_table() {
    let app = spawn_store().await;
    app.store.insert(&account("alice", "pw1")).await.expect("insert");

    let err = sqlx::query("UPDATE accounts SET refresh_token = $1 WHERE username = $2")
        .bind("token-without-expiry")
        .bind("alice")
        .execute(&app.db_pool)
        .await
        .expect_err("A token without timestamps must violate the check");

    let code = err.as_database_error().and_then(|e| e.code());
    assert_eq!(code.as_deref(), Some("23514"));
    assert!(matches!(
        AppError::from(err),
        AppError::Database(DatabaseError::QueryExecution(_))
    ));

    let stored = app
        .store
        .find_by_username("alice")
        .await
        .expect("lookup")
        .expect("Account missing");
    assert!(stored.refresh.is_none());
}
