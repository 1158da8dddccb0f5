use std::sync::Arc;

use auth::{AuthError, SessionManager, TokenSettings};
use storage::SqliteStore;
use tempfile::TempDir;

fn manager(store: &SqliteStore) -> SessionManager {
    let store = Arc::new(store.clone());
    SessionManager::new(store.clone(), store, "integration_secret", TokenSettings::default())
}

#[tokio::test]
async fn register_refresh_replay_scenario() {
    let temp_dir = TempDir::new().unwrap();
    let store = SqliteStore::open(temp_dir.path().join("sessionkit.db")).unwrap();
    let manager = manager(&store);

    let (alice, original) = manager.register("alice", "alice@x.com", "secret123").await.unwrap();
    assert_eq!(alice.username, "alice");
    assert!(!original.access_token.is_empty());
    assert!(!original.refresh_token.is_empty());

    let rotated = manager.refresh(&original.refresh_token).await.unwrap();
    assert_eq!(manager.verify_access(&rotated.access_token).unwrap(), alice.id);

    let replay = manager.refresh(&original.refresh_token).await;
    assert_eq!(replay.unwrap_err(), AuthError::InvalidToken);
}

#[tokio::test]
async fn login_and_logout_against_sqlite() {
    let store = SqliteStore::in_memory().unwrap();
    let manager = manager(&store);
    manager.register("bob", "bob@x.com", "hunter22").await.unwrap();

    assert_eq!(
        manager.login("bob@x.com", "wrong").await.unwrap_err(),
        manager.login("nobody@x.com", "hunter22").await.unwrap_err(),
    );

    let (_, tokens) = manager.login("bob@x.com", "hunter22").await.unwrap();
    manager.logout(&tokens.refresh_token).await.unwrap();
    assert_eq!(
        manager.refresh(&tokens.refresh_token).await.unwrap_err(),
        AuthError::InvalidToken
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_refresh_rotates_once() {
    let store = SqliteStore::in_memory().unwrap();
    let manager = Arc::new(manager(&store));
    let (_, tokens) = manager.register("carol", "carol@x.com", "secret123").await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager = Arc::clone(&manager);
            let token = tokens.refresh_token.clone();
            tokio::spawn(async move { manager.refresh(&token).await })
        })
        .collect();

    let mut successes = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => successes += 1,
            Err(e) => assert_eq!(e, AuthError::InvalidToken),
        }
    }
    assert_eq!(successes, 1);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let store = SqliteStore::in_memory().unwrap();
    let manager = manager(&store);
    manager.register("dave", "dave@x.com", "secret123").await.unwrap();

    let result = manager.register("dave", "dave2@x.com", "secret123").await;
    assert_eq!(result.unwrap_err(), AuthError::DuplicateIdentity);
}
