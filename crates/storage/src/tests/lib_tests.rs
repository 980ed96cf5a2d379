use super::*;

fn sample_session(role: Option<UserRole>) -> Session {
    Session {
        access_token: "access-1".into(),
        refresh_token: "refresh-1".into(),
        user_role: role,
    }
}

#[tokio::test]
async fn memory_store_round_trips_session_keys() {
    let store = MemorySessionStore::new();
    save_session(&store, &sample_session(Some(UserRole::Admin)))
        .await
        .expect("save");

    assert_eq!(
        access_token(&store).await.expect("token").as_deref(),
        Some("access-1")
    );
    assert_eq!(
        store.get(REFRESH_TOKEN_KEY).await.expect("refresh").as_deref(),
        Some("refresh-1")
    );
    assert_eq!(user_role(&store).await.expect("role"), Some(UserRole::Admin));
}

#[tokio::test]
async fn saving_session_without_role_drops_previous_role() {
    let store = MemorySessionStore::with_entries([(USER_ROLE_KEY, "ADMIN")]);
    save_session(&store, &sample_session(None))
        .await
        .expect("save");

    assert_eq!(user_role(&store).await.expect("role"), None);
    assert_eq!(store.snapshot().await.len(), 2);
}

#[tokio::test]
async fn blank_access_token_counts_as_missing() {
    let store = MemorySessionStore::with_entries([(ACCESS_TOKEN_KEY, "  ")]);
    assert_eq!(access_token(&store).await.expect("token"), None);
}

#[tokio::test]
async fn clear_session_removes_every_key() {
    let store = MemorySessionStore::new();
    save_session(&store, &sample_session(Some(UserRole::User)))
        .await
        .expect("save");
    clear_session(&store).await.expect("clear");
    assert!(store.snapshot().await.is_empty());
}

#[tokio::test]
async fn sqlite_store_applies_batches_in_memory_database() {
    let store = SqliteSessionStore::open("sqlite::memory:").await.expect("db");
    store.health_check().await.expect("health check");

    save_session(&store, &sample_session(Some(UserRole::User)))
        .await
        .expect("save");
    store.set(ACCESS_TOKEN_KEY, "access-2").await.expect("overwrite");

    assert_eq!(
        access_token(&store).await.expect("token").as_deref(),
        Some("access-2")
    );
    assert_eq!(user_role(&store).await.expect("role"), Some(UserRole::User));

    store.remove(USER_ROLE_KEY).await.expect("remove");
    assert_eq!(store.get(USER_ROLE_KEY).await.expect("role"), None);
}

#[tokio::test]
async fn sqlite_session_survives_reopen() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("nested").join("session.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    {
        let store = SqliteSessionStore::open(&database_url).await.expect("db");
        save_session(&store, &sample_session(Some(UserRole::Admin)))
            .await
            .expect("save");
    }

    assert!(
        db_path.exists(),
        "database file should exist: {}",
        db_path.display()
    );

    let reopened = SqliteSessionStore::open(&database_url).await.expect("reopen");
    assert_eq!(
        access_token(&reopened).await.expect("token").as_deref(),
        Some("access-1")
    );
    assert_eq!(
        user_role(&reopened).await.expect("role"),
        Some(UserRole::Admin)
    );
}

#[test]
fn session_db_file_ignores_memory_and_foreign_urls() {
    assert_eq!(session_db_file("sqlite::memory:"), None);
    assert_eq!(session_db_file("postgres://db"), None);
    assert_eq!(
        session_db_file("sqlite://./data/session.db?mode=rwc"),
        Some(PathBuf::from("./data/session.db"))
    );
    assert_eq!(
        session_db_file("sqlite:session.db"),
        Some(PathBuf::from("session.db"))
    );
}
