use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::sync::RwLock;

use shared::domain::UserRole;

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const USER_ROLE_KEY: &str = "userRole";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionWrite {
    Set { key: String, value: String },
    Remove { key: String },
}

impl SessionWrite {
    pub fn set(key: &str, value: impl Into<String>) -> Self {
        Self::Set {
            key: key.to_string(),
            value: value.into(),
        }
    }

    pub fn remove(key: &str) -> Self {
        Self::Remove {
            key: key.to_string(),
        }
    }
}

/// Key-value persistence for the signed-in session.
///
/// Implementations must apply a batch passed to [`SessionStore::apply`] as a
/// whole or not at all.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn apply(&self, writes: &[SessionWrite]) -> Result<()>;

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.apply(&[SessionWrite::set(key, value)]).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.apply(&[SessionWrite::remove(key)]).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user_role: Option<UserRole>,
}

impl Session {
    /// Writes that replace whatever session was stored before.
    pub fn to_writes(&self) -> Vec<SessionWrite> {
        let role = match &self.user_role {
            Some(role) => SessionWrite::set(USER_ROLE_KEY, role.as_str()),
            None => SessionWrite::remove(USER_ROLE_KEY),
        };
        vec![
            SessionWrite::set(ACCESS_TOKEN_KEY, self.access_token.clone()),
            SessionWrite::set(REFRESH_TOKEN_KEY, self.refresh_token.clone()),
            role,
        ]
    }
}

pub async fn save_session(store: &dyn SessionStore, session: &Session) -> Result<()> {
    store.apply(&session.to_writes()).await
}

pub async fn clear_session(store: &dyn SessionStore) -> Result<()> {
    store
        .apply(&[
            SessionWrite::remove(ACCESS_TOKEN_KEY),
            SessionWrite::remove(REFRESH_TOKEN_KEY),
            SessionWrite::remove(USER_ROLE_KEY),
        ])
        .await
}

/// Non-empty access token, if one is stored.
pub async fn access_token(store: &dyn SessionStore) -> Result<Option<String>> {
    Ok(store
        .get(ACCESS_TOKEN_KEY)
        .await?
        .filter(|token| !token.trim().is_empty()))
}

pub async fn user_role(store: &dyn SessionStore) -> Result<Option<UserRole>> {
    Ok(store
        .get(USER_ROLE_KEY)
        .await?
        .filter(|role| !role.trim().is_empty())
        .map(|role| UserRole::parse(&role)))
}

#[derive(Default)]
pub struct MemorySessionStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    pub async fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn apply(&self, writes: &[SessionWrite]) -> Result<()> {
        let mut entries = self.entries.write().await;
        for write in writes {
            match write {
                SessionWrite::Set { key, value } => {
                    entries.insert(key.clone(), value.clone());
                }
                SessionWrite::Remove { key } => {
                    entries.remove(key);
                }
            }
        }
        Ok(())
    }
}

/// Session store backed by a single SQLite table, kept across process runs.
#[derive(Clone)]
pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSessionStore {
    pub async fn open(database_url: &str) -> Result<Self> {
        if let Some(dir) = session_db_file(database_url).as_deref().and_then(Path::parent) {
            fs::create_dir_all(dir).with_context(|| {
                format!(
                    "failed to create session database directory '{}'",
                    dir.display()
                )
            })?;
        }

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid session database url '{database_url}'"))?
            .create_if_missing(true);
        // One connection keeps `sqlite::memory:` databases shared between calls.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open session database '{database_url}'"))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS session_entries (
                key        TEXT PRIMARY KEY NOT NULL,
                value      TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#,
        )
        .execute(&pool)
        .await
        .context("failed to ensure session_entries table exists")?;

        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let row = sqlx::query("SELECT value FROM session_entries WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("failed to read session key '{key}'"))?;
        row.map(|row| row.try_get::<String, _>("value"))
            .transpose()
            .map_err(Into::into)
    }

    async fn apply(&self, writes: &[SessionWrite]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for write in writes {
            match write {
                SessionWrite::Set { key, value } => {
                    sqlx::query(
                        "INSERT INTO session_entries (key, value) VALUES (?, ?)
                         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
                    )
                    .bind(key)
                    .bind(value)
                    .execute(&mut *tx)
                    .await
                    .with_context(|| format!("failed to write session key '{key}'"))?;
                }
                SessionWrite::Remove { key } => {
                    sqlx::query("DELETE FROM session_entries WHERE key = ?")
                        .bind(key)
                        .execute(&mut *tx)
                        .await
                        .with_context(|| format!("failed to remove session key '{key}'"))?;
                }
            }
        }
        tx.commit().await?;
        Ok(())
    }
}

/// File behind a sqlite url, or `None` for in-memory and non-sqlite urls.
fn session_db_file(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
