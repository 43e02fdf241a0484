use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Sqlite,
};
use tokio::sync::RwLock;

/// Key-value store for the handful of values the app keeps across restarts.
#[async_trait]
pub trait Preferences: Send + Sync {
    async fn get_string(&self, key: &str) -> Result<Option<String>>;
    async fn set_string(&self, key: &str, value: &str) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;

    async fn get_int(&self, key: &str) -> Result<Option<i64>> {
        let Some(raw) = self.get_string(key).await? else {
            return Ok(None);
        };
        let value = raw
            .parse::<i64>()
            .with_context(|| format!("preference '{key}' is not an integer: '{raw}'"))?;
        Ok(Some(value))
    }

    async fn set_int(&self, key: &str, value: i64) -> Result<()> {
        self.set_string(key, &value.to_string()).await
    }
}

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid preferences database url '{database_url}'"))?
            .create_if_missing(true);
        // every connection to an in-memory database sees its own empty database
        let max_connections = if database_url.contains(":memory:") {
            1
        } else {
            4
        };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .with_context(|| format!("failed to open preferences database '{database_url}'"))?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run preferences migrations")?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl Preferences for Storage {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> =
            sqlx::query_scalar("SELECT value FROM preferences WHERE key = ?")
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("failed to read preference '{key}'"))?;
        Ok(value)
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?, ?, CURRENT_TIMESTAMP)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("failed to write preference '{key}'"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM preferences WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("failed to remove preference '{key}'"))?;
        Ok(())
    }
}

/// Non-persistent preferences, for tests and for running without a database.
#[derive(Default)]
pub struct MemoryPreferences {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Preferences for MemoryPreferences {
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set_string(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url.contains(":memory:") || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
