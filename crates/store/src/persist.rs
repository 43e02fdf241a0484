//! Values kept across restarts.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::ArticleId,
    model::{Article, LoginInfo},
};
use storage::Preferences;
use tracing::warn;

use crate::state::{AppState, ArticleState, LoginState, HISTORY_LIMIT};

pub const COUNT_KEY: &str = "count";
pub const HISTORY_KEY: &str = "article_history";
pub const BLOCKED_KEY: &str = "blocked_articles";
pub const LOGIN_KEY: &str = "login_info";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub count: i64,
    pub history: Vec<Article>,
    pub blocked: BTreeSet<ArticleId>,
    pub login: Option<LoginInfo>,
}

impl PersistedState {
    /// Initial store state seeded with the persisted values.
    pub fn into_state(self) -> AppState {
        let mut history = self.history;
        history.truncate(HISTORY_LIMIT);
        AppState {
            count: self.count,
            login: LoginState {
                is_logged_in: self.login.is_some(),
                info: self.login,
                ..LoginState::default()
            },
            articles: ArticleState {
                history,
                blocked: self.blocked,
                ..ArticleState::default()
            },
            ..AppState::default()
        }
    }
}

/// Reads every persisted value. Unreadable entries fall back to their defaults.
pub async fn load_persisted(prefs: &dyn Preferences) -> Result<PersistedState> {
    let count = match prefs.get_int(COUNT_KEY).await {
        Ok(count) => count.unwrap_or_default(),
        Err(err) => {
            warn!(key = COUNT_KEY, error = %err, "ignoring unreadable preference");
            0
        }
    };
    Ok(PersistedState {
        count,
        history: load_json(prefs, HISTORY_KEY).await?,
        blocked: load_json(prefs, BLOCKED_KEY).await?,
        login: load_json(prefs, LOGIN_KEY).await?,
    })
}

async fn load_json<T: DeserializeOwned + Default>(prefs: &dyn Preferences, key: &str) -> Result<T> {
    let Some(raw) = prefs.get_string(key).await? else {
        return Ok(T::default());
    };
    match serde_json::from_str(&raw) {
        Ok(value) => Ok(value),
        Err(err) => {
            warn!(key, error = %err, "corrupt preference, starting from defaults");
            Ok(T::default())
        }
    }
}

async fn save_json<T: Serialize + ?Sized>(prefs: &dyn Preferences, key: &str, value: &T) -> Result<()> {
    let raw = serde_json::to_string(value).with_context(|| format!("failed to encode '{key}'"))?;
    prefs.set_string(key, &raw).await
}

pub async fn save_count(prefs: &dyn Preferences, count: i64) -> Result<()> {
    prefs.set_int(COUNT_KEY, count).await
}

pub async fn save_history(prefs: &dyn Preferences, state: &AppState) -> Result<()> {
    save_json(prefs, HISTORY_KEY, &state.articles.history).await
}

pub async fn save_blocked(prefs: &dyn Preferences, state: &AppState) -> Result<()> {
    save_json(prefs, BLOCKED_KEY, &state.articles.blocked).await
}

/// Stores the session, or forgets it when `info` is `None`.
pub async fn save_login(prefs: &dyn Preferences, info: Option<&LoginInfo>) -> Result<()> {
    match info {
        Some(info) => save_json(prefs, LOGIN_KEY, info).await,
        None => prefs.remove(LOGIN_KEY).await,
    }
}

#[cfg(test)]
#[path = "tests/persist_tests.rs"]
mod tests;
