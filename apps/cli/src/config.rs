use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

pub const CONFIG_FILE: &str = "connect.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub api_url: String,
    pub preferences_url: String,
    pub auth_token: Option<String>,
    pub request_timeout_seconds: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:8443/api".into(),
            preferences_url: "sqlite://./data/connect.db".into(),
            auth_token: None,
            request_timeout_seconds: 15,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds.max(1))
    }
}

/// Defaults, then `connect.toml` (or `path`), then environment variables.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let file = path.unwrap_or_else(|| Path::new(CONFIG_FILE));
    match fs::read_to_string(file) {
        Ok(raw) => apply_file(&mut settings, &raw)
            .with_context(|| format!("invalid config file '{}'", file.display()))?,
        Err(_) if path.is_none() => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read '{}'", file.display()))
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    settings.preferences_url = normalize_preferences_url(&settings.preferences_url);
    Ok(settings)
}

fn apply_file(settings: &mut Settings, raw: &str) -> anyhow::Result<()> {
    let file_cfg = toml::from_str::<HashMap<String, String>>(raw)?;
    if let Some(v) = file_cfg.get("api_url") {
        settings.api_url = v.clone();
    }
    if let Some(v) = file_cfg.get("preferences_url") {
        settings.preferences_url = v.clone();
    }
    if let Some(v) = file_cfg.get("auth_token") {
        settings.auth_token = Some(v.clone());
    }
    if let Some(v) = file_cfg.get("request_timeout_seconds") {
        settings.request_timeout_seconds = v
            .parse()
            .with_context(|| format!("request_timeout_seconds must be a number, got '{v}'"))?;
    }
    if let Some(v) = file_cfg.get("log_filter") {
        settings.log_filter = v.clone();
    }
    Ok(())
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("CONNECT_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = var("APP__API_URL") {
        settings.api_url = v;
    }

    if let Some(v) = var("CONNECT_PREFERENCES_URL") {
        settings.preferences_url = v;
    }
    if let Some(v) = var("APP__PREFERENCES_URL") {
        settings.preferences_url = v;
    }

    if let Some(v) = var("CONNECT_AUTH_TOKEN") {
        settings.auth_token = Some(v).filter(|token| !token.is_empty());
    }

    if let Some(v) = var("APP__REQUEST_TIMEOUT_SECONDS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_seconds = parsed;
        }
    }

    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}

fn normalize_preferences_url(raw: &str) -> String {
    let raw = raw.trim();

    if raw.is_empty() {
        return Settings::default().preferences_url;
    }

    if raw.starts_with("sqlite::memory:") || raw.starts_with("sqlite://") || raw.contains("://") {
        return raw.to_string();
    }

    if let Some(path) = raw.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw.replace('\\', "/"))
}
