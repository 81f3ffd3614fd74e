//! Application configuration structures.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// What to watch and how often
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// Baseline persistence
    #[serde(default)]
    pub storage: StorageConfig,

    /// Alert delivery
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Status surface binding
    #[serde(default)]
    pub server: ServerConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup("TELEGRAM_TOKEN") {
            self.notifier.telegram_token = Some(token);
        }
        if let Some(chat_id) = lookup("TELEGRAM_CHAT_ID") {
            self.notifier.chat_id = Some(chat_id);
        }
        if let Some(raw) = lookup("POLL_INTERVAL_SECS") {
            self.monitor.interval_secs = parse_number("POLL_INTERVAL_SECS", &raw)?;
        }
        if let Some(raw) = lookup("PORT") {
            self.server.port = parse_number("PORT", &raw)?;
        }
        if let Some(raw) = lookup("PAGEWATCH_TARGETS") {
            self.monitor.targets = raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(path) = lookup("PAGEWATCH_STATE_FILE") {
            self.storage.state_file = PathBuf::from(path);
        }
        Ok(())
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.monitor.targets.is_empty() {
            return Err(AppError::validation("monitor.targets is empty"));
        }
        let mut seen = HashSet::new();
        for target in &self.monitor.targets {
            let parsed = url::Url::parse(target)
                .map_err(|e| AppError::validation(format!("invalid target {target}: {e}")))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(AppError::validation(format!(
                    "target {target} is not an http(s) URL"
                )));
            }
            if !seen.insert(target.as_str()) {
                return Err(AppError::validation(format!("duplicate target {target}")));
            }
        }
        if let Some(origin) = &self.monitor.site_origin {
            url::Url::parse(origin).map_err(|e| {
                AppError::validation(format!("invalid monitor.site_origin {origin}: {e}"))
            })?;
        }
        if self.monitor.interval_secs == 0 {
            return Err(AppError::validation("monitor.interval_secs must be > 0"));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.http.max_concurrent == 0 {
            return Err(AppError::validation("http.max_concurrent must be > 0"));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::config(format!("{key} must be a number, got {raw:?}")))
}

/// Targets and polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Page URLs to watch
    #[serde(default = "defaults::targets")]
    pub targets: Vec<String>,

    /// Sleep between cycles in seconds
    #[serde(default = "defaults::interval")]
    pub interval_secs: u64,

    /// Origin prepended to site-relative links (derived per target when unset)
    #[serde(default)]
    pub site_origin: Option<String>,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            targets: defaults::targets(),
            interval_secs: defaults::interval(),
            site_origin: None,
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum targets fetched at once
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// Baseline persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// JSON file holding the last fingerprint of every target
    #[serde(default = "defaults::state_file")]
    pub state_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: defaults::state_file(),
        }
    }
}

/// Alert delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Telegram bot token; alerts are only logged when unset
    #[serde(default)]
    pub telegram_token: Option<String>,

    /// Telegram chat receiving the alerts
    #[serde(default)]
    pub chat_id: Option<String>,

    /// Telegram Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Upper bound on documents listed in one alert
    #[serde(default = "defaults::max_listed_documents")]
    pub max_listed_documents: usize,
}

impl NotifierConfig {
    /// Token and chat id, when both are configured.
    pub fn telegram_credentials(&self) -> Option<(&str, &str)> {
        match (&self.telegram_token, &self.chat_id) {
            (Some(token), Some(chat)) if !token.is_empty() && !chat.is_empty() => {
                Some((token.as_str(), chat.as_str()))
            }
            _ => None,
        }
    }
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            telegram_token: None,
            chat_id: None,
            api_base: defaults::api_base(),
            max_listed_documents: defaults::max_listed_documents(),
        }
    }
}

/// Status surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::host")]
    pub host: String,

    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::host(),
            port: defaults::port(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Monitor defaults
    pub fn targets() -> Vec<String> {
        vec![
            "https://www.gov.br/ebserh/pt-br/acesso-a-informacao/agentes-publicos/concursos-e-selecoes/concursos/2024/convocacoes/hc-ufpe".to_string(),
            "https://www.gov.br/ebserh/pt-br/acesso-a-informacao/agentes-publicos/concursos-e-selecoes/concursos/2024/convocacoes/hu-univasf".to_string(),
        ]
    }
    pub fn interval() -> u64 {
        300
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        20
    }
    pub fn max_concurrent() -> usize {
        4
    }

    // Storage defaults
    pub fn state_file() -> PathBuf {
        PathBuf::from("state.json")
    }

    // Notifier defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn max_listed_documents() -> usize {
        20
    }

    // Server defaults
    pub fn host() -> String {
        "0.0.0.0".into()
    }
    pub fn port() -> u16 {
        8080
    }
}
