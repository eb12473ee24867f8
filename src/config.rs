//! Configuration file parser for ~/.config/suprss/config.toml.
//!
//! The config file is optional. A missing file yields `Config::default()`.
//! Unknown keys are accepted by serde, though we log a warning when the file
//! contains potential typos.
use secrecy::SecretString;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Environment variable that overrides `session_cookie`.
pub const SESSION_COOKIE_ENV: &str = "SUPRSS_SESSION_COOKIE";

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
/// The Debug impl masks `session_cookie`.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the SUPRSS server.
    pub server_url: String,

    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Delay between the "Unauthorized" notice and the login redirect.
    pub redirect_delay_ms: u64,

    /// Refetch cached lists older than this on read. Unset = never.
    pub stale_after_secs: Option<u64>,

    /// How long a notification stays in the status line.
    pub notification_ttl_secs: u64,

    /// Value of the `Cookie` header carrying the server session.
    /// The `SUPRSS_SESSION_COOKIE` env var takes precedence.
    pub session_cookie: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 30,
            redirect_delay_ms: 500,
            stale_after_secs: None,
            notification_ttl_secs: 4,
            session_cookie: None,
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("server_url", &self.server_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("redirect_delay_ms", &self.redirect_delay_ms)
            .field("stale_after_secs", &self.stale_after_secs)
            .field("notification_ttl_secs", &self.notification_ttl_secs)
            .field(
                "session_cookie",
                &self.session_cookie.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "server_url",
        "request_timeout_secs",
        "redirect_delay_ms",
        "stale_after_secs",
        "notification_ttl_secs",
        "session_cookie",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        tracing::info!(path = %path.display(), server = %config.server_url, "Loaded configuration");
        Ok(config)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }

    pub fn stale_after(&self) -> Option<Duration> {
        self.stale_after_secs.map(Duration::from_secs)
    }

    pub fn notification_ttl(&self) -> Duration {
        Duration::from_secs(self.notification_ttl_secs)
    }

    /// Session cookie from the environment, else from the file.
    pub fn session_cookie(&self) -> Option<SecretString> {
        Self::pick_cookie(std::env::var(SESSION_COOKIE_ENV).ok(), self.session_cookie.clone())
    }

    fn pick_cookie(env: Option<String>, file: Option<String>) -> Option<SecretString> {
        env.filter(|v| !v.trim().is_empty())
            .or(file.filter(|v| !v.trim().is_empty()))
            .map(SecretString::from)
    }
}

// ============================================================================
// Tests
// ============================================================================
