use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Mandatory free-tier API key.
pub const FREE_KEY_VAR: &str = "GEMINI_API_KEY";
/// Optional paid-tier API key.
pub const PAID_KEY_VAR: &str = "GEMINI_API_KEY_PAID";
pub const PORT_VAR: &str = "PORT";
pub const APP_ENV_VAR: &str = "APP_ENV";

const DEFAULT_CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_body_limit")]
    pub request_body_limit_bytes: usize,
    #[serde(default)]
    pub graceful_shutdown_seconds: u64,
    /// Serve the client bundle from `static_dir` instead of the embedded copy.
    #[serde(default)]
    pub production: bool,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// No value keeps the HTTP client's own default.
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

/// The two API keys, loaded once at startup and never mutated.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub free: SecretString,
    pub paid: Option<SecretString>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_body_limit_bytes: default_request_body_limit(),
            graceful_shutdown_seconds: 0,
            production: false,
            static_dir: default_static_dir(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: None,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            tracing_level: default_tracing_level(),
            log_format: LogFormat::default(),
        }
    }
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_request_body_limit() -> usize {
    262_144
}
fn default_static_dir() -> PathBuf {
    PathBuf::from("./dist")
}
fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}
fn default_tracing_level() -> String {
    "info".to_string()
}

/// Load configuration from the optional TOML file and the process environment.
pub fn load_config(path: Option<&Path>) -> Result<(Config, Credentials)> {
    load_config_with(path, |name| std::env::var(name).ok())
}

/// Same as [`load_config`] with an injectable environment lookup.
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<(Config, Credentials)>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match path {
        Some(path) => {
            let config_str = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            parse_config(&config_str, path)?
        }
        None => match std::fs::read_to_string(DEFAULT_CONFIG_FILE) {
            Ok(config_str) => parse_config(&config_str, Path::new(DEFAULT_CONFIG_FILE))?,
            Err(_) => Config::default(),
        },
    };

    config.apply_env(&env)?;
    let credentials = Credentials::from_env(&env)?;

    Ok((config, credentials))
}

fn parse_config(config_str: &str, path: &Path) -> Result<Config> {
    toml::from_str(config_str).with_context(|| format!("Failed to parse {}", path.display()))
}

impl Config {
    fn apply_env<F>(&mut self, env: &F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = env(PORT_VAR) {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} value '{}'", PORT_VAR, port))?;
        }

        if let Some(app_env) = env(APP_ENV_VAR) {
            if app_env.trim().eq_ignore_ascii_case("production") {
                self.server.production = true;
            }
        }

        Ok(())
    }
}

impl Credentials {
    pub fn new(free: impl Into<String>, paid: Option<String>) -> Self {
        Self {
            free: SecretString::new(free.into()),
            paid: paid.map(SecretString::new),
        }
    }

    /// Read both keys; a missing or empty free key is fatal.
    pub fn from_env<F>(env: &F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| env(name).filter(|value| !value.trim().is_empty());

        let free = non_empty(FREE_KEY_VAR).with_context(|| {
            format!("{} is not set; refusing to start without the free-tier API key", FREE_KEY_VAR)
        })?;

        Ok(Self::new(free, non_empty(PAID_KEY_VAR)))
    }

    pub fn has_paid(&self) -> bool {
        self.paid.is_some()
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn graceful_shutdown_duration(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_seconds)
    }
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}
