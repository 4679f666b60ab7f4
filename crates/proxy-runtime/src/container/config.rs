//! # Proxy Configuration
//!
//! Read from a TOML file, then overridden by `VP_*` environment variables.
//! A missing file means all defaults.
//!
//! ```toml
//! [listen]
//! host = "127.0.0.1"
//! port = 13001
//! path = "/cgi-bin/sendsms"
//!
//! [gateway]
//! url = "http://localhost:13131/cgi-bin/sendsms"
//!
//! [verification]
//! service_account_file = "credentials.json"
//!
//! [agents]
//! source = "file:///etc/vsms-proxy/agents/"
//!
//! [policy]
//! send_unverified = true
//! ```
//!
//! ## Security Notes
//!
//! - Exactly one backend authentication method must be configured.
//! - Secrets are redacted from `Debug` output.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vp_04_verification_client::{RetryPolicy, DEFAULT_API_ROOT};

/// Used when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "vsms-proxy.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value {value:?} for {var}")]
    InvalidEnv { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
    pub listen: ListenConfig,
    pub gateway: GatewayConfig,
    pub verification: VerificationConfig,
    pub agents: AgentsConfig,
    pub policy: PolicyConfig,
}

/// Where the proxy accepts `sendsms` requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 13001,
            path: "/cgi-bin/sendsms".to_string(),
        }
    }
}

impl ListenConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// The Kannel `sendsms` endpoint requests are relayed to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub url: String,
    pub timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:13131/cgi-bin/sendsms".to_string(),
            timeout_secs: 30,
        }
    }
}

impl GatewayConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    pub api_root: String,
    /// Overrides the token URI of the service account file.
    pub token_uri: Option<String>,
    pub api_key: Option<String>,
    pub service_account_file: Option<PathBuf>,
    /// Attach the agent public key to stored hashes and log key comparisons.
    pub debug_mode: bool,
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_secs: u64,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            api_root: DEFAULT_API_ROOT.to_string(),
            token_uri: None,
            api_key: None,
            service_account_file: None,
            debug_mode: false,
            max_retries: retry.max_retries,
            initial_backoff_ms: retry.initial_backoff.as_millis() as u64,
            max_backoff_ms: retry.max_backoff.as_millis() as u64,
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for VerificationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationConfig")
            .field("api_root", &self.api_root)
            .field("token_uri", &self.token_uri)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("service_account_file", &self.service_account_file)
            .field("debug_mode", &self.debug_mode)
            .field("max_retries", &self.max_retries)
            .field("initial_backoff_ms", &self.initial_backoff_ms)
            .field("max_backoff_ms", &self.max_backoff_ms)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl VerificationConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where agent records live: `file://<dir>/` or an `http(s)://` service.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentsConfig {
    pub source: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Load every agent at startup instead of on each request.
    pub cache: bool,
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            source: "file://./agents/".to_string(),
            username: None,
            password: None,
            cache: true,
        }
    }
}

impl fmt::Debug for AgentsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentsConfig")
            .field("source", &self.source)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("cache", &self.cache)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Forward messages whose hashes could not be registered.
    pub send_unverified: bool,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            send_unverified: true,
        }
    }
}

// =============================================================================
// LOADING
// =============================================================================

impl ProxyConfig {
    /// File, then process environment, then validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse `path`; defaults when it does not exist.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(raw) => toml::from_str(&raw).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read {
                path: path.display().to_string(),
                source,
            }),
        }
    }

    /// Apply `VP_*` overrides found through `lookup`.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("VP_LISTEN_HOST") {
            self.listen.host = v;
        }
        if let Some(v) = get("VP_LISTEN_PORT") {
            self.listen.port = parse_env("VP_LISTEN_PORT", &v)?;
        }
        if let Some(v) = get("VP_LISTEN_PATH") {
            self.listen.path = v;
        }
        if let Some(v) = get("VP_GATEWAY_URL") {
            self.gateway.url = v;
        }
        if let Some(v) = get("VP_API_ROOT") {
            self.verification.api_root = v;
        }
        if let Some(v) = get("VP_TOKEN_URI") {
            self.verification.token_uri = Some(v);
        }
        if let Some(v) = get("VP_API_KEY") {
            self.verification.api_key = Some(v);
        }
        if let Some(v) = get("VP_SERVICE_ACCOUNT_FILE") {
            self.verification.service_account_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get("VP_DEBUG_MODE") {
            self.verification.debug_mode = parse_flag("VP_DEBUG_MODE", &v)?;
        }
        if let Some(v) = get("VP_MAX_RETRIES") {
            self.verification.max_retries = parse_env("VP_MAX_RETRIES", &v)?;
        }
        if let Some(v) = get("VP_AGENT_SOURCE") {
            self.agents.source = v;
        }
        if let Some(v) = get("VP_AGENT_USER") {
            self.agents.username = Some(v);
        }
        if let Some(v) = get("VP_AGENT_PASSWORD") {
            self.agents.password = Some(v);
        }
        if let Some(v) = get("VP_CACHE_AGENTS") {
            self.agents.cache = parse_flag("VP_CACHE_AGENTS", &v)?;
        }
        if let Some(v) = get("VP_SEND_UNVERIFIED") {
            self.policy.send_unverified = parse_flag("VP_SEND_UNVERIFIED", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        match (&self.verification.api_key, &self.verification.service_account_file) {
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(
                    "configure either an api key or a service account file, not both".into(),
                ))
            }
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "no verification backend credentials: set api_key or service_account_file".into(),
                ))
            }
            _ => {}
        }
        if self.agents.source.trim().is_empty() {
            return Err(ConfigError::Invalid("agents.source is empty".into()));
        }
        if self.verification.initial_backoff_ms == 0 {
            return Err(ConfigError::Invalid(
                "verification.initial_backoff_ms cannot be 0".into(),
            ));
        }
        if !self.listen.path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "listen.path must start with '/': {:?}",
                self.listen.path
            )));
        }
        if self.gateway.url.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.url is empty".into()));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(var: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        var,
        value: value.to_string(),
    })
}

fn parse_flag(var: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            var,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn with_api_key() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.verification.api_key = Some("k".into());
        config
    }

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ProxyConfig::default();
        assert_eq!(config.listen.addr(), "127.0.0.1:13001");
        assert_eq!(config.listen.path, "/cgi-bin/sendsms");
        assert!(config.policy.send_unverified);
        assert!(config.agents.cache);
        assert_eq!(config.verification.retry_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_missing_file_means_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ProxyConfig::from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, ProxyConfig::default());
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[listen]\nport = 8080\n\n[verification]\napi_key = \"abc\"\nmax_retries = 2\n\n[policy]\nsend_unverified = false"
        )
        .unwrap();

        let config = ProxyConfig::from_file(file.path()).unwrap();

        assert_eq!(config.listen.port, 8080);
        assert_eq!(config.listen.host, "127.0.0.1");
        assert_eq!(config.verification.api_key.as_deref(), Some("abc"));
        assert_eq!(config.verification.max_retries, 2);
        assert!(!config.policy.send_unverified);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[listen\nport = ").unwrap();
        assert!(matches!(
            ProxyConfig::from_file(file.path()),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = with_api_key();
        config
            .apply_env(env(&[
                ("VP_LISTEN_PORT", "9000"),
                ("VP_GATEWAY_URL", "http://kannel:13013/cgi-bin/sendsms"),
                ("VP_SEND_UNVERIFIED", "no"),
                ("VP_CACHE_AGENTS", "0"),
                ("VP_DEBUG_MODE", "true"),
                ("VP_AGENT_SOURCE", "https://agents.example.com/"),
                ("VP_LISTEN_HOST", "  "),
            ]))
            .unwrap();

        assert_eq!(config.listen.port, 9000);
        assert_eq!(config.listen.host, "127.0.0.1");
        assert_eq!(config.gateway.url, "http://kannel:13013/cgi-bin/sendsms");
        assert!(!config.policy.send_unverified);
        assert!(!config.agents.cache);
        assert!(config.verification.debug_mode);
        assert_eq!(config.agents.source, "https://agents.example.com/");
    }

    #[test]
    fn test_bad_env_value() {
        let mut config = with_api_key();
        assert!(matches!(
            config.apply_env(env(&[("VP_LISTEN_PORT", "eighty")])),
            Err(ConfigError::InvalidEnv { var: "VP_LISTEN_PORT", .. })
        ));
        assert!(matches!(
            config.apply_env(env(&[("VP_SEND_UNVERIFIED", "maybe")])),
            Err(ConfigError::InvalidEnv { .. })
        ));
    }

    #[test]
    fn test_validate_auth_methods() {
        assert!(ProxyConfig::default().validate().is_err());

        let mut both = with_api_key();
        both.verification.service_account_file = Some(PathBuf::from("sa.json"));
        assert!(both.validate().is_err());

        assert!(with_api_key().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = with_api_key();
        config.agents.source = " ".into();
        assert!(config.validate().is_err());

        let mut config = with_api_key();
        config.verification.initial_backoff_ms = 0;
        assert!(config.validate().is_err());

        let mut config = with_api_key();
        config.listen.path = "sendsms".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = with_api_key();
        config.verification.api_key = Some("super-secret".into());
        config.agents.password = Some("hunter2".into());
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(!rendered.contains("hunter2"));
    }
}
