//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.
//! A [`Config`] is treated as an immutable snapshot: runtime changes are
//! expressed as a [`ConfigPatch`] and produce a new merged snapshot.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default, skip_serializing)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default, skip_serializing)]
    _comment: Option<String>,

    /// Server name reported during initialisation.
    #[serde(default = "default_name")]
    pub name: String,

    /// Server version reported during initialisation.
    #[serde(default = "default_version")]
    pub version: String,

    /// Human-readable server description.
    #[serde(default = "default_description")]
    pub description: String,

    /// Capabilities advertised to clients.
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,

    /// Protocol log level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_request_size")]
    pub max_request_size: usize,

    /// Per-client rate limiting policy.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Cross-origin policy.
    #[serde(default)]
    pub cors: CorsConfig,

    /// Security response headers.
    #[serde(default)]
    pub security: SecurityConfig,

    /// Socket address the HTTP transport listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Optional path to a documentation catalog JSON file.
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            _schema: None,
            _comment: None,
            name: default_name(),
            version: default_version(),
            description: default_description(),
            capabilities: default_capabilities(),
            log_level: LogLevel::default(),
            max_request_size: default_max_request_size(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
            security: SecurityConfig::default(),
            bind_address: default_bind_address(),
            catalog_path: None,
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(validation("name must not be empty"));
        }
        if self.max_request_size == 0 {
            return Err(validation("maxRequestSize must be greater than zero"));
        }
        if self.rate_limit.enabled {
            if self.rate_limit.max_requests == 0 {
                return Err(validation(
                    "rateLimit.maxRequests must be greater than zero when enabled",
                ));
            }
            if self.rate_limit.window_ms == 0 {
                return Err(validation(
                    "rateLimit.windowMs must be greater than zero when enabled",
                ));
            }
        }
        if self.bind_address.parse::<SocketAddr>().is_err() {
            return Err(validation(&format!(
                "Invalid bindAddress '{}'. Expected host:port, e.g. 127.0.0.1:3000",
                self.bind_address
            )));
        }
        Ok(())
    }

    /// Returns a new snapshot with `patch` shallow-merged over `self`.
    ///
    /// Only top-level keys are merged: a patch carrying `rateLimit` replaces
    /// the entire rate limit policy.
    #[must_use]
    pub fn merged(mut self, patch: ConfigPatch) -> Self {
        let ConfigPatch {
            name,
            version,
            description,
            capabilities,
            log_level,
            max_request_size,
            rate_limit,
            cors,
            security,
            bind_address,
            catalog_path,
        } = patch;

        if let Some(v) = name {
            self.name = v;
        }
        if let Some(v) = version {
            self.version = v;
        }
        if let Some(v) = description {
            self.description = v;
        }
        if let Some(v) = capabilities {
            self.capabilities = v;
        }
        if let Some(v) = log_level {
            self.log_level = v;
        }
        if let Some(v) = max_request_size {
            self.max_request_size = v;
        }
        if let Some(v) = rate_limit {
            self.rate_limit = v;
        }
        if let Some(v) = cors {
            self.cors = v;
        }
        if let Some(v) = security {
            self.security = v;
        }
        if let Some(v) = bind_address {
            self.bind_address = v;
        }
        if let Some(v) = catalog_path {
            self.catalog_path = Some(v);
        }
        self
    }
}

fn validation(message: &str) -> ConfigError {
    ConfigError::ValidationError {
        message: message.to_string(),
    }
}

/// A partial configuration. Present keys replace the corresponding
/// top-level key of a [`Config`] wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigPatch {
    /// Replacement server name.
    pub name: Option<String>,
    /// Replacement server version.
    pub version: Option<String>,
    /// Replacement description.
    pub description: Option<String>,
    /// Replacement capability list.
    pub capabilities: Option<Vec<String>>,
    /// Replacement log level.
    pub log_level: Option<LogLevel>,
    /// Replacement request size cap.
    pub max_request_size: Option<usize>,
    /// Replacement rate limit policy.
    pub rate_limit: Option<RateLimitConfig>,
    /// Replacement CORS policy.
    pub cors: Option<CorsConfig>,
    /// Replacement security header policy.
    pub security: Option<SecurityConfig>,
    /// Replacement bind address.
    pub bind_address: Option<String>,
    /// Replacement catalog path.
    pub catalog_path: Option<PathBuf>,
}

fn default_name() -> String {
    "component-docs-mcp".to_string()
}

fn default_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_description() -> String {
    "Documentation knowledge base for UI components".to_string()
}

fn default_capabilities() -> Vec<String> {
    vec!["tools".to_string(), "resources".to_string()]
}

const fn default_max_request_size() -> usize {
    1024 * 1024
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

const fn default_true() -> bool {
    true
}

/// Protocol log level, ordered by verbosity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Errors only.
    #[serde(alias = "ERROR")]
    Error,
    /// Errors and warnings.
    #[serde(alias = "WARN")]
    Warn,
    /// Normal operational messages.
    #[default]
    #[serde(alias = "INFO")]
    Info,
    /// Everything, including per-request detail.
    #[serde(alias = "DEBUG")]
    Debug,
}

impl LogLevel {
    /// Numeric severity: ERROR(0) < WARN(1) < INFO(2) < DEBUG(3).
    #[must_use]
    pub const fn severity(self) -> u8 {
        match self {
            Self::Error => 0,
            Self::Warn => 1,
            Self::Info => 2,
            Self::Debug => 3,
        }
    }

    /// Returns `true` if a message at `self` passes a gate set to `configured`.
    #[must_use]
    pub const fn enabled_under(self, configured: Self) -> bool {
        self.severity() <= configured.severity()
    }
}

/// Rate limiting policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Whether rate limiting is applied at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Requests allowed per client per window.
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in milliseconds.
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            max_requests: default_max_requests(),
            window_ms: default_window_ms(),
        }
    }
}

const fn default_max_requests() -> u32 {
    100
}

const fn default_window_ms() -> u64 {
    60_000
}

/// Cross-origin resource sharing policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CorsConfig {
    /// Whether cross-origin requests are allowed at all.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Allowed origins; `"*"` allows any origin.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Methods advertised in preflight responses.
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,

    /// Request headers advertised in preflight responses.
    #[serde(default = "default_allowed_headers")]
    pub allowed_headers: Vec<String>,

    /// Whether credentialed requests are allowed.
    #[serde(default)]
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    #[serde(default = "default_max_age_sec")]
    pub max_age_sec: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            allowed_origins: default_allowed_origins(),
            allowed_methods: default_allowed_methods(),
            allowed_headers: default_allowed_headers(),
            allow_credentials: false,
            max_age_sec: default_max_age_sec(),
        }
    }
}

fn default_allowed_origins() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_allowed_methods() -> Vec<String> {
    ["GET", "POST", "OPTIONS"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

fn default_allowed_headers() -> Vec<String> {
    ["Content-Type", "Authorization", "X-Client-Id"]
        .iter()
        .map(ToString::to_string)
        .collect()
}

const fn default_max_age_sec() -> u64 {
    86_400
}

/// Security response headers to attach to every response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
#[allow(clippy::struct_excessive_bools)] // Mirrors the config file: one toggle per header
pub struct SecurityConfig {
    /// Emit `Content-Security-Policy`.
    #[serde(default = "default_true")]
    pub csp: bool,

    /// Emit `Strict-Transport-Security`.
    #[serde(default)]
    pub hsts: bool,

    /// Emit `X-Frame-Options: DENY`.
    #[serde(default = "default_true")]
    pub x_frame_options: bool,

    /// Emit `X-Content-Type-Options: nosniff`.
    #[serde(default = "default_true")]
    pub x_content_type_options: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            csp: default_true(),
            hsts: false,
            x_frame_options: default_true(),
            x_content_type_options: default_true(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r"{}";
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config, Config::default());
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "name": "ui-docs",
            "version": "2.3.0",
            "description": "Test server",
            "capabilities": ["tools"],
            "logLevel": "debug",
            "maxRequestSize": 4096,
            "rateLimit": {
                "enabled": true,
                "maxRequests": 3,
                "windowMs": 1000
            },
            "cors": {
                "enabled": true,
                "allowedOrigins": ["https://example.com"],
                "allowedMethods": ["POST"],
                "allowedHeaders": ["Content-Type"],
                "allowCredentials": true,
                "maxAgeSec": 600
            },
            "security": {
                "csp": false,
                "hsts": true,
                "xFrameOptions": true,
                "xContentTypeOptions": false
            },
            "bindAddress": "0.0.0.0:8080",
            "catalogPath": "/srv/catalog.json"
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.name, "ui-docs");
        assert_eq!(config.capabilities, vec!["tools".to_string()]);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.max_request_size, 4096);
        assert_eq!(config.rate_limit.max_requests, 3);
        assert_eq!(config.rate_limit.window_ms, 1000);
        assert_eq!(config.cors.allowed_origins, vec!["https://example.com"]);
        assert!(config.cors.allow_credentials);
        assert_eq!(config.cors.max_age_sec, 600);
        assert!(!config.security.csp);
        assert!(config.security.hsts);
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(
            config.catalog_path,
            Some(PathBuf::from("/srv/catalog.json"))
        );
    }

    #[test]
    fn log_level_accepts_upper_case() {
        let level: LogLevel = serde_json::from_str(r#""WARN""#).unwrap();
        assert_eq!(level, LogLevel::Warn);
    }

    #[test]
    fn log_level_severity_order() {
        assert!(LogLevel::Error.severity() < LogLevel::Warn.severity());
        assert!(LogLevel::Warn.severity() < LogLevel::Info.severity());
        assert!(LogLevel::Info.severity() < LogLevel::Debug.severity());
        assert!(LogLevel::Error.enabled_under(LogLevel::Warn));
        assert!(!LogLevel::Debug.enabled_under(LogLevel::Info));
    }

    #[test]
    fn rate_limit_defaults() {
        let config = RateLimitConfig::default();
        assert!(config.enabled);
        assert_eq!(config.max_requests, 100);
        assert_eq!(config.window_ms, 60_000);
    }

    #[test]
    fn cors_defaults_allow_any_origin() {
        let config = CorsConfig::default();
        assert!(config.enabled);
        assert_eq!(config.allowed_origins, vec!["*"]);
        assert!(!config.allow_credentials);
    }

    #[test]
    fn merge_replaces_whole_sub_object() {
        let base = Config::default();
        let patch: ConfigPatch = serde_json::from_str(r#"{"rateLimit": {"maxRequests": 5}}"#)
            .unwrap();

        let merged = base.clone().merged(patch);

        assert_eq!(merged.rate_limit.max_requests, 5);
        // Unspecified keys of the replaced object fall back to defaults, not to
        // the previous snapshot.
        assert_eq!(merged.rate_limit.window_ms, 60_000);
        assert_eq!(merged.name, base.name);
        assert_eq!(merged.cors, base.cors);
    }

    #[test]
    fn merge_empty_patch_is_identity() {
        let base = Config::default();
        let merged = base.clone().merged(ConfigPatch::default());
        assert_eq!(merged, base);
    }

    #[test]
    fn reject_zero_window_when_enabled() {
        let json = r#"{"rateLimit": {"windowMs": 0}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_window_allowed_when_disabled() {
        let json = r#"{"rateLimit": {"enabled": false, "windowMs": 0}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn reject_invalid_bind_address() {
        let json = r#"{"bindAddress": "localhost"}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
