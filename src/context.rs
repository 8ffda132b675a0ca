//! Shared server context.
//!
//! [`ServerContext`] owns the current configuration snapshot and the rate
//! limiter. It is constructed once at startup and shared (`Arc`) with the
//! dispatcher and the HTTP transport; tests build isolated instances.
//!
//! Every operation here is total: none of them fail.

use std::sync::{Arc, RwLock};
use std::time::Instant;

use serde_json::Value;

use crate::config::{Config, ConfigPatch, LogLevel};
use crate::rate_limit::RateLimiter;

const CSP_POLICY: &str = "default-src 'none'; frame-ancestors 'none'";
const HSTS_POLICY: &str = "max-age=31536000; includeSubDomains";

/// Configuration snapshot plus per-client rate limiting state.
#[derive(Debug)]
pub struct ServerContext {
    config: RwLock<Arc<Config>>,
    limiter: RateLimiter,
}

impl ServerContext {
    /// Creates a context around an initial configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            limiter: RateLimiter::new(),
        }
    }

    fn snapshot(&self) -> Arc<Config> {
        Arc::clone(&self.config.read().unwrap_or_else(|e| e.into_inner()))
    }

    /// Returns a copy of the current configuration.
    #[must_use]
    pub fn get_config(&self) -> Config {
        (*self.snapshot()).clone()
    }

    /// Shallow-merges `patch` into the current configuration and returns the
    /// merged snapshot.
    pub fn update_config(&self, patch: ConfigPatch) -> Config {
        let mut guard = self.config.write().unwrap_or_else(|e| e.into_inner());
        let merged = (**guard).clone().merged(patch);
        *guard = Arc::new(merged.clone());
        drop(guard);

        tracing::info!(name = %merged.name, "Configuration updated");
        merged
    }

    /// Records a request from `client_id`; `true` means reject.
    pub fn check_rate_limit(&self, client_id: &str) -> bool {
        self.check_rate_limit_at(client_id, Instant::now())
    }

    /// Same as [`check_rate_limit`](Self::check_rate_limit) with an explicit
    /// clock reading.
    pub fn check_rate_limit_at(&self, client_id: &str, now: Instant) -> bool {
        let config = self.snapshot();
        self.limiter.check_at(client_id, &config.rate_limit, now)
    }

    /// Drops expired rate limit windows. Returns how many were removed.
    pub fn prune_rate_limits(&self) -> usize {
        let config = self.snapshot();
        self.limiter.prune_expired(&config.rate_limit, Instant::now())
    }

    /// Returns the number of clients with a live rate limit counter.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.limiter.tracked_clients()
    }

    /// Returns whether a cross-origin request from `origin` is allowed.
    #[must_use]
    pub fn is_cors_allowed(&self, origin: &str) -> bool {
        let config = self.snapshot();
        let cors = &config.cors;
        if !cors.enabled {
            return false;
        }
        cors.allowed_origins
            .iter()
            .any(|allowed| allowed == "*" || allowed == origin)
    }

    /// Returns the CORS response headers for `origin`, or `None` if the
    /// origin is not allowed.
    ///
    /// With a wildcard policy and no credentials the origin is echoed as `*`;
    /// otherwise the concrete origin is echoed back.
    #[must_use]
    pub fn cors_headers(&self, origin: &str) -> Option<Vec<(&'static str, String)>> {
        if !self.is_cors_allowed(origin) {
            return None;
        }
        let config = self.snapshot();
        let cors = &config.cors;

        let wildcard = cors.allowed_origins.iter().any(|o| o == "*");
        let allow_origin = if wildcard && !cors.allow_credentials {
            "*".to_string()
        } else {
            origin.to_string()
        };

        let mut headers = vec![
            ("access-control-allow-origin", allow_origin),
            ("access-control-allow-methods", cors.allowed_methods.join(", ")),
            ("access-control-allow-headers", cors.allowed_headers.join(", ")),
            ("access-control-max-age", cors.max_age_sec.to_string()),
        ];
        if cors.allow_credentials {
            headers.push(("access-control-allow-credentials", "true".to_string()));
        }
        if !wildcard || cors.allow_credentials {
            headers.push(("vary", "Origin".to_string()));
        }
        Some(headers)
    }

    /// Returns the security headers enabled by the current policy.
    #[must_use]
    pub fn security_headers(&self) -> Vec<(&'static str, &'static str)> {
        let config = self.snapshot();
        let security = &config.security;

        let mut headers = Vec::with_capacity(4);
        if security.csp {
            headers.push(("content-security-policy", CSP_POLICY));
        }
        if security.hsts {
            headers.push(("strict-transport-security", HSTS_POLICY));
        }
        if security.x_frame_options {
            headers.push(("x-frame-options", "DENY"));
        }
        if security.x_content_type_options {
            headers.push(("x-content-type-options", "nosniff"));
        }
        headers
    }

    /// Returns whether a message at `level` passes the configured gate.
    #[must_use]
    pub fn log_enabled(&self, level: LogLevel) -> bool {
        level.enabled_under(self.snapshot().log_level)
    }

    /// Emits a protocol log entry if `level` passes the configured gate.
    ///
    /// Returns `true` if the entry was emitted.
    pub fn log(&self, level: LogLevel, msg: &str, data: Option<&Value>) -> bool {
        if !self.log_enabled(level) {
            return false;
        }

        let data = data.map(ToString::to_string);
        let data = data.as_deref().unwrap_or("");
        match level {
            LogLevel::Error => tracing::error!(data, "{msg}"),
            LogLevel::Warn => tracing::warn!(data, "{msg}"),
            LogLevel::Info => tracing::info!(data, "{msg}"),
            LogLevel::Debug => tracing::debug!(data, "{msg}"),
        }
        true
    }
}

impl Default for ServerContext {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
