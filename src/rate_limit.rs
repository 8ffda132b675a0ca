//! Per-client fixed-window rate limiter.
//!
//! Each distinct client identifier owns a counter that is created lazily on
//! its first request and reset once its window has elapsed. The policy is
//! passed in on every check so that configuration updates take effect
//! immediately without rebuilding the limiter.
//!
//! # Eviction
//!
//! Counters for clients that stop sending requests would otherwise stay
//! forever. Before a new client is tracked, if the table already holds
//! [`SWEEP_THRESHOLD`] clients, every expired window is dropped.
//! [`RateLimiter::prune_expired`] performs the same sweep on demand.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::config::RateLimitConfig;

/// Number of tracked clients at which expired windows are swept.
pub const SWEEP_THRESHOLD: usize = 10_000;

/// Counter state for one client.
#[derive(Debug, Clone, Copy)]
struct ClientWindow {
    window_start: Instant,
    count: u32,
}

impl ClientWindow {
    fn is_expired(&self, window: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.window_start) > window
    }
}

/// Rate limiter keyed by client identifier.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, ClientWindow>>,
}

impl RateLimiter {
    /// Creates an empty rate limiter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a request from `client_id` and reports whether it must be
    /// rejected.
    ///
    /// Returns `true` when the client has exceeded `policy.max_requests`
    /// within the current window. Always `false` when the policy is disabled.
    pub fn check(&self, client_id: &str, policy: &RateLimitConfig) -> bool {
        self.check_at(client_id, policy, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(&self, client_id: &str, policy: &RateLimitConfig, now: Instant) -> bool {
        if !policy.enabled {
            return false;
        }

        let window = Duration::from_millis(policy.window_ms);
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());

        if windows.len() >= SWEEP_THRESHOLD && !windows.contains_key(client_id) {
            let before = windows.len();
            windows.retain(|_, w| !w.is_expired(window, now));
            tracing::debug!(
                evicted = before - windows.len(),
                remaining = windows.len(),
                "Swept expired rate limit windows"
            );
        }

        let entry = windows
            .entry(client_id.to_string())
            .or_insert(ClientWindow {
                window_start: now,
                count: 0,
            });

        if entry.count == 0 || entry.is_expired(window, now) {
            entry.window_start = now;
            entry.count = 1;
            return false;
        }

        entry.count = entry.count.saturating_add(1);
        entry.count > policy.max_requests
    }

    /// Drops every counter whose window has elapsed. Returns how many were
    /// removed.
    pub fn prune_expired(&self, policy: &RateLimitConfig, now: Instant) -> usize {
        let window = Duration::from_millis(policy.window_ms);
        let mut windows = self.windows.lock().unwrap_or_else(|e| e.into_inner());
        let before = windows.len();
        windows.retain(|_, w| !w.is_expired(window, now));
        before - windows.len()
    }

    /// Returns the number of clients currently tracked.
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}
