//! Per-caller request admission.
//!
//! A fixed window per caller key, reset lazily on the first call after it expires.
//! State is process-local and lost on restart.

use crate::config::RateLimitSettings;
use crate::error::{GleanError, Result};
use axum::http::HeaderMap;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Key used when the caller address cannot be determined.
pub const UNKNOWN_CLIENT: &str = "unknown";

#[derive(Debug, Clone, Copy)]
struct RateWindow {
    count: u32,
    window_start: Instant,
}

/// In-memory rate limiter keyed by caller.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<String, RateWindow>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_settings(settings: &RateLimitSettings) -> Self {
        Self::new(
            settings.max_requests,
            Duration::from_secs(settings.window_secs),
        )
    }

    /// Admit or reject a call from `key` now.
    pub fn check(&self, key: &str) -> Result<()> {
        self.check_at(key, Instant::now())
    }

    /// Admit or reject a call from `key` at `now`.
    ///
    /// Rejected calls do not count against the window.
    pub fn check_at(&self, key: &str, now: Instant) -> Result<()> {
        let mut windows = self
            .windows
            .lock()
            .map_err(|e| GleanError::Internal(format!("rate limiter lock poisoned: {}", e)))?;

        if windows.len() > 1024 {
            prune(&mut windows, now, self.window);
        }

        let entry = windows.entry(key.to_string()).or_insert(RateWindow {
            count: 0,
            window_start: now,
        });

        let elapsed = now.saturating_duration_since(entry.window_start);
        if elapsed >= self.window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= self.max_requests {
            let remaining = self.window.saturating_sub(elapsed);
            let retry_after_secs = remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0);
            debug!("Rate limit hit for {}", key);
            return Err(GleanError::RateLimited {
                retry_after_secs: retry_after_secs.max(1),
            });
        }

        entry.count += 1;
        Ok(())
    }

    /// Number of keys currently tracked.
    pub fn tracked_keys(&self) -> usize {
        self.windows.lock().map(|w| w.len()).unwrap_or(0)
    }
}

fn prune(windows: &mut HashMap<String, RateWindow>, now: Instant, window: Duration) {
    windows.retain(|_, w| now.saturating_duration_since(w.window_start) < window);
}

/// Caller key: first `X-Forwarded-For` entry, then `X-Real-IP`, then `"unknown"`.
pub fn client_key(headers: &HeaderMap) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let real_ip = || {
        headers
            .get("x-real-ip")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    forwarded
        .or_else(real_ip)
        .unwrap_or(UNKNOWN_CLIENT)
        .to_string()
}
