//! Sliding-window rate limiting for login attempts.
//!
//! [`RateLimiter`] tracks one client; [`LoginRateLimiter`] keeps one per
//! email so repeated password guesses against an account are throttled.

use esport_arena::auth::normalize_email;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Rate limiter using a sliding window algorithm
#[derive(Debug)]
pub struct RateLimiter {
    /// Timestamps of recent requests
    timestamps: VecDeque<Instant>,
    /// Maximum number of requests allowed in the window
    max_requests: usize,
    /// Time window for rate limiting
    window: Duration,
}

impl RateLimiter {
    /// Create a new rate limiter
    ///
    /// # Example
    ///
    /// ```
    /// use ea_server::api::rate_limiter::RateLimiter;
    /// use std::time::Duration;
    ///
    /// // Allow 5 attempts per minute
    /// let limiter = RateLimiter::new(5, Duration::from_secs(60));
    /// ```
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: VecDeque::with_capacity(max_requests),
            max_requests,
            window,
        }
    }

    /// Check if a request should be allowed
    ///
    /// Returns `true` if the request is allowed, `false` if rate limit exceeded.
    ///
    /// # Example
    ///
    /// ```
    /// # use ea_server::api::rate_limiter::RateLimiter;
    /// # use std::time::Duration;
    /// let mut limiter = RateLimiter::new(5, Duration::from_secs(1));
    ///
    /// for _ in 0..5 {
    ///     assert!(limiter.check());
    /// }
    ///
    /// assert!(!limiter.check());
    /// ```
    pub fn check(&mut self) -> bool {
        self.evict_expired(Instant::now());

        if self.timestamps.len() >= self.max_requests {
            return false;
        }

        self.timestamps.push_back(Instant::now());
        true
    }

    /// Get the number of remaining requests allowed in the current window
    pub fn remaining(&self) -> usize {
        self.max_requests.saturating_sub(self.timestamps.len())
    }

    /// Get the time until the oldest request leaves the window
    ///
    /// Returns `None` if there are no requests in the current window.
    pub fn reset_in(&self) -> Option<Duration> {
        self.timestamps.front().map(|oldest| {
            let elapsed = Instant::now().duration_since(*oldest);
            self.window.saturating_sub(elapsed)
        })
    }

    /// Whether every recorded request has left the window
    fn is_idle(&mut self, now: Instant) -> bool {
        self.evict_expired(now);
        self.timestamps.is_empty()
    }

    fn evict_expired(&mut self, now: Instant) {
        while let Some(ts) = self.timestamps.front() {
            if now.duration_since(*ts) > self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Tracked keys above which idle limiters are dropped
const PRUNE_THRESHOLD: usize = 10_000;

/// Login attempts per email address
#[derive(Debug)]
pub struct LoginRateLimiter {
    max_attempts: usize,
    window: Duration,
    limiters: Mutex<HashMap<String, RateLimiter>>,
}

impl LoginRateLimiter {
    pub fn new(max_attempts: usize, window: Duration) -> Self {
        Self {
            max_attempts,
            window,
            limiters: Mutex::new(HashMap::new()),
        }
    }

    /// Record an attempt for `email`.
    ///
    /// # Errors
    ///
    /// Returns how long to wait when the limit is exceeded.
    pub fn check(&self, email: &str) -> Result<(), Duration> {
        let mut limiters = self
            .limiters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if limiters.len() > PRUNE_THRESHOLD {
            let now = Instant::now();
            limiters.retain(|_, limiter| !limiter.is_idle(now));
        }

        let limiter = limiters
            .entry(normalize(email))
            .or_insert_with(|| RateLimiter::new(self.max_attempts, self.window));

        if limiter.check() {
            Ok(())
        } else {
            Err(limiter.reset_in().unwrap_or(self.window))
        }
    }

    /// Forget the attempts for `email` after a successful login
    pub fn reset(&self, email: &str) {
        self.limiters
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(&normalize(email));
    }
}

/// Throttling keys match account keys exactly
fn normalize(email: &str) -> String {
    normalize_email(email).to_string()
}
