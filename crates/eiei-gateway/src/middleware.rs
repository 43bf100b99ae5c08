//! Gateway middleware.

use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::net::IpAddr;
use std::num::NonZeroU32;

/// Limiter for login attempts, keyed by client address and email.
///
/// Every attempt is charged, successful ones included, and the check runs
/// before any hashing. Scoping the key to the client address means a third
/// party hammering an email only exhausts its own quota. The cost is that
/// one account can be tried from many addresses at the full rate each.
/// Without a known client address the key falls back to the email alone.
pub struct LoginRateLimiter {
    limiter: RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>,
    per_minute: u32,
}

impl LoginRateLimiter {
    /// Create a limiter allowing `attempts_per_minute` per key.
    #[must_use]
    pub fn new(attempts_per_minute: u32) -> Self {
        let per_minute = NonZeroU32::new(attempts_per_minute).unwrap_or(NonZeroU32::MIN);
        Self {
            limiter: RateLimiter::keyed(Quota::per_minute(per_minute)),
            per_minute: per_minute.get(),
        }
    }

    /// Limiter key for a login attempt on `email` from `client`.
    #[must_use]
    pub fn attempt_key(email: &str, client: Option<IpAddr>) -> String {
        match client {
            Some(ip) => format!("{ip}/{email}"),
            None => email.to_string(),
        }
    }

    /// Consume one attempt for `key`. Returns false once the quota is spent.
    #[must_use]
    pub fn check(&self, key: &str) -> bool {
        self.limiter.check_key(&key.to_string()).is_ok()
    }

    /// Drop state for keys whose quota has fully replenished.
    pub fn retain_recent(&self) {
        self.limiter.retain_recent();
    }

    /// Configured attempts per minute.
    #[must_use]
    pub const fn per_minute(&self) -> u32 {
        self.per_minute
    }
}

impl Default for LoginRateLimiter {
    fn default() -> Self {
        Self::new(10)
    }
}

impl std::fmt::Debug for LoginRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRateLimiter")
            .field("per_minute", &self.per_minute)
            .finish_non_exhaustive()
    }
}
