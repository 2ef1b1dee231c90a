//! Per-username login rate limiting: sliding window plus lockout.
//!
//! State lives in process memory and resets on restart. Each entry moves
//! between counting failed attempts inside a window and a hard lockout once
//! the limit is hit; while locked, the gate rejects attempts before any
//! credential work runs, so even a correct password is refused.

use std::time::{Duration, Instant};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use bancx::constants::{ATTEMPT_WINDOW_SECS, LOCKOUT_SECS, MAX_LOGIN_ATTEMPTS};

const WINDOW: Duration = Duration::from_secs(ATTEMPT_WINDOW_SECS);
const LOCKOUT: Duration = Duration::from_secs(LOCKOUT_SECS);

/// Outcome of the pre-login gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    Allowed,
    /// Locked out; minutes remaining, rounded up.
    Locked { minutos: u64 },
}

#[derive(Debug, Clone, Copy)]
struct AttemptState {
    attempts: u32,
    first_attempt_at: Instant,
    locked_until: Option<Instant>,
}

/// In-memory attempt tracker keyed by username.
///
/// The DashMap entry API makes each gate check and each record an atomic
/// per-key read-modify-write.
pub struct RateLimiter {
    entries: DashMap<String, AttemptState>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Gate check, run before touching credentials. Expired lockouts and
    /// stale windows are cleared here.
    pub fn may_attempt(&self, username: &str) -> Gate {
        self.may_attempt_at(username, Instant::now())
    }

    /// Record the outcome of a permitted attempt. Success clears the entry;
    /// the failure that reaches the limit starts the lockout.
    pub fn record(&self, username: &str, success: bool) {
        self.record_at(username, success, Instant::now());
    }

    fn may_attempt_at(&self, username: &str, now: Instant) -> Gate {
        match self.entries.entry(username.to_string()) {
            Entry::Vacant(_) => Gate::Allowed,
            Entry::Occupied(entry) => {
                let state = *entry.get();
                if let Some(until) = state.locked_until {
                    if now < until {
                        let secs = (until - now).as_secs();
                        return Gate::Locked {
                            minutos: secs.div_ceil(60).max(1),
                        };
                    }
                    entry.remove();
                    return Gate::Allowed;
                }
                if now.saturating_duration_since(state.first_attempt_at) > WINDOW {
                    entry.remove();
                }
                Gate::Allowed
            }
        }
    }

    fn record_at(&self, username: &str, success: bool, now: Instant) {
        if success {
            self.entries.remove(username);
            return;
        }
        match self.entries.entry(username.to_string()) {
            Entry::Vacant(vacant) => {
                vacant.insert(AttemptState {
                    attempts: 1,
                    first_attempt_at: now,
                    locked_until: None,
                });
            }
            Entry::Occupied(mut entry) => {
                let state = entry.get_mut();
                if state.locked_until.is_none()
                    && now.saturating_duration_since(state.first_attempt_at) > WINDOW
                {
                    // stale window: this failure starts a new count
                    *state = AttemptState {
                        attempts: 1,
                        first_attempt_at: now,
                        locked_until: None,
                    };
                    return;
                }
                state.attempts += 1;
                if state.attempts >= MAX_LOGIN_ATTEMPTS {
                    state.locked_until = Some(now + LOCKOUT);
                    tracing::warn!(username, attempts = state.attempts, "usuario bloqueado");
                }
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
