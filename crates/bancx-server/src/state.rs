//! Shared server context passed to connection workers.

use crate::config::ServerConfig;
use crate::rate_limit::RateLimiter;

/// Everything a worker needs to process one request. Shared behind an `Arc`
/// rather than living in process globals.
pub struct ServerContext {
    pub config: ServerConfig,
    pub limiter: RateLimiter,
}

impl ServerContext {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            limiter: RateLimiter::new(),
        }
    }
}
