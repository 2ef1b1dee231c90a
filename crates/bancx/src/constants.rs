//! Protocol-wide constants shared by client and server.

/// HMAC-SHA256 tag width in bytes.
pub const MAC_SIZE: usize = 32;

/// Nonce width in bytes (256 bits).
pub const NONCE_SIZE: usize = 32;

/// Shared-key width in bytes (256 bits).
pub const KEY_SIZE: usize = 32;

// Argon2id parameters. Seed data hashed by external tooling must verify
// against a server running these exact parameters, so they are pinned here
// rather than left to crate defaults.

/// Argon2id iteration count.
pub const ARGON2_TIME_COST: u32 = 3;
/// Argon2id memory cost in KiB (64 MiB).
pub const ARGON2_MEMORY_COST: u32 = 65536;
/// Argon2id lane count.
pub const ARGON2_PARALLELISM: u32 = 4;
/// Digest length in bytes.
pub const ARGON2_HASH_LEN: usize = 32;
/// Salt length in bytes, drawn fresh per hash.
pub const ARGON2_SALT_LEN: usize = 16;

/// Default server bind address.
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default server port.
pub const DEFAULT_PORT: u16 = 5000;
/// Maximum size of a single request read from a socket.
pub const BUFFER_SIZE: usize = 4096;

/// How long an admitted nonce blocks reuse before it may be swept.
pub const NONCE_TTL_SECS: i64 = 5 * 60;

/// Failed login attempts tolerated inside one window before lockout.
pub const MAX_LOGIN_ATTEMPTS: u32 = 5;
/// Sliding window over failed login attempts.
pub const ATTEMPT_WINDOW_SECS: u64 = 5 * 60;
/// Lockout duration once the attempt limit is hit.
pub const LOCKOUT_SECS: u64 = 15 * 60;
