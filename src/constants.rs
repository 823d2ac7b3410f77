// src/constants.rs

/// Milliseconds in one minute
pub const MILLIS_PER_MINUTE: f64 = 60_000.0;

/// The warning latch trips this many tabs before the configured limit
pub const WARNING_MARGIN: f64 = 2.0;

/// Default interval between scheduled cleanup runs
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 60;

/// Chrome limits native messaging to 1MB (1024 * 1024 bytes)
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Maximum domain pattern length (longest valid DNS name)
pub const MAX_DOMAIN_PATTERN_LEN: usize = 253;
