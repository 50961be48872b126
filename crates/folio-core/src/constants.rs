//! Service-wide constants.

/// Default size of a single upload chunk in bytes (2 MiB). The admin client
/// splits files larger than the inline-upload threshold into chunks of this
/// size and sends them sequentially.
pub const DEFAULT_CHUNK_SIZE_BYTES: usize = 2 * 1024 * 1024;

/// Upper bound on the number of chunks a single upload session may declare.
pub const DEFAULT_MAX_CHUNK_COUNT: u32 = 512;

/// Default time-to-live for an upload session that is still collecting
/// chunks. Sessions older than this are reclaimed by the background reaper.
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

/// Default interval between reaper runs.
pub const DEFAULT_SESSION_REAP_INTERVAL_SECS: u64 = 60;

/// Storage key prefix for directly uploaded and assembled files.
pub const MEDIA_KEY_PREFIX: &str = "media";

/// Storage key prefix for materialized logo images.
pub const LOGO_KEY_PREFIX: &str = "logos";
