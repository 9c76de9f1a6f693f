//! Format and tuning constants shared across the crate.

/// Magic bytes opening every datastore envelope.
pub const MAGIC: [u8; 8] = *b"LNKSHELF";
/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;
/// magic (8) + version (4) + flags (4) + payload length (8) + blake3 checksum (32).
pub const ENVELOPE_HEADER_SIZE: usize = 56;
/// Envelope flag: payload is zstd-compressed.
pub const FLAG_ZSTD: u32 = 1;
/// zstd level used when persisting.
pub const ENVELOPE_ZSTD_LEVEL: i32 = 3;
/// Upper bound accepted for a decoded payload.
pub const MAX_PAYLOAD_BYTES: u64 = 256 * 1024 * 1024;

/// Free space required on top of the payload before a persist is attempted.
pub const DISK_SPACE_MARGIN_BYTES: u64 = 500 * 1024;

pub const DEFAULT_LOCK_TIMEOUT_MS: u64 = 250;
pub const DEFAULT_LOCK_POLL_MS: u64 = 10;

/// Suffix appended to the datastore path for the sidecar lock file.
pub const LOCK_FILE_SUFFIX: &str = "lock";

/// Datetime layout hashed into short ids.
pub const SHORT_ID_DATE_FORMAT: &str = "%Y%m%d_%H%M%S";
/// Day layout accepted by the date-bucket filter.
pub const DAY_FORMAT: &str = "%Y%m%d";

/// Prefix identifying note bookmarks (self-referencing permalinks).
pub const NOTE_URL_PREFIX: &str = "?";
/// Tags starting with this prefix are hidden from anonymous visitors.
pub const HIDDEN_TAG_PREFIX: char = '.';
/// Transient extension key produced by search front-ends; never persisted.
pub const SEARCH_HIGHLIGHT_KEY: &str = "search_highlight";

/// Separator used in the migrations-done file.
pub const MIGRATION_RECORD_SEPARATOR: char = ';';

/// History retention window (31 days).
pub const DEFAULT_HISTORY_RETENTION_SECS: i64 = 2_678_400;

pub const DEFAULT_LINKS_PER_PAGE: usize = 20;
