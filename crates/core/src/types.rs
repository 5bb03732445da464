/// Chat-platform identifiers (user ids, conversation ids) are signed 64-bit.
pub type PlatformId = i64;

/// Record keys are decimal-string sequence numbers, unique per collection.
pub type SeqKey = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
