/// Content backend document ids are opaque strings (e.g. `"abc123"`,
/// `"drafts.abc123"`).
pub type DocumentId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
