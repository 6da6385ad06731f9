/// Name shown instead of the submitter on anonymous reports
pub const ANONYMOUS_NAME: &str = "Anonim";

/// Number of reports on the public landing feed
pub const PUBLIC_FEED_LIMIT: i64 = 8;

/// Evidence photos allowed on a new report
pub const MIN_SUBMISSION_PHOTOS: usize = 1;
pub const MAX_SUBMISSION_PHOTOS: usize = 3;

/// Maximum size of a single uploaded photo
pub const MAX_PHOTO_SIZE: usize = 5 * 1024 * 1024;

/// Directory prefix for evidence photo paths
pub const EVIDENCE_PATH_PREFIX: &str = "evidence";

/// Number of buckets returned by trend queries
pub const TREND_BUCKETS: i64 = 12;
