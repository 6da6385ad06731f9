use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Explicit month filter in `YYYY-MM` form
    /// - Valid: "2024-01", "2025-12"
    /// - Invalid: "2024-1", "2024-13", "24-01", "2024/01"
    pub static ref MONTH_REGEX: Regex = Regex::new(r"^\d{4}-(0[1-9]|1[0-2])$").unwrap();

    /// Tracking id prefix: 1 to 8 uppercase ASCII letters
    pub static ref TRACKING_ID_PREFIX_REGEX: Regex = Regex::new(r"^[A-Z]{1,8}$").unwrap();

    /// Tracking id: uppercase prefix, YYMMDD, 4-digit suffix
    pub static ref TRACKING_ID_REGEX: Regex = Regex::new(r"^[A-Z]{1,8}\d{6}[1-9]\d{3}$").unwrap();

    /// Characters not allowed in stored file names
    static ref UNSAFE_FILENAME_CHARS: Regex = Regex::new(r"[^A-Za-z0-9._-]+").unwrap();
}

/// Reduce an uploaded file name to a safe single path segment.
///
/// Directory components are stripped and unsafe runs become `_`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(base, "_");
    let cleaned = cleaned.trim_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
