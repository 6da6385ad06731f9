use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Produces candidate tracking ids. Uniqueness is checked by the store.
pub trait TrackingIdGenerator: Send + Sync {
    fn generate(&self, now: DateTime<Utc>) -> String;
}

/// `<prefix><YYMMDD><NNNN>` with a random suffix in 1000..=9999
pub struct RandomTrackingIdGenerator {
    prefix: String,
}

impl RandomTrackingIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl TrackingIdGenerator for RandomTrackingIdGenerator {
    fn generate(&self, now: DateTime<Utc>) -> String {
        let suffix = 1000 + (Uuid::new_v4().as_u128() % 9000) as u16;
        format!("{}{}{}", self.prefix, now.format("%y%m%d"), suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::validation::TRACKING_ID_REGEX;
    use chrono::TimeZone;

    #[test]
    fn test_format_and_suffix_range() {
        let generator = RandomTrackingIdGenerator::new("YK");
        let now = Utc.with_ymd_and_hms(2024, 3, 9, 8, 30, 0).unwrap();

        for _ in 0..200 {
            let id = generator.generate(now);
            assert!(TRACKING_ID_REGEX.is_match(&id), "bad id {}", id);
            assert!(id.starts_with("YK240309"));
            let suffix: u16 = id[8..].parse().unwrap();
            assert!((1000..=9999).contains(&suffix));
        }
    }
}
