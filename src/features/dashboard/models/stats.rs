use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

use crate::core::error::AppError;

/// Which records a trend counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrendSource {
    Reports,
    Comments,
    FollowUps,
}

/// Trend bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    #[default]
    Week,
    Month,
}

impl TrendPeriod {
    /// Bucket label: ISO week `2024-W07` or month `2024-02`
    pub fn label(&self, at: DateTime<Utc>) -> String {
        match self {
            TrendPeriod::Week => {
                let week = at.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            TrendPeriod::Month => at.format("%Y-%m").to_string(),
        }
    }

    /// Postgres `to_char` pattern that yields the same labels as [`TrendPeriod::label`]
    pub fn sql_format(&self) -> &'static str {
        match self {
            TrendPeriod::Week => "IYYY-\"W\"IW",
            TrendPeriod::Month => "YYYY-MM",
        }
    }

    pub fn sql_trunc(&self) -> &'static str {
        match self {
            TrendPeriod::Week => "week",
            TrendPeriod::Month => "month",
        }
    }
}

impl std::str::FromStr for TrendPeriod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(TrendPeriod::Week),
            "month" => Ok(TrendPeriod::Month),
            other => Err(AppError::Validation(format!(
                "Invalid period '{}'. Use 'week' or 'month'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct TrendPoint {
    pub period: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow, ToSchema)]
pub struct CategoryCount {
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub total: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_week_label_uses_iso_year() {
        // 2021-01-03 belongs to ISO week 53 of 2020
        let at = Utc.with_ymd_and_hms(2021, 1, 3, 12, 0, 0).unwrap();
        assert_eq!(TrendPeriod::Week.label(at), "2020-W53");

        let at = Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0).unwrap();
        assert_eq!(TrendPeriod::Week.label(at), "2024-W07");
    }

    #[test]
    fn test_month_label() {
        let at = Utc.with_ymd_and_hms(2024, 2, 14, 0, 0, 0).unwrap();
        assert_eq!(TrendPeriod::Month.label(at), "2024-02");
    }

    #[test]
    fn test_period_from_str() {
        assert_eq!("month".parse::<TrendPeriod>().unwrap(), TrendPeriod::Month);
        assert!("year".parse::<TrendPeriod>().is_err());
    }
}
