use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::core::error::{AppError, Result};
use crate::shared::validation::MONTH_REGEX;

/// Creation-time filter for report listings. All boundaries are UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    /// Since midnight today
    Today,
    /// Since Monday of the current week
    Week,
    /// Since the first of the current month
    Month,
    /// The whole calendar month starting on this date
    ExplicitMonth(NaiveDate),
}

impl TimeWindow {
    /// Build from the `filter` and `month` query values. `month` wins when both are set.
    pub fn parse(filter: Option<&str>, month: Option<&str>) -> Result<Option<Self>> {
        if let Some(month) = month.map(str::trim).filter(|m| !m.is_empty()) {
            if !MONTH_REGEX.is_match(month) {
                return Err(AppError::Validation(
                    "Invalid month format. Use YYYY-MM".to_string(),
                ));
            }
            let first = NaiveDate::parse_from_str(&format!("{}-01", month), "%Y-%m-%d")
                .map_err(|_| {
                    AppError::Validation("Invalid month format. Use YYYY-MM".to_string())
                })?;
            return Ok(Some(TimeWindow::ExplicitMonth(first)));
        }

        match filter.map(str::trim).filter(|f| !f.is_empty()) {
            None => Ok(None),
            Some("today") => Ok(Some(TimeWindow::Today)),
            Some("week") => Ok(Some(TimeWindow::Week)),
            Some("month") => Ok(Some(TimeWindow::Month)),
            Some(other) => Err(AppError::Validation(format!(
                "Invalid filter '{}'. Use today, week or month",
                other
            ))),
        }
    }

    /// Inclusive start and optional exclusive end
    pub fn bounds(&self, now: DateTime<Utc>) -> (DateTime<Utc>, Option<DateTime<Utc>>) {
        let today = now.date_naive();
        match self {
            TimeWindow::Today => (midnight(today), None),
            TimeWindow::Week => {
                let monday = today - Duration::days(today.weekday().num_days_from_monday() as i64);
                (midnight(monday), None)
            }
            TimeWindow::Month => (midnight(today.with_day(1).unwrap_or(today)), None),
            TimeWindow::ExplicitMonth(first) => {
                let end = first.checked_add_months(Months::new(1)).map(midnight);
                (midnight(*first), end)
            }
        }
    }
}

fn midnight(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}
