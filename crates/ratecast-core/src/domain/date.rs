use std::fmt::{Display, Formatter};

use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::ValidationError;

/// Calendar day rendered as `DD.MM.YYYY`, the form used by the rate source
/// query string and by broadcast reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReportDate(Date);

impl ReportDate {
    pub const fn new(date: Date) -> Self {
        Self(date)
    }

    /// Today's local calendar date, or the UTC date when the local offset
    /// cannot be determined.
    pub fn today() -> Self {
        let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
        Self(now.date())
    }

    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), format_description!("[day].[month].[year]"))
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// The date `days` calendar days before this one.
    pub fn days_before(self, days: u32) -> Option<Self> {
        self.0
            .checked_sub(Duration::days(i64::from(days)))
            .map(Self)
    }

    pub const fn into_inner(self) -> Date {
        self.0
    }
}

impl Display for ReportDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:02}.{:02}.{:04}",
            self.0.day(),
            u8::from(self.0.month()),
            self.0.year()
        )
    }
}
