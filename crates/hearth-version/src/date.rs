use time::{Date, Month};

use crate::error::{Result, VersionError};
use crate::Version;

/// Digit layout of a calendar date packed into a version's minor component.
///
/// Synthetic versions from [`crate::date_commit_version`] use [`DateEncoding::Short`]
/// (`YYMMDD`). Changelog tooling historically expects [`DateEncoding::Long`]
/// (`YYYYMMDD`). The two are not interchangeable, so callers pick one explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DateEncoding {
    /// `YYMMDD`, years 2000-2099.
    Short,
    /// `YYYYMMDD`.
    Long,
}

impl DateEncoding {
    fn digits(self) -> usize {
        match self {
            DateEncoding::Short => 6,
            DateEncoding::Long => 8,
        }
    }

    fn year_digits(self) -> usize {
        self.digits() - 4
    }
}

impl Version {
    /// Decodes the minor component as a calendar date and renders it as `YYYY-MM-DD`.
    ///
    /// Fails when the minor component does not have exactly the digit count of
    /// `encoding`, or when the digits do not name a real day.
    pub fn calendar_date(&self, encoding: DateEncoding) -> Result<String> {
        let digits = self.minor().to_string();
        if digits.len() != encoding.digits() {
            return Err(VersionError::DateLayout {
                version: self.to_string(),
                encoding,
                expected: encoding.digits(),
                found: digits.len(),
            });
        }

        let (year, rest) = digits.split_at(encoding.year_digits());
        let (month, day) = rest.split_at(2);
        // All slices are ASCII digits of bounded width, so these parses cannot overflow.
        let mut year: i32 = year.parse().unwrap_or_default();
        let month: u8 = month.parse().unwrap_or_default();
        let day: u8 = day.parse().unwrap_or_default();
        if encoding == DateEncoding::Short {
            year += 2000;
        }

        let invalid = |source| VersionError::InvalidDate {
            version: self.to_string(),
            source,
        };
        let month = Month::try_from(month).map_err(invalid)?;
        let date = Date::from_calendar_date(year, month, day).map_err(invalid)?;

        Ok(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            u8::from(date.month()),
            date.day()
        ))
    }

    /// The `YYYY-MM-DD` date used for changelog headings (8-digit minor layout).
    pub fn changelog_date(&self) -> Result<String> {
        self.calendar_date(DateEncoding::Long)
    }
}
