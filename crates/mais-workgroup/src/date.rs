//! Dates as the Workgroup API writes them (`1-Jan-2025`).

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::America::Los_Angeles;
use mais_core::{Error, Result};

const DATE_FORMAT: &str = "%d-%b-%Y";

/// Parse a `D-Mon-YYYY` date. The month abbreviation is case-insensitive.
pub fn parse_date(raw: &str) -> Result<NaiveDate> {
  NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
    .map_err(|e| Error::Decode(format!("bad workgroup date {raw:?}: {e}")))
}

/// The calendar date at Stanford at `instant`, daylight time included.
pub fn pacific_date(instant: DateTime<Utc>) -> NaiveDate {
  instant.with_timezone(&Los_Angeles).date_naive()
}

/// Today's date at Stanford.
pub fn pacific_today() -> NaiveDate { pacific_date(Utc::now()) }
