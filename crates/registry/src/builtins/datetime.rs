//! Date-time converters.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use super::BuiltinError;
use super::config::EpochUnit;

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// RFC 3339 text, normalised to UTC.
pub fn parse_rfc3339(text: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
	DateTime::parse_from_rfc3339(text).map(|dt| dt.with_timezone(&Utc))
}

pub fn from_epoch_int(unit: EpochUnit) -> impl Fn(&i64) -> Result<DateTime<Utc>, BuiltinError> {
	move |&epoch| {
		let dt = match unit {
			EpochUnit::Milliseconds => DateTime::from_timestamp_millis(epoch),
			EpochUnit::Seconds => DateTime::from_timestamp(epoch, 0),
		};
		dt.ok_or(BuiltinError::EpochOutOfRange(epoch as f64))
	}
}

pub fn from_epoch_float(
	unit: EpochUnit,
) -> impl Fn(&f64) -> Result<DateTime<Utc>, BuiltinError> {
	move |&epoch| {
		let out_of_range = BuiltinError::EpochOutOfRange(epoch);
		if !epoch.is_finite() {
			return Err(out_of_range);
		}
		let seconds = match unit {
			EpochUnit::Milliseconds => epoch / 1000.0,
			EpochUnit::Seconds => epoch,
		};
		let whole = seconds.floor();
		if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
			return Err(out_of_range);
		}
		let nanos = (((seconds - whole) * NANOS_PER_SEC).round() as u32).min(999_999_999);
		DateTime::from_timestamp(whole as i64, nanos).ok_or(out_of_range)
	}
}

/// Parses `text` with the strftime-style pattern passed as the format.
///
/// Patterns carrying a zone (`%z`, `%:z`) are honoured. Otherwise the text is
/// read as a local date-time (or a bare date at midnight) in `offset`.
pub fn parse_with_pattern(
	offset: FixedOffset,
) -> impl Fn(&String, Option<&str>) -> Result<DateTime<Utc>, BuiltinError> {
	move |text, pattern| {
		let pattern = pattern.ok_or(BuiltinError::MissingPattern)?;
		if let Ok(dt) = DateTime::parse_from_str(text, pattern) {
			return Ok(dt.with_timezone(&Utc));
		}
		let naive = NaiveDateTime::parse_from_str(text, pattern).or_else(|_| {
			NaiveDate::parse_from_str(text, pattern).map(|date| date.and_time(NaiveTime::MIN))
		})?;
		offset
			.from_local_datetime(&naive)
			.single()
			.map(|dt| dt.with_timezone(&Utc))
			.ok_or(BuiltinError::LocalTimeOutOfRange)
	}
}
