//! UTC timestamp formatting for values written to the store.

use thiserror::Error;
use time::{OffsetDateTime, format_description};

/// SQL `DATETIME` layout.
pub const DEFAULT_DATE_FORMAT: &str = "[year]-[month]-[day] [hour]:[minute]:[second]";

#[derive(Debug, Error)]
pub enum DateError {
    #[error("invalid date format: {0}")]
    Format(#[from] time::error::InvalidFormatDescription),
    #[error("timestamp out of range: {0}")]
    Range(#[from] time::error::ComponentRange),
    #[error("failed to format date: {0}")]
    Render(#[from] time::error::Format),
}

/// Format `timestamp` (seconds since the epoch, `None` for now) in UTC.
pub fn utc_date(format: Option<&str>, timestamp: Option<i64>) -> Result<String, DateError> {
    let items = format_description::parse(format.unwrap_or(DEFAULT_DATE_FORMAT))?;
    let instant = match timestamp {
        Some(seconds) => OffsetDateTime::from_unix_timestamp(seconds)?,
        None => OffsetDateTime::now_utc(),
    };
    Ok(instant.format(&items)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_format_is_sql_datetime() {
        let formatted = utc_date(None, Some(1_700_000_000)).expect("formatted");
        assert_eq!(formatted, "2023-11-14 22:13:20");
    }

    #[test]
    fn custom_format_is_honoured() {
        let formatted = utc_date(Some("[year]/[month]/[day]"), Some(0)).expect("formatted");
        assert_eq!(formatted, "1970/01/01");
    }

    #[test]
    fn now_uses_default_layout() {
        let formatted = utc_date(None, None).expect("formatted");
        assert_eq!(formatted.len(), "1970-01-01 00:00:00".len());
    }

    #[test]
    fn invalid_format_is_rejected() {
        let err = utc_date(Some("[nonsense]"), Some(0)).expect_err("bad format");
        assert!(matches!(err, DateError::Format(_)));
    }

    #[test]
    fn out_of_range_timestamp_is_rejected() {
        let err = utc_date(None, Some(i64::MAX)).expect_err("out of range");
        assert!(matches!(err, DateError::Range(_)));
    }
}
