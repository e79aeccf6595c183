//! Timestamp normalization for upstream date strings.
//!
//! UTC fields are stored as RFC 3339 in UTC with millisecond precision so
//! they sort correctly as text. Local dates keep their offset. Empty strings
//! become NULL.

use crate::api::Collection;
use crate::error::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};

fn parse(
    collection: Collection,
    index: usize,
    field: &str,
    value: &str,
) -> Result<DateTime<chrono::FixedOffset>> {
    DateTime::parse_from_rfc3339(value).map_err(|e| Error::MalformedRecord {
        collection: collection.to_string(),
        index,
        reason: format!("{} {:?} is not an RFC 3339 timestamp: {}", field, value, e),
    })
}

/// Rewrite `value` in place as a UTC timestamp
pub(super) fn normalize_utc(
    collection: Collection,
    index: usize,
    field: &str,
    value: &mut Option<String>,
) -> Result<()> {
    *value = match value.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            parse(collection, index, field, raw)?
                .with_timezone(&Utc)
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        ),
    };
    Ok(())
}

/// Rewrite `value` in place, keeping its UTC offset
pub(super) fn normalize_local(
    collection: Collection,
    index: usize,
    field: &str,
    value: &mut Option<String>,
) -> Result<()> {
    *value = match value.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(
            parse(collection, index, field, raw)?.to_rfc3339_opts(SecondsFormat::Millis, false),
        ),
    };
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(raw: Option<&str>) -> Result<Option<String>> {
        let mut value = raw.map(str::to_string);
        normalize_utc(Collection::Launches, 0, "date_utc", &mut value)?;
        Ok(value)
    }

    #[test]
    fn test_utc_is_normalized() {
        assert_eq!(
            utc(Some("2006-03-24T22:30:00.000Z")).unwrap().as_deref(),
            Some("2006-03-24T22:30:00.000Z")
        );
        assert_eq!(
            utc(Some("2006-03-25T10:30:00+12:00")).unwrap().as_deref(),
            Some("2006-03-24T22:30:00.000Z")
        );
        assert_eq!(utc(Some("")).unwrap(), None);
        assert_eq!(utc(None).unwrap(), None);
    }

    #[test]
    fn test_bad_timestamp_is_malformed() {
        let err = utc(Some("last tuesday")).unwrap_err();
        assert!(err.is_record_error());
        assert!(err.to_string().contains("date_utc"));
    }

    #[test]
    fn test_local_keeps_offset() {
        let mut value = Some("2006-03-25T10:30:00+12:00".to_string());
        normalize_local(Collection::Launches, 0, "date_local", &mut value).unwrap();
        assert_eq!(value.as_deref(), Some("2006-03-25T10:30:00.000+12:00"));
    }
}
