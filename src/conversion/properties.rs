use chrono::{NaiveDate, NaiveTime};

use crate::error::DriverError;
use crate::record::TargetType;
use crate::types::SqlValue;

/// Coerces an extracted column value into the exact shape a record field declares.
pub trait PropertyHandler: Send + Sync {
    fn matches(&self, target: TargetType, value: &SqlValue) -> bool;

    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no reading as `target`.
    fn apply(&self, target: TargetType, value: SqlValue) -> Result<SqlValue, DriverError>;
}

/// Moves temporal values between timestamp, date and time fields.
///
/// Textual temporal values (as stored by SQLite) are parsed. A bare time placed into a date or
/// timestamp field lands on 1970-01-01; a bare date placed into a time field becomes midnight.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatePropertyHandler;

fn epoch() -> NaiveDate {
    NaiveDate::default()
}

impl PropertyHandler for DatePropertyHandler {
    fn matches(&self, target: TargetType, value: &SqlValue) -> bool {
        target.is_temporal()
            && matches!(
                value,
                SqlValue::Timestamp(_) | SqlValue::Date(_) | SqlValue::Time(_) | SqlValue::Text(_)
            )
    }

    fn apply(&self, target: TargetType, value: SqlValue) -> Result<SqlValue, DriverError> {
        let converted = match (target, &value) {
            (TargetType::Date, SqlValue::Time(_)) => Some(SqlValue::Date(epoch())),
            (TargetType::Date, _) => value.as_date().map(SqlValue::Date),
            (TargetType::Time, SqlValue::Date(_)) => Some(SqlValue::Time(NaiveTime::MIN)),
            (TargetType::Time, _) => value.as_time().map(SqlValue::Time),
            (TargetType::Timestamp, SqlValue::Time(t)) => {
                Some(SqlValue::Timestamp(epoch().and_time(*t)))
            }
            (TargetType::Timestamp, _) => value.as_timestamp().map(SqlValue::Timestamp),
            _ => Some(value.clone()),
        };
        converted.ok_or_else(|| value.conversion_error(&format!("{target:?}").to_uppercase()))
    }
}

/// Checks text against the variant names of an enumeration field.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringEnumPropertyHandler;

impl PropertyHandler for StringEnumPropertyHandler {
    fn matches(&self, target: TargetType, value: &SqlValue) -> bool {
        matches!(target, TargetType::Enum { .. }) && matches!(value, SqlValue::Text(_))
    }

    fn apply(&self, target: TargetType, value: SqlValue) -> Result<SqlValue, DriverError> {
        match (target, &value) {
            (TargetType::Enum { name, variants }, SqlValue::Text(text)) => {
                if variants.contains(&text.as_str()) {
                    Ok(value)
                } else {
                    Err(DriverError::Conversion(format!(
                        "no variant {name}::{text}, expected one of {variants:?}"
                    )))
                }
            }
            _ => Ok(value),
        }
    }
}

#[must_use]
pub fn default_property_handlers() -> Vec<Box<dyn PropertyHandler>> {
    vec![Box::new(DatePropertyHandler), Box::new(StringEnumPropertyHandler)]
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDateTime;

    use super::*;

    fn ts(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    #[test]
    fn timestamp_into_date_keeps_the_day() {
        let value = SqlValue::Timestamp(ts("2024-02-29 23:59:59"));
        assert!(DatePropertyHandler.matches(TargetType::Date, &value));
        assert_eq!(
            DatePropertyHandler.apply(TargetType::Date, value).unwrap(),
            SqlValue::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
    }

    #[test]
    fn bare_time_lands_on_epoch() {
        let time = NaiveTime::from_hms_opt(8, 30, 0).unwrap();
        assert_eq!(
            DatePropertyHandler
                .apply(TargetType::Timestamp, SqlValue::Time(time))
                .unwrap(),
            SqlValue::Timestamp(ts("1970-01-01 08:30:00"))
        );
    }

    #[test]
    fn text_is_parsed_or_rejected() {
        assert_eq!(
            DatePropertyHandler
                .apply(TargetType::Time, SqlValue::from("12:00:01"))
                .unwrap(),
            SqlValue::Time(NaiveTime::from_hms_opt(12, 0, 1).unwrap())
        );
        assert!(
            DatePropertyHandler
                .apply(TargetType::Date, SqlValue::from("soon"))
                .is_err()
        );
        assert!(!DatePropertyHandler.matches(TargetType::String, &SqlValue::from("x")));
    }

    #[test]
    fn enum_text_must_name_a_variant() {
        let target = TargetType::Enum {
            name: "Status",
            variants: &["Active", "Closed"],
        };
        let ok = SqlValue::from("Closed");
        assert!(StringEnumPropertyHandler.matches(target, &ok));
        assert_eq!(StringEnumPropertyHandler.apply(target, ok.clone()).unwrap(), ok);
        let err = StringEnumPropertyHandler
            .apply(target, SqlValue::from("closed"))
            .unwrap_err();
        assert!(err.to_string().contains("Status::closed"));
    }
}
