use rusqlite::types::Value;

use crate::types::SqlValue;

/// Convert a bound [`SqlValue`] into the value rusqlite stores.
///
/// Booleans become 0/1, temporal values become ISO text and JSON/XML are stored as text.
#[must_use]
pub fn sql_value_to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Integer(i64::from(*b)),
        SqlValue::TinyInt(i) => Value::Integer(i64::from(*i)),
        SqlValue::SmallInt(i) => Value::Integer(i64::from(*i)),
        SqlValue::Int(i) => Value::Integer(i64::from(*i)),
        SqlValue::BigInt(i) => Value::Integer(*i),
        SqlValue::Float(f) => Value::Real(f64::from(*f)),
        SqlValue::Double(f) => Value::Real(*f),
        SqlValue::Text(s) | SqlValue::Xml(s) => Value::Text(s.clone()),
        SqlValue::Timestamp(dt) => Value::Text(dt.format("%F %T%.f").to_string()),
        SqlValue::Date(d) => Value::Text(d.format("%F").to_string()),
        SqlValue::Time(t) => Value::Text(t.format("%T%.f").to_string()),
        SqlValue::Blob(bytes) => Value::Blob(bytes.clone()),
        SqlValue::Json(json) => Value::Text(json.to_string()),
    }
}

/// Convert a stored rusqlite value back into a [`SqlValue`], by storage class.
#[must_use]
pub fn sqlite_to_sql_value(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(i) => SqlValue::BigInt(i),
        Value::Real(f) => SqlValue::Double(f),
        Value::Text(s) => SqlValue::Text(s),
        Value::Blob(b) => SqlValue::Blob(b),
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn host_values_map_onto_storage_classes() {
        assert_eq!(sql_value_to_sqlite(&SqlValue::Bool(true)), Value::Integer(1));
        assert_eq!(sql_value_to_sqlite(&SqlValue::Float(1.5)), Value::Real(1.5));
        let ts = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(3, 4, 5))
            .unwrap();
        assert_eq!(
            sql_value_to_sqlite(&SqlValue::Timestamp(ts)),
            Value::Text("2024-01-02 03:04:05".into())
        );
        assert_eq!(
            sql_value_to_sqlite(&SqlValue::Json(serde_json::json!({"a": 1}))),
            Value::Text(r#"{"a":1}"#.into())
        );
        assert_eq!(sqlite_to_sql_value(Value::Integer(4)), SqlValue::BigInt(4));
    }
}
