use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::DriverError;

const TIMESTAMP_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Values that can be bound as parameters or read from a result row.
///
/// ```rust
/// use sql_accessor::prelude::*;
///
/// let values = vec![
///     SqlValue::from(1),
///     SqlValue::from("alice"),
///     SqlValue::Null,
/// ];
/// assert_eq!(values[0].sql_type(), SqlType::Integer);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SqlValue {
    /// SQL NULL
    #[default]
    Null,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Float(f32),
    Double(f64),
    Text(String),
    Timestamp(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    /// Binary data
    Blob(Vec<u8>),
    Json(JsonValue),
    /// XML document held as text
    Xml(String),
}

impl SqlValue {
    /// Check if this value is NULL
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The SQL type a driver infers for this host value when binding it.
    #[must_use]
    pub fn sql_type(&self) -> SqlType {
        match self {
            SqlValue::Null => SqlType::Null,
            SqlValue::Bool(_) => SqlType::Boolean,
            SqlValue::TinyInt(_) => SqlType::TinyInt,
            SqlValue::SmallInt(_) => SqlType::SmallInt,
            SqlValue::Int(_) => SqlType::Integer,
            SqlValue::BigInt(_) => SqlType::BigInt,
            SqlValue::Float(_) => SqlType::Real,
            SqlValue::Double(_) => SqlType::Double,
            SqlValue::Text(_) => SqlType::Varchar,
            SqlValue::Timestamp(_) => SqlType::Timestamp,
            SqlValue::Date(_) => SqlType::Date,
            SqlValue::Time(_) => SqlType::Time,
            SqlValue::Blob(_) => SqlType::Blob,
            SqlValue::Json(_) => SqlType::Json,
            SqlValue::Xml(_) => SqlType::SqlXml,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            SqlValue::TinyInt(v) => Some(i64::from(*v)),
            SqlValue::SmallInt(v) => Some(i64::from(*v)),
            SqlValue::Int(v) => Some(i64::from(*v)),
            SqlValue::BigInt(v) => Some(*v),
            SqlValue::Bool(b) => Some(i64::from(*b)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) | SqlValue::Xml(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let SqlValue::Bool(value) = self {
            return Some(*value);
        } else if let Some(i) = self.as_i64() {
            if i == 1 {
                return Some(true);
            } else if i == 0 {
                return Some(false);
            }
        }
        None
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            SqlValue::Float(f) => Some(f64::from(*f)),
            SqlValue::Double(f) => Some(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_timestamp(&self) -> Option<NaiveDateTime> {
        match self {
            SqlValue::Timestamp(value) => Some(*value),
            SqlValue::Date(date) => date.and_hms_opt(0, 0, 0),
            SqlValue::Text(s) => parse_timestamp(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            SqlValue::Date(value) => Some(*value),
            SqlValue::Timestamp(ts) => Some(ts.date()),
            SqlValue::Text(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
                .ok()
                .or_else(|| parse_timestamp(s).map(|ts| ts.date())),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            SqlValue::Time(value) => Some(*value),
            SqlValue::Timestamp(ts) => Some(ts.time()),
            SqlValue::Text(s) => TIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveTime::parse_from_str(s.trim(), fmt).ok())
                .or_else(|| parse_timestamp(s).map(|ts| ts.time())),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_blob(&self) -> Option<&[u8]> {
        if let SqlValue::Blob(bytes) = self {
            Some(bytes)
        } else {
            None
        }
    }

    /// Read as a boolean: non-zero numbers are true, text accepts `true`/`false`/`1`/`0`.
    ///
    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no boolean reading.
    pub fn to_bool(&self) -> Result<Option<bool>, DriverError> {
        match self {
            SqlValue::Null => Ok(None),
            SqlValue::Bool(b) => Ok(Some(*b)),
            SqlValue::Float(_) | SqlValue::Double(_) => Ok(self.as_f64().map(|f| f != 0.0)),
            SqlValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "1" => Ok(Some(true)),
                "false" | "0" => Ok(Some(false)),
                _ => Err(self.conversion_error("BOOLEAN")),
            },
            other => other
                .as_i64()
                .map(|i| Some(i != 0))
                .ok_or_else(|| other.conversion_error("BOOLEAN")),
        }
    }

    /// Read as a 64-bit integer; floating point values are truncated toward zero.
    ///
    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no integer reading.
    pub fn to_i64(&self) -> Result<Option<i64>, DriverError> {
        match self {
            SqlValue::Null => Ok(None),
            SqlValue::Float(_) | SqlValue::Double(_) => match self.as_f64() {
                Some(f) if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 => {
                    Ok(Some(f.trunc() as i64))
                }
                _ => Err(self.conversion_error("BIGINT")),
            },
            SqlValue::Text(s) => s
                .trim()
                .parse::<i64>()
                .map(Some)
                .map_err(|_| self.conversion_error("BIGINT")),
            other => other
                .as_i64()
                .map(Some)
                .ok_or_else(|| other.conversion_error("BIGINT")),
        }
    }

    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no integer reading or overflows.
    pub fn to_i32(&self) -> Result<Option<i32>, DriverError> {
        self.narrow(SqlType::Integer)
    }

    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no integer reading or overflows.
    pub fn to_i16(&self) -> Result<Option<i16>, DriverError> {
        self.narrow(SqlType::SmallInt)
    }

    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no integer reading or overflows.
    pub fn to_i8(&self) -> Result<Option<i8>, DriverError> {
        self.narrow(SqlType::TinyInt)
    }

    fn narrow<T: TryFrom<i64>>(&self, target: SqlType) -> Result<Option<T>, DriverError> {
        match self.to_i64()? {
            None => Ok(None),
            Some(wide) => T::try_from(wide)
                .map(Some)
                .map_err(|_| self.conversion_error(target.name())),
        }
    }

    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no numeric reading.
    pub fn to_f64(&self) -> Result<Option<f64>, DriverError> {
        match self {
            SqlValue::Null => Ok(None),
            SqlValue::Text(s) => s
                .trim()
                .parse::<f64>()
                .map(Some)
                .map_err(|_| self.conversion_error("DOUBLE")),
            SqlValue::Bool(_) => Err(self.conversion_error("DOUBLE")),
            other => other
                .as_f64()
                .or_else(|| other.as_i64().map(|i| i as f64))
                .map(Some)
                .ok_or_else(|| other.conversion_error("DOUBLE")),
        }
    }

    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no numeric reading.
    pub fn to_f32(&self) -> Result<Option<f32>, DriverError> {
        self.to_f64().map(|v| v.map(|f| f as f32))
    }

    /// Render as text the way a driver's string getter would.
    ///
    /// # Errors
    /// Returns `DriverError::Conversion` for binary values.
    pub fn to_text(&self) -> Result<Option<String>, DriverError> {
        match self {
            SqlValue::Null => Ok(None),
            SqlValue::Text(s) | SqlValue::Xml(s) => Ok(Some(s.clone())),
            SqlValue::Bool(b) => Ok(Some(b.to_string())),
            SqlValue::TinyInt(v) => Ok(Some(v.to_string())),
            SqlValue::SmallInt(v) => Ok(Some(v.to_string())),
            SqlValue::Int(v) => Ok(Some(v.to_string())),
            SqlValue::BigInt(v) => Ok(Some(v.to_string())),
            SqlValue::Float(v) => Ok(Some(v.to_string())),
            SqlValue::Double(v) => Ok(Some(v.to_string())),
            SqlValue::Timestamp(ts) => Ok(Some(ts.format("%F %T%.f").to_string())),
            SqlValue::Date(d) => Ok(Some(d.format("%F").to_string())),
            SqlValue::Time(t) => Ok(Some(t.format("%T%.f").to_string())),
            SqlValue::Json(j) => Ok(Some(j.to_string())),
            SqlValue::Blob(_) => Err(self.conversion_error("VARCHAR")),
        }
    }

    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no timestamp reading.
    pub fn to_timestamp(&self) -> Result<Option<NaiveDateTime>, DriverError> {
        if self.is_null() {
            return Ok(None);
        }
        self.as_timestamp()
            .map(Some)
            .ok_or_else(|| self.conversion_error("TIMESTAMP"))
    }

    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no date reading.
    pub fn to_date(&self) -> Result<Option<NaiveDate>, DriverError> {
        if self.is_null() {
            return Ok(None);
        }
        self.as_date()
            .map(Some)
            .ok_or_else(|| self.conversion_error("DATE"))
    }

    /// # Errors
    /// Returns `DriverError::Conversion` when the value has no time reading.
    pub fn to_time(&self) -> Result<Option<NaiveTime>, DriverError> {
        if self.is_null() {
            return Ok(None);
        }
        self.as_time()
            .map(Some)
            .ok_or_else(|| self.conversion_error("TIME"))
    }

    pub(crate) fn conversion_error(&self, target: &str) -> DriverError {
        DriverError::Conversion(format!(
            "cannot read {} value {self} as {target}",
            self.sql_type()
        ))
    }
}

fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
}

impl fmt::Display for SqlValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SqlValue::Null => f.write_str("NULL"),
            SqlValue::Bool(b) => write!(f, "{b}"),
            SqlValue::TinyInt(v) => write!(f, "{v}"),
            SqlValue::SmallInt(v) => write!(f, "{v}"),
            SqlValue::Int(v) => write!(f, "{v}"),
            SqlValue::BigInt(v) => write!(f, "{v}"),
            SqlValue::Float(v) => write!(f, "{v}"),
            SqlValue::Double(v) => write!(f, "{v}"),
            SqlValue::Text(s) | SqlValue::Xml(s) => write!(f, "'{s}'"),
            SqlValue::Timestamp(ts) => write!(f, "{}", ts.format("%F %T%.f")),
            SqlValue::Date(d) => write!(f, "{}", d.format("%F")),
            SqlValue::Time(t) => write!(f, "{}", t.format("%T%.f")),
            SqlValue::Blob(bytes) => write!(f, "<blob {} bytes>", bytes.len()),
            SqlValue::Json(j) => write!(f, "{j}"),
        }
    }
}

macro_rules! sql_value_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for SqlValue {
                fn from(value: $ty) -> Self {
                    SqlValue::$variant(value)
                }
            }
        )*
    };
}

sql_value_from! {
    bool => Bool,
    i8 => TinyInt,
    i16 => SmallInt,
    i32 => Int,
    i64 => BigInt,
    f32 => Float,
    f64 => Double,
    String => Text,
    NaiveDateTime => Timestamp,
    NaiveDate => Date,
    NaiveTime => Time,
    Vec<u8> => Blob,
    JsonValue => Json,
}

impl From<u32> for SqlValue {
    fn from(value: u32) -> Self {
        SqlValue::BigInt(i64::from(value))
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<&[u8]> for SqlValue {
    fn from(value: &[u8]) -> Self {
        SqlValue::Blob(value.to_vec())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

/// SQL type codes used for typed NULL binding, output parameters and column metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SqlType {
    Boolean,
    Bit,
    TinyInt,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Float,
    Double,
    Numeric,
    Char,
    Varchar,
    LongVarchar,
    Clob,
    Date,
    Time,
    Timestamp,
    Blob,
    Binary,
    SqlXml,
    Json,
    Null,
    Other,
}

impl SqlType {
    /// The type used to bind a NULL when nothing better is known.
    ///
    /// VARCHAR is accepted by most drivers regardless of the real column type, where NULL and
    /// OTHER are not.
    pub const DEFAULT_NULL: SqlType = SqlType::Varchar;

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            SqlType::Boolean => "BOOLEAN",
            SqlType::Bit => "BIT",
            SqlType::TinyInt => "TINYINT",
            SqlType::SmallInt => "SMALLINT",
            SqlType::Integer => "INTEGER",
            SqlType::BigInt => "BIGINT",
            SqlType::Real => "REAL",
            SqlType::Float => "FLOAT",
            SqlType::Double => "DOUBLE",
            SqlType::Numeric => "NUMERIC",
            SqlType::Char => "CHAR",
            SqlType::Varchar => "VARCHAR",
            SqlType::LongVarchar => "LONGVARCHAR",
            SqlType::Clob => "CLOB",
            SqlType::Date => "DATE",
            SqlType::Time => "TIME",
            SqlType::Timestamp => "TIMESTAMP",
            SqlType::Blob => "BLOB",
            SqlType::Binary => "BINARY",
            SqlType::SqlXml => "SQLXML",
            SqlType::Json => "JSON",
            SqlType::Null => "NULL",
            SqlType::Other => "OTHER",
        }
    }

    /// Map a declared column type (`VARCHAR(20)`, `bigint`, `DATETIME`, ...) onto a type code.
    ///
    /// Exact keywords are checked first, then SQLite-style affinity substrings.
    #[must_use]
    pub fn from_declared(declared: &str) -> SqlType {
        let upper = declared.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or_default().trim();
        match base {
            "BOOLEAN" | "BOOL" => return SqlType::Boolean,
            "BIT" => return SqlType::Bit,
            "TINYINT" => return SqlType::TinyInt,
            "SMALLINT" | "INT2" => return SqlType::SmallInt,
            "INT" | "INTEGER" | "MEDIUMINT" | "INT4" => return SqlType::Integer,
            "BIGINT" | "INT8" => return SqlType::BigInt,
            "REAL" => return SqlType::Real,
            "FLOAT" => return SqlType::Float,
            "DOUBLE" | "DOUBLE PRECISION" => return SqlType::Double,
            "NUMERIC" | "DECIMAL" => return SqlType::Numeric,
            "CHAR" | "CHARACTER" | "NCHAR" => return SqlType::Char,
            "CLOB" => return SqlType::Clob,
            "DATE" => return SqlType::Date,
            "TIME" => return SqlType::Time,
            "TIMESTAMP" | "DATETIME" => return SqlType::Timestamp,
            "XML" | "SQLXML" => return SqlType::SqlXml,
            "JSON" | "JSONB" => return SqlType::Json,
            "" => return SqlType::Other,
            _ => {}
        }
        if base.contains("INT") {
            SqlType::BigInt
        } else if base.contains("CHAR") || base.contains("TEXT") {
            SqlType::Varchar
        } else if base.contains("BLOB") || base.contains("BINARY") {
            SqlType::Blob
        } else if base.contains("REAL") || base.contains("FLOA") || base.contains("DOUB") {
            SqlType::Double
        } else {
            SqlType::Numeric
        }
    }
}

impl fmt::Display for SqlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A stored-procedure output parameter.
///
/// The handle is cheap to clone; all clones share the slot the accessor writes after execution,
/// so keep one and pass a clone inside the parameter list:
///
/// ```rust
/// use sql_accessor::prelude::*;
///
/// let total = OutParameter::new(SqlType::Integer);
/// let params = params![7, total.clone()];
/// assert_eq!(params.len(), 2);
/// assert!(total.value().is_null());
/// ```
#[derive(Debug, Clone)]
pub struct OutParameter {
    sql_type: SqlType,
    value: Arc<Mutex<SqlValue>>,
}

impl OutParameter {
    #[must_use]
    pub fn new(sql_type: SqlType) -> Self {
        Self::with_value(sql_type, SqlValue::Null)
    }

    /// An in/out parameter: `value` is bound as input when not NULL.
    #[must_use]
    pub fn with_value(sql_type: SqlType, value: SqlValue) -> Self {
        Self {
            sql_type,
            value: Arc::new(Mutex::new(value)),
        }
    }

    #[must_use]
    pub fn sql_type(&self) -> SqlType {
        self.sql_type
    }

    /// The current value: the input value before execution, the returned value afterwards.
    #[must_use]
    pub fn value(&self) -> SqlValue {
        self.value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_value(&self, value: SqlValue) {
        *self.value.lock().unwrap_or_else(PoisonError::into_inner) = value;
    }
}

impl fmt::Display for OutParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.value();
        if value.is_null() {
            write!(f, "OUT({})", self.sql_type)
        } else {
            write!(f, "OUT({}, {value})", self.sql_type)
        }
    }
}

/// One positional statement parameter.
#[derive(Debug, Clone)]
pub enum Param {
    Value(SqlValue),
    Out(OutParameter),
}

impl Param {
    #[must_use]
    pub fn null() -> Self {
        Param::Value(SqlValue::Null)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Param::Value(SqlValue::Null))
    }

    #[must_use]
    pub fn as_value(&self) -> Option<&SqlValue> {
        match self {
            Param::Value(v) => Some(v),
            Param::Out(_) => None,
        }
    }

    #[must_use]
    pub fn as_out(&self) -> Option<&OutParameter> {
        match self {
            Param::Out(out) => Some(out),
            Param::Value(_) => None,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Value(v) => v.fmt(f),
            Param::Out(out) => out.fmt(f),
        }
    }
}

impl From<SqlValue> for Param {
    fn from(value: SqlValue) -> Self {
        Param::Value(value)
    }
}

impl From<OutParameter> for Param {
    fn from(out: OutParameter) -> Self {
        Param::Out(out)
    }
}

impl From<&OutParameter> for Param {
    fn from(out: &OutParameter) -> Self {
        Param::Out(out.clone())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for Param {
    fn from(value: Option<T>) -> Self {
        Param::Value(value.into())
    }
}

macro_rules! param_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Param {
                fn from(value: $ty) -> Self {
                    Param::Value(SqlValue::from(value))
                }
            }
        )*
    };
}

param_from!(
    bool,
    i8,
    i16,
    i32,
    i64,
    u32,
    f32,
    f64,
    String,
    &str,
    NaiveDateTime,
    NaiveDate,
    NaiveTime,
    Vec<u8>,
    &[u8],
    JsonValue,
);

/// Render a parameter list for error messages, e.g. `[7, 'x', NULL, OUT(INTEGER)]`.
#[must_use]
pub fn render_params(params: &[Param]) -> String {
    let mut out = String::from("[");
    for (i, p) in params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&p.to_string());
    }
    out.push(']');
    out
}

/// Render a batch parameter matrix, one bracketed list per row.
#[must_use]
pub fn render_param_rows(rows: &[Vec<Param>]) -> String {
    let rendered: Vec<String> = rows.iter().map(|row| render_params(row)).collect();
    format!("[{}]", rendered.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lenient_readings() {
        assert_eq!(SqlValue::Int(1).as_bool(), Some(true));
        assert_eq!(SqlValue::BigInt(2).as_bool(), None);
        assert_eq!(
            SqlValue::Text("2024-03-01 10:11:12".into()).as_timestamp(),
            NaiveDate::from_ymd_opt(2024, 3, 1).and_then(|d| d.and_hms_opt(10, 11, 12))
        );
        assert_eq!(
            SqlValue::Text("2024-03-01".into()).as_date(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn narrowing_checks_range() {
        assert_eq!(SqlValue::BigInt(120).to_i8().unwrap(), Some(120));
        assert!(SqlValue::BigInt(300).to_i8().is_err());
        assert_eq!(SqlValue::Double(7.9).to_i32().unwrap(), Some(7));
        assert_eq!(SqlValue::Null.to_i32().unwrap(), None);
        assert_eq!(SqlValue::Text(" 42 ".into()).to_i64().unwrap(), Some(42));
    }

    #[test]
    fn doubles_at_the_i64_edge_do_not_saturate() {
        // 2^63 is exactly representable as f64 but one past i64::MAX.
        assert!(SqlValue::Double(9_223_372_036_854_775_808.0).to_i64().is_err());
        assert!(SqlValue::Double(9.3e18).to_i64().is_err());
        assert_eq!(
            SqlValue::Double(-9_223_372_036_854_775_808.0).to_i64().unwrap(),
            Some(i64::MIN)
        );
        assert_eq!(
            SqlValue::Double(9_223_372_036_854_774_784.0).to_i64().unwrap(),
            Some(9_223_372_036_854_774_784)
        );
    }

    #[test]
    fn default_value_is_null() {
        assert_eq!(SqlValue::default(), SqlValue::Null);
    }

    #[test]
    fn declared_types() {
        assert_eq!(SqlType::from_declared("varchar(20)"), SqlType::Varchar);
        assert_eq!(SqlType::from_declared("INTEGER"), SqlType::Integer);
        assert_eq!(SqlType::from_declared("unsigned big int"), SqlType::BigInt);
        assert_eq!(SqlType::from_declared("datetime"), SqlType::Timestamp);
        assert_eq!(SqlType::from_declared(""), SqlType::Other);
        assert_eq!(SqlType::from_declared("money"), SqlType::Numeric);
    }

    #[test]
    fn renders_nested_params() {
        let out = OutParameter::new(SqlType::Integer);
        let params = vec![Param::from(7), Param::from("x"), Param::null(), Param::from(&out)];
        assert_eq!(render_params(&params), "[7, 'x', NULL, OUT(INTEGER)]");
        let rows = vec![vec![Param::from(1)], vec![Param::from(2)]];
        assert_eq!(render_param_rows(&rows), "[[1], [2]]");
    }

    #[test]
    fn out_parameter_clones_share_value() {
        let out = OutParameter::new(SqlType::Varchar);
        let clone = out.clone();
        clone.set_value(SqlValue::from("done"));
        assert_eq!(out.value(), SqlValue::Text("done".into()));
    }
}
