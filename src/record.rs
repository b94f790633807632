//! Structured records: types whose fields are filled from result columns by name.
//!
//! A record describes its fields once through a static [`FieldDescriptor`] table. The
//! [`crate::record!`] macro declares the struct and generates that table together with the typed
//! setters and getters, so no runtime reflection is involved.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;

use crate::error::DriverError;
use crate::types::{SqlType, SqlValue};

/// The declared type of a record field, as seen by the row conversion pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    String,
    Timestamp,
    Date,
    Time,
    Xml,
    Bytes,
    Json,
    /// A string-backed enumeration with its type name and accepted variant names.
    Enum {
        name: &'static str,
        variants: &'static [&'static str],
    },
    /// Any value, taken as the driver reports it.
    Object,
}

impl TargetType {
    /// The target used when converting a column of `sql_type` without a record field to guide it.
    #[must_use]
    pub fn for_column(sql_type: SqlType) -> TargetType {
        match sql_type {
            SqlType::Boolean | SqlType::Bit => TargetType::Bool,
            SqlType::TinyInt => TargetType::I8,
            SqlType::SmallInt => TargetType::I16,
            SqlType::Integer => TargetType::I32,
            SqlType::BigInt => TargetType::I64,
            SqlType::Real => TargetType::F32,
            SqlType::Float | SqlType::Double => TargetType::F64,
            SqlType::Char | SqlType::Varchar | SqlType::LongVarchar | SqlType::Clob => {
                TargetType::String
            }
            SqlType::Timestamp => TargetType::Timestamp,
            SqlType::Date => TargetType::Date,
            SqlType::Time => TargetType::Time,
            SqlType::SqlXml => TargetType::Xml,
            SqlType::Blob | SqlType::Binary => TargetType::Bytes,
            SqlType::Json => TargetType::Json,
            SqlType::Numeric | SqlType::Null | SqlType::Other => TargetType::Object,
        }
    }

    #[must_use]
    pub fn is_temporal(self) -> bool {
        matches!(
            self,
            TargetType::Timestamp | TargetType::Date | TargetType::Time
        )
    }
}

/// Name and declared type of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    name: &'static str,
    target: TargetType,
}

impl FieldDescriptor {
    #[must_use]
    pub const fn new(name: &'static str, target: TargetType) -> Self {
        Self { name, target }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[must_use]
    pub fn target(&self) -> TargetType {
        self.target
    }
}

/// A value holder whose fields can be set from and read back as [`SqlValue`]s.
///
/// Usually implemented through [`crate::record!`]:
///
/// ```rust
/// use sql_accessor::prelude::*;
///
/// sql_accessor::record! {
///     #[derive(Debug, Default, PartialEq)]
///     pub struct Customer {
///         pub customer_id: i64,
///         pub name: String,
///         pub email: Option<String>,
///     }
/// }
///
/// let mut c = Customer::default();
/// c.set_field("name", SqlValue::from("Ada")).unwrap();
/// assert_eq!(c.field_value("name"), Some(SqlValue::from("Ada")));
/// assert_eq!(Customer::fields().len(), 3);
/// ```
pub trait Record: Default {
    fn fields() -> &'static [FieldDescriptor];

    /// Assign a field by name. A NULL leaves a non-optional field at its current value.
    ///
    /// # Errors
    /// Returns `DriverError` if the field does not exist or the value does not convert.
    fn set_field(&mut self, name: &str, value: SqlValue) -> Result<(), DriverError>;

    /// The current value of a field, `None` if there is no such field.
    fn field_value(&self, name: &str) -> Option<SqlValue>;
}

/// Conversion between a field's Rust type and [`SqlValue`].
pub trait SqlField: Sized {
    const TARGET: TargetType;

    /// `Ok(None)` means "keep the field's current value" and is returned for NULL.
    ///
    /// # Errors
    /// Returns `DriverError::Conversion` when the value cannot become `Self`.
    fn from_sql(value: SqlValue) -> Result<Option<Self>, DriverError>;

    fn to_sql(&self) -> SqlValue;
}

/// XML document content. Binds and reads as SQLXML rather than plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlXml(pub String);

macro_rules! lenient_field {
    ($($ty:ty => $target:ident, $reader:ident);* $(;)?) => {
        $(
            impl SqlField for $ty {
                const TARGET: TargetType = TargetType::$target;

                fn from_sql(value: SqlValue) -> Result<Option<Self>, DriverError> {
                    value.$reader()
                }

                fn to_sql(&self) -> SqlValue {
                    SqlValue::from(self.clone())
                }
            }
        )*
    };
}

lenient_field! {
    bool => Bool, to_bool;
    i8 => I8, to_i8;
    i16 => I16, to_i16;
    i32 => I32, to_i32;
    i64 => I64, to_i64;
    f32 => F32, to_f32;
    f64 => F64, to_f64;
    String => String, to_text;
}

// Temporal fields only accept their exact variant; other temporal shapes go through
// `DatePropertyHandler` first.
macro_rules! exact_field {
    ($($ty:ty => $target:ident, $variant:ident);* $(;)?) => {
        $(
            impl SqlField for $ty {
                const TARGET: TargetType = TargetType::$target;

                fn from_sql(value: SqlValue) -> Result<Option<Self>, DriverError> {
                    match value {
                        SqlValue::Null => Ok(None),
                        SqlValue::$variant(v) => Ok(Some(v)),
                        other => Err(other.conversion_error(stringify!($target))),
                    }
                }

                fn to_sql(&self) -> SqlValue {
                    SqlValue::$variant(self.clone())
                }
            }
        )*
    };
}

exact_field! {
    NaiveDateTime => Timestamp, Timestamp;
    NaiveDate => Date, Date;
    NaiveTime => Time, Time;
    Vec<u8> => Bytes, Blob;
}

impl SqlField for JsonValue {
    const TARGET: TargetType = TargetType::Json;

    fn from_sql(value: SqlValue) -> Result<Option<Self>, DriverError> {
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Json(json) => Ok(Some(json)),
            SqlValue::Text(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| DriverError::Conversion(format!("invalid JSON text: {e}"))),
            other => Err(other.conversion_error("JSON")),
        }
    }

    fn to_sql(&self) -> SqlValue {
        SqlValue::Json(self.clone())
    }
}

impl SqlField for SqlXml {
    const TARGET: TargetType = TargetType::Xml;

    fn from_sql(value: SqlValue) -> Result<Option<Self>, DriverError> {
        match value {
            SqlValue::Null => Ok(None),
            SqlValue::Xml(s) | SqlValue::Text(s) => Ok(Some(SqlXml(s))),
            other => Err(other.conversion_error("SQLXML")),
        }
    }

    fn to_sql(&self) -> SqlValue {
        SqlValue::Xml(self.0.clone())
    }
}

impl SqlField for SqlValue {
    const TARGET: TargetType = TargetType::Object;

    fn from_sql(value: SqlValue) -> Result<Option<Self>, DriverError> {
        Ok(Some(value))
    }

    fn to_sql(&self) -> SqlValue {
        self.clone()
    }
}

impl<T: SqlField> SqlField for Option<T> {
    const TARGET: TargetType = T::TARGET;

    fn from_sql(value: SqlValue) -> Result<Option<Self>, DriverError> {
        if value.is_null() {
            return Ok(Some(None));
        }
        Ok(T::from_sql(value)?.map(Some))
    }

    fn to_sql(&self) -> SqlValue {
        self.as_ref().map_or(SqlValue::Null, SqlField::to_sql)
    }
}

#[doc(hidden)]
#[must_use]
pub fn field_error(record: &str, field: &str, err: DriverError) -> DriverError {
    DriverError::Conversion(format!("{record}.{field}: {err}"))
}

#[doc(hidden)]
#[must_use]
pub fn unknown_field(record: &str, field: &str) -> DriverError {
    DriverError::Other(format!("{record} has no field named {field}"))
}

#[doc(hidden)]
#[must_use]
pub fn unknown_variant(enumeration: &str, variant: &str) -> DriverError {
    DriverError::Conversion(format!("no variant {enumeration}::{variant}"))
}

/// Declare a struct and implement [`Record`] for it.
///
/// Every field type must implement [`SqlField`] and the struct must implement `Default`.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty, )*
        }

        impl $crate::record::Record for $name {
            fn fields() -> &'static [$crate::record::FieldDescriptor] {
                static FIELDS: &[$crate::record::FieldDescriptor] = &[
                    $(
                        $crate::record::FieldDescriptor::new(
                            stringify!($field),
                            <$ty as $crate::record::SqlField>::TARGET,
                        ),
                    )*
                ];
                FIELDS
            }

            #[allow(unused_variables)]
            fn set_field(
                &mut self,
                name: &str,
                value: $crate::types::SqlValue,
            ) -> ::std::result::Result<(), $crate::error::DriverError> {
                $(
                    if name == stringify!($field) {
                        let converted = <$ty as $crate::record::SqlField>::from_sql(value)
                            .map_err(|e| $crate::record::field_error(stringify!($name), name, e))?;
                        if let Some(v) = converted {
                            self.$field = v;
                        }
                        return Ok(());
                    }
                )*
                Err($crate::record::unknown_field(stringify!($name), name))
            }

            #[allow(unused_variables)]
            fn field_value(&self, name: &str) -> ::std::option::Option<$crate::types::SqlValue> {
                $(
                    if name == stringify!($field) {
                        return Some($crate::record::SqlField::to_sql(&self.$field));
                    }
                )*
                None
            }
        }
    };
}

/// Declare a fieldless enum stored as its variant name.
///
/// ```rust
/// use sql_accessor::prelude::*;
///
/// sql_accessor::sql_enum! {
///     #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
///     pub enum Status {
///         #[default]
///         Active,
///         Suspended,
///     }
/// }
///
/// assert_eq!("Suspended".parse::<Status>().unwrap(), Status::Suspended);
/// assert!("suspended".parse::<Status>().is_err());
/// assert_eq!(Status::Active.to_sql(), SqlValue::from("Active"));
/// ```
#[macro_export]
macro_rules! sql_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )*
        }

        impl $name {
            pub const VARIANTS: &'static [&'static str] = &[$(stringify!($variant)),*];

            #[must_use]
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => stringify!($variant), )*
                }
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::error::DriverError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $( stringify!($variant) => Ok($name::$variant), )*
                    other => Err($crate::record::unknown_variant(stringify!($name), other)),
                }
            }
        }

        impl $crate::record::SqlField for $name {
            const TARGET: $crate::record::TargetType = $crate::record::TargetType::Enum {
                name: stringify!($name),
                variants: $name::VARIANTS,
            };

            fn from_sql(
                value: $crate::types::SqlValue,
            ) -> ::std::result::Result<::std::option::Option<Self>, $crate::error::DriverError> {
                match value {
                    $crate::types::SqlValue::Null => Ok(None),
                    $crate::types::SqlValue::Text(s) => s.parse().map(Some),
                    other => Err($crate::error::DriverError::Conversion(format!(
                        "cannot read {} as {}",
                        other,
                        stringify!($name)
                    ))),
                }
            }

            fn to_sql(&self) -> $crate::types::SqlValue {
                $crate::types::SqlValue::Text(self.as_str().to_string())
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        struct Sample {
            id: i64,
            label: Option<String>,
            seen: NaiveDate,
            raw: SqlValue,
        }
    }

    crate::sql_enum! {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        enum Color {
            #[default]
            Red,
            Green,
        }
    }

    #[test]
    fn descriptors_follow_declaration_order() {
        let names: Vec<_> = Sample::fields().iter().map(FieldDescriptor::name).collect();
        assert_eq!(names, vec!["id", "label", "seen", "raw"]);
        assert_eq!(Sample::fields()[1].target(), TargetType::String);
        assert_eq!(Sample::fields()[3].target(), TargetType::Object);
    }

    #[test]
    fn null_keeps_default_unless_optional() {
        let mut s = Sample {
            id: 5,
            label: Some("x".into()),
            ..Sample::default()
        };
        s.set_field("id", SqlValue::Null).unwrap();
        s.set_field("label", SqlValue::Null).unwrap();
        assert_eq!(s.id, 5);
        assert_eq!(s.label, None);
    }

    #[test]
    fn unknown_field_and_bad_value_fail() {
        let mut s = Sample::default();
        assert!(s.set_field("nope", SqlValue::Int(1)).is_err());
        let err = s
            .set_field("seen", SqlValue::from("yesterday"))
            .unwrap_err()
            .to_string();
        assert!(err.contains("Sample.seen"), "{err}");
    }

    #[test]
    fn enum_round_trips_through_text() {
        assert_eq!(Color::from_sql(SqlValue::from("Green")).unwrap(), Some(Color::Green));
        assert!(Color::from_sql(SqlValue::from("Blue")).is_err());
        assert_eq!(Color::Green.to_sql(), SqlValue::from("Green"));
        assert_eq!(
            Color::TARGET,
            TargetType::Enum {
                name: "Color",
                variants: &["Red", "Green"]
            }
        );
    }
}
