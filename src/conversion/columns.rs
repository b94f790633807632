use crate::driver::ResultCursor;
use crate::error::DriverError;
use crate::record::TargetType;
use crate::types::SqlValue;

/// Extracts one column of the current row for a given target type.
///
/// Handlers are tried in order and the first whose [`ColumnHandler::matches`] accepts the target
/// does the extraction.
pub trait ColumnHandler: Send + Sync {
    fn matches(&self, target: TargetType) -> bool;

    /// # Errors
    /// Returns `DriverError` if the column cannot be read as the handled type.
    fn extract(&self, cursor: &dyn ResultCursor, index: usize) -> Result<SqlValue, DriverError>;
}

macro_rules! column_handler {
    ($($(#[$meta:meta])* $name:ident: $target:ident => $getter:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Debug, Clone, Copy, Default)]
            pub struct $name;

            impl ColumnHandler for $name {
                fn matches(&self, target: TargetType) -> bool {
                    target == TargetType::$target
                }

                fn extract(
                    &self,
                    cursor: &dyn ResultCursor,
                    index: usize,
                ) -> Result<SqlValue, DriverError> {
                    Ok(SqlValue::from(cursor.$getter(index)?))
                }
            }
        )*
    };
}

column_handler! {
    BooleanColumnHandler: Bool => get_bool;
    ByteColumnHandler: I8 => get_i8;
    ShortColumnHandler: I16 => get_i16;
    IntegerColumnHandler: I32 => get_i32;
    LongColumnHandler: I64 => get_i64;
    FloatColumnHandler: F32 => get_f32;
    DoubleColumnHandler: F64 => get_f64;
    StringColumnHandler: String => get_string;
    TimestampColumnHandler: Timestamp => get_timestamp;
}

/// Reads XML columns, keeping them as [`SqlValue::Xml`] rather than plain text.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqlXmlColumnHandler;

impl ColumnHandler for SqlXmlColumnHandler {
    fn matches(&self, target: TargetType) -> bool {
        target == TargetType::Xml
    }

    fn extract(&self, cursor: &dyn ResultCursor, index: usize) -> Result<SqlValue, DriverError> {
        Ok(cursor.get_xml(index)?.map_or(SqlValue::Null, SqlValue::Xml))
    }
}

/// The standard chain: boolean, byte, short, integer, long, float, double, string, timestamp,
/// SQLXML. Targets none of them match are read with `get_object`.
#[must_use]
pub fn default_column_handlers() -> Vec<Box<dyn ColumnHandler>> {
    vec![
        Box::new(BooleanColumnHandler),
        Box::new(ByteColumnHandler),
        Box::new(ShortColumnHandler),
        Box::new(IntegerColumnHandler),
        Box::new(LongColumnHandler),
        Box::new(FloatColumnHandler),
        Box::new(DoubleColumnHandler),
        Box::new(StringColumnHandler),
        Box::new(TimestampColumnHandler),
        Box::new(SqlXmlColumnHandler),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ColumnMeta, MemoryCursor};
    use crate::types::SqlType;

    #[test]
    fn getters_coerce_to_handled_type() {
        let mut cursor = MemoryCursor::new(
            vec![ColumnMeta::new("flag", SqlType::Integer)],
            vec![vec![SqlValue::BigInt(1)]],
        );
        assert!(cursor.next().unwrap());
        assert_eq!(
            BooleanColumnHandler.extract(&cursor, 1).unwrap(),
            SqlValue::Bool(true)
        );
        assert_eq!(ShortColumnHandler.extract(&cursor, 1).unwrap(), SqlValue::SmallInt(1));
        assert_eq!(
            StringColumnHandler.extract(&cursor, 1).unwrap(),
            SqlValue::from("1")
        );
    }

    #[test]
    fn first_match_in_chain_order() {
        let chain = default_column_handlers();
        let position = |target: TargetType| chain.iter().position(|h| h.matches(target));
        assert_eq!(position(TargetType::Bool), Some(0));
        assert_eq!(position(TargetType::Xml), Some(9));
        assert_eq!(position(TargetType::Date), None);
        assert_eq!(position(TargetType::Object), None);
    }
}
