//! Row conversion: one result row into an array, a [`RowMap`] or a [`Record`].

use std::any::{TypeId, type_name};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

mod columns;
mod properties;
mod row_map;
mod rows;

pub use columns::{
    BooleanColumnHandler, ByteColumnHandler, ColumnHandler, DoubleColumnHandler,
    FloatColumnHandler, IntegerColumnHandler, LongColumnHandler, ShortColumnHandler,
    SqlXmlColumnHandler, StringColumnHandler, TimestampColumnHandler, default_column_handlers,
};
pub use properties::{
    DatePropertyHandler, PropertyHandler, StringEnumPropertyHandler, default_property_handlers,
};
pub use row_map::RowMap;
pub(crate) use row_map::fold_name;
pub use rows::RowIter;

use crate::driver::ResultCursor;
use crate::error::DriverError;
use crate::record::{Record, TargetType, field_error};
use crate::types::SqlValue;

static SHARED: LazyLock<Arc<RowProcessor>> = LazyLock::new(|| Arc::new(RowProcessor::new()));

type FieldIndex = Arc<HashMap<String, usize>>;

/// Converts cursor rows using an ordered column-handler chain and property-handler chain.
///
/// The field lookup table of each record type is built on first use and kept for the lifetime of
/// the processor.
pub struct RowProcessor {
    columns: Vec<Box<dyn ColumnHandler>>,
    properties: Vec<Box<dyn PropertyHandler>>,
    field_indexes: RwLock<HashMap<TypeId, FieldIndex>>,
}

impl fmt::Debug for RowProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowProcessor")
            .field("column_handlers", &self.columns.len())
            .field("property_handlers", &self.properties.len())
            .finish_non_exhaustive()
    }
}

impl Default for RowProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl RowProcessor {
    /// A processor with the standard handler chains.
    #[must_use]
    pub fn new() -> Self {
        Self::with_handlers(default_column_handlers(), default_property_handlers())
    }

    /// A processor with custom chains. Order matters: the first matching handler wins.
    #[must_use]
    pub fn with_handlers(
        columns: Vec<Box<dyn ColumnHandler>>,
        properties: Vec<Box<dyn PropertyHandler>>,
    ) -> Self {
        Self {
            columns,
            properties,
            field_indexes: RwLock::new(HashMap::new()),
        }
    }

    /// The process-wide standard processor used by handlers built without one.
    #[must_use]
    pub fn shared() -> Arc<RowProcessor> {
        Arc::clone(&SHARED)
    }

    /// Read column `index` (1-based) of the current row for `target`.
    ///
    /// # Errors
    /// Returns `DriverError` if the column cannot be read.
    pub fn column_value(
        &self,
        cursor: &dyn ResultCursor,
        index: usize,
        target: TargetType,
    ) -> Result<SqlValue, DriverError> {
        match self.columns.iter().find(|handler| handler.matches(target)) {
            Some(handler) => handler.extract(cursor, index),
            None => cursor.get_object(index),
        }
    }

    /// The current row as values in column order.
    ///
    /// # Errors
    /// Returns `DriverError` if a column cannot be read.
    pub fn to_array(&self, cursor: &dyn ResultCursor) -> Result<Vec<SqlValue>, DriverError> {
        cursor
            .columns()
            .iter()
            .enumerate()
            .map(|(i, col)| self.column_value(cursor, i + 1, TargetType::for_column(col.sql_type)))
            .collect()
    }

    /// Iterate the remaining rows of `cursor` as arrays, one row per step.
    pub fn iter<'a>(&'a self, cursor: &'a mut dyn ResultCursor) -> RowIter<'a> {
        RowIter::new(cursor, self)
    }

    /// The current row keyed by column label (or name when there is no label).
    ///
    /// # Errors
    /// Returns `DriverError` if a column cannot be read.
    pub fn to_map(&self, cursor: &dyn ResultCursor) -> Result<RowMap, DriverError> {
        let columns = cursor.columns();
        let mut map = RowMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            let value = self.column_value(cursor, i + 1, TargetType::for_column(col.sql_type))?;
            map.insert(col.display_name(), value);
        }
        Ok(map)
    }

    /// The current row as a record. Fields without a matching column keep their default.
    ///
    /// # Errors
    /// Returns `DriverError` if a column cannot be read or converted into its field.
    pub fn to_record<R: Record + 'static>(
        &self,
        cursor: &dyn ResultCursor,
    ) -> Result<R, DriverError> {
        let mapping = self.map_columns::<R>(cursor);
        self.populate(cursor, &mapping)
    }

    /// Every remaining row as a record, matching columns to fields once.
    ///
    /// # Errors
    /// Returns `DriverError` if the cursor fails or a row cannot be converted.
    pub fn to_record_list<R: Record + 'static>(
        &self,
        cursor: &mut dyn ResultCursor,
    ) -> Result<Vec<R>, DriverError> {
        let mapping = self.map_columns::<R>(&*cursor);
        let mut records = Vec::new();
        while cursor.next()? {
            records.push(self.populate(&*cursor, &mapping)?);
        }
        Ok(records)
    }

    /// For each column, the index of the record field it fills.
    fn map_columns<R: Record + 'static>(&self, cursor: &dyn ResultCursor) -> Vec<Option<usize>> {
        let index = self.field_index::<R>();
        cursor
            .columns()
            .iter()
            .map(|col| index.get(&normalize(col.display_name())).copied())
            .collect()
    }

    fn field_index<R: Record + 'static>(&self) -> FieldIndex {
        let key = TypeId::of::<R>();
        if let Some(index) = self
            .field_indexes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Arc::clone(index);
        }
        let built: FieldIndex = Arc::new(
            R::fields()
                .iter()
                .enumerate()
                .map(|(i, field)| (normalize(field.name()), i))
                .collect(),
        );
        let mut indexes = self
            .field_indexes
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(indexes.entry(key).or_insert(built))
    }

    fn populate<R: Record>(
        &self,
        cursor: &dyn ResultCursor,
        mapping: &[Option<usize>],
    ) -> Result<R, DriverError> {
        let fields = R::fields();
        let mut record = R::default();
        for (column, field) in mapping.iter().enumerate() {
            let Some(field) = field.map(|i| &fields[i]) else {
                continue;
            };
            let raw = self.column_value(cursor, column + 1, field.target())?;
            let value = self
                .coerce(field.target(), raw)
                .map_err(|e| field_error(type_name::<R>(), field.name(), e))?;
            record.set_field(field.name(), value)?;
        }
        Ok(record)
    }

    fn coerce(&self, target: TargetType, value: SqlValue) -> Result<SqlValue, DriverError> {
        if value.is_null() {
            return Ok(value);
        }
        match self.properties.iter().find(|h| h.matches(target, &value)) {
            Some(handler) => handler.apply(target, value),
            None => Ok(value),
        }
    }
}

/// Lower-case and drop `_` and spaces, so `CUSTOMER_ID`, `customerId` and `customer id` agree.
fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;
    use crate::driver::{ColumnMeta, MemoryCursor};
    use crate::types::SqlType;

    crate::sql_enum! {
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        enum Tier {
            #[default]
            Basic,
            Gold,
        }
    }

    crate::record! {
        #[derive(Debug, Default, PartialEq)]
        struct Account {
            account_id: i64,
            display_name: String,
            opened_on: Option<NaiveDate>,
            tier: Tier,
            untouched: i32,
        }
    }

    fn cursor() -> MemoryCursor {
        let opened = NaiveDateTime::parse_from_str("2023-05-06 07:08:09", "%Y-%m-%d %H:%M:%S")
            .unwrap();
        MemoryCursor::new(
            vec![
                ColumnMeta::new("ACCOUNT_ID", SqlType::BigInt),
                ColumnMeta::new("name", SqlType::Varchar).with_label("displayName"),
                ColumnMeta::new("opened_on", SqlType::Timestamp),
                ColumnMeta::new("tier", SqlType::Varchar),
                ColumnMeta::new("extra", SqlType::Integer),
            ],
            vec![
                vec![
                    SqlValue::BigInt(10),
                    SqlValue::from("Ada"),
                    SqlValue::Timestamp(opened),
                    SqlValue::from("Gold"),
                    SqlValue::Int(3),
                ],
                vec![
                    SqlValue::BigInt(11),
                    SqlValue::from("Bob"),
                    SqlValue::Null,
                    SqlValue::from("Basic"),
                    SqlValue::Null,
                ],
            ],
        )
    }

    #[test]
    fn array_and_map_follow_column_order() {
        let processor = RowProcessor::new();
        let mut c = cursor();
        assert!(c.next().unwrap());
        let array = processor.to_array(&c).unwrap();
        assert_eq!(array.len(), 5);
        assert_eq!(array[0], SqlValue::BigInt(10));
        assert_eq!(array[4], SqlValue::Int(3));

        let map = processor.to_map(&c).unwrap();
        assert_eq!(
            map.keys().collect::<Vec<_>>(),
            vec!["ACCOUNT_ID", "displayName", "opened_on", "tier", "extra"]
        );
        assert_eq!(map.get("account_id"), Some(&SqlValue::BigInt(10)));
    }

    #[test]
    fn records_match_normalized_names_and_coerce() {
        let processor = RowProcessor::new();
        let mut c = cursor();
        let accounts: Vec<Account> = processor.to_record_list(&mut c).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(
            accounts[0],
            Account {
                account_id: 10,
                display_name: "Ada".into(),
                opened_on: NaiveDate::from_ymd_opt(2023, 5, 6),
                tier: Tier::Gold,
                untouched: 0,
            }
        );
        assert_eq!(accounts[1].opened_on, None);
        assert_eq!(accounts[1].tier, Tier::Basic);
    }

    #[test]
    fn record_round_trips_identity_fields() {
        let processor = RowProcessor::new();
        let mut c = cursor();
        assert!(c.next().unwrap());
        let account: Account = processor.to_record(&c).unwrap();
        assert_eq!(account.field_value("account_id"), Some(c.get_object(1).unwrap()));
        assert_eq!(account.field_value("display_name"), Some(c.get_object(2).unwrap()));
        assert_eq!(account.field_value("tier"), Some(c.get_object(4).unwrap()));
    }

    #[test]
    fn unknown_enum_variant_names_the_field() {
        let processor = RowProcessor::new();
        let mut c = MemoryCursor::new(
            vec![ColumnMeta::new("tier", SqlType::Varchar)],
            vec![vec![SqlValue::from("Platinum")]],
        );
        assert!(c.next().unwrap());
        let err = processor.to_record::<Account>(&c).unwrap_err().to_string();
        assert!(err.contains("tier"), "{err}");
        assert!(err.contains("Tier::Platinum"), "{err}");
    }

    #[test]
    fn normalization_ignores_case_and_separators() {
        assert_eq!(normalize("CUSTOMER_ID"), "customerid");
        assert_eq!(normalize("customerId"), "customerid");
        assert_eq!(normalize("customer id"), "customerid");
    }
}
