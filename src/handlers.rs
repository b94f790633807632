//! Result handlers: turn a whole result cursor into the value an operation returns.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::conversion::{RowMap, RowProcessor, fold_name};
use crate::driver::ResultCursor;
use crate::error::DriverError;
use crate::record::{Record, SqlField};
use crate::types::SqlValue;

/// Converts a result cursor into a value.
///
/// Any `Fn(&mut dyn ResultCursor) -> Result<T, DriverError>` closure is a handler.
pub trait ResultSetHandler<T> {
    /// # Errors
    /// Returns `DriverError` if the cursor fails or a row cannot be converted.
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<T, DriverError>;
}

impl<T, F> ResultSetHandler<T> for F
where
    F: Fn(&mut dyn ResultCursor) -> Result<T, DriverError>,
{
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<T, DriverError> {
        self(cursor)
    }
}

/// The first row as an array; empty when there are no rows.
#[derive(Debug, Clone)]
pub struct ArrayHandler {
    processor: Arc<RowProcessor>,
}

/// Every row as an array, in cursor order.
#[derive(Debug, Clone)]
pub struct ArrayListHandler {
    processor: Arc<RowProcessor>,
}

/// The first row as a [`RowMap`]; `None` when there are no rows.
#[derive(Debug, Clone)]
pub struct MapHandler {
    processor: Arc<RowProcessor>,
}

/// Every row as a [`RowMap`], in cursor order.
#[derive(Debug, Clone)]
pub struct MapListHandler {
    processor: Arc<RowProcessor>,
}

macro_rules! processor_ctors {
    ($($name:ident),*) => {
        $(
            impl $name {
                #[must_use]
                pub fn new() -> Self {
                    Self::with_processor(RowProcessor::shared())
                }

                #[must_use]
                pub fn with_processor(processor: Arc<RowProcessor>) -> Self {
                    Self { processor }
                }
            }

            impl Default for $name {
                fn default() -> Self {
                    Self::new()
                }
            }
        )*
    };
}

processor_ctors!(ArrayHandler, ArrayListHandler, MapHandler, MapListHandler);

impl ResultSetHandler<Vec<SqlValue>> for ArrayHandler {
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<Vec<SqlValue>, DriverError> {
        if cursor.next()? {
            self.processor.to_array(&*cursor)
        } else {
            Ok(Vec::new())
        }
    }
}

impl ResultSetHandler<Vec<Vec<SqlValue>>> for ArrayListHandler {
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<Vec<Vec<SqlValue>>, DriverError> {
        let mut rows = Vec::new();
        while cursor.next()? {
            rows.push(self.processor.to_array(&*cursor)?);
        }
        Ok(rows)
    }
}

impl ResultSetHandler<Option<RowMap>> for MapHandler {
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<Option<RowMap>, DriverError> {
        if cursor.next()? {
            self.processor.to_map(&*cursor).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl ResultSetHandler<Vec<RowMap>> for MapListHandler {
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<Vec<RowMap>, DriverError> {
        let mut rows = Vec::new();
        while cursor.next()? {
            rows.push(self.processor.to_map(&*cursor)?);
        }
        Ok(rows)
    }
}

/// The first row as a record `R`; `None` when there are no rows.
pub struct RecordHandler<R> {
    processor: Arc<RowProcessor>,
    _record: PhantomData<fn() -> R>,
}

/// Every row as a record `R`, in cursor order.
pub struct RecordListHandler<R> {
    processor: Arc<RowProcessor>,
    _record: PhantomData<fn() -> R>,
}

macro_rules! record_ctors {
    ($($name:ident),*) => {
        $(
            impl<R> $name<R> {
                #[must_use]
                pub fn new() -> Self {
                    Self::with_processor(RowProcessor::shared())
                }

                #[must_use]
                pub fn with_processor(processor: Arc<RowProcessor>) -> Self {
                    Self {
                        processor,
                        _record: PhantomData,
                    }
                }
            }

            impl<R> Default for $name<R> {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl<R> Clone for $name<R> {
                fn clone(&self) -> Self {
                    Self::with_processor(Arc::clone(&self.processor))
                }
            }

            impl<R> std::fmt::Debug for $name<R> {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.debug_struct(stringify!($name))
                        .field("record", &std::any::type_name::<R>())
                        .finish_non_exhaustive()
                }
            }
        )*
    };
}

record_ctors!(RecordHandler, RecordListHandler);

impl<R: Record + 'static> ResultSetHandler<Option<R>> for RecordHandler<R> {
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<Option<R>, DriverError> {
        if cursor.next()? {
            self.processor.to_record(&*cursor).map(Some)
        } else {
            Ok(None)
        }
    }
}

impl<R: Record + 'static> ResultSetHandler<Vec<R>> for RecordListHandler<R> {
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<Vec<R>, DriverError> {
        self.processor.to_record_list(cursor)
    }
}

/// Which column a single-column handler reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnRef {
    /// 1-based position.
    Index(usize),
    /// Label or name, compared case-insensitively.
    Name(String),
}

impl ColumnRef {
    fn resolve(&self, cursor: &dyn ResultCursor) -> Result<usize, DriverError> {
        match self {
            ColumnRef::Index(index) => Ok(*index),
            ColumnRef::Name(name) => {
                let wanted = fold_name(name);
                cursor
                    .columns()
                    .iter()
                    .position(|col| {
                        fold_name(col.display_name()) == wanted || fold_name(&col.name) == wanted
                    })
                    .map(|i| i + 1)
                    .ok_or_else(|| DriverError::Other(format!("column {name} not found")))
            }
        }
    }
}

/// One column of the first row; `None` when there are no rows or the value is NULL.
///
/// Typically used with [`crate::accessor::Accessor::insert`] to read a generated key.
pub struct ScalarHandler<T> {
    column: ColumnRef,
    _value: PhantomData<fn() -> T>,
}

/// One column of every row, in cursor order.
///
/// Use `ColumnListHandler<Option<T>>` for columns that may hold NULL; with a plain `T` a NULL is
/// a conversion error.
pub struct ColumnListHandler<T> {
    column: ColumnRef,
    _value: PhantomData<fn() -> T>,
}

macro_rules! column_ctors {
    ($($name:ident),*) => {
        $(
            impl<T> $name<T> {
                /// Reads the first column.
                #[must_use]
                pub fn new() -> Self {
                    Self::index(1)
                }

                #[must_use]
                pub fn index(index: usize) -> Self {
                    Self {
                        column: ColumnRef::Index(index),
                        _value: PhantomData,
                    }
                }

                #[must_use]
                pub fn named(name: impl Into<String>) -> Self {
                    Self {
                        column: ColumnRef::Name(name.into()),
                        _value: PhantomData,
                    }
                }
            }

            impl<T> Default for $name<T> {
                fn default() -> Self {
                    Self::new()
                }
            }

            impl<T> Clone for $name<T> {
                fn clone(&self) -> Self {
                    Self {
                        column: self.column.clone(),
                        _value: PhantomData,
                    }
                }
            }

            impl<T> std::fmt::Debug for $name<T> {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    f.debug_struct(stringify!($name))
                        .field("column", &self.column)
                        .finish_non_exhaustive()
                }
            }
        )*
    };
}

column_ctors!(ScalarHandler, ColumnListHandler);

impl<T: SqlField> ResultSetHandler<Option<T>> for ScalarHandler<T> {
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<Option<T>, DriverError> {
        if !cursor.next()? {
            return Ok(None);
        }
        let index = self.column.resolve(&*cursor)?;
        T::from_sql(cursor.get_object(index)?)
    }
}

impl<T: SqlField> ResultSetHandler<Vec<T>> for ColumnListHandler<T> {
    fn handle(&self, cursor: &mut dyn ResultCursor) -> Result<Vec<T>, DriverError> {
        let index = self.column.resolve(&*cursor)?;
        let mut values = Vec::new();
        while cursor.next()? {
            let row = values.len() + 1;
            let value = T::from_sql(cursor.get_object(index)?)?.ok_or_else(|| {
                DriverError::Conversion(format!("NULL in column {index} of row {row}"))
            })?;
            values.push(value);
        }
        Ok(values)
    }
}
