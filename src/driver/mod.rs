//! Driver abstraction the accessor runs on.
//!
//! A driver supplies connections, prepared/callable statements and forward-only result cursors.
//! All positional indices (placeholders and columns) are 1-based.

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::config::FetchDirection;
use crate::error::DriverError;
use crate::types::{SqlType, SqlValue};

pub mod memory;

pub use memory::MemoryCursor;

/// Whether a prepared statement should expose auto-generated keys after execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GeneratedKeys {
    #[default]
    None,
    Return,
}

/// Column metadata reported by a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// The column name as reported by the database.
    pub name: String,
    /// The alias from `AS`, when it differs from the name.
    pub label: Option<String>,
    pub sql_type: SqlType,
}

impl ColumnMeta {
    #[must_use]
    pub fn new(name: impl Into<String>, sql_type: SqlType) -> Self {
        Self {
            name: name.into(),
            label: None,
            sql_type,
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// The label when present and non-empty, otherwise the name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        match self.label.as_deref() {
            Some(label) if !label.is_empty() => label,
            _ => &self.name,
        }
    }
}

/// Forward-only stream of rows produced by executing a statement.
///
/// Only [`ResultCursor::next`], [`ResultCursor::columns`] and [`ResultCursor::get_object`] are
/// required; the typed getters coerce the raw value and return `None` for SQL NULL.
pub trait ResultCursor {
    /// Advance to the next row; `false` once the cursor is exhausted.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver fails to fetch the row.
    fn next(&mut self) -> Result<bool, DriverError>;

    fn columns(&self) -> &[ColumnMeta];

    fn column_count(&self) -> usize {
        self.columns().len()
    }

    /// Raw value of a column in the current row.
    ///
    /// # Errors
    /// Returns `DriverError` if there is no current row or the index is out of range.
    fn get_object(&self, index: usize) -> Result<SqlValue, DriverError>;

    /// # Errors
    /// Returns `DriverError` if the value cannot be read as a boolean.
    fn get_bool(&self, index: usize) -> Result<Option<bool>, DriverError> {
        self.get_object(index)?.to_bool()
    }

    /// # Errors
    /// Returns `DriverError` if the value cannot be read as an `i8`.
    fn get_i8(&self, index: usize) -> Result<Option<i8>, DriverError> {
        self.get_object(index)?.to_i8()
    }

    /// # Errors
    /// Returns `DriverError` if the value cannot be read as an `i16`.
    fn get_i16(&self, index: usize) -> Result<Option<i16>, DriverError> {
        self.get_object(index)?.to_i16()
    }

    /// # Errors
    /// Returns `DriverError` if the value cannot be read as an `i32`.
    fn get_i32(&self, index: usize) -> Result<Option<i32>, DriverError> {
        self.get_object(index)?.to_i32()
    }

    /// # Errors
    /// Returns `DriverError` if the value cannot be read as an `i64`.
    fn get_i64(&self, index: usize) -> Result<Option<i64>, DriverError> {
        self.get_object(index)?.to_i64()
    }

    /// # Errors
    /// Returns `DriverError` if the value cannot be read as an `f32`.
    fn get_f32(&self, index: usize) -> Result<Option<f32>, DriverError> {
        self.get_object(index)?.to_f32()
    }

    /// # Errors
    /// Returns `DriverError` if the value cannot be read as an `f64`.
    fn get_f64(&self, index: usize) -> Result<Option<f64>, DriverError> {
        self.get_object(index)?.to_f64()
    }

    /// # Errors
    /// Returns `DriverError` if the value cannot be rendered as text.
    fn get_string(&self, index: usize) -> Result<Option<String>, DriverError> {
        self.get_object(index)?.to_text()
    }

    /// # Errors
    /// Returns `DriverError` if the value cannot be read as a timestamp.
    fn get_timestamp(&self, index: usize) -> Result<Option<NaiveDateTime>, DriverError> {
        self.get_object(index)?.to_timestamp()
    }

    /// XML column content as text.
    ///
    /// # Errors
    /// Returns `DriverError` if the value is not textual.
    fn get_xml(&self, index: usize) -> Result<Option<String>, DriverError> {
        match self.get_object(index)? {
            SqlValue::Null => Ok(None),
            SqlValue::Xml(s) | SqlValue::Text(s) => Ok(Some(s)),
            other => Err(other.conversion_error("SQLXML")),
        }
    }

    /// # Errors
    /// Returns `DriverError` if the driver fails to release the cursor.
    fn close(&mut self) -> Result<(), DriverError> {
        Ok(())
    }
}

/// Declared parameter information of a prepared statement.
pub trait ParameterMetadata {
    /// # Errors
    /// Returns `DriverError::FeatureNotSupported` when the driver cannot count parameters.
    fn parameter_count(&self) -> Result<usize, DriverError>;

    /// # Errors
    /// Returns `DriverError` when the declared type of `index` is unavailable.
    fn parameter_type(&self, index: usize) -> Result<SqlType, DriverError>;
}

/// Stored-procedure capabilities of a statement.
pub trait CallableStatement {
    /// # Errors
    /// Returns `DriverError` if the driver rejects the registration.
    fn register_out_parameter(&mut self, index: usize, sql_type: SqlType)
    -> Result<(), DriverError>;

    /// Value of a registered output parameter after execution.
    ///
    /// # Errors
    /// Returns `DriverError` if the parameter was not registered or cannot be read.
    fn out_value(&mut self, index: usize) -> Result<SqlValue, DriverError>;
}

/// A precompiled SQL command with positional placeholders.
pub trait Statement {
    /// The SQL text this statement was prepared from.
    fn sql(&self) -> &str;

    /// Declared parameter information.
    ///
    /// `Ok(None)` and `Err(DriverError::FeatureNotSupported)` both mean the driver does not offer
    /// parameter metadata.
    ///
    /// # Errors
    /// Returns `DriverError` when the driver fails while producing the metadata.
    fn parameter_metadata(&mut self) -> Result<Option<Box<dyn ParameterMetadata>>, DriverError>;

    /// Bind a value, letting the driver infer its SQL type from the host value.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver rejects the value.
    fn set_value(&mut self, index: usize, value: &SqlValue) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the driver rejects the typed NULL.
    fn set_null(&mut self, index: usize, sql_type: SqlType) -> Result<(), DriverError>;

    /// Queue the currently bound values as one batch entry.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver does not support batching.
    fn add_batch(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if execution fails or produces no rows.
    fn execute_query(&mut self) -> Result<Box<dyn ResultCursor + '_>, DriverError>;

    /// # Errors
    /// Returns `DriverError` if execution fails.
    fn execute_update(&mut self) -> Result<usize, DriverError>;

    /// Execute the queued batch; one affected-row count per entry, in order.
    ///
    /// # Errors
    /// Returns `DriverError` if any entry fails.
    fn execute_batch(&mut self) -> Result<Vec<usize>, DriverError>;

    /// Keys generated by the last execution. Requires [`GeneratedKeys::Return`].
    ///
    /// # Errors
    /// Returns `DriverError` if keys were not requested or are unavailable.
    fn generated_keys(&mut self) -> Result<Box<dyn ResultCursor + '_>, DriverError>;

    /// Generic execution; `true` when the first result is a cursor.
    ///
    /// # Errors
    /// Returns `DriverError` if execution fails.
    fn execute(&mut self) -> Result<bool, DriverError>;

    /// The current result cursor after [`Statement::execute`] or [`Statement::more_results`].
    ///
    /// # Errors
    /// Returns `DriverError` if the driver cannot produce the cursor.
    fn result_cursor(&mut self) -> Result<Option<Box<dyn ResultCursor + '_>>, DriverError>;

    /// Move to the next result; `true` when it is a cursor.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver fails to advance.
    fn more_results(&mut self) -> Result<bool, DriverError>;

    /// Affected rows of the current result, `None` when it is a cursor or there are no more.
    ///
    /// # Errors
    /// Returns `DriverError` if the driver cannot report the count.
    fn update_count(&mut self) -> Result<Option<usize>, DriverError>;

    /// # Errors
    /// Returns `DriverError` if the direction is unsupported.
    fn set_fetch_direction(&mut self, direction: FetchDirection) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the driver rejects the hint.
    fn set_fetch_size(&mut self, rows: u32) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the driver rejects the limit.
    fn set_max_field_size(&mut self, bytes: u32) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the driver rejects the limit.
    fn set_max_rows(&mut self, rows: u64) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the driver rejects the timeout.
    fn set_query_timeout(&mut self, timeout: Duration) -> Result<(), DriverError>;

    /// Stored-procedure view of this statement, if it was prepared as a call.
    fn as_callable(&mut self) -> Option<&mut dyn CallableStatement> {
        None
    }

    /// # Errors
    /// Returns `DriverError` if the driver fails to release the statement.
    fn close(&mut self) -> Result<(), DriverError>;
}

/// A database session.
pub trait Connection {
    /// # Errors
    /// Returns `DriverError` if the SQL cannot be prepared.
    fn prepare(&mut self, sql: &str, keys: GeneratedKeys)
    -> Result<Box<dyn Statement + '_>, DriverError>;

    /// Prepare a stored-procedure call.
    ///
    /// # Errors
    /// Returns `DriverError` if the SQL cannot be prepared.
    fn prepare_call(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError>;

    /// # Errors
    /// Returns `DriverError` if the mode cannot be changed.
    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), DriverError>;

    fn auto_commit(&self) -> bool;

    /// # Errors
    /// Returns `DriverError` if the commit fails.
    fn commit(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the rollback fails.
    fn rollback(&mut self) -> Result<(), DriverError>;

    /// # Errors
    /// Returns `DriverError` if the session cannot be released cleanly.
    fn close(&mut self) -> Result<(), DriverError>;
}

/// Connection-acquisition callback used by the self-managing operation forms.
pub trait ConnectionSource: Send + Sync {
    /// # Errors
    /// Returns `DriverError` if no connection can be opened.
    fn connection(&self) -> Result<Box<dyn Connection>, DriverError>;
}

impl<F> ConnectionSource for F
where
    F: Fn() -> Result<Box<dyn Connection>, DriverError> + Send + Sync,
{
    fn connection(&self) -> Result<Box<dyn Connection>, DriverError> {
        self()
    }
}
