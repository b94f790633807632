use std::fmt;
use std::time::Duration;

use rusqlite::types::Value;

use crate::config::FetchDirection;
use crate::driver::{
    CallableStatement, ColumnMeta, GeneratedKeys, MemoryCursor, ParameterMetadata, ResultCursor,
    Statement,
};
use crate::error::DriverError;
use crate::types::{SqlType, SqlValue};

use super::params::sql_value_to_sqlite;
use super::query::{build_result_set, run_update};

/// Column label of the generated-keys cursor.
pub const GENERATED_KEY_COLUMN: &str = "last_insert_rowid()";

/// What the last generic `execute` produced.
#[derive(Debug)]
enum Outcome {
    Nothing,
    Cursor(Option<MemoryCursor>),
    Count(usize),
}

/// Prepared statement on a [`super::SqliteConnection`].
///
/// Values are kept host-side and bound right before each execution, so a batch is a list of value
/// snapshots executed one after the other.
pub(crate) struct SqliteStatement<'c> {
    conn: &'c rusqlite::Connection,
    stmt: Option<rusqlite::Statement<'c>>,
    sql: String,
    keys: GeneratedKeys,
    callable: bool,
    values: Vec<Value>,
    batch: Vec<Vec<Value>>,
    generated: Vec<i64>,
    outcome: Outcome,
    max_rows: Option<u64>,
    max_field_size: Option<u32>,
    fetch_size: Option<u32>,
    query_timeout: Option<Duration>,
}

impl<'c> SqliteStatement<'c> {
    pub(crate) fn new(
        conn: &'c rusqlite::Connection,
        stmt: rusqlite::Statement<'c>,
        sql: &str,
        keys: GeneratedKeys,
        callable: bool,
    ) -> Self {
        let count = stmt.parameter_count();
        Self {
            conn,
            stmt: Some(stmt),
            sql: sql.to_string(),
            keys,
            callable,
            values: vec![Value::Null; count],
            batch: Vec::new(),
            generated: Vec::new(),
            outcome: Outcome::Nothing,
            max_rows: None,
            max_field_size: None,
            fetch_size: None,
            query_timeout: None,
        }
    }

    fn inner(&mut self) -> Result<&mut rusqlite::Statement<'c>, DriverError> {
        self.stmt
            .as_mut()
            .ok_or_else(|| DriverError::Other("statement is closed".into()))
    }

    fn slot(&mut self, index: usize) -> Result<&mut Value, DriverError> {
        let count = self.values.len();
        index
            .checked_sub(1)
            .and_then(|i| self.values.get_mut(i))
            .ok_or_else(|| {
                DriverError::Other(format!(
                    "parameter index {index} out of range (statement has {count})"
                ))
            })
    }

    fn has_columns(&self) -> bool {
        self.stmt.as_ref().is_some_and(|s| s.column_count() > 0)
    }

    fn query(&mut self) -> Result<MemoryCursor, DriverError> {
        let values = self.values.clone();
        let (max_rows, max_field_size) = (self.max_rows, self.max_field_size);
        build_result_set(self.inner()?, &values, max_rows, max_field_size)
    }

    fn update(&mut self, values: &[Value]) -> Result<usize, DriverError> {
        let rows = run_update(self.inner()?, values)?;
        // last_insert_rowid() is stale when nothing was inserted.
        if self.keys == GeneratedKeys::Return && rows > 0 {
            self.generated.push(self.conn.last_insert_rowid());
        }
        Ok(rows)
    }
}

impl fmt::Debug for SqliteStatement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteStatement")
            .field("sql", &self.sql)
            .field("keys", &self.keys)
            .field("callable", &self.callable)
            .field("closed", &self.stmt.is_none())
            .field("queued", &self.batch.len())
            .field("max_rows", &self.max_rows)
            .field("max_field_size", &self.max_field_size)
            .field("fetch_size", &self.fetch_size)
            .field("query_timeout", &self.query_timeout)
            .finish_non_exhaustive()
    }
}

struct SqliteParameterMetadata {
    count: usize,
}

impl ParameterMetadata for SqliteParameterMetadata {
    fn parameter_count(&self) -> Result<usize, DriverError> {
        Ok(self.count)
    }

    fn parameter_type(&self, _index: usize) -> Result<SqlType, DriverError> {
        Err(DriverError::FeatureNotSupported(
            "SQLite does not declare parameter types".into(),
        ))
    }
}

impl Statement for SqliteStatement<'_> {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn parameter_metadata(&mut self) -> Result<Option<Box<dyn ParameterMetadata>>, DriverError> {
        Ok(Some(Box::new(SqliteParameterMetadata {
            count: self.values.len(),
        })))
    }

    fn set_value(&mut self, index: usize, value: &SqlValue) -> Result<(), DriverError> {
        *self.slot(index)? = sql_value_to_sqlite(value);
        Ok(())
    }

    fn set_null(&mut self, index: usize, _sql_type: SqlType) -> Result<(), DriverError> {
        *self.slot(index)? = Value::Null;
        Ok(())
    }

    fn add_batch(&mut self) -> Result<(), DriverError> {
        self.batch.push(self.values.clone());
        Ok(())
    }

    fn execute_query(&mut self) -> Result<Box<dyn ResultCursor + '_>, DriverError> {
        if !self.has_columns() {
            return Err(DriverError::sql("statement does not return a result cursor"));
        }
        Ok(Box::new(self.query()?))
    }

    fn execute_update(&mut self) -> Result<usize, DriverError> {
        self.generated.clear();
        let values = self.values.clone();
        self.update(&values)
    }

    fn execute_batch(&mut self) -> Result<Vec<usize>, DriverError> {
        self.generated.clear();
        let batch = std::mem::take(&mut self.batch);
        let mut counts = Vec::with_capacity(batch.len());
        for values in &batch {
            counts.push(self.update(values)?);
        }
        Ok(counts)
    }

    fn generated_keys(&mut self) -> Result<Box<dyn ResultCursor + '_>, DriverError> {
        if self.keys != GeneratedKeys::Return {
            return Err(DriverError::Other(
                "generated keys were not requested when the statement was prepared".into(),
            ));
        }
        let rows = self
            .generated
            .iter()
            .map(|key| vec![SqlValue::BigInt(*key)])
            .collect();
        Ok(Box::new(MemoryCursor::new(
            vec![ColumnMeta::new(GENERATED_KEY_COLUMN, SqlType::BigInt)],
            rows,
        )))
    }

    fn execute(&mut self) -> Result<bool, DriverError> {
        self.generated.clear();
        if self.has_columns() {
            let cursor = self.query()?;
            self.outcome = Outcome::Cursor(Some(cursor));
            Ok(true)
        } else {
            let values = self.values.clone();
            let rows = self.update(&values)?;
            self.outcome = Outcome::Count(rows);
            Ok(false)
        }
    }

    fn result_cursor(&mut self) -> Result<Option<Box<dyn ResultCursor + '_>>, DriverError> {
        match &mut self.outcome {
            Outcome::Cursor(cursor) => Ok(cursor
                .take()
                .map(|c| Box::new(c) as Box<dyn ResultCursor>)),
            Outcome::Nothing | Outcome::Count(_) => Ok(None),
        }
    }

    // A prepared SQLite statement holds a single command, so there is never a second result.
    fn more_results(&mut self) -> Result<bool, DriverError> {
        self.outcome = Outcome::Nothing;
        Ok(false)
    }

    fn update_count(&mut self) -> Result<Option<usize>, DriverError> {
        match self.outcome {
            Outcome::Count(rows) => Ok(Some(rows)),
            Outcome::Nothing | Outcome::Cursor(_) => Ok(None),
        }
    }

    fn set_fetch_direction(&mut self, direction: FetchDirection) -> Result<(), DriverError> {
        match direction {
            FetchDirection::Forward => Ok(()),
            other => Err(DriverError::FeatureNotSupported(format!(
                "SQLite cursors only fetch forward, not {other:?}"
            ))),
        }
    }

    fn set_fetch_size(&mut self, rows: u32) -> Result<(), DriverError> {
        self.fetch_size = Some(rows);
        Ok(())
    }

    fn set_max_field_size(&mut self, bytes: u32) -> Result<(), DriverError> {
        self.max_field_size = Some(bytes);
        Ok(())
    }

    fn set_max_rows(&mut self, rows: u64) -> Result<(), DriverError> {
        self.max_rows = Some(rows);
        Ok(())
    }

    fn set_query_timeout(&mut self, timeout: Duration) -> Result<(), DriverError> {
        tracing::trace!(?timeout, "sqlite statement timeout recorded");
        self.query_timeout = Some(timeout);
        Ok(())
    }

    fn as_callable(&mut self) -> Option<&mut dyn CallableStatement> {
        if self.callable { Some(self) } else { None }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        match self.stmt.take() {
            Some(stmt) => Ok(stmt.finalize()?),
            None => Ok(()),
        }
    }
}

impl CallableStatement for SqliteStatement<'_> {
    fn register_out_parameter(
        &mut self,
        index: usize,
        _sql_type: SqlType,
    ) -> Result<(), DriverError> {
        Err(DriverError::FeatureNotSupported(format!(
            "SQLite has no output parameters (parameter {index})"
        )))
    }

    fn out_value(&mut self, index: usize) -> Result<SqlValue, DriverError> {
        Err(DriverError::FeatureNotSupported(format!(
            "SQLite has no output parameters (parameter {index})"
        )))
    }
}
