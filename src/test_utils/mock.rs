//! A scripted in-memory driver that records every call it receives.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::FetchDirection;
use crate::driver::{
    CallableStatement, ColumnMeta, Connection, ConnectionSource, GeneratedKeys, MemoryCursor,
    ParameterMetadata, ResultCursor, Statement,
};
use crate::error::DriverError;
use crate::types::{SqlType, SqlValue};

/// How a scripted statement answers parameter-metadata requests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MetadataMode {
    /// `parameter_metadata()` returns `Ok(None)`.
    #[default]
    Absent,
    /// `parameter_metadata()` fails with `FeatureNotSupported`.
    Unsupported,
    /// The count is known; `parameter_type` fails with `FeatureNotSupported`.
    CountOnly(usize),
    /// Count and declared types are known.
    Typed(Vec<SqlType>),
}

/// The step at which a scripted statement fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    Prepare,
    Configure,
    Bind,
    Execute,
    CursorClose,
    StatementClose,
    ConnectionClose,
}

/// One result produced by a scripted statement.
#[derive(Debug, Clone)]
pub enum MockResult {
    Rows {
        columns: Vec<ColumnMeta>,
        rows: Vec<Vec<SqlValue>>,
    },
    Count(usize),
}

impl MockResult {
    #[must_use]
    pub fn rows(columns: Vec<ColumnMeta>, rows: Vec<Vec<SqlValue>>) -> Self {
        MockResult::Rows { columns, rows }
    }
}

/// Calls observed by a [`MockDatabase`], in the order they happened.
#[derive(Debug, Clone, PartialEq)]
pub enum MockEvent {
    ConnectionOpened,
    Prepared {
        sql: String,
        callable: bool,
        keys: GeneratedKeys,
    },
    Configured {
        option: &'static str,
        value: String,
    },
    MetadataRequested,
    SetValue {
        index: usize,
        value: SqlValue,
    },
    SetNull {
        index: usize,
        sql_type: SqlType,
    },
    RegisterOut {
        index: usize,
        sql_type: SqlType,
    },
    BatchAdded,
    Executed,
    CursorClosed,
    StatementClosed,
    ConnectionClosed,
    Commit,
    Rollback,
}

/// Canned behaviour for one SQL text.
#[derive(Debug, Clone, Default)]
pub struct MockScript {
    metadata: MetadataMode,
    results: Vec<MockResult>,
    update_count: Option<usize>,
    generated_keys: Vec<i64>,
    out_values: HashMap<usize, SqlValue>,
    failure: Option<MockFailure>,
}

impl MockScript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn metadata(mut self, mode: MetadataMode) -> Self {
        self.metadata = mode;
        self
    }

    /// Append a result: the first one answers `execute_query`, all of them answer `execute`.
    #[must_use]
    pub fn result(mut self, result: MockResult) -> Self {
        self.results.push(result);
        self
    }

    /// Rows affected by `execute_update` and by each batch entry. Defaults to 1.
    #[must_use]
    pub fn update_count(mut self, rows: usize) -> Self {
        self.update_count = Some(rows);
        self
    }

    #[must_use]
    pub fn generated_keys(mut self, keys: Vec<i64>) -> Self {
        self.generated_keys = keys;
        self
    }

    #[must_use]
    pub fn out_value(mut self, index: usize, value: SqlValue) -> Self {
        self.out_values.insert(index, value);
        self
    }

    #[must_use]
    pub fn fail_at(mut self, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    fn fails_at(&self, failure: MockFailure) -> bool {
        self.failure == Some(failure)
    }
}

#[derive(Debug, Default)]
struct MockState {
    scripts: HashMap<String, MockScript>,
    events: Vec<MockEvent>,
    connection_failure: Option<String>,
}

/// Shared script registry and event log. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockDatabase {
    state: Arc<Mutex<MockState>>,
}

impl MockDatabase {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the behaviour for `sql`. Unscripted SQL behaves as [`MockScript::new`].
    pub fn script(&self, sql: impl Into<String>, script: MockScript) {
        self.lock().scripts.insert(sql.into(), script);
    }

    /// Make every further connection acquisition fail with `message`.
    pub fn refuse_connections(&self, message: impl Into<String>) {
        self.lock().connection_failure = Some(message.into());
    }

    #[must_use]
    pub fn connect(&self) -> MockConnection {
        self.record(MockEvent::ConnectionOpened);
        MockConnection {
            db: self.clone(),
            auto_commit: true,
            fail_close: false,
        }
    }

    /// A connection source handing out new mock connections.
    #[must_use]
    pub fn source(&self) -> impl ConnectionSource + 'static {
        let db = self.clone();
        move || -> Result<Box<dyn Connection>, DriverError> {
            if let Some(message) = db.lock().connection_failure.clone() {
                return Err(DriverError::sql(message));
            }
            Ok(Box::new(db.connect()))
        }
    }

    #[must_use]
    pub fn events(&self) -> Vec<MockEvent> {
        self.lock().events.clone()
    }

    /// The recorded events `keep` accepts, e.g. every `SetNull`.
    #[must_use]
    pub fn events_matching(&self, keep: impl Fn(&MockEvent) -> bool) -> Vec<MockEvent> {
        self.lock().events.iter().filter(|e| keep(e)).cloned().collect()
    }

    pub fn clear_events(&self) {
        self.lock().events.clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: MockEvent) {
        self.lock().events.push(event);
    }

    fn script_for(&self, sql: &str) -> MockScript {
        self.lock().scripts.get(sql).cloned().unwrap_or_default()
    }
}

/// Connection handed out by a [`MockDatabase`].
#[derive(Debug)]
pub struct MockConnection {
    db: MockDatabase,
    auto_commit: bool,
    fail_close: bool,
}

impl MockConnection {
    /// Make `close` fail, independent of any statement script.
    #[must_use]
    pub fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    fn open_statement(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
        callable: bool,
    ) -> Result<Box<dyn Statement + '_>, DriverError> {
        let script = self.db.script_for(sql);
        if script.fails_at(MockFailure::ConnectionClose) {
            self.fail_close = true;
        }
        if script.fails_at(MockFailure::Prepare) {
            return Err(DriverError::sql(format!("cannot prepare {sql}")));
        }
        self.db.record(MockEvent::Prepared {
            sql: sql.to_string(),
            callable,
            keys,
        });
        Ok(Box::new(MockStatement {
            db: self.db.clone(),
            sql: sql.to_string(),
            script,
            callable,
            batch: 0,
            pending: Vec::new(),
            current: None,
            max_rows: None,
            max_field_size: None,
        }))
    }
}

impl Connection for MockConnection {
    fn prepare(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<Box<dyn Statement + '_>, DriverError> {
        self.open_statement(sql, keys, false)
    }

    fn prepare_call(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError> {
        self.open_statement(sql, GeneratedKeys::None, true)
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), DriverError> {
        self.auto_commit = auto_commit;
        Ok(())
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.db.record(MockEvent::Commit);
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.db.record(MockEvent::Rollback);
        Ok(())
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.db.record(MockEvent::ConnectionClosed);
        if self.fail_close {
            return Err(DriverError::sql("connection close failed"));
        }
        Ok(())
    }
}

struct MockMetadata {
    mode: MetadataMode,
}

impl ParameterMetadata for MockMetadata {
    fn parameter_count(&self) -> Result<usize, DriverError> {
        match &self.mode {
            MetadataMode::CountOnly(count) => Ok(*count),
            MetadataMode::Typed(types) => Ok(types.len()),
            MetadataMode::Absent | MetadataMode::Unsupported => Err(
                DriverError::FeatureNotSupported("parameter count".into()),
            ),
        }
    }

    fn parameter_type(&self, index: usize) -> Result<SqlType, DriverError> {
        match &self.mode {
            MetadataMode::Typed(types) => index
                .checked_sub(1)
                .and_then(|i| types.get(i))
                .copied()
                .ok_or_else(|| DriverError::Other(format!("no parameter {index}"))),
            _ => Err(DriverError::FeatureNotSupported("parameter type".into())),
        }
    }
}

struct MockStatement {
    db: MockDatabase,
    sql: String,
    script: MockScript,
    callable: bool,
    batch: usize,
    pending: Vec<MockResult>,
    current: Option<MockResult>,
    max_rows: Option<u64>,
    max_field_size: Option<u32>,
}

impl MockStatement {
    fn configured(&self, option: &'static str, value: String) -> Result<(), DriverError> {
        if self.script.fails_at(MockFailure::Configure) {
            return Err(DriverError::FeatureNotSupported(option.into()));
        }
        self.db.record(MockEvent::Configured { option, value });
        Ok(())
    }

    fn run(&self) -> Result<(), DriverError> {
        if self.script.fails_at(MockFailure::Execute) {
            return Err(DriverError::Sql {
                message: format!("execution of {} failed", self.sql),
                state: Some("42000".into()),
            });
        }
        self.db.record(MockEvent::Executed);
        Ok(())
    }

    fn bound(&self) -> Result<(), DriverError> {
        if self.script.fails_at(MockFailure::Bind) {
            return Err(DriverError::Conversion("value rejected".into()));
        }
        Ok(())
    }

    fn cursor(&self, columns: Vec<ColumnMeta>, rows: Vec<Vec<SqlValue>>) -> MockCursor {
        MockCursor {
            db: self.db.clone(),
            inner: MemoryCursor::new(columns, rows)
                .with_max_rows(self.max_rows)
                .with_max_field_size(self.max_field_size),
            fail_close: self.script.fails_at(MockFailure::CursorClose),
        }
    }

    fn rows_affected(&self) -> usize {
        self.script.update_count.unwrap_or(1)
    }
}

impl Statement for MockStatement {
    fn sql(&self) -> &str {
        &self.sql
    }

    fn parameter_metadata(&mut self) -> Result<Option<Box<dyn ParameterMetadata>>, DriverError> {
        self.db.record(MockEvent::MetadataRequested);
        match &self.script.metadata {
            MetadataMode::Absent => Ok(None),
            MetadataMode::Unsupported => Err(DriverError::FeatureNotSupported(
                "parameter metadata".into(),
            )),
            mode => Ok(Some(Box::new(MockMetadata { mode: mode.clone() }))),
        }
    }

    fn set_value(&mut self, index: usize, value: &SqlValue) -> Result<(), DriverError> {
        self.bound()?;
        self.db.record(MockEvent::SetValue {
            index,
            value: value.clone(),
        });
        Ok(())
    }

    fn set_null(&mut self, index: usize, sql_type: SqlType) -> Result<(), DriverError> {
        self.bound()?;
        self.db.record(MockEvent::SetNull { index, sql_type });
        Ok(())
    }

    fn add_batch(&mut self) -> Result<(), DriverError> {
        self.batch += 1;
        self.db.record(MockEvent::BatchAdded);
        Ok(())
    }

    fn execute_query(&mut self) -> Result<Box<dyn ResultCursor + '_>, DriverError> {
        self.run()?;
        let (columns, rows) = self
            .script
            .results
            .iter()
            .find_map(|r| match r {
                MockResult::Rows { columns, rows } => Some((columns.clone(), rows.clone())),
                MockResult::Count(_) => None,
            })
            .unwrap_or_default();
        Ok(Box::new(self.cursor(columns, rows)))
    }

    fn execute_update(&mut self) -> Result<usize, DriverError> {
        self.run()?;
        Ok(self.rows_affected())
    }

    fn execute_batch(&mut self) -> Result<Vec<usize>, DriverError> {
        self.run()?;
        let queued = std::mem::take(&mut self.batch);
        Ok(vec![self.rows_affected(); queued])
    }

    fn generated_keys(&mut self) -> Result<Box<dyn ResultCursor + '_>, DriverError> {
        let rows = self
            .script
            .generated_keys
            .iter()
            .map(|key| vec![SqlValue::BigInt(*key)])
            .collect();
        Ok(Box::new(self.cursor(
            vec![ColumnMeta::new("GENERATED_KEY", SqlType::BigInt)],
            rows,
        )))
    }

    fn execute(&mut self) -> Result<bool, DriverError> {
        self.run()?;
        self.pending = self.script.results.iter().rev().cloned().collect();
        self.current = self.pending.pop();
        Ok(matches!(self.current, Some(MockResult::Rows { .. })))
    }

    fn result_cursor(&mut self) -> Result<Option<Box<dyn ResultCursor + '_>>, DriverError> {
        match self.current.clone() {
            Some(MockResult::Rows { columns, rows }) => {
                let cursor: Box<dyn ResultCursor> = Box::new(self.cursor(columns, rows));
                Ok(Some(cursor))
            }
            _ => Ok(None),
        }
    }

    fn more_results(&mut self) -> Result<bool, DriverError> {
        self.current = self.pending.pop();
        Ok(matches!(self.current, Some(MockResult::Rows { .. })))
    }

    fn update_count(&mut self) -> Result<Option<usize>, DriverError> {
        match self.current {
            Some(MockResult::Count(rows)) => Ok(Some(rows)),
            _ => Ok(None),
        }
    }

    fn set_fetch_direction(&mut self, direction: FetchDirection) -> Result<(), DriverError> {
        self.configured("fetch_direction", format!("{direction:?}"))
    }

    fn set_fetch_size(&mut self, rows: u32) -> Result<(), DriverError> {
        self.configured("fetch_size", rows.to_string())
    }

    fn set_max_field_size(&mut self, bytes: u32) -> Result<(), DriverError> {
        self.configured("max_field_size", bytes.to_string())?;
        self.max_field_size = Some(bytes);
        Ok(())
    }

    fn set_max_rows(&mut self, rows: u64) -> Result<(), DriverError> {
        self.configured("max_rows", rows.to_string())?;
        self.max_rows = Some(rows);
        Ok(())
    }

    fn set_query_timeout(&mut self, timeout: Duration) -> Result<(), DriverError> {
        self.configured("query_timeout", timeout.as_secs().to_string())
    }

    fn as_callable(&mut self) -> Option<&mut dyn CallableStatement> {
        if self.callable { Some(self) } else { None }
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.db.record(MockEvent::StatementClosed);
        if self.script.fails_at(MockFailure::StatementClose) {
            return Err(DriverError::sql("statement close failed"));
        }
        Ok(())
    }
}

impl CallableStatement for MockStatement {
    fn register_out_parameter(
        &mut self,
        index: usize,
        sql_type: SqlType,
    ) -> Result<(), DriverError> {
        self.db.record(MockEvent::RegisterOut { index, sql_type });
        Ok(())
    }

    fn out_value(&mut self, index: usize) -> Result<SqlValue, DriverError> {
        self.script
            .out_values
            .get(&index)
            .cloned()
            .ok_or_else(|| DriverError::Other(format!("parameter {index} is not an output")))
    }
}

struct MockCursor {
    db: MockDatabase,
    inner: MemoryCursor,
    fail_close: bool,
}

impl ResultCursor for MockCursor {
    fn next(&mut self) -> Result<bool, DriverError> {
        self.inner.next()
    }

    fn columns(&self) -> &[ColumnMeta] {
        self.inner.columns()
    }

    fn get_object(&self, index: usize) -> Result<SqlValue, DriverError> {
        self.inner.get_object(index)
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.inner.close()?;
        self.db.record(MockEvent::CursorClosed);
        if self.fail_close {
            return Err(DriverError::sql("cursor close failed"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_walks_scripted_results() {
        let db = MockDatabase::new();
        db.script(
            "CALL p()",
            MockScript::new()
                .result(MockResult::rows(
                    vec![ColumnMeta::new("a", SqlType::Integer)],
                    vec![vec![SqlValue::Int(1)]],
                ))
                .result(MockResult::Count(4)),
        );
        let mut conn = db.connect();
        let mut stmt = conn.prepare_call("CALL p()").unwrap();
        assert!(stmt.execute().unwrap());
        assert!(stmt.result_cursor().unwrap().is_some());
        assert!(!stmt.more_results().unwrap());
        assert_eq!(stmt.update_count().unwrap(), Some(4));
        assert!(!stmt.more_results().unwrap());
        assert_eq!(stmt.update_count().unwrap(), None);
    }
}
