//! The accessor operation family.
//!
//! Every operation comes in two forms: `op(..)` acquires a connection from the configured
//! [`ConnectionSource`] and closes it afterwards, `op_with(conn, ..)` runs on a caller-owned
//! connection and leaves it open. In both forms the statement and any result cursor are closed
//! before the call returns, cursor first.

use std::fmt;
use std::sync::Arc;

mod named;
mod records;

pub use named::NamedAccessor;
pub use records::{RecordAccessor, record_map};

use crate::binder::{self, MetadataLatch};
use crate::cleanup::{settle, using_cursor, using_statement};
use crate::config::StatementConfiguration;
use crate::driver::{Connection, ConnectionSource, GeneratedKeys, Statement};
use crate::error::{OpError, SqlAccessorError};
use crate::handlers::ResultSetHandler;
use crate::record::Record;
use crate::statement;
use crate::types::{Param, render_param_rows, render_params};

/// Executes SQL with positional `?` parameters.
///
/// # Examples
/// ```rust,no_run
/// use sql_accessor::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let accessor = Accessor::builder()
///     .source(SqliteSource::new("app.db"))
///     .statement_config(StatementConfiguration::builder().max_rows(100).build())
///     .build();
///
/// accessor.update("INSERT INTO users (id, name) VALUES (?, ?)", &params![1, "alice"])?;
/// let name: Option<String> =
///     accessor.query("SELECT name FROM users WHERE id = ?", &ScalarHandler::new(), &params![1])?;
/// # let _ = name;
/// # Ok(())
/// # }
/// ```
pub struct Accessor {
    source: Option<Arc<dyn ConnectionSource>>,
    config: Option<StatementConfiguration>,
    latch: MetadataLatch,
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accessor")
            .field("has_source", &self.source.is_some())
            .field("config", &self.config)
            .field("pmd_known_broken", &self.latch.is_set())
            .finish()
    }
}

impl Default for Accessor {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`Accessor`].
#[derive(Default)]
pub struct AccessorBuilder {
    source: Option<Arc<dyn ConnectionSource>>,
    config: Option<StatementConfiguration>,
    pmd_known_broken: bool,
}

impl AccessorBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Connection source for the self-acquiring operation forms.
    #[must_use]
    pub fn source(mut self, source: impl ConnectionSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Share an existing connection source.
    #[must_use]
    pub fn shared_source(mut self, source: Arc<dyn ConnectionSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Options applied to every statement this accessor prepares.
    #[must_use]
    pub fn statement_config(mut self, config: StatementConfiguration) -> Self {
        self.config = Some(config);
        self
    }

    /// Skip parameter-metadata introspection from the start, for drivers known not to support it.
    #[must_use]
    pub fn pmd_known_broken(mut self, known_broken: bool) -> Self {
        self.pmd_known_broken = known_broken;
        self
    }

    #[must_use]
    pub fn build(self) -> Accessor {
        Accessor {
            source: self.source,
            config: self.config,
            latch: MetadataLatch::new(self.pmd_known_broken),
        }
    }
}

fn check_sql(sql: &str) -> Result<(), SqlAccessorError> {
    if sql.trim().is_empty() {
        return Err(SqlAccessorError::InvalidArgument(
            "SQL statement is empty".to_string(),
        ));
    }
    Ok(())
}

fn reject_out_params(operation: &str, params: &[Param]) -> Result<(), SqlAccessorError> {
    match params.iter().position(|p| p.as_out().is_some()) {
        Some(i) => Err(SqlAccessorError::InvalidArgument(format!(
            "{operation} does not accept output parameters (position {})",
            i + 1
        ))),
        None => Ok(()),
    }
}

impl Accessor {
    /// An accessor without a connection source; only the `_with` forms can be used.
    #[must_use]
    pub fn new() -> Self {
        AccessorBuilder::new().build()
    }

    #[must_use]
    pub fn builder() -> AccessorBuilder {
        AccessorBuilder::new()
    }

    #[must_use]
    pub fn source(&self) -> Option<&Arc<dyn ConnectionSource>> {
        self.source.as_ref()
    }

    #[must_use]
    pub fn statement_config(&self) -> Option<&StatementConfiguration> {
        self.config.as_ref()
    }

    /// Whether parameter-metadata introspection has been given up on.
    #[must_use]
    pub fn is_pmd_known_broken(&self) -> bool {
        self.latch.is_set()
    }

    /// Bind `params` onto a statement the caller prepared.
    ///
    /// # Errors
    /// `ParameterCountMismatch` when metadata reports a different placeholder count,
    /// `InvalidArgument` for an output parameter on a non-callable statement, and
    /// `DatabaseOperationFailed` when the driver rejects a value.
    pub fn fill_statement(
        &self,
        stmt: &mut dyn Statement,
        params: &[Param],
    ) -> Result<(), SqlAccessorError> {
        binder::fill_statement(stmt, params, &self.latch)
            .map_err(|e| e.into_accessor(stmt.sql(), || render_params(params)))
    }

    /// Bind the named fields of `record`, in the given order.
    ///
    /// # Errors
    /// `InvalidArgument` when a name is not a field of `R`; otherwise as
    /// [`Accessor::fill_statement`].
    pub fn fill_statement_with_record<R: Record>(
        &self,
        stmt: &mut dyn Statement,
        record: &R,
        field_names: &[&str],
    ) -> Result<(), SqlAccessorError> {
        let params = records::record_params(record, field_names)?;
        self.fill_statement(stmt, &params)
    }

    /// Acquire a connection, run `op` on it and close it whatever the outcome.
    fn with_source<T>(
        &self,
        sql: &str,
        render: impl Fn() -> String,
        op: impl FnOnce(&mut dyn Connection) -> Result<T, SqlAccessorError>,
    ) -> Result<T, SqlAccessorError> {
        let source = self.source.as_ref().ok_or_else(|| {
            SqlAccessorError::ConfigError(
                "Accessor requires a connection source to be invoked in this way, \
                 or a connection should be passed in"
                    .to_string(),
            )
        })?;
        let mut conn = source
            .connection()
            .map_err(|e| SqlAccessorError::database(e, sql, render()))?;
        let outcome = op(&mut *conn).map_err(OpError::from);
        let closed = conn.close();
        settle(outcome, closed, "connection").map_err(|e| e.into_accessor(sql, render))
    }

    fn bind(&self, stmt: &mut dyn Statement, params: &[Param]) -> Result<(), OpError> {
        binder::fill_statement(stmt, params, &self.latch)
    }

    /// Copy output-parameter values back into the caller's handles, positionally.
    fn retrieve_out_parameters(stmt: &mut dyn Statement, params: &[Param]) -> Result<(), OpError> {
        let Some(callable) = stmt.as_callable() else {
            return Ok(());
        };
        for (i, param) in params.iter().enumerate() {
            if let Param::Out(out) = param {
                out.set_value(callable.out_value(i + 1)?);
            }
        }
        Ok(())
    }

    /// Run a query and hand the cursor to `handler`, acquiring a connection.
    ///
    /// # Errors
    /// `ConfigError` without a connection source, otherwise as [`Accessor::query_with`].
    pub fn query<T, H>(
        &self,
        sql: &str,
        handler: &H,
        params: &[Param],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
    {
        self.with_source(sql, || render_params(params), |conn| {
            self.query_with(conn, sql, handler, params)
        })
    }

    /// Run a query on `conn` and hand the cursor to `handler`.
    ///
    /// # Errors
    /// `InvalidArgument` for blank SQL or output parameters, `ParameterCountMismatch`, or
    /// `DatabaseOperationFailed` for any driver or conversion failure.
    pub fn query_with<T, H>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        params: &[Param],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
    {
        check_sql(sql)?;
        reject_out_params("query", params)?;
        tracing::debug!(operation = "query", sql, params = params.len());
        statement::prepare(conn, sql, GeneratedKeys::None, self.config.as_ref())
            .map_err(OpError::from)
            .and_then(|stmt| {
                using_statement(stmt, |stmt| {
                    self.bind(stmt, params)?;
                    let cursor = stmt.execute_query()?;
                    using_cursor(cursor, |cursor| Ok(handler.handle(cursor)?))
                })
            })
            .map_err(|e| e.into_accessor(sql, || render_params(params)))
    }

    /// Execute an INSERT, UPDATE or DELETE, acquiring a connection.
    ///
    /// # Errors
    /// `ConfigError` without a connection source, otherwise as [`Accessor::update_with`].
    pub fn update(&self, sql: &str, params: &[Param]) -> Result<usize, SqlAccessorError> {
        self.with_source(sql, || render_params(params), |conn| {
            self.update_with(conn, sql, params)
        })
    }

    /// Execute an INSERT, UPDATE or DELETE on `conn`; returns the affected row count.
    ///
    /// # Errors
    /// `InvalidArgument` for blank SQL or output parameters, `ParameterCountMismatch`, or
    /// `DatabaseOperationFailed` for any driver failure.
    pub fn update_with(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        params: &[Param],
    ) -> Result<usize, SqlAccessorError> {
        check_sql(sql)?;
        reject_out_params("update", params)?;
        tracing::debug!(operation = "update", sql, params = params.len());
        statement::prepare(conn, sql, GeneratedKeys::None, self.config.as_ref())
            .map_err(OpError::from)
            .and_then(|stmt| {
                using_statement(stmt, |stmt| {
                    self.bind(stmt, params)?;
                    Ok(stmt.execute_update()?)
                })
            })
            .map_err(|e| e.into_accessor(sql, || render_params(params)))
    }

    /// Execute an INSERT and hand the generated keys to `handler`, acquiring a connection.
    ///
    /// # Errors
    /// `ConfigError` without a connection source, otherwise as [`Accessor::insert_with`].
    pub fn insert<T, H>(
        &self,
        sql: &str,
        handler: &H,
        params: &[Param],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
    {
        self.with_source(sql, || render_params(params), |conn| {
            self.insert_with(conn, sql, handler, params)
        })
    }

    /// Execute an INSERT on `conn` and hand the generated keys to `handler`.
    ///
    /// # Errors
    /// `InvalidArgument` for blank SQL or output parameters, `ParameterCountMismatch`, or
    /// `DatabaseOperationFailed` for any driver or conversion failure.
    pub fn insert_with<T, H>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        params: &[Param],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
    {
        check_sql(sql)?;
        reject_out_params("insert", params)?;
        tracing::debug!(operation = "insert", sql, params = params.len());
        statement::prepare(conn, sql, GeneratedKeys::Return, self.config.as_ref())
            .map_err(OpError::from)
            .and_then(|stmt| {
                using_statement(stmt, |stmt| {
                    self.bind(stmt, params)?;
                    stmt.execute_update()?;
                    let keys = stmt.generated_keys()?;
                    using_cursor(keys, |keys| Ok(handler.handle(keys)?))
                })
            })
            .map_err(|e| e.into_accessor(sql, || render_params(params)))
    }

    /// Execute one statement per parameter row as a batch, acquiring a connection.
    ///
    /// # Errors
    /// `ConfigError` without a connection source, otherwise as [`Accessor::batch_with`].
    pub fn batch(&self, sql: &str, rows: &[Vec<Param>]) -> Result<Vec<usize>, SqlAccessorError> {
        self.with_source(sql, || render_param_rows(rows), |conn| {
            self.batch_with(conn, sql, rows)
        })
    }

    /// Execute one statement per parameter row as a batch on `conn`.
    ///
    /// Returns one affected-row count per input row, in input order.
    ///
    /// # Errors
    /// `InvalidArgument` for blank SQL or output parameters, `ParameterCountMismatch`, or
    /// `DatabaseOperationFailed` for any driver failure.
    pub fn batch_with(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        rows: &[Vec<Param>],
    ) -> Result<Vec<usize>, SqlAccessorError> {
        check_sql(sql)?;
        for row in rows {
            reject_out_params("batch", row)?;
        }
        tracing::debug!(operation = "batch", sql, rows = rows.len());
        statement::prepare(conn, sql, GeneratedKeys::None, self.config.as_ref())
            .map_err(OpError::from)
            .and_then(|stmt| {
                using_statement(stmt, |stmt| {
                    self.queue_rows(stmt, rows)?;
                    Ok(stmt.execute_batch()?)
                })
            })
            .map_err(|e| e.into_accessor(sql, || render_param_rows(rows)))
    }

    /// Batch INSERT and hand the generated keys to `handler`, acquiring a connection.
    ///
    /// # Errors
    /// `ConfigError` without a connection source, otherwise as [`Accessor::insert_batch_with`].
    pub fn insert_batch<T, H>(
        &self,
        sql: &str,
        handler: &H,
        rows: &[Vec<Param>],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
    {
        self.with_source(sql, || render_param_rows(rows), |conn| {
            self.insert_batch_with(conn, sql, handler, rows)
        })
    }

    /// Batch INSERT on `conn` and hand the generated keys to `handler`.
    ///
    /// # Errors
    /// `InvalidArgument` for blank SQL or output parameters, `ParameterCountMismatch`, or
    /// `DatabaseOperationFailed` for any driver or conversion failure.
    pub fn insert_batch_with<T, H>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        rows: &[Vec<Param>],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
    {
        check_sql(sql)?;
        for row in rows {
            reject_out_params("insert_batch", row)?;
        }
        tracing::debug!(operation = "insert_batch", sql, rows = rows.len());
        statement::prepare(conn, sql, GeneratedKeys::Return, self.config.as_ref())
            .map_err(OpError::from)
            .and_then(|stmt| {
                using_statement(stmt, |stmt| {
                    self.queue_rows(stmt, rows)?;
                    stmt.execute_batch()?;
                    let keys = stmt.generated_keys()?;
                    using_cursor(keys, |keys| Ok(handler.handle(keys)?))
                })
            })
            .map_err(|e| e.into_accessor(sql, || render_param_rows(rows)))
    }

    fn queue_rows(&self, stmt: &mut dyn Statement, rows: &[Vec<Param>]) -> Result<(), OpError> {
        for row in rows {
            self.bind(stmt, row)?;
            stmt.add_batch()?;
        }
        Ok(())
    }

    /// Call a stored procedure that returns no result cursor, acquiring a connection.
    ///
    /// # Errors
    /// `ConfigError` without a connection source, otherwise as [`Accessor::execute_with`].
    pub fn execute(&self, sql: &str, params: &[Param]) -> Result<usize, SqlAccessorError> {
        self.with_source(sql, || render_params(params), |conn| {
            self.execute_with(conn, sql, params)
        })
    }

    /// Call a stored procedure on `conn`; returns the affected row count (0 when the first
    /// result is a cursor). Output parameters are filled in after execution.
    ///
    /// # Errors
    /// `InvalidArgument` for blank SQL, `ParameterCountMismatch`, or `DatabaseOperationFailed`
    /// for any driver failure.
    pub fn execute_with(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        params: &[Param],
    ) -> Result<usize, SqlAccessorError> {
        check_sql(sql)?;
        tracing::debug!(operation = "execute", sql, params = params.len());
        statement::prepare_call(conn, sql, self.config.as_ref())
            .map_err(OpError::from)
            .and_then(|stmt| {
                using_statement(stmt, |stmt| {
                    self.bind(stmt, params)?;
                    stmt.execute()?;
                    let rows = stmt.update_count()?.unwrap_or(0);
                    Self::retrieve_out_parameters(stmt, params)?;
                    Ok(rows)
                })
            })
            .map_err(|e| e.into_accessor(sql, || render_params(params)))
    }

    /// Call a stored procedure and convert each result cursor, acquiring a connection.
    ///
    /// # Errors
    /// `ConfigError` without a connection source, otherwise as
    /// [`Accessor::execute_results_with`].
    pub fn execute_results<T, H>(
        &self,
        sql: &str,
        handler: &H,
        params: &[Param],
    ) -> Result<Vec<T>, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
    {
        self.with_source(sql, || render_params(params), |conn| {
            self.execute_results_with(conn, sql, handler, params)
        })
    }

    /// Call a stored procedure on `conn` and apply `handler` to every result cursor it
    /// produces, in order. Collection stops at the first result that is not a cursor. Output
    /// parameters are filled in after execution.
    ///
    /// # Errors
    /// `InvalidArgument` for blank SQL, `ParameterCountMismatch`, or `DatabaseOperationFailed`
    /// for any driver or conversion failure.
    pub fn execute_results_with<T, H>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        params: &[Param],
    ) -> Result<Vec<T>, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
    {
        check_sql(sql)?;
        tracing::debug!(operation = "execute_results", sql, params = params.len());
        statement::prepare_call(conn, sql, self.config.as_ref())
            .map_err(OpError::from)
            .and_then(|stmt| {
                using_statement(stmt, |stmt| {
                    self.bind(stmt, params)?;
                    let mut results = Vec::new();
                    let mut more = stmt.execute()?;
                    while more {
                        if let Some(cursor) = stmt.result_cursor()? {
                            let converted =
                                using_cursor(cursor, |cursor| Ok(handler.handle(cursor)?))?;
                            results.push(converted);
                        }
                        more = stmt.more_results()?;
                    }
                    Self::retrieve_out_parameters(stmt, params)?;
                    Ok(results)
                })
            })
            .map_err(|e| e.into_accessor(sql, || render_params(params)))
    }
}
