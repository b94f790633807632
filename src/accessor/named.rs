use std::sync::Arc;

use crate::accessor::Accessor;
use crate::driver::Connection;
use crate::error::SqlAccessorError;
use crate::handlers::ResultSetHandler;
use crate::translation::{NamedParams, NamedSqlTranslator};
use crate::types::Param;

/// Runs `#{name}` SQL through an [`Accessor`].
///
/// Each call translates the SQL (cached per SQL text) and resolves the positional parameters
/// from the supplied values by name. Names the values do not contain are bound as NULL. Pass
/// `&()` when the statement has no placeholders.
///
/// ```rust
/// use std::collections::HashMap;
/// use sql_accessor::prelude::*;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let named = NamedAccessor::new(Accessor::new());
/// let mut conn = SqliteConnection::open_in_memory()?;
/// conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT)")?;
///
/// let values = HashMap::from([
///     ("id".to_string(), SqlValue::from(7)),
///     ("name".to_string(), SqlValue::from("seven")),
/// ]);
/// named.update_with(&mut conn, "INSERT INTO t (id, name) VALUES (#{id}, #{name})", &values)?;
///
/// let name: Option<String> = named.query_with(
///     &mut conn,
///     "SELECT name FROM t WHERE id = #{id}",
///     &ScalarHandler::new(),
///     &values,
/// )?;
/// assert_eq!(name.as_deref(), Some("seven"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct NamedAccessor {
    accessor: Accessor,
    translator: Arc<NamedSqlTranslator>,
}

impl NamedAccessor {
    /// Wrap `accessor`, translating through the process-wide translator.
    #[must_use]
    pub fn new(accessor: Accessor) -> Self {
        Self::with_translator(accessor, NamedSqlTranslator::global())
    }

    #[must_use]
    pub fn with_translator(accessor: Accessor, translator: Arc<NamedSqlTranslator>) -> Self {
        Self {
            accessor,
            translator,
        }
    }

    #[must_use]
    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    #[must_use]
    pub fn translator(&self) -> &NamedSqlTranslator {
        &self.translator
    }

    fn positional<V: NamedParams + ?Sized>(&self, sql: &str, values: &V) -> (String, Vec<Param>) {
        let named = self.translator.translate(sql);
        (named.sql().to_string(), named.parameters(values))
    }

    /// # Errors
    /// As [`Accessor::query`].
    pub fn query<T, H, V>(&self, sql: &str, handler: &H, values: &V) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        V: NamedParams + ?Sized,
    {
        let (sql, params) = self.positional(sql, values);
        self.accessor.query(&sql, handler, &params)
    }

    /// # Errors
    /// As [`Accessor::query_with`].
    pub fn query_with<T, H, V>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        values: &V,
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        V: NamedParams + ?Sized,
    {
        let (sql, params) = self.positional(sql, values);
        self.accessor.query_with(conn, &sql, handler, &params)
    }

    /// # Errors
    /// As [`Accessor::update`].
    pub fn update<V: NamedParams + ?Sized>(
        &self,
        sql: &str,
        values: &V,
    ) -> Result<usize, SqlAccessorError> {
        let (sql, params) = self.positional(sql, values);
        self.accessor.update(&sql, &params)
    }

    /// # Errors
    /// As [`Accessor::update_with`].
    pub fn update_with<V: NamedParams + ?Sized>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        values: &V,
    ) -> Result<usize, SqlAccessorError> {
        let (sql, params) = self.positional(sql, values);
        self.accessor.update_with(conn, &sql, &params)
    }

    /// # Errors
    /// As [`Accessor::insert`].
    pub fn insert<T, H, V>(&self, sql: &str, handler: &H, values: &V) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        V: NamedParams + ?Sized,
    {
        let (sql, params) = self.positional(sql, values);
        self.accessor.insert(&sql, handler, &params)
    }

    /// # Errors
    /// As [`Accessor::insert_with`].
    pub fn insert_with<T, H, V>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        values: &V,
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        V: NamedParams + ?Sized,
    {
        let (sql, params) = self.positional(sql, values);
        self.accessor.insert_with(conn, &sql, handler, &params)
    }

    /// # Errors
    /// As [`Accessor::batch`].
    pub fn batch<V: NamedParams>(
        &self,
        sql: &str,
        rows: &[V],
    ) -> Result<Vec<usize>, SqlAccessorError> {
        let params = self.translator.parameter_rows(sql, rows);
        let sql = self.translator.sql(sql);
        self.accessor.batch(&sql, &params)
    }

    /// # Errors
    /// As [`Accessor::batch_with`].
    pub fn batch_with<V: NamedParams>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        rows: &[V],
    ) -> Result<Vec<usize>, SqlAccessorError> {
        let params = self.translator.parameter_rows(sql, rows);
        let sql = self.translator.sql(sql);
        self.accessor.batch_with(conn, &sql, &params)
    }

    /// # Errors
    /// As [`Accessor::insert_batch`].
    pub fn insert_batch<T, H, V>(
        &self,
        sql: &str,
        handler: &H,
        rows: &[V],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        V: NamedParams,
    {
        let params = self.translator.parameter_rows(sql, rows);
        let sql = self.translator.sql(sql);
        self.accessor.insert_batch(&sql, handler, &params)
    }

    /// # Errors
    /// As [`Accessor::insert_batch_with`].
    pub fn insert_batch_with<T, H, V>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        rows: &[V],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        V: NamedParams,
    {
        let params = self.translator.parameter_rows(sql, rows);
        let sql = self.translator.sql(sql);
        self.accessor.insert_batch_with(conn, &sql, handler, &params)
    }

    /// # Errors
    /// As [`Accessor::execute`].
    pub fn execute<V: NamedParams + ?Sized>(
        &self,
        sql: &str,
        values: &V,
    ) -> Result<usize, SqlAccessorError> {
        let (sql, params) = self.positional(sql, values);
        self.accessor.execute(&sql, &params)
    }

    /// # Errors
    /// As [`Accessor::execute_with`].
    pub fn execute_with<V: NamedParams + ?Sized>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        values: &V,
    ) -> Result<usize, SqlAccessorError> {
        let (sql, params) = self.positional(sql, values);
        self.accessor.execute_with(conn, &sql, &params)
    }

    /// # Errors
    /// As [`Accessor::execute_results`].
    pub fn execute_results<T, H, V>(
        &self,
        sql: &str,
        handler: &H,
        values: &V,
    ) -> Result<Vec<T>, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        V: NamedParams + ?Sized,
    {
        let (sql, params) = self.positional(sql, values);
        self.accessor.execute_results(&sql, handler, &params)
    }

    /// # Errors
    /// As [`Accessor::execute_results_with`].
    pub fn execute_results_with<T, H, V>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        values: &V,
    ) -> Result<Vec<T>, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        V: NamedParams + ?Sized,
    {
        let (sql, params) = self.positional(sql, values);
        self.accessor.execute_results_with(conn, &sql, handler, &params)
    }
}
