use std::fmt;
use std::path::{Path, PathBuf};

use crate::driver::{Connection, ConnectionSource, GeneratedKeys, Statement};
use crate::error::DriverError;

use super::statement::SqliteStatement;

/// A [`Connection`] over one rusqlite connection.
///
/// Auto-commit is on by default. Turning it off opens a transaction with `BEGIN`; `commit` and
/// `rollback` end that transaction and open the next one while auto-commit stays off.
pub struct SqliteConnection {
    conn: Option<rusqlite::Connection>,
    auto_commit: bool,
}

impl SqliteConnection {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns `DriverError::Sqlite` if the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DriverError> {
        Ok(Self::from_rusqlite(rusqlite::Connection::open(path)?))
    }

    /// # Errors
    /// Returns `DriverError::Sqlite` if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self, DriverError> {
        Ok(Self::from_rusqlite(rusqlite::Connection::open_in_memory()?))
    }

    /// Wrap an existing rusqlite connection.
    #[must_use]
    pub fn from_rusqlite(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Some(conn),
            auto_commit: true,
        }
    }

    /// Run one or more `;`-separated statements without parameters.
    ///
    /// # Errors
    /// Returns `DriverError` if the connection is closed or any statement fails.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), DriverError> {
        Ok(self.raw()?.execute_batch(sql)?)
    }

    fn raw(&self) -> Result<&rusqlite::Connection, DriverError> {
        self.conn
            .as_ref()
            .ok_or_else(|| DriverError::Other("connection is closed".into()))
    }

    fn in_transaction(&self) -> Result<bool, DriverError> {
        Ok(!self.raw()?.is_autocommit())
    }

    fn end_transaction(&mut self, verb: &str) -> Result<(), DriverError> {
        if self.in_transaction()? {
            self.raw()?.execute_batch(verb)?;
        }
        if !self.auto_commit {
            self.raw()?.execute_batch("BEGIN")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("open", &self.conn.is_some())
            .field("auto_commit", &self.auto_commit)
            .finish()
    }
}

impl Connection for SqliteConnection {
    fn prepare(
        &mut self,
        sql: &str,
        keys: GeneratedKeys,
    ) -> Result<Box<dyn Statement + '_>, DriverError> {
        let conn = self.raw()?;
        let stmt = conn.prepare(sql)?;
        Ok(Box::new(SqliteStatement::new(conn, stmt, sql, keys, false)))
    }

    fn prepare_call(&mut self, sql: &str) -> Result<Box<dyn Statement + '_>, DriverError> {
        let conn = self.raw()?;
        let stmt = conn.prepare(sql)?;
        Ok(Box::new(SqliteStatement::new(
            conn,
            stmt,
            sql,
            GeneratedKeys::None,
            true,
        )))
    }

    fn set_auto_commit(&mut self, auto_commit: bool) -> Result<(), DriverError> {
        if auto_commit == self.auto_commit {
            return Ok(());
        }
        if auto_commit {
            if self.in_transaction()? {
                self.raw()?.execute_batch("COMMIT")?;
            }
        } else if !self.in_transaction()? {
            self.raw()?.execute_batch("BEGIN")?;
        }
        self.auto_commit = auto_commit;
        tracing::debug!(auto_commit, "sqlite auto-commit changed");
        Ok(())
    }

    fn auto_commit(&self) -> bool {
        self.auto_commit
    }

    fn commit(&mut self) -> Result<(), DriverError> {
        self.end_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), DriverError> {
        self.end_transaction("ROLLBACK")
    }

    fn close(&mut self) -> Result<(), DriverError> {
        match self.conn.take() {
            Some(conn) => conn.close().map_err(|(_, err)| DriverError::Sqlite(err)),
            None => Ok(()),
        }
    }
}

/// A [`ConnectionSource`] that opens a new [`SqliteConnection`] per acquisition.
///
/// Each acquisition of `":memory:"` yields a fresh, empty database, so in-memory use needs the
/// `_with` operation forms on a connection the caller keeps.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    db_path: PathBuf,
    init_sql: Option<String>,
}

impl SqliteSource {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
            init_sql: None,
        }
    }

    /// SQL run on every newly opened connection, such as `PRAGMA` settings.
    #[must_use]
    pub fn with_init_sql(mut self, init_sql: impl Into<String>) -> Self {
        self.init_sql = Some(init_sql.into());
        self
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl ConnectionSource for SqliteSource {
    fn connection(&self) -> Result<Box<dyn Connection>, DriverError> {
        let mut conn = SqliteConnection::open(&self.db_path)?;
        if let Some(init_sql) = &self.init_sql {
            conn.execute_batch(init_sql)?;
        }
        tracing::trace!(path = %self.db_path.display(), "sqlite connection opened");
        Ok(Box::new(conn))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_commit_reopens_transaction() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (v INTEGER)").unwrap();
        conn.set_auto_commit(false).unwrap();
        assert!(conn.in_transaction().unwrap());

        conn.execute_batch("INSERT INTO t VALUES (1)").unwrap();
        conn.rollback().unwrap();
        assert!(conn.in_transaction().unwrap());

        conn.execute_batch("INSERT INTO t VALUES (2)").unwrap();
        conn.commit().unwrap();
        conn.set_auto_commit(true).unwrap();
        assert!(!conn.in_transaction().unwrap());

        let count: i64 = conn
            .raw()
            .unwrap()
            .query_row("SELECT SUM(v) FROM t", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 2);
    }

    #[test]
    fn closed_connection_rejects_work() {
        let mut conn = SqliteConnection::open_in_memory().unwrap();
        conn.close().unwrap();
        conn.close().unwrap();
        assert!(conn.prepare("SELECT 1", GeneratedKeys::None).is_err());
    }
}
