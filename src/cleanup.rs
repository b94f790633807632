//! Close, commit and rollback helpers for driver resources.
//!
//! The plain variants report failures; the `_quietly` variants log them at debug level and carry
//! on. Consuming helpers (`*_and_close`) always attempt the close, even when the commit or
//! rollback before it failed.

use crate::driver::{Connection, ResultCursor, Statement};
use crate::error::{DriverError, OpError};

/// # Errors
/// Returns `DriverError` if the driver fails to release the cursor.
pub fn close_cursor(cursor: &mut dyn ResultCursor) -> Result<(), DriverError> {
    cursor.close()
}

pub fn close_cursor_quietly(cursor: &mut dyn ResultCursor) {
    if let Err(error) = cursor.close() {
        tracing::debug!(%error, "ignoring cursor close failure");
    }
}

/// # Errors
/// Returns `DriverError` if the driver fails to release the statement.
pub fn close_statement(stmt: &mut dyn Statement) -> Result<(), DriverError> {
    stmt.close()
}

pub fn close_statement_quietly(stmt: &mut dyn Statement) {
    if let Err(error) = stmt.close() {
        tracing::debug!(%error, sql = stmt.sql(), "ignoring statement close failure");
    }
}

/// # Errors
/// Returns `DriverError` if the session cannot be released cleanly.
pub fn close_connection(mut conn: Box<dyn Connection>) -> Result<(), DriverError> {
    conn.close()
}

pub fn close_connection_quietly(conn: Box<dyn Connection>) {
    if let Err(error) = close_connection(conn) {
        tracing::debug!(%error, "ignoring connection close failure");
    }
}

/// Commit, then close the connection whether or not the commit succeeded.
///
/// # Errors
/// Returns the commit failure if there was one, otherwise the close failure.
pub fn commit_and_close(mut conn: Box<dyn Connection>) -> Result<(), DriverError> {
    let committed = conn.commit();
    let closed = conn.close();
    committed.and(closed)
}

pub fn commit_and_close_quietly(conn: Box<dyn Connection>) {
    if let Err(error) = commit_and_close(conn) {
        tracing::debug!(%error, "ignoring commit/close failure");
    }
}

/// # Errors
/// Returns `DriverError` if the rollback fails.
pub fn rollback(conn: &mut dyn Connection) -> Result<(), DriverError> {
    conn.rollback()
}

/// Roll back, then close the connection whether or not the rollback succeeded.
///
/// # Errors
/// Returns the rollback failure if there was one, otherwise the close failure.
pub fn rollback_and_close(mut conn: Box<dyn Connection>) -> Result<(), DriverError> {
    let rolled_back = conn.rollback();
    let closed = conn.close();
    rolled_back.and(closed)
}

pub fn rollback_and_close_quietly(conn: Box<dyn Connection>) {
    if let Err(error) = rollback_and_close(conn) {
        tracing::debug!(%error, "ignoring rollback/close failure");
    }
}

/// Combine an operation outcome with the outcome of closing one of its resources.
///
/// A close failure after a successful operation becomes the result. After a failed operation the
/// close failure is logged and the original error is kept.
pub(crate) fn settle<T>(
    primary: Result<T, OpError>,
    cleanup: Result<(), DriverError>,
    resource: &'static str,
) -> Result<T, OpError> {
    match (primary, cleanup) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close)) => Err(OpError::Driver(close)),
        (Err(err), Ok(())) => Err(err),
        (Err(err), Err(close)) => {
            tracing::warn!(
                resource,
                error = %close,
                "close failed after an earlier error; keeping the earlier error"
            );
            Err(err)
        }
    }
}

/// Run `f` against the statement, then close it on every exit path.
pub(crate) fn using_statement<T>(
    mut stmt: Box<dyn Statement + '_>,
    f: impl FnOnce(&mut dyn Statement) -> Result<T, OpError>,
) -> Result<T, OpError> {
    let outcome = f(&mut *stmt);
    let closed = stmt.close();
    settle(outcome, closed, "statement")
}

/// Run `f` against the cursor, then close it on every exit path.
pub(crate) fn using_cursor<T>(
    mut cursor: Box<dyn ResultCursor + '_>,
    f: impl FnOnce(&mut dyn ResultCursor) -> Result<T, OpError>,
) -> Result<T, OpError> {
    let outcome = f(&mut *cursor);
    let closed = cursor.close();
    settle(outcome, closed, "cursor")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SqlAccessorError;

    #[test]
    fn close_error_surfaces_after_success() {
        let settled: Result<u8, OpError> = settle(Ok(1), Err(DriverError::sql("close")), "cursor");
        assert!(matches!(settled, Err(OpError::Driver(DriverError::Sql { .. }))));
    }

    #[test]
    fn primary_error_wins_over_close_error() {
        let primary = Err(OpError::Accessor(SqlAccessorError::InvalidArgument("x".into())));
        let settled: Result<u8, OpError> =
            settle(primary, Err(DriverError::sql("close")), "cursor");
        assert!(matches!(
            settled,
            Err(OpError::Accessor(SqlAccessorError::InvalidArgument(_)))
        ));
    }
}
