use crate::cleanup::close_statement_quietly;
use crate::config::StatementConfiguration;
use crate::driver::{Connection, GeneratedKeys, Statement};
use crate::error::DriverError;

/// Prepare `sql` on `conn` and apply the configured statement options.
///
/// If an option cannot be applied the new statement is closed before the error is returned.
pub(crate) fn prepare<'c>(
    conn: &'c mut dyn Connection,
    sql: &str,
    keys: GeneratedKeys,
    config: Option<&StatementConfiguration>,
) -> Result<Box<dyn Statement + 'c>, DriverError> {
    let stmt = conn.prepare(sql, keys)?;
    configured(stmt, config)
}

/// Prepare a stored-procedure call on `conn` and apply the configured statement options.
pub(crate) fn prepare_call<'c>(
    conn: &'c mut dyn Connection,
    sql: &str,
    config: Option<&StatementConfiguration>,
) -> Result<Box<dyn Statement + 'c>, DriverError> {
    let stmt = conn.prepare_call(sql)?;
    configured(stmt, config)
}

fn configured<'c>(
    mut stmt: Box<dyn Statement + 'c>,
    config: Option<&StatementConfiguration>,
) -> Result<Box<dyn Statement + 'c>, DriverError> {
    if let Some(config) = config
        && let Err(err) = configure_statement(&mut *stmt, config)
    {
        close_statement_quietly(&mut *stmt);
        return Err(err);
    }
    Ok(stmt)
}

/// Apply every option that is set in `config`; unset options leave the driver default alone.
///
/// # Errors
/// Returns the first `DriverError` raised by the statement.
pub fn configure_statement(
    stmt: &mut dyn Statement,
    config: &StatementConfiguration,
) -> Result<(), DriverError> {
    if let Some(direction) = config.fetch_direction() {
        stmt.set_fetch_direction(direction)?;
    }
    if let Some(size) = config.fetch_size() {
        stmt.set_fetch_size(size)?;
    }
    if let Some(size) = config.max_field_size() {
        stmt.set_max_field_size(size)?;
    }
    if let Some(rows) = config.max_rows() {
        stmt.set_max_rows(rows)?;
    }
    if let Some(timeout) = config.query_timeout() {
        stmt.set_query_timeout(timeout)?;
    }
    tracing::trace!(sql = stmt.sql(), ?config, "statement configured");
    Ok(())
}
