use rusqlite::types::Value;

use crate::driver::{ColumnMeta, MemoryCursor};
use crate::error::DriverError;
use crate::types::SqlType;

use super::params::sqlite_to_sql_value;

/// Column metadata of a prepared statement.
///
/// Declared types map through [`SqlType::from_declared`]; integer and real declarations widen to
/// BIGINT and DOUBLE since SQLite stores them as 64-bit values. Expression columns have no
/// declared type and report OTHER.
pub(crate) fn column_meta(stmt: &rusqlite::Statement<'_>) -> Vec<ColumnMeta> {
    stmt.columns()
        .iter()
        .map(|col| {
            let sql_type = match col.decl_type().map(SqlType::from_declared) {
                Some(SqlType::Integer) => SqlType::BigInt,
                Some(SqlType::Real | SqlType::Float) => SqlType::Double,
                Some(other) => other,
                None => SqlType::Other,
            };
            ColumnMeta::new(col.name(), sql_type)
        })
        .collect()
}

/// Bind `values` positionally and run the statement, reading every row into memory.
///
/// Reading stops after `max_rows` rows when a non-zero limit is set.
pub(crate) fn build_result_set(
    stmt: &mut rusqlite::Statement<'_>,
    values: &[Value],
    max_rows: Option<u64>,
    max_field_size: Option<u32>,
) -> Result<MemoryCursor, DriverError> {
    let columns = column_meta(stmt);
    bind_all(stmt, values)?;

    let limit = max_rows
        .filter(|limit| *limit > 0)
        .map_or(usize::MAX, |limit| usize::try_from(limit).unwrap_or(usize::MAX));
    let mut rows_out = Vec::new();
    let mut rows = stmt.raw_query();
    while rows_out.len() < limit
        && let Some(row) = rows.next()?
    {
        let mut values = Vec::with_capacity(columns.len());
        for i in 0..columns.len() {
            let value: Value = row.get(i)?;
            values.push(sqlite_to_sql_value(value));
        }
        rows_out.push(values);
    }

    Ok(MemoryCursor::new(columns, rows_out).with_max_field_size(max_field_size))
}

/// Bind `values` positionally and execute a statement that returns no rows.
pub(crate) fn run_update(
    stmt: &mut rusqlite::Statement<'_>,
    values: &[Value],
) -> Result<usize, DriverError> {
    bind_all(stmt, values)?;
    Ok(stmt.raw_execute()?)
}

fn bind_all(stmt: &mut rusqlite::Statement<'_>, values: &[Value]) -> Result<(), DriverError> {
    for (i, value) in values.iter().enumerate() {
        stmt.raw_bind_parameter(i + 1, value)?;
    }
    Ok(())
}
