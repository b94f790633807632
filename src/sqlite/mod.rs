// SQLite driver - runs the accessor on rusqlite
//
// - connection: SqliteConnection, transactions and SqliteSource
// - statement: prepared/callable statements, batches and generated keys
// - params: value conversion between SqlValue and rusqlite
// - query: column metadata and result materialization

mod connection;
mod params;
mod query;
mod statement;

pub use connection::{SqliteConnection, SqliteSource};
pub use params::{sql_value_to_sqlite, sqlite_to_sql_value};
pub use statement::GENERATED_KEY_COLUMN;
