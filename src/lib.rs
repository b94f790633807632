//! Blocking SQL accessor: positional and named parameter binding, pluggable row conversion and a
//! uniform query/update/insert/batch/execute operation family over a small driver abstraction.
//!
//! ```rust
//! use sql_accessor::prelude::*;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let accessor = Accessor::new();
//! let mut conn = SqliteConnection::open_in_memory()?;
//! conn.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//!
//! let id: Option<i64> = accessor.insert_with(
//!     &mut conn,
//!     "INSERT INTO users (name) VALUES (?)",
//!     &ScalarHandler::new(),
//!     &params!["alice"],
//! )?;
//! let rows = accessor.query_with(
//!     &mut conn,
//!     "SELECT id, name FROM users",
//!     &MapListHandler::new(),
//!     &params![],
//! )?;
//! assert_eq!(rows[0].get("id"), id.map(SqlValue::from).as_ref());
//! # Ok(())
//! # }
//! ```

pub mod accessor;
mod binder;
pub mod cleanup;
pub mod config;
pub mod conversion;
pub mod driver;
pub mod error;
pub mod handlers;
mod macros;
pub mod prelude;
pub mod record;
pub mod statement;
pub mod translation;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use accessor::{Accessor, AccessorBuilder, NamedAccessor, RecordAccessor};
pub use config::{FetchDirection, StatementConfiguration, StatementConfigurationBuilder};
pub use error::{DriverError, SqlAccessorError};
pub use types::{OutParameter, Param, SqlType, SqlValue};
