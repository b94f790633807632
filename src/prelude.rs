//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::accessor::{
    Accessor, AccessorBuilder, NamedAccessor, RecordAccessor, record_map,
};
pub use crate::config::{FetchDirection, StatementConfiguration, StatementConfigurationBuilder};
pub use crate::conversion::{RowIter, RowMap, RowProcessor};
pub use crate::driver::{
    ColumnMeta, Connection, ConnectionSource, GeneratedKeys, MemoryCursor, ResultCursor, Statement,
};
pub use crate::error::{DriverError, SqlAccessorError};
pub use crate::handlers::{
    ArrayHandler, ArrayListHandler, ColumnListHandler, MapHandler, MapListHandler, RecordHandler,
    RecordListHandler, ResultSetHandler, ScalarHandler,
};
pub use crate::params;
pub use crate::record::{Record, SqlField, SqlXml};
pub use crate::translation::{NamedParams, NamedSqlTranslator};
pub use crate::types::{OutParameter, Param, SqlType, SqlValue, render_param_rows, render_params};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteSource};
