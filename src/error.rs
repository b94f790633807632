use thiserror::Error;

/// Failures reported by a driver (connection, statement or cursor implementation).
///
/// Drivers return this type from every [`crate::driver`] trait method. The accessor never hands
/// it to callers directly: it is wrapped into [`SqlAccessorError::DatabaseOperationFailed`]
/// together with the SQL text and the rendered parameters.
#[derive(Debug, Error)]
pub enum DriverError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// The driver does not implement the requested capability.
    #[error("Feature not supported: {0}")]
    FeatureNotSupported(String),

    /// A database-reported failure with an optional SQLSTATE.
    #[error("{message}")]
    Sql {
        message: String,
        state: Option<String>,
    },

    /// A value could not be converted to the requested type.
    #[error("Conversion error: {0}")]
    Conversion(String),

    #[error("Driver error: {0}")]
    Other(String),
}

impl DriverError {
    /// Shorthand for a database-reported failure without SQLSTATE.
    #[must_use]
    pub fn sql(message: impl Into<String>) -> Self {
        DriverError::Sql {
            message: message.into(),
            state: None,
        }
    }

    /// Whether this error signals an unsupported driver capability.
    #[must_use]
    pub fn is_feature_not_supported(&self) -> bool {
        matches!(self, DriverError::FeatureNotSupported(_))
    }
}

/// The single error type returned by every accessor operation.
#[derive(Debug, Error)]
pub enum SqlAccessorError {
    /// Bad call arguments, detected before any I/O.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The statement expects a different number of parameters than were supplied.
    #[error("Wrong number of parameters: expected {expected}, was given {given}")]
    ParameterCountMismatch { expected: usize, given: usize },

    /// A driver failure during prepare, bind, execute or conversion.
    #[error("{message} Query: {sql} Parameters: {params}")]
    DatabaseOperationFailed {
        message: String,
        sql: String,
        params: String,
        #[source]
        source: DriverError,
    },

    /// The accessor is missing something it needs, such as a connection source.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl SqlAccessorError {
    /// Wrap a driver failure with the statement text and a rendering of its parameters.
    #[must_use]
    pub fn database(source: DriverError, sql: &str, params: String) -> Self {
        SqlAccessorError::DatabaseOperationFailed {
            message: source.to_string(),
            sql: sql.to_string(),
            params,
            source,
        }
    }

    /// The driver error behind a `DatabaseOperationFailed`, if any.
    #[must_use]
    pub fn driver_error(&self) -> Option<&DriverError> {
        match self {
            SqlAccessorError::DatabaseOperationFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Internal step error: either already normalized, or a raw driver error still waiting for the
/// SQL/parameter context that only the operation knows.
#[derive(Debug)]
pub(crate) enum OpError {
    Driver(DriverError),
    Accessor(SqlAccessorError),
}

impl OpError {
    pub(crate) fn into_accessor(
        self,
        sql: &str,
        render: impl FnOnce() -> String,
    ) -> SqlAccessorError {
        match self {
            OpError::Driver(source) => SqlAccessorError::database(source, sql, render()),
            OpError::Accessor(err) => err,
        }
    }
}

impl From<DriverError> for OpError {
    fn from(err: DriverError) -> Self {
        OpError::Driver(err)
    }
}

impl From<SqlAccessorError> for OpError {
    fn from(err: SqlAccessorError) -> Self {
        OpError::Accessor(err)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for OpError {
    fn from(err: rusqlite::Error) -> Self {
        OpError::Driver(DriverError::Sqlite(err))
    }
}
