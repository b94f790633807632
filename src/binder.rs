use std::sync::atomic::{AtomicBool, Ordering};

use crate::driver::{ParameterMetadata, Statement};
use crate::error::{OpError, SqlAccessorError};
use crate::types::{Param, SqlType};

/// One-way flag recording that the driver cannot report parameter metadata.
///
/// Once set it stays set, so introspection is never retried by the owning accessor. Every writer
/// stores the same value, so relaxed ordering is enough.
#[derive(Debug, Default)]
pub(crate) struct MetadataLatch(AtomicBool);

impl MetadataLatch {
    pub(crate) fn new(known_broken: bool) -> Self {
        Self(AtomicBool::new(known_broken))
    }

    pub(crate) fn is_set(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    pub(crate) fn trip(&self, reason: &str) {
        if !self.0.swap(true, Ordering::Relaxed) {
            tracing::warn!(reason, "parameter metadata unavailable; disabling introspection");
        }
    }
}

/// Bind `params` to the statement's placeholders, 1-based and in order.
///
/// Output parameters are registered on callable statements; when they carry a value it is bound
/// as input too. NULL is bound with the declared parameter type when metadata provides it and
/// [`SqlType::DEFAULT_NULL`] otherwise. Non-null values are bound as-is and the driver infers
/// their type.
pub(crate) fn fill_statement(
    stmt: &mut dyn Statement,
    params: &[Param],
    latch: &MetadataLatch,
) -> Result<(), OpError> {
    let metadata = if latch.is_set() {
        None
    } else {
        checked_metadata(stmt, params.len(), latch)?
    };

    for (position, param) in params.iter().enumerate() {
        let index = position + 1;
        match param {
            Param::Out(out) => {
                let Some(callable) = stmt.as_callable() else {
                    return Err(SqlAccessorError::InvalidArgument(format!(
                        "output parameter at position {index} requires a callable statement"
                    ))
                    .into());
                };
                callable.register_out_parameter(index, out.sql_type())?;
                let input = out.value();
                if !input.is_null() {
                    stmt.set_value(index, &input)?;
                }
            }
            Param::Value(value) if value.is_null() => {
                let sql_type = null_type(metadata.as_deref(), index, latch);
                stmt.set_null(index, sql_type)?;
            }
            Param::Value(value) => stmt.set_value(index, value)?,
        }
    }
    Ok(())
}

/// Fetch metadata and validate the placeholder count against `given`.
fn checked_metadata(
    stmt: &mut dyn Statement,
    given: usize,
    latch: &MetadataLatch,
) -> Result<Option<Box<dyn ParameterMetadata>>, OpError> {
    let metadata = match stmt.parameter_metadata() {
        Ok(Some(metadata)) => metadata,
        Ok(None) => {
            latch.trip("driver returned no parameter metadata");
            return Ok(None);
        }
        Err(err) if err.is_feature_not_supported() => {
            latch.trip("parameter metadata not supported");
            return Ok(None);
        }
        Err(err) => return Err(err.into()),
    };

    match metadata.parameter_count() {
        Ok(expected) if expected != given => {
            Err(SqlAccessorError::ParameterCountMismatch { expected, given }.into())
        }
        Ok(_) => Ok(Some(metadata)),
        Err(err) if err.is_feature_not_supported() => {
            latch.trip("parameter count not supported");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

fn null_type(
    metadata: Option<&dyn ParameterMetadata>,
    index: usize,
    latch: &MetadataLatch,
) -> SqlType {
    let Some(metadata) = metadata.filter(|_| !latch.is_set()) else {
        return SqlType::DEFAULT_NULL;
    };
    match metadata.parameter_type(index) {
        Ok(sql_type) => sql_type,
        Err(err) => {
            latch.trip(&format!("parameter type lookup failed: {err}"));
            SqlType::DEFAULT_NULL
        }
    }
}
