use crate::accessor::NamedAccessor;
use crate::conversion::RowMap;
use crate::driver::Connection;
use crate::error::SqlAccessorError;
use crate::handlers::ResultSetHandler;
use crate::record::Record;
use crate::types::{Param, SqlValue};

/// A record's fields as a name → value mapping, in declaration order.
#[must_use]
pub fn record_map<R: Record>(record: &R) -> RowMap {
    R::fields()
        .iter()
        .map(|field| {
            let value = record.field_value(field.name()).unwrap_or(SqlValue::Null);
            (field.name(), value)
        })
        .collect()
}

pub(crate) fn record_params<R: Record>(
    record: &R,
    field_names: &[&str],
) -> Result<Vec<Param>, SqlAccessorError> {
    field_names
        .iter()
        .map(|name| {
            record.field_value(name).map(Param::Value).ok_or_else(|| {
                SqlAccessorError::InvalidArgument(format!(
                    "{} has no field named {name}",
                    std::any::type_name::<R>()
                ))
            })
        })
        .collect()
}

/// Runs `#{name}` SQL with parameters taken from a record's fields.
///
/// `#{customer_id}` resolves to the `customer_id` field; placeholders that name no field bind NULL.
#[derive(Debug)]
pub struct RecordAccessor {
    named: NamedAccessor,
}

impl RecordAccessor {
    #[must_use]
    pub fn new(named: NamedAccessor) -> Self {
        Self { named }
    }

    #[must_use]
    pub fn named(&self) -> &NamedAccessor {
        &self.named
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::query`].
    pub fn query<T, H, R>(&self, sql: &str, handler: &H, record: &R) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        R: Record,
    {
        self.named.query(sql, handler, &record_map(record))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::query_with`].
    pub fn query_with<T, H, R>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        record: &R,
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        R: Record,
    {
        self.named.query_with(conn, sql, handler, &record_map(record))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::update`].
    pub fn update<R: Record>(&self, sql: &str, record: &R) -> Result<usize, SqlAccessorError> {
        self.named.update(sql, &record_map(record))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::update_with`].
    pub fn update_with<R: Record>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        record: &R,
    ) -> Result<usize, SqlAccessorError> {
        self.named.update_with(conn, sql, &record_map(record))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::insert`].
    pub fn insert<T, H, R>(&self, sql: &str, handler: &H, record: &R) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        R: Record,
    {
        self.named.insert(sql, handler, &record_map(record))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::insert_with`].
    pub fn insert_with<T, H, R>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        record: &R,
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        R: Record,
    {
        self.named
            .insert_with(conn, sql, handler, &record_map(record))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::batch`].
    pub fn batch<R: Record>(
        &self,
        sql: &str,
        records: &[R],
    ) -> Result<Vec<usize>, SqlAccessorError> {
        self.named.batch(sql, &maps(records))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::batch_with`].
    pub fn batch_with<R: Record>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        records: &[R],
    ) -> Result<Vec<usize>, SqlAccessorError> {
        self.named.batch_with(conn, sql, &maps(records))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::insert_batch`].
    pub fn insert_batch<T, H, R>(
        &self,
        sql: &str,
        handler: &H,
        records: &[R],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        R: Record,
    {
        self.named.insert_batch(sql, handler, &maps(records))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::insert_batch_with`].
    pub fn insert_batch_with<T, H, R>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        records: &[R],
    ) -> Result<T, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        R: Record,
    {
        self.named
            .insert_batch_with(conn, sql, handler, &maps(records))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::execute`].
    pub fn execute<R: Record>(&self, sql: &str, record: &R) -> Result<usize, SqlAccessorError> {
        self.named.execute(sql, &record_map(record))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::execute_with`].
    pub fn execute_with<R: Record>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        record: &R,
    ) -> Result<usize, SqlAccessorError> {
        self.named.execute_with(conn, sql, &record_map(record))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::execute_results`].
    pub fn execute_results<T, H, R>(
        &self,
        sql: &str,
        handler: &H,
        record: &R,
    ) -> Result<Vec<T>, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        R: Record,
    {
        self.named
            .execute_results(sql, handler, &record_map(record))
    }

    /// # Errors
    /// As [`crate::accessor::Accessor::execute_results_with`].
    pub fn execute_results_with<T, H, R>(
        &self,
        conn: &mut dyn Connection,
        sql: &str,
        handler: &H,
        record: &R,
    ) -> Result<Vec<T>, SqlAccessorError>
    where
        H: ResultSetHandler<T> + ?Sized,
        R: Record,
    {
        self.named
            .execute_results_with(conn, sql, handler, &record_map(record))
    }
}

fn maps<R: Record>(records: &[R]) -> Vec<RowMap> {
    records.iter().map(record_map).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::record! {
        #[derive(Debug, Default, Clone, PartialEq)]
        struct Order {
            order_id: i64,
            note: Option<String>,
        }
    }

    #[test]
    fn record_map_keys_are_field_names() {
        let order = Order {
            order_id: 9,
            note: None,
        };
        let map = record_map(&order);
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["order_id", "note"]);
        assert_eq!(map.get("ORDER_ID"), Some(&SqlValue::BigInt(9)));
        assert_eq!(map.get("note"), Some(&SqlValue::Null));
    }

    #[test]
    fn record_params_follow_requested_order() {
        let order = Order {
            order_id: 3,
            note: Some("rush".into()),
        };
        let params = record_params(&order, &["note", "order_id"]).unwrap();
        assert_eq!(crate::types::render_params(&params), "['rush', 3]");

        let err = record_params(&order, &["customer"]).unwrap_err();
        assert!(matches!(err, SqlAccessorError::InvalidArgument(_)));
    }
}
