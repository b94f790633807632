use std::iter::FusedIterator;

use crate::conversion::RowProcessor;
use crate::driver::ResultCursor;
use crate::error::DriverError;
use crate::types::SqlValue;

/// Lazily walks a cursor, yielding each row as values in column order.
///
/// The first error ends the iteration; later calls return `None`. The cursor is borrowed, not
/// closed, so the caller still owns its cleanup.
pub struct RowIter<'a> {
    cursor: &'a mut dyn ResultCursor,
    processor: &'a RowProcessor,
    done: bool,
}

impl<'a> RowIter<'a> {
    pub(crate) fn new(cursor: &'a mut dyn ResultCursor, processor: &'a RowProcessor) -> Self {
        Self {
            cursor,
            processor,
            done: false,
        }
    }
}

impl Iterator for RowIter<'_> {
    type Item = Result<Vec<SqlValue>, DriverError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let row = match self.cursor.next() {
            Ok(true) => self.processor.to_array(&*self.cursor),
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => Err(e),
        };
        if row.is_err() {
            self.done = true;
        }
        Some(row)
    }
}

impl FusedIterator for RowIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{ColumnMeta, MemoryCursor};
    use crate::types::SqlType;

    fn columns() -> Vec<ColumnMeta> {
        vec![
            ColumnMeta::new("id", SqlType::BigInt),
            ColumnMeta::new("name", SqlType::Varchar),
        ]
    }

    #[test]
    fn empty_cursor_yields_nothing() {
        let processor = RowProcessor::new();
        let mut cursor = MemoryCursor::new(columns(), Vec::new());
        let mut rows = processor.iter(&mut cursor);
        assert!(rows.next().is_none());
        assert!(rows.next().is_none());
    }

    #[test]
    fn rows_come_back_in_cursor_order() {
        let processor = RowProcessor::new();
        let mut cursor = MemoryCursor::new(
            columns(),
            vec![
                vec![SqlValue::BigInt(1), SqlValue::from("a")],
                vec![SqlValue::BigInt(2), SqlValue::Null],
                vec![SqlValue::BigInt(3), SqlValue::from("c")],
            ],
        );
        let rows: Vec<Vec<SqlValue>> = processor
            .iter(&mut cursor)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(
            rows,
            vec![
                vec![SqlValue::BigInt(1), SqlValue::from("a")],
                vec![SqlValue::BigInt(2), SqlValue::Null],
                vec![SqlValue::BigInt(3), SqlValue::from("c")],
            ]
        );
    }

    #[test]
    fn an_unreadable_row_ends_the_iteration() {
        let processor = RowProcessor::new();
        // The second row is short a column, so reading it fails.
        let mut cursor = MemoryCursor::new(
            columns(),
            vec![
                vec![SqlValue::BigInt(1), SqlValue::from("a")],
                vec![SqlValue::BigInt(2)],
                vec![SqlValue::BigInt(3), SqlValue::from("c")],
            ],
        );
        let mut rows = processor.iter(&mut cursor);
        assert_eq!(
            rows.next().unwrap().unwrap(),
            vec![SqlValue::BigInt(1), SqlValue::from("a")]
        );
        let err = rows.next().unwrap().unwrap_err();
        assert!(err.to_string().contains("out of range"), "{err}");
        assert!(rows.next().is_none());
    }
}
