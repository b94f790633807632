use crate::driver::{ColumnMeta, ResultCursor};
use crate::error::DriverError;
use crate::types::SqlValue;

/// A fully materialized result cursor.
///
/// Rows are held in memory and walked forward. A row limit drops everything past the first
/// `max_rows` rows, and a field-size limit truncates text and binary values to that many bytes.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
    columns: Vec<ColumnMeta>,
    rows: Vec<Vec<SqlValue>>,
    position: Option<usize>,
    closed: bool,
}

impl MemoryCursor {
    #[must_use]
    pub fn new(columns: Vec<ColumnMeta>, rows: Vec<Vec<SqlValue>>) -> Self {
        Self {
            columns,
            rows,
            position: None,
            closed: false,
        }
    }

    /// Keep only the first `max_rows` rows. Zero means no limit.
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: Option<u64>) -> Self {
        if let Some(limit) = max_rows.filter(|limit| *limit > 0) {
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            self.rows.truncate(limit);
        }
        self
    }

    /// Truncate text and binary values to `max_field_size` bytes. Zero means no limit.
    #[must_use]
    pub fn with_max_field_size(mut self, max_field_size: Option<u32>) -> Self {
        if let Some(limit) = max_field_size.filter(|limit| *limit > 0) {
            let limit = usize::try_from(limit).unwrap_or(usize::MAX);
            for value in self.rows.iter_mut().flatten() {
                truncate_value(value, limit);
            }
        }
        self
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn current_row(&self) -> Result<&[SqlValue], DriverError> {
        if self.closed {
            return Err(DriverError::Other("cursor is closed".into()));
        }
        self.position
            .and_then(|pos| self.rows.get(pos))
            .map(Vec::as_slice)
            .ok_or_else(|| DriverError::Other("cursor is not positioned on a row".into()))
    }
}

fn truncate_value(value: &mut SqlValue, limit: usize) {
    match value {
        SqlValue::Text(s) | SqlValue::Xml(s) if s.len() > limit => {
            let mut cut = limit;
            while !s.is_char_boundary(cut) {
                cut -= 1;
            }
            s.truncate(cut);
        }
        SqlValue::Blob(bytes) => bytes.truncate(limit),
        _ => {}
    }
}

impl ResultCursor for MemoryCursor {
    fn next(&mut self) -> Result<bool, DriverError> {
        if self.closed {
            return Err(DriverError::Other("cursor is closed".into()));
        }
        let next = self.position.map_or(0, |pos| pos + 1);
        if next < self.rows.len() {
            self.position = Some(next);
            Ok(true)
        } else {
            self.position = Some(self.rows.len());
            Ok(false)
        }
    }

    fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    fn get_object(&self, index: usize) -> Result<SqlValue, DriverError> {
        let row = self.current_row()?;
        index
            .checked_sub(1)
            .and_then(|i| row.get(i))
            .cloned()
            .ok_or_else(|| {
                DriverError::Other(format!(
                    "column index {index} out of range 1..={}",
                    self.columns.len()
                ))
            })
    }

    fn close(&mut self) -> Result<(), DriverError> {
        self.closed = true;
        Ok(())
    }
}
