use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Direction hint for result cursors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchDirection {
    Forward,
    Reverse,
    Unknown,
}

/// Optional overrides applied to every statement an accessor prepares.
///
/// Options that are not set are never applied, so the driver defaults stay untouched. The value
/// is immutable once built and can be shared by concurrent operations.
///
/// # Examples
/// ```rust
/// use std::time::Duration;
/// use sql_accessor::prelude::*;
///
/// let config = StatementConfiguration::builder()
///     .fetch_size(500)
///     .query_timeout(Duration::from_secs(30))
///     .build();
/// assert!(config.is_fetch_size_set());
/// assert!(!config.is_max_rows_set());
/// ```
///
/// It also deserializes from configuration files:
/// ```rust
/// use sql_accessor::prelude::*;
///
/// let config: StatementConfiguration =
///     serde_json::from_str(r#"{"max_rows": 10, "query_timeout_seconds": 5}"#).unwrap();
/// assert_eq!(config.max_rows(), Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StatementConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    fetch_direction: Option<FetchDirection>,
    #[serde(skip_serializing_if = "Option::is_none")]
    fetch_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_field_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_rows: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    query_timeout_seconds: Option<u32>,
}

impl StatementConfiguration {
    #[must_use]
    pub fn builder() -> StatementConfigurationBuilder {
        StatementConfigurationBuilder::new()
    }

    #[must_use]
    pub fn fetch_direction(&self) -> Option<FetchDirection> {
        self.fetch_direction
    }

    #[must_use]
    pub fn is_fetch_direction_set(&self) -> bool {
        self.fetch_direction.is_some()
    }

    #[must_use]
    pub fn fetch_size(&self) -> Option<u32> {
        self.fetch_size
    }

    #[must_use]
    pub fn is_fetch_size_set(&self) -> bool {
        self.fetch_size.is_some()
    }

    #[must_use]
    pub fn max_field_size(&self) -> Option<u32> {
        self.max_field_size
    }

    #[must_use]
    pub fn is_max_field_size_set(&self) -> bool {
        self.max_field_size.is_some()
    }

    #[must_use]
    pub fn max_rows(&self) -> Option<u64> {
        self.max_rows
    }

    #[must_use]
    pub fn is_max_rows_set(&self) -> bool {
        self.max_rows.is_some()
    }

    #[must_use]
    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout_seconds
            .map(|secs| Duration::from_secs(u64::from(secs)))
    }

    #[must_use]
    pub fn is_query_timeout_set(&self) -> bool {
        self.query_timeout_seconds.is_some()
    }

    /// True when no option is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Fluent builder for [`StatementConfiguration`].
#[derive(Debug, Clone, Default)]
pub struct StatementConfigurationBuilder {
    config: StatementConfiguration,
}

impl StatementConfigurationBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn fetch_direction(mut self, direction: FetchDirection) -> Self {
        self.config.fetch_direction = Some(direction);
        self
    }

    #[must_use]
    pub fn fetch_size(mut self, size: u32) -> Self {
        self.config.fetch_size = Some(size);
        self
    }

    #[must_use]
    pub fn max_field_size(mut self, size: u32) -> Self {
        self.config.max_field_size = Some(size);
        self
    }

    #[must_use]
    pub fn max_rows(mut self, rows: u64) -> Self {
        self.config.max_rows = Some(rows);
        self
    }

    /// Query timeout, truncated to whole seconds (drivers take seconds).
    #[must_use]
    pub fn query_timeout(mut self, timeout: Duration) -> Self {
        let secs = u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX);
        self.config.query_timeout_seconds = Some(secs);
        self
    }

    #[must_use]
    pub fn build(self) -> StatementConfiguration {
        self.config
    }
}
