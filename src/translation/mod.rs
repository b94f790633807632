use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

mod parsers;

use parsers::parse_named;

use crate::types::Param;

static GLOBAL: LazyLock<Arc<NamedSqlTranslator>> =
    LazyLock::new(|| Arc::new(NamedSqlTranslator::new()));

/// `#{name}` SQL rewritten to positional `?` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedSql {
    sql: String,
    names: Vec<String>,
}

impl NamedSql {
    /// The positional SQL text.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Placeholder names in encounter order. A name used twice appears twice.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Resolve one positional parameter per placeholder; names missing from `values` give NULL.
    #[must_use]
    pub fn parameters<V: NamedParams + ?Sized>(&self, values: &V) -> Vec<Param> {
        self.names
            .iter()
            .map(|name| values.named_param(name).unwrap_or_else(Param::null))
            .collect()
    }
}

/// A name → value source for named-parameter SQL.
///
/// Implemented for `HashMap`/`BTreeMap` keyed by `String` with any value convertible into a
/// [`Param`], and for [`crate::conversion::RowMap`].
pub trait NamedParams {
    fn named_param(&self, name: &str) -> Option<Param>;
}

impl<V, S> NamedParams for HashMap<String, V, S>
where
    V: Clone + Into<Param>,
    S: BuildHasher,
{
    fn named_param(&self, name: &str) -> Option<Param> {
        self.get(name).cloned().map(Into::into)
    }
}

impl<V> NamedParams for BTreeMap<String, V>
where
    V: Clone + Into<Param>,
{
    fn named_param(&self, name: &str) -> Option<Param> {
        self.get(name).cloned().map(Into::into)
    }
}

/// No values: every placeholder binds NULL.
impl NamedParams for () {
    fn named_param(&self, _name: &str) -> Option<Param> {
        None
    }
}

impl<T: NamedParams + ?Sized> NamedParams for &T {
    fn named_param(&self, name: &str) -> Option<Param> {
        (**self).named_param(name)
    }
}

/// Translates `#{name}` SQL into positional SQL and remembers the result per SQL text.
///
/// Entries are never evicted: SQL text in an application is a small, fixed set. Concurrent first
/// translations of the same text may both parse, but only the first insert is kept and every
/// caller gets that entry.
///
/// # Examples
/// ```rust
/// use std::collections::HashMap;
/// use sql_accessor::prelude::*;
///
/// let translator = NamedSqlTranslator::new();
/// let named = translator.translate("SELECT * FROM t WHERE id = #{id}");
/// assert_eq!(named.sql(), "SELECT * FROM t WHERE id = ?");
///
/// let values = HashMap::from([("id".to_string(), 7)]);
/// let params = translator.parameters("SELECT * FROM t WHERE id = #{id}", &values);
/// assert_eq!(render_params(&params), "[7]");
/// ```
#[derive(Debug, Default)]
pub struct NamedSqlTranslator {
    cache: RwLock<HashMap<String, Arc<NamedSql>>>,
}

impl NamedSqlTranslator {
    /// An isolated translator with its own empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide translator used by [`crate::accessor::NamedAccessor`] by default.
    #[must_use]
    pub fn global() -> Arc<NamedSqlTranslator> {
        Arc::clone(&GLOBAL)
    }

    /// Translate `sql`, reusing the cached entry for byte-identical text.
    #[must_use]
    pub fn translate(&self, sql: &str) -> Arc<NamedSql> {
        if let Some(hit) = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(sql)
        {
            tracing::trace!(sql, "named sql cache hit");
            return Arc::clone(hit);
        }

        let parsed = Arc::new(parse_named(sql));
        tracing::trace!(sql, names = parsed.names.len(), "named sql cache miss");
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(cache.entry(sql.to_string()).or_insert(parsed))
    }

    /// The positional SQL for `sql`.
    #[must_use]
    pub fn sql(&self, sql: &str) -> String {
        self.translate(sql).sql.clone()
    }

    /// Placeholder names of `sql` in encounter order.
    #[must_use]
    pub fn names(&self, sql: &str) -> Vec<String> {
        self.translate(sql).names.clone()
    }

    /// Positional parameters for `sql` resolved from `values`; absent names yield NULL.
    #[must_use]
    pub fn parameters<V: NamedParams + ?Sized>(&self, sql: &str, values: &V) -> Vec<Param> {
        self.translate(sql).parameters(values)
    }

    /// One positional parameter row per mapping, in input order.
    #[must_use]
    pub fn parameter_rows<V: NamedParams>(&self, sql: &str, rows: &[V]) -> Vec<Vec<Param>> {
        let named = self.translate(sql);
        rows.iter().map(|row| named.parameters(row)).collect()
    }

    /// Number of distinct SQL texts translated so far.
    #[must_use]
    pub fn cached(&self) -> usize {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::types::{SqlValue, render_params};

    #[test]
    fn translates_single_placeholder() {
        let translator = NamedSqlTranslator::new();
        let values = HashMap::from([("id".to_string(), 7)]);
        let sql = "SELECT * FROM t WHERE id = #{id}";
        assert_eq!(translator.sql(sql), "SELECT * FROM t WHERE id = ?");
        assert_eq!(render_params(&translator.parameters(sql, &values)), "[7]");
    }

    #[test]
    fn cache_is_deterministic_and_idempotent() {
        let translator = NamedSqlTranslator::new();
        let sql = "UPDATE t SET a = #{a}, b = #{b} WHERE id = #{id}";
        let first = translator.translate(sql);
        let second = translator.translate(sql);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(translator.cached(), 1);

        let again = translator.translate(first.sql());
        assert_eq!(again.sql(), first.sql());
        assert!(again.names().is_empty());
    }

    #[test]
    fn missing_names_bind_null_and_repeats_resolve_each_time() {
        let translator = NamedSqlTranslator::new();
        let sql = "SELECT * FROM t WHERE a = #{x} OR b = #{x} OR c = #{missing}";
        let values = BTreeMap::from([("x".to_string(), SqlValue::from("v"))]);
        let params = translator.parameters(sql, &values);
        assert_eq!(translator.names(sql), vec!["x", "x", "missing"]);
        assert_eq!(render_params(&params), "['v', 'v', NULL]");
    }

    #[test]
    fn parameter_rows_follow_input_order() {
        let translator = NamedSqlTranslator::new();
        let rows = vec![
            HashMap::from([("n".to_string(), 1)]),
            HashMap::from([("n".to_string(), 2)]),
        ];
        let params = translator.parameter_rows("INSERT INTO t VALUES (#{n})", &rows);
        assert_eq!(crate::types::render_param_rows(&params), "[[1], [2]]");
    }

    #[test]
    fn concurrent_first_use_converges() {
        let translator = Arc::new(NamedSqlTranslator::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let translator = Arc::clone(&translator);
                thread::spawn(move || translator.translate("SELECT #{a}, #{b}"))
            })
            .collect();
        let results: Vec<Arc<NamedSql>> = handles
            .into_iter()
            .map(|h| h.join().expect("translator thread panicked"))
            .collect();
        let cached = translator.translate("SELECT #{a}, #{b}");
        assert!(results.iter().all(|r| **r == *cached));
        assert_eq!(translator.cached(), 1);
    }
}
