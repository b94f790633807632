/// Build a positional parameter list, converting each element into a
/// [`Param`](crate::types::Param).
///
/// ```rust
/// use sql_accessor::prelude::*;
///
/// let none: Option<i64> = None;
/// let params = params![1, "alice", none, 2.5];
/// assert_eq!(render_params(&params), "[1, 'alice', NULL, 2.5]");
/// assert!(params![].is_empty());
/// ```
#[macro_export]
macro_rules! params {
    () => {
        ::std::vec::Vec::<$crate::types::Param>::new()
    };
    ($($value:expr),+ $(,)?) => {
        ::std::vec![$($crate::types::Param::from($value)),+]
    };
}
