use std::sync::LazyLock;

use regex::Regex;

use super::NamedSql;

// `#{name}`: a name is any run of characters other than `}`.
static NAMED_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\{([^}]*)\}").expect("placeholder pattern is valid"));

/// Scan `sql` left to right, collecting names in encounter order and replacing each
/// placeholder with `?`.
pub(super) fn parse_named(sql: &str) -> NamedSql {
    let mut names = Vec::new();
    let mut positional = String::with_capacity(sql.len());
    let mut last = 0;
    for caps in NAMED_PLACEHOLDER.captures_iter(sql) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        positional.push_str(&sql[last..whole.start()]);
        positional.push('?');
        names.push(name.as_str().to_string());
        last = whole.end();
    }
    positional.push_str(&sql[last..]);
    NamedSql {
        sql: positional,
        names,
    }
}
