use rusqlite::types::Value;

/// A match rule over a string column: either an exact value, or a prefix
/// written with a trailing `%` (`text/%`, `assign%`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern<'a> {
    Exact(&'a str),
    Prefix(&'a str),
}

impl<'a> Pattern<'a> {
    pub fn parse(raw: &'a str) -> Self {
        match raw.strip_suffix('%') {
            Some(prefix) => Pattern::Prefix(prefix),
            None => Pattern::Exact(raw),
        }
    }

    /// Case-sensitive match, the same semantics the SQL rendering has.
    pub fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Exact(exact) => value == *exact,
            Pattern::Prefix(prefix) => value.starts_with(prefix),
        }
    }

    /// Render as a SQL condition on `column` with a single bound parameter.
    /// Must agree with `matches`, so no `LIKE` (case-insensitive in SQLite,
    /// and `_` is a wildcard there).
    pub fn to_sql(&self, column: &str) -> (String, Value) {
        match self {
            Pattern::Exact(exact) => (format!("{column} = ?"), Value::Text((*exact).to_string())),
            Pattern::Prefix(prefix) => (
                format!("substr({column}, 1, {}) = ?", prefix.chars().count()),
                Value::Text((*prefix).to_string()),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_splits_trailing_wildcard() {
        assert_eq!(Pattern::parse("text/%"), Pattern::Prefix("text/"));
        assert_eq!(Pattern::parse("application/pdf"), Pattern::Exact("application/pdf"));
    }

    #[test]
    fn prefix_matches_only_leading_text() {
        let p = Pattern::parse("assign%");
        assert!(p.matches("assignsubmission_file"));
        assert!(p.matches("assign"));
        assert!(!p.matches("mod_assign"));
    }

    #[test]
    fn exact_is_case_sensitive() {
        let p = Pattern::parse("application/zip");
        assert!(p.matches("application/zip"));
        assert!(!p.matches("application/ZIP"));
        assert!(!p.matches("application/zip2"));
    }

    #[test]
    fn sql_uses_character_length_of_prefix() {
        let (sql, value) = Pattern::parse("image/%").to_sql("f.mimetype");
        assert_eq!(sql, "substr(f.mimetype, 1, 6) = ?");
        assert_eq!(value, Value::Text("image/".into()));
    }
}
