//! Dynamic `WHERE` clause building for list queries.

use rusqlite::ToSql;

/// Accumulates `AND`-joined conditions and their bound values.
///
/// Clauses use unnumbered `?` placeholders; values are bound in push order,
/// followed by the page bounds.
#[derive(Default)]
pub(crate) struct Conditions {
    clauses: Vec<String>,
    values: Vec<Box<dyn ToSql>>,
}

impl Conditions {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Add a clause with one placeholder.
    pub(crate) fn push(&mut self, clause: &str, value: impl ToSql + 'static) {
        self.clauses.push(clause.to_string());
        self.values.push(Box::new(value));
    }

    /// Add a clause with no placeholders.
    pub(crate) fn push_raw(&mut self, clause: &str) {
        self.clauses.push(clause.to_string());
    }

    /// Add a case-insensitive substring match across several columns.
    ///
    /// Blank terms are ignored.
    pub(crate) fn push_search(&mut self, columns: &[&str], term: Option<&str>) {
        let Some(term) = term.map(str::trim).filter(|t| !t.is_empty()) else {
            return;
        };
        let pattern = format!("%{}%", escape_like(term));
        let group = columns
            .iter()
            .map(|c| format!("{c} LIKE ? ESCAPE '\\'"))
            .collect::<Vec<_>>()
            .join(" OR ");
        self.clauses.push(format!("({group})"));
        for _ in columns {
            self.values.push(Box::new(pattern.clone()));
        }
    }

    /// The ` WHERE ...` fragment, or an empty string.
    pub(crate) fn where_sql(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }

    /// Bound values followed by `LIMIT`/`OFFSET`.
    pub(crate) fn into_values_with_page(mut self, page: (i64, i64)) -> Vec<Box<dyn ToSql>> {
        self.values.push(Box::new(page.0));
        self.values.push(Box::new(page.1));
        self.values
    }

    /// Bound values only.
    pub(crate) fn into_values(self) -> Vec<Box<dyn ToSql>> {
        self.values
    }
}

/// Escape `%`, `_` and `\` for use inside a `LIKE ... ESCAPE '\'` pattern.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_where() {
        assert_eq!(Conditions::new().where_sql(), "");
    }

    #[test]
    fn test_where_joins_with_and() {
        let mut conditions = Conditions::new();
        conditions.push("purok = ?", "Purok 1".to_string());
        conditions.push_raw("is_voter = 1");
        assert_eq!(conditions.where_sql(), " WHERE purok = ? AND is_voter = 1");
        assert_eq!(conditions.into_values().len(), 1);
    }

    #[test]
    fn test_push_search_binds_each_column() {
        let mut conditions = Conditions::new();
        conditions.push_search(&["first_name", "last_name"], Some("cruz"));
        assert!(conditions.where_sql().contains("first_name LIKE ?"));
        assert!(conditions.where_sql().contains(" OR last_name LIKE ?"));
        assert_eq!(conditions.into_values_with_page((50, 0)).len(), 4);
    }

    #[test]
    fn test_push_search_ignores_blank() {
        let mut conditions = Conditions::new();
        conditions.push_search(&["first_name"], Some("   "));
        assert_eq!(conditions.where_sql(), "");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
    }
}
