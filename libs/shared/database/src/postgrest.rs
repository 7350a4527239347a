use std::fmt::Display;

use urlencoding::encode;

/// Builds PostgREST query strings (`select=*&id=eq.…&order=name.asc`).
///
/// Values are URL-encoded; column names are trusted and passed through.
#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    select: Option<String>,
    filters: Vec<String>,
    order: Vec<String>,
    limit: Option<usize>,
}

impl QueryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn eq(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn gte(self, column: &str, value: impl Display) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn in_list<V: Display>(mut self, column: &str, values: &[V]) -> Self {
        let values = values
            .iter()
            .map(|v| encode(&v.to_string()).into_owned())
            .collect::<Vec<_>>()
            .join(",");
        self.filters.push(format!("{}=in.({})", column, values));
        self
    }

    /// Case-insensitive substring match on any of `columns`.
    ///
    /// The term matches literally: `%`, `_` and `\` are escaped for LIKE.
    /// `*` and `"` are dropped, since PostgREST reads `*` as a wildcard
    /// even inside quotes.
    pub fn ilike_any(mut self, columns: &[&str], term: &str) -> Self {
        let pattern = format!("\"*{}*\"", escape_like(term));
        let clauses = columns
            .iter()
            .map(|column| format!("{}.ilike.{}", column, pattern))
            .collect::<Vec<_>>()
            .join(",");
        self.filters.push(format!("or={}", encode(&format!("({})", clauses))));
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{}.{}", column, direction));
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn filter(mut self, column: &str, operator: &str, value: impl Display) -> Self {
        let value = value.to_string();
        self.filters.push(format!("{}={}.{}", column, operator, encode(&value)));
        self
    }

    pub fn build(&self) -> String {
        let mut parts = Vec::new();

        if let Some(select) = &self.select {
            parts.push(format!("select={}", select));
        }
        parts.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            parts.push(format!("order={}", self.order.join(",")));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("limit={}", limit));
        }

        parts.join("&")
    }
}

/// Escapes LIKE metacharacters for a double-quoted PostgREST value, where
/// `\` itself must be escaped once more.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '*' | '"' => {}
            '\\' => escaped.push_str(r"\\\\"),
            '%' | '_' => {
                escaped.push_str(r"\\");
                escaped.push(c);
            }
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_filters_in_insertion_order() {
        let query = QueryBuilder::new()
            .select("*")
            .eq("physician_id", "abc")
            .eq("date", "2024-06-03")
            .gte("time", "08:00")
            .order("date", true)
            .order("time", true)
            .limit(5)
            .build();

        assert_eq!(
            query,
            "select=*&physician_id=eq.abc&date=eq.2024-06-03&time=gte.08%3A00&order=date.asc,time.asc&limit=5"
        );
    }

    #[test]
    fn encodes_filter_values() {
        let query = QueryBuilder::new().eq("email", "ana+1@clinic.com").build();
        assert_eq!(query, "email=eq.ana%2B1%40clinic.com");
    }

    #[test]
    fn search_matches_any_column() {
        let query = QueryBuilder::new().ilike_any(&["name", "specialty"], "card").build();
        assert_eq!(
            query,
            format!("or={}", encode("(name.ilike.\"*card*\",specialty.ilike.\"*card*\")"))
        );
    }

    #[test]
    fn search_term_is_matched_literally() {
        let query = QueryBuilder::new().ilike_any(&["name"], r#"50%_a\b*"c"#).build();
        assert_eq!(
            query,
            format!("or={}", encode(r#"(name.ilike."*50\\%\\_a\\\\bc*")"#))
        );
    }

    #[test]
    fn in_list_keeps_parentheses() {
        let query = QueryBuilder::new().in_list("status", &["scheduled", "confirmed"]).build();
        assert_eq!(query, "status=in.(scheduled,confirmed)");
    }

    #[test]
    fn empty_builder_is_empty_query() {
        assert_eq!(QueryBuilder::new().build(), "");
    }
}
