//! Minimal PostgREST request builder.
//!
//! Only renders paths and query strings; sending is left to whichever HTTP
//! client the caller runs on.

use crate::models::Table;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FilterOp {
    Eq(String),
    In(Vec<String>),
    ILike(String),
    IsNull,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Filter {
    pub column: String,
    pub op: FilterOp,
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<String>) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::Eq(value.into()),
        }
    }

    pub fn in_list<I, S>(column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            column: column.to_string(),
            op: FilterOp::In(values.into_iter().map(Into::into).collect()),
        }
    }

    /// Case-insensitive exact match; `%` and `_` in `value` are escaped.
    pub fn ilike_exact(column: &str, value: &str) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::ILike(escape_like(value)),
        }
    }

    pub fn is_null(column: &str) -> Self {
        Self {
            column: column.to_string(),
            op: FilterOp::IsNull,
        }
    }

    /// `true` when the filter can never match (an empty `in` list).
    pub fn is_empty_set(&self) -> bool {
        matches!(&self.op, FilterOp::In(v) if v.is_empty())
    }

    fn render_value(&self) -> String {
        match &self.op {
            FilterOp::Eq(v) => format!("eq.{v}"),
            FilterOp::ILike(v) => format!("ilike.{v}"),
            FilterOp::IsNull => "is.null".to_string(),
            FilterOp::In(values) => {
                let items: Vec<String> = values.iter().map(|v| quote_in_item(v)).collect();
                format!("in.({})", items.join(","))
            }
        }
    }

    pub fn to_query_pair(&self) -> String {
        format!(
            "{}={}",
            urlencoding::encode(&self.column),
            urlencoding::encode(&self.render_value())
        )
    }
}

fn quote_in_item(v: &str) -> String {
    if v.chars().any(|c| matches!(c, ',' | '(' | ')' | '"' | ' ')) {
        format!("\"{}\"", v.replace('\\', "\\\\").replace('"', "\\\""))
    } else {
        v.to_string()
    }
}

pub fn escape_like(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Query {
    table: Table,
    select: Option<String>,
    filters: Vec<Filter>,
    order: Vec<(String, bool)>,
    limit: Option<usize>,
}

impl Query {
    pub fn table(table: Table) -> Self {
        Self {
            table,
            select: None,
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<String>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn in_list<I, S>(self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filter(Filter::in_list(column, values))
    }

    pub fn ilike_exact(self, column: &str, value: &str) -> Self {
        self.filter(Filter::ilike_exact(column, value))
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push((column.to_string(), ascending));
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn table_name(&self) -> Table {
        self.table
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    /// Whether any filter makes the result set empty without asking the backend.
    pub fn matches_nothing(&self) -> bool {
        self.filters.iter().any(Filter::is_empty_set)
    }

    /// Path relative to the project URL, e.g. `/rest/v1/list?select=*&user_id=eq.u1`.
    pub fn path(&self) -> String {
        let mut parts: Vec<String> = Vec::new();
        if let Some(select) = &self.select {
            parts.push(format!("select={}", urlencoding::encode(select)));
        }
        parts.extend(self.filters.iter().map(Filter::to_query_pair));
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|(col, asc)| format!("{col}.{}", if *asc { "asc" } else { "desc" }))
                .collect();
            parts.push(format!("order={}", urlencoding::encode(&order.join(","))));
        }
        if let Some(limit) = self.limit {
            parts.push(format!("limit={limit}"));
        }

        let base = format!("/rest/v1/{}", self.table.as_ref());
        if parts.is_empty() {
            base
        } else {
            format!("{base}?{}", parts.join("&"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_with_eq_and_order() {
        let q = Query::table(Table::List)
            .select("*")
            .eq("user_id", "u1")
            .order("created_at", true);
        assert_eq!(
            q.path(),
            "/rest/v1/list?select=%2A&user_id=eq.u1&order=created_at.asc"
        );
    }

    #[test]
    fn in_filter_quotes_reserved_characters() {
        let f = Filter::in_list("id", ["a", "b,c"]);
        assert_eq!(f.to_query_pair(), "id=in.%28a%2C%22b%2Cc%22%29");
    }

    #[test]
    fn ilike_exact_escapes_wildcards() {
        let f = Filter::ilike_exact("name", "50%_off");
        assert_eq!(f.op, FilterOp::ILike("50\\%\\_off".to_string()));
    }

    #[test]
    fn empty_in_list_matches_nothing() {
        let q = Query::table(Table::Note).in_list("collection_id", Vec::<String>::new());
        assert!(q.matches_nothing());
        let q = Query::table(Table::Note).eq("collection_id", "c1");
        assert!(!q.matches_nothing());
    }

    #[test]
    fn bare_table_path() {
        assert_eq!(Query::table(Table::Users).path(), "/rest/v1/users");
    }

    #[test]
    fn limit_and_descending_order() {
        let q = Query::table(Table::Task)
            .order("is_priority", false)
            .order("created_at", true)
            .limit(5);
        assert_eq!(
            q.path(),
            "/rest/v1/task?order=is_priority.desc%2Ccreated_at.asc&limit=5"
        );
    }
}
