use serde_json::Value;

/// A typed row predicate. Interpreted by the gateway backend; values are
/// always quoted or escaped on the way out.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: Value },
    /// Case-insensitive substring match.
    ILike { column: String, term: String },
    /// `column` is one of `values`.
    In { column: String, values: Vec<Value> },
    /// `column >= value`
    Gte { column: String, value: Value },
    /// `column <= value`
    Lte { column: String, value: Value },
    /// Disjunction of the inner predicates.
    AnyOf(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn ilike(column: impl Into<String>, term: impl Into<String>) -> Self {
        Filter::ILike {
            column: column.into(),
            term: term.into(),
        }
    }

    pub fn one_of<V: Into<Value>>(column: impl Into<String>, values: impl IntoIterator<Item = V>) -> Self {
        Filter::In {
            column: column.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte {
            column: column.into(),
            value: value.into(),
        }
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Lte {
            column: column.into(),
            value: value.into(),
        }
    }

    /// Encodes the predicate as a PostgREST query parameter.
    pub(crate) fn to_query_pair(&self) -> (String, String) {
        match self {
            Filter::AnyOf(inner) => ("or".to_string(), format!("({})", encode_disjunction(inner))),
            Filter::Eq { column, value } => (column.clone(), format!("eq.{}", render(value))),
            Filter::ILike { column, term } => {
                (column.clone(), format!("ilike.*{}*", escape_like(term)))
            }
            Filter::In { column, values } => (column.clone(), format!("in.({})", quote_list(values))),
            Filter::Gte { column, value } => (column.clone(), format!("gte.{}", render(value))),
            Filter::Lte { column, value } => (column.clone(), format!("lte.{}", render(value))),
        }
    }

    /// Encodes the predicate as one member of an `or=(...)` list, where every
    /// operand must be quoted.
    fn to_list_member(&self) -> String {
        match self {
            Filter::AnyOf(inner) => format!("or({})", encode_disjunction(inner)),
            Filter::Eq { column, value } => format!("{column}.eq.{}", quote(&render(value))),
            Filter::ILike { column, term } => {
                format!("{column}.ilike.{}", quote(&format!("*{}*", escape_like(term))))
            }
            Filter::In { column, values } => format!("{column}.in.({})", quote_list(values)),
            Filter::Gte { column, value } => format!("{column}.gte.{}", quote(&render(value))),
            Filter::Lte { column, value } => format!("{column}.lte.{}", quote(&render(value))),
        }
    }
}

fn encode_disjunction(inner: &[Filter]) -> String {
    inner
        .iter()
        .map(Filter::to_list_member)
        .collect::<Vec<_>>()
        .join(",")
}

fn quote_list(values: &[Value]) -> String {
    values
        .iter()
        .map(|v| quote(&render(v)))
        .collect::<Vec<_>>()
        .join(",")
}

/// Renders a JSON scalar the way PostgREST expects it on the wire.
fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn quote(raw: &str) -> String {
    format!("\"{}\"", raw.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Strips the `*` wildcard alias and escapes LIKE metacharacters so the term
/// is always matched literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        match c {
            '*' => {}
            '%' | '_' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            ascending: false,
        }
    }
}

/// Parameters of a `select` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectOptions {
    /// PostgREST column list, including embedded resources. `None` selects `*`.
    pub columns: Option<String>,
    pub filters: Vec<Filter>,
    pub order_by: Option<OrderBy>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Page size applied when an offset is requested without a limit.
pub const DEFAULT_RANGE_SIZE: usize = 10;

impl SelectOptions {
    pub fn columns(columns: &str) -> Self {
        Self {
            columns: Some(compact_columns(columns)),
            ..Self::default()
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Encodes the full option set as PostgREST query parameters.
    pub(crate) fn to_query(&self) -> Vec<(String, String)> {
        let mut query = vec![(
            "select".to_string(),
            self.columns.clone().unwrap_or_else(|| "*".to_string()),
        )];
        query.extend(self.filters.iter().map(Filter::to_query_pair));
        if let Some(order) = &self.order_by {
            let direction = if order.ascending { "asc" } else { "desc" };
            query.push(("order".to_string(), format!("{}.{direction}", order.column)));
        }
        let limit = match (self.limit, self.offset) {
            (Some(limit), _) => Some(limit),
            (None, Some(_)) => Some(DEFAULT_RANGE_SIZE),
            (None, None) => None,
        };
        if let Some(limit) = limit {
            query.push(("limit".to_string(), limit.to_string()));
        }
        if let Some(offset) = self.offset {
            query.push(("offset".to_string(), offset.to_string()));
        }
        query
    }
}

/// Removes whitespace from a multi-line column list.
fn compact_columns(columns: &str) -> String {
    columns.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(k: &str, v: &str) -> (String, String) {
        (k.to_string(), v.to_string())
    }

    #[test]
    fn test_eq_renders_plain_value() {
        assert_eq!(Filter::eq("status", "active").to_query_pair(), pair("status", "eq.active"));
        assert_eq!(Filter::eq("remote_allowed", true).to_query_pair(), pair("remote_allowed", "eq.true"));
    }

    #[test]
    fn test_ilike_escapes_wildcards() {
        let f = Filter::ilike("location", "50%_off*");
        assert_eq!(f.to_query_pair(), pair("location", "ilike.*50\\%\\_off*"));
    }

    #[test]
    fn test_in_quotes_every_member() {
        let f = Filter::one_of("employment_type", ["Full-time", "a,b\"c"]);
        assert_eq!(
            f.to_query_pair(),
            pair("employment_type", "in.(\"Full-time\",\"a,b\\\"c\")")
        );
    }

    #[test]
    fn test_any_of_builds_or_list() {
        let f = Filter::AnyOf(vec![
            Filter::ilike("title", "rust"),
            Filter::ilike("description", "rust"),
        ]);
        assert_eq!(
            f.to_query_pair(),
            pair("or", "(title.ilike.\"*rust*\",description.ilike.\"*rust*\")")
        );
    }

    #[test]
    fn test_select_options_query_order() {
        let options = SelectOptions::columns("id,\n   title,\n   companies ( name )")
            .filter(Filter::eq("status", "active"))
            .order(OrderBy::desc("created_at"))
            .limit(5);
        assert_eq!(
            options.to_query(),
            vec![
                pair("select", "id,title,companies(name)"),
                pair("status", "eq.active"),
                pair("order", "created_at.desc"),
                pair("limit", "5"),
            ]
        );
    }

    #[test]
    fn test_offset_without_limit_uses_default_range() {
        let options = SelectOptions::default().offset(20);
        assert_eq!(
            options.to_query(),
            vec![pair("select", "*"), pair("limit", "10"), pair("offset", "20")]
        );
    }
}
