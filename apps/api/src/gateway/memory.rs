//! In-memory `DataGateway` used by accessor, store and router tests.
//!
//! Rows are stored as-is, embedded resources included, so `columns` is
//! ignored. Filters, ordering and ranges follow the remote semantics.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::filter::DEFAULT_RANGE_SIZE;
use super::{DataGateway, Filter, GatewayError, SelectOptions};

#[derive(Clone, Default)]
pub struct MemoryGateway {
    tables: Arc<Mutex<HashMap<String, Vec<Value>>>>,
    failing: Arc<Mutex<HashSet<String>>>,
    selects: Arc<Mutex<Vec<(String, SelectOptions)>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, table: &str, rows: Vec<Value>) {
        self.tables
            .lock()
            .unwrap()
            .entry(table.to_string())
            .or_default()
            .extend(rows);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables
            .lock()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    /// Every subsequent call touching `table` fails with a 500.
    pub fn fail_on(&self, table: &str) {
        self.failing.lock().unwrap().insert(table.to_string());
    }

    pub fn last_select(&self) -> Option<(String, SelectOptions)> {
        self.selects.lock().unwrap().last().cloned()
    }

    fn check(&self, table: &str) -> Result<(), GatewayError> {
        if self.failing.lock().unwrap().contains(table) {
            return Err(GatewayError::Api {
                status: 500,
                message: format!("{table} is unavailable"),
                code: None,
                details: None,
                hint: None,
            });
        }
        Ok(())
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn matches(filter: &Filter, row: &Value) -> bool {
    let field = |column: &str| row.get(column).cloned().unwrap_or(Value::Null);
    match filter {
        Filter::Eq { column, value } => loose_eq(&field(column), value),
        Filter::ILike { column, term } => field(column)
            .as_str()
            .map(|s| {
                s.to_lowercase()
                    .contains(&term.replace('*', "").to_lowercase())
            })
            .unwrap_or(false),
        Filter::In { column, values } => {
            let v = field(column);
            values.iter().any(|candidate| loose_eq(&v, candidate))
        }
        Filter::Gte { column, value } => compare(&field(column), value) != Ordering::Less,
        Filter::Lte { column, value } => compare(&field(column), value) != Ordering::Greater,
        Filter::AnyOf(inner) => inner.iter().any(|f| matches(f, row)),
    }
}

fn matches_all(filters: &[Filter], row: &Value) -> bool {
    filters.iter().all(|f| matches(f, row))
}

fn merge(target: &mut Value, changes: &Value) {
    if let (Some(target), Some(changes)) = (target.as_object_mut(), changes.as_object()) {
        for (k, v) in changes {
            target.insert(k.clone(), v.clone());
        }
    }
}

fn with_defaults(row: Value) -> Value {
    let mut object = match row {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    object
        .entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    object
        .entry("created_at")
        .or_insert_with(|| Value::String(chrono::Utc::now().to_rfc3339()));
    Value::Object(object)
}

fn as_rows(values: Value) -> Vec<Value> {
    match values {
        Value::Array(rows) => rows,
        row => vec![row],
    }
}

#[async_trait]
impl DataGateway for MemoryGateway {
    async fn select(&self, table: &str, options: &SelectOptions) -> Result<Vec<Value>, GatewayError> {
        self.check(table)?;
        self.selects
            .lock()
            .unwrap()
            .push((table.to_string(), options.clone()));

        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| matches_all(&options.filters, row))
            .collect();

        if let Some(order) = &options.order_by {
            rows.sort_by(|a, b| {
                let ord = compare(
                    a.get(&order.column).unwrap_or(&Value::Null),
                    b.get(&order.column).unwrap_or(&Value::Null),
                );
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let offset = options.offset.unwrap_or(0);
        let limit = match (options.limit, options.offset) {
            (Some(limit), _) => limit,
            (None, Some(_)) => DEFAULT_RANGE_SIZE,
            (None, None) => usize::MAX,
        };
        Ok(rows.into_iter().skip(offset).take(limit).collect())
    }

    async fn insert(&self, table: &str, values: Value) -> Result<Vec<Value>, GatewayError> {
        self.check(table)?;
        let rows: Vec<Value> = as_rows(values).into_iter().map(with_defaults).collect();
        self.seed(table, rows.clone());
        Ok(rows)
    }

    async fn update(
        &self,
        table: &str,
        values: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, GatewayError> {
        self.check(table)?;
        if filters.is_empty() {
            return Err(GatewayError::MissingFilter {
                verb: "update",
                table: table.to_string(),
            });
        }
        let mut tables = self.tables.lock().unwrap();
        let mut updated = Vec::new();
        for row in tables.entry(table.to_string()).or_default().iter_mut() {
            if matches_all(filters, row) {
                merge(row, &values);
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn upsert(&self, table: &str, values: Value) -> Result<Vec<Value>, GatewayError> {
        self.check(table)?;
        let mut tables = self.tables.lock().unwrap();
        let stored = tables.entry(table.to_string()).or_default();
        let mut result = Vec::new();
        for incoming in as_rows(values) {
            let existing = incoming
                .get("id")
                .and_then(|id| stored.iter_mut().find(|row| row.get("id") == Some(id)));
            match existing {
                Some(row) => {
                    merge(row, &incoming);
                    result.push(row.clone());
                }
                None => {
                    let row = with_defaults(incoming);
                    stored.push(row.clone());
                    result.push(row);
                }
            }
        }
        Ok(result)
    }

    async fn remove(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, GatewayError> {
        self.check(table)?;
        if filters.is_empty() {
            return Err(GatewayError::MissingFilter {
                verb: "delete from",
                table: table.to_string(),
            });
        }
        let mut tables = self.tables.lock().unwrap();
        let stored = tables.entry(table.to_string()).or_default();
        let (removed, kept): (Vec<Value>, Vec<Value>) =
            stored.drain(..).partition(|row| matches_all(filters, row));
        *stored = kept;
        Ok(removed)
    }

    fn with_access_token(&self, _access_token: &str) -> Box<dyn DataGateway> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::OrderBy;
    use serde_json::json;

    fn seeded() -> MemoryGateway {
        let gateway = MemoryGateway::new();
        gateway.seed(
            "jobs",
            vec![
                json!({"id": "1", "title": "Rust Dev", "salary_min": 50, "created_at": "2024-01-01"}),
                json!({"id": "2", "title": "Vue Dev", "salary_min": 90, "created_at": "2024-03-01"}),
                json!({"id": "3", "title": "Go Dev", "salary_min": 70, "created_at": "2024-02-01"}),
            ],
        );
        gateway
    }

    #[tokio::test]
    async fn test_select_orders_and_ranges() {
        let gateway = seeded();
        let options = SelectOptions::default()
            .order(OrderBy::desc("created_at"))
            .limit(2);
        let rows = gateway.select("jobs", &options).await.unwrap();
        let ids: Vec<_> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[tokio::test]
    async fn test_range_filters() {
        let gateway = seeded();
        let options = SelectOptions::default()
            .filter(Filter::gte("salary_min", 60))
            .filter(Filter::lte("salary_min", 80));
        let rows = gateway.select("jobs", &options).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], "3");
    }

    #[tokio::test]
    async fn test_update_and_remove_touch_matching_rows_only() {
        let gateway = seeded();
        let updated = gateway
            .update("jobs", json!({"title": "Senior Rust Dev"}), &[Filter::eq("id", "1")])
            .await
            .unwrap();
        assert_eq!(updated.len(), 1);
        assert_eq!(updated[0]["title"], "Senior Rust Dev");

        let removed = gateway.remove("jobs", &[Filter::eq("id", "2")]).await.unwrap();
        assert_eq!(removed.len(), 1);
        assert_eq!(gateway.rows("jobs").len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_merges_on_id() {
        let gateway = seeded();
        gateway
            .upsert("jobs", json!([{"id": "1", "title": "Staff Rust Dev"}, {"title": "New"}]))
            .await
            .unwrap();
        let rows = gateway.rows("jobs");
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["title"], "Staff Rust Dev");
        assert_eq!(rows[0]["salary_min"], 50);
    }
}
