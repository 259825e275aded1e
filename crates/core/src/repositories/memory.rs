//! In-process row store.
//!
//! Mimics the parts of PostgREST the services rely on: `created_at` is filled in by the store,
//! projections drop unrequested columns, equality filters compare the textual value and
//! ordering is stable.

use super::store::{Direction, Query, RowStore, StoreError, StoreResult};
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
struct Tables {
    rows: HashMap<String, Vec<Map<String, Value>>>,
    last_created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows currently in `table`.
    pub fn row_count(&self, table: &str) -> usize {
        self.lock().rows.get(table).map_or(0, Vec::len)
    }

    /// Raw copy of every row in `table`, in insertion order.
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock()
            .rows
            .get(table)
            .map(|rows| rows.iter().cloned().map(Value::Object).collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Tables {
    /// Strictly increasing creation timestamps so ordering by `created_at` is total.
    fn next_created_at(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let stamp = match self.last_created_at {
            Some(prev) if now <= prev => prev + Duration::microseconds(1),
            _ => now,
        };
        self.last_created_at = Some(stamp);
        stamp
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::Null) | None, Some(Value::Null) | None) => Ordering::Equal,
        (Some(Value::Null) | None, _) => Ordering::Less,
        (_, Some(Value::Null) | None) => Ordering::Greater,
        (Some(x), Some(y)) => text_of(x).cmp(&text_of(y)),
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn insert(&self, table: &str, record: Value) -> StoreResult<()> {
        let mut row = match record {
            Value::Object(row) => row,
            other => return Err(StoreError::InvalidRecord(other.to_string())),
        };
        let mut tables = self.lock();
        if !row.contains_key("created_at") {
            let stamp = tables.next_created_at();
            row.insert(
                "created_at".to_string(),
                Value::String(stamp.to_rfc3339_opts(SecondsFormat::Micros, true)),
            );
        }
        tables.rows.entry(table.to_string()).or_default().push(row);
        Ok(())
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Value>> {
        let tables = self.lock();
        let Some(rows) = tables.rows.get(query.table_name()) else {
            return Ok(Vec::new());
        };

        let mut matched: Vec<&Map<String, Value>> = rows
            .iter()
            .filter(|row| {
                query
                    .filters()
                    .iter()
                    .all(|(column, value)| {
                        row.get(column).map(text_of).as_deref() == Some(value.as_str())
                    })
            })
            .collect();

        if let Some((column, direction)) = query.order() {
            matched.sort_by(|a, b| {
                let ordering = compare_values(a.get(column), b.get(column));
                match direction {
                    Direction::Ascending => ordering,
                    Direction::Descending => ordering.reverse(),
                }
            });
        }

        let columns = query.columns();
        Ok(matched
            .into_iter()
            .map(|row| {
                if columns.is_empty() {
                    return Value::Object(row.clone());
                }
                let projected: Map<String, Value> = columns
                    .iter()
                    .filter_map(|c| row.get(c).map(|v| (c.clone(), v.clone())))
                    .collect();
                Value::Object(projected)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_stamps_created_at() {
        let store = MemoryStore::new();
        store
            .insert("recipes", json!({"id": "a", "name": "Soupe"}))
            .await
            .unwrap();

        let rows = store.rows("recipes");
        assert_eq!(rows.len(), 1);
        let created_at = rows[0]["created_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(created_at).is_ok());
    }

    #[tokio::test]
    async fn test_insert_rejects_non_objects() {
        let store = MemoryStore::new();
        let result = store.insert("recipes", json!("Soupe")).await;
        assert!(matches!(result, Err(StoreError::InvalidRecord(_))));
        assert_eq!(store.row_count("recipes"), 0);
    }

    #[tokio::test]
    async fn test_query_unknown_table_is_empty() {
        let store = MemoryStore::new();
        let rows = store.query(&Query::table("planning")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_order_by_created_at_desc_returns_newest_first() {
        let store = MemoryStore::new();
        for name in ["first", "second", "third"] {
            store
                .insert("recipes", json!({ "name": name }))
                .await
                .unwrap();
        }

        let rows = store
            .query(&Query::table("recipes").order_by("created_at", Direction::Descending))
            .await
            .unwrap();
        let names: Vec<&str> = rows.iter().map(|r| r["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn test_projection_and_filter() {
        let store = MemoryStore::new();
        store
            .insert(
                "planning",
                json!({"week_label": "default", "day_slot": "lundi_midi", "recipe_id": "r1"}),
            )
            .await
            .unwrap();
        store
            .insert(
                "planning",
                json!({"week_label": "autre", "day_slot": "lundi_soir", "recipe_id": "r2"}),
            )
            .await
            .unwrap();

        let rows = store
            .query(
                &Query::table("planning")
                    .select(&["day_slot", "recipe_id"])
                    .eq("week_label", "default"),
            )
            .await
            .unwrap();

        assert_eq!(
            rows,
            vec![json!({"day_slot": "lundi_midi", "recipe_id": "r1"})]
        );
    }

    #[test]
    fn test_compare_values_puts_missing_first() {
        let one = json!(1);
        let two = json!(2.5);
        assert_eq!(compare_values(Some(&one), Some(&two)), Ordering::Less);
        assert_eq!(compare_values(None, Some(&one)), Ordering::Less);
        assert_eq!(compare_values(Some(&Value::Null), None), Ordering::Equal);
        assert_eq!(
            compare_values(Some(&json!("b")), Some(&json!("a"))),
            Ordering::Greater
        );
    }
}
