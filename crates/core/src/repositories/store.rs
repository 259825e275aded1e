//! The row store seam and its query description.

use async_trait::async_trait;
use serde_json::Value;

/// Errors raised by a [`RowStore`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("table store returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("record must be a JSON object, got: {0}")]
    InvalidRecord(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Sort direction for [`Query::order_by`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Ascending => "asc",
            Direction::Descending => "desc",
        }
    }
}

/// A read against one table: projection, equality filters and an optional ordering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    table: String,
    columns: Vec<String>,
    filters: Vec<(String, String)>,
    order: Option<(String, Direction)>,
}

impl Query {
    /// All columns of `table`, unfiltered, in store order.
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Keeps rows whose `column` equals `value`.
    pub fn eq(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.push((column.into(), value.into()));
        self
    }

    pub fn order_by(mut self, column: impl Into<String>, direction: Direction) -> Self {
        self.order = Some((column.into(), direction));
        self
    }

    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Projected columns; empty means every column.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn filters(&self) -> &[(String, String)] {
        &self.filters
    }

    pub fn order(&self) -> Option<(&str, Direction)> {
        self.order.as_ref().map(|(c, d)| (c.as_str(), *d))
    }

    /// The `select` clause in PostgREST syntax.
    pub fn select_clause(&self) -> String {
        if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        }
    }

    /// Query string parameters in PostgREST syntax.
    pub fn rest_params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select_clause())];
        for (column, value) in &self.filters {
            params.push((column.clone(), format!("eq.{}", value)));
        }
        if let Some((column, direction)) = &self.order {
            params.push((
                "order".to_string(),
                format!("{}.{}", column, direction.as_str()),
            ));
        }
        params
    }
}

/// Table storage used for recipes and planning rows.
///
/// Rows travel as JSON objects so the trait stays object safe; typed (de)serialisation happens
/// in the services.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Appends `record` to `table`.
    async fn insert(&self, table: &str, record: Value) -> StoreResult<()>;

    /// Runs `query`. An empty result is an empty vector, never an error.
    async fn query(&self, query: &Query) -> StoreResult<Vec<Value>>;
}
