//! PostgREST (Supabase `rest/v1`) implementation of [`RowStore`].

use super::store::{Query, RowStore, StoreError, StoreResult};
use async_trait::async_trait;
use repas_types::BackendCredentials;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;

#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    credentials: BackendCredentials,
}

impl RestStore {
    pub fn new(client: Client, credentials: BackendCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.credentials.base_url(), table)
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        self.credentials
            .auth_headers()
            .into_iter()
            .fold(builder, |b, (name, value)| b.header(name, value))
    }
}

async fn check_status(response: Response) -> StoreResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Backend {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

/// PostgREST errors carry `message` (and sometimes `details`/`hint`).
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl RowStore for RestStore {
    async fn insert(&self, table: &str, record: Value) -> StoreResult<()> {
        if !record.is_object() {
            return Err(StoreError::InvalidRecord(record.to_string()));
        }
        let request = self
            .authorised(self.client.post(self.table_url(table)))
            .header("Prefer", "return=minimal")
            .json(&record);

        check_status(request.send().await?).await?;
        Ok(())
    }

    async fn query(&self, query: &Query) -> StoreResult<Vec<Value>> {
        let request = self
            .authorised(self.client.get(self.table_url(query.table_name())))
            .query(&query.rest_params());

        let response = check_status(request.send().await?).await?;
        match response.json::<Value>().await? {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(StoreError::Backend {
                status: 200,
                message: format!("expected a JSON array, got: {}", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::store::Direction;
    use super::*;
    use axum::extract::{Query as Params, State};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_table_url() {
        let credentials = BackendCredentials::new("https://abc.supabase.co", "key").unwrap();
        let store = RestStore::new(Client::new(), credentials);
        assert_eq!(
            store.table_url("recipes"),
            "https://abc.supabase.co/rest/v1/recipes"
        );
    }

    #[test]
    fn test_error_message() {
        assert_eq!(
            error_message(r#"{"code":"42P01","message":"relation \"public.recipes\" does not exist"}"#),
            "relation \"public.recipes\" does not exist"
        );
        assert_eq!(error_message(" upstream timeout "), "upstream timeout");
    }

    #[tokio::test]
    async fn test_insert_rejects_non_object_without_calling_out() {
        let credentials = BackendCredentials::new("http://127.0.0.1:9", "key").unwrap();
        let store = RestStore::new(Client::new(), credentials);
        let result = store.insert("recipes", serde_json::json!([1, 2])).await;
        assert!(matches!(result, Err(StoreError::InvalidRecord(_))));
    }

    /// One request as seen by the local stand-in for PostgREST.
    #[derive(Debug, Clone)]
    struct Seen {
        method: String,
        path: String,
        params: Vec<(String, String)>,
        headers: axum::http::HeaderMap,
        body: Vec<u8>,
    }

    type SeenLog = Arc<Mutex<Vec<Seen>>>;

    async fn record(
        State((log, status, reply)): State<(SeenLog, u16, &'static str)>,
        method: axum::http::Method,
        uri: axum::http::Uri,
        Params(params): Params<Vec<(String, String)>>,
        headers: axum::http::HeaderMap,
        body: axum::body::Bytes,
    ) -> (axum::http::StatusCode, &'static str) {
        log.lock().unwrap().push(Seen {
            method: method.to_string(),
            path: uri.path().to_string(),
            params,
            headers,
            body: body.to_vec(),
        });
        (axum::http::StatusCode::from_u16(status).unwrap(), reply)
    }

    /// Serves every request with `status` and `reply` on a local port.
    async fn local_backend(status: u16, reply: &'static str) -> (RestStore, SeenLog) {
        let log = SeenLog::default();
        let app = axum::Router::new()
            .fallback(record)
            .with_state((log.clone(), status, reply));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let credentials = BackendCredentials::new(format!("http://{}", addr), "service-key").unwrap();
        (RestStore::new(Client::new(), credentials), log)
    }

    fn header<'a>(seen: &'a Seen, name: &str) -> &'a str {
        seen.headers.get(name).unwrap().to_str().unwrap()
    }

    #[tokio::test]
    async fn test_insert_posts_json_with_minimal_return() {
        let (store, log) = local_backend(201, "").await;
        let record = json!({ "id": "r1", "name": "Soupe" });
        store.insert("recipes", record.clone()).await.unwrap();

        let seen = log.lock().unwrap().clone();
        assert_eq!(seen.len(), 1);
        let insert = &seen[0];
        assert_eq!(insert.method, "POST");
        assert_eq!(insert.path, "/rest/v1/recipes");
        assert_eq!(header(insert, "prefer"), "return=minimal");
        assert_eq!(header(insert, "apikey"), "service-key");
        assert_eq!(header(insert, "authorization"), "Bearer service-key");
        assert_eq!(header(insert, "content-type"), "application/json");
        let sent: Value = serde_json::from_slice(&insert.body).unwrap();
        assert_eq!(sent, record);
    }

    #[tokio::test]
    async fn test_query_sends_params_and_reads_rows() {
        let (store, log) = local_backend(
            200,
            r#"[{"day_slot":"Lundi midi","recipe_id":"r1"},{"day_slot":"Mardi soir","recipe_id":"r2"}]"#,
        )
        .await;
        let query = Query::table("planning")
            .select(&["day_slot", "recipe_id"])
            .eq("week_label", "Semaine 1")
            .order_by("created_at", Direction::Descending);

        let rows = store.query(&query).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["recipe_id"], "r2");

        let seen = log.lock().unwrap().clone();
        let get = &seen[0];
        assert_eq!(get.method, "GET");
        assert_eq!(get.path, "/rest/v1/planning");
        assert_eq!(header(get, "apikey"), "service-key");
        assert_eq!(get.params, query.rest_params());
        assert!(get
            .params
            .contains(&("week_label".to_string(), "eq.Semaine 1".to_string())));
        assert!(get
            .params
            .contains(&("order".to_string(), "created_at.desc".to_string())));
    }

    #[tokio::test]
    async fn test_query_null_body_is_empty() {
        let (store, _) = local_backend(200, "null").await;
        let rows = store.query(&Query::table("recipes")).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_backend_error_carries_status_and_message() {
        let (store, _) = local_backend(
            404,
            r#"{"code":"42P01","message":"relation \"public.recipes\" does not exist"}"#,
        )
        .await;
        match store.query(&Query::table("recipes")).await {
            Err(StoreError::Backend { status, message }) => {
                assert_eq!(status, 404);
                assert_eq!(message, "relation \"public.recipes\" does not exist");
            }
            other => panic!("expected a backend error, got {:?}", other),
        }
    }
}
