use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{DataGateway, Filter, GatewayError, SelectOptions};

const REST_PATH: &str = "/rest/v1";
const RETURN_REPRESENTATION: &str = "return=representation";
const MERGE_DUPLICATES: &str = "resolution=merge-duplicates,return=representation";

#[derive(Debug, Deserialize)]
struct PostgrestErrorBody {
    message: String,
    code: Option<String>,
    details: Option<String>,
    hint: Option<String>,
}

/// PostgREST client for the hosted database.
///
/// Without a user token every request authenticates with the public key, so
/// row-level policies see an anonymous caller.
#[derive(Clone)]
pub struct RestGateway {
    client: Client,
    base_url: Option<String>,
    anon_key: Option<String>,
    access_token: Option<String>,
}

impl RestGateway {
    pub fn new(base_url: Option<String>, anon_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            anon_key,
            access_token: None,
        }
    }

    fn request(&self, method: Method, table: &str) -> Result<RequestBuilder, GatewayError> {
        let (base_url, anon_key) = match (&self.base_url, &self.anon_key) {
            (Some(url), Some(key)) => (url, key),
            _ => return Err(GatewayError::NotConfigured),
        };
        let bearer = self.access_token.as_deref().unwrap_or(anon_key);

        Ok(self
            .client
            .request(method, format!("{base_url}{REST_PATH}/{table}"))
            .header("apikey", anon_key)
            .header("Authorization", format!("Bearer {bearer}")))
    }

    fn update_request(
        &self,
        table: &str,
        values: &Value,
        filters: &[Filter],
    ) -> Result<RequestBuilder, GatewayError> {
        if filters.is_empty() {
            return Err(GatewayError::MissingFilter {
                verb: "update",
                table: table.to_string(),
            });
        }
        Ok(self
            .request(Method::PATCH, table)?
            .query(&filter_query(filters))
            .header("Prefer", RETURN_REPRESENTATION)
            .json(values))
    }

    fn upsert_request(&self, table: &str, values: &Value) -> Result<RequestBuilder, GatewayError> {
        Ok(self
            .request(Method::POST, table)?
            .header("Prefer", MERGE_DUPLICATES)
            .json(values))
    }

    fn remove_request(&self, table: &str, filters: &[Filter]) -> Result<RequestBuilder, GatewayError> {
        if filters.is_empty() {
            return Err(GatewayError::MissingFilter {
                verb: "delete from",
                table: table.to_string(),
            });
        }
        Ok(self
            .request(Method::DELETE, table)?
            .query(&filter_query(filters))
            .header("Prefer", RETURN_REPRESENTATION))
    }

    async fn execute(&self, builder: RequestBuilder) -> Result<Vec<Value>, GatewayError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("Backend returned {}: {}", status, body);
            return Err(match serde_json::from_str::<PostgrestErrorBody>(&body) {
                Ok(e) => GatewayError::Api {
                    status: status.as_u16(),
                    message: e.message,
                    code: e.code,
                    details: e.details,
                    hint: e.hint,
                },
                Err(_) => GatewayError::Api {
                    status: status.as_u16(),
                    message: body,
                    code: None,
                    details: None,
                    hint: None,
                },
            });
        }

        parse_rows(&body)
    }
}

fn parse_rows(body: &str) -> Result<Vec<Value>, GatewayError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(match serde_json::from_str::<Value>(body)? {
        Value::Array(rows) => rows,
        Value::Null => Vec::new(),
        row => vec![row],
    })
}

fn filter_query(filters: &[Filter]) -> Vec<(String, String)> {
    filters.iter().map(Filter::to_query_pair).collect()
}

#[async_trait]
impl DataGateway for RestGateway {
    async fn select(&self, table: &str, options: &SelectOptions) -> Result<Vec<Value>, GatewayError> {
        let query = options.to_query();
        debug!("select {table}: {query:?}");
        let rows = self
            .execute(self.request(Method::GET, table)?.query(&query))
            .await?;
        debug!("select {table} returned {} rows", rows.len());
        Ok(rows)
    }

    async fn insert(&self, table: &str, values: Value) -> Result<Vec<Value>, GatewayError> {
        debug!("insert into {table}");
        self.execute(
            self.request(Method::POST, table)?
                .header("Prefer", RETURN_REPRESENTATION)
                .json(&values),
        )
        .await
    }

    async fn update(
        &self,
        table: &str,
        values: Value,
        filters: &[Filter],
    ) -> Result<Vec<Value>, GatewayError> {
        debug!("update {table}: {filters:?}");
        self.execute(self.update_request(table, &values, filters)?).await
    }

    async fn upsert(&self, table: &str, values: Value) -> Result<Vec<Value>, GatewayError> {
        debug!("upsert into {table}");
        self.execute(self.upsert_request(table, &values)?).await
    }

    async fn remove(&self, table: &str, filters: &[Filter]) -> Result<Vec<Value>, GatewayError> {
        debug!("delete from {table}: {filters:?}");
        self.execute(self.remove_request(table, filters)?).await
    }

    fn with_access_token(&self, access_token: &str) -> Box<dyn DataGateway> {
        Box::new(Self {
            access_token: Some(access_token.to_string()),
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_rows_handles_array_object_and_empty() {
        assert_eq!(parse_rows("[{\"id\":1},{\"id\":2}]").unwrap().len(), 2);
        assert_eq!(parse_rows("{\"id\":1}").unwrap(), vec![json!({"id": 1})]);
        assert!(parse_rows("").unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unconfigured_gateway_fails_before_sending() {
        let gateway = RestGateway::new(None, Some("anon".to_string()));
        let result = gateway.select("jobs", &SelectOptions::default()).await;
        assert!(matches!(result, Err(GatewayError::NotConfigured)));
    }

    #[tokio::test]
    async fn test_unfiltered_delete_is_rejected() {
        let gateway = RestGateway::new(
            Some("http://localhost:54321".to_string()),
            Some("anon".to_string()),
        );
        let result = gateway.remove("jobs", &[]).await;
        assert!(matches!(result, Err(GatewayError::MissingFilter { .. })));
    }

    fn local_gateway() -> RestGateway {
        RestGateway::new(
            Some("http://localhost:54321".to_string()),
            Some("anon".to_string()),
        )
    }

    #[test]
    fn test_update_and_remove_carry_filters_in_query() {
        let gateway = RestGateway {
            access_token: Some("user-jwt".to_string()),
            ..local_gateway()
        };
        let filters = [Filter::eq("id", "j1")];

        let update = gateway
            .update_request("jobs", &json!({"status": "closed"}), &filters)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(update.method(), &Method::PATCH);
        assert_eq!(update.url().path(), "/rest/v1/jobs");
        assert_eq!(update.url().query(), Some("id=eq.j1"));
        assert_eq!(update.headers()["Prefer"], RETURN_REPRESENTATION);
        assert_eq!(update.headers()["Authorization"], "Bearer user-jwt");
        assert_eq!(update.headers()["apikey"], "anon");

        let remove = gateway
            .remove_request("jobs", &filters)
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(remove.method(), &Method::DELETE);
        assert_eq!(remove.url().query(), Some("id=eq.j1"));
    }

    #[test]
    fn test_upsert_merges_duplicates() {
        let upsert = local_gateway()
            .upsert_request("user_profiles", &json!({"id": "u1"}))
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(upsert.method(), &Method::POST);
        assert_eq!(upsert.url().query(), None);
        assert_eq!(
            upsert.headers()["Prefer"],
            "resolution=merge-duplicates,return=representation"
        );
        assert_eq!(upsert.headers()["Authorization"], "Bearer anon");
        let body = upsert.body().and_then(|b| b.as_bytes()).unwrap();
        assert_eq!(serde_json::from_slice::<Value>(body).unwrap(), json!({"id": "u1"}));
    }
}
