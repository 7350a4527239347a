use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method, Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error};

use shared_config::AppConfig;

use crate::error::DatabaseError;

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    anon_key: String,
    bearer_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            bearer_key: config.database_bearer_key().to_string(),
        }
    }

    fn get_headers(&self) -> Result<HeaderMap, DatabaseError> {
        let mut headers = HeaderMap::new();

        let apikey = HeaderValue::from_str(&self.anon_key)
            .map_err(|_| DatabaseError::Config("anon key is not a valid header value".into()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.bearer_key))
            .map_err(|_| DatabaseError::Config("bearer key is not a valid header value".into()))?;

        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        Ok(headers)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        extra_headers: Option<HeaderMap>,
    ) -> Result<Response, DatabaseError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut headers = self.get_headers()?;
        if let Some(extra) = extra_headers {
            headers.extend(extra);
        }

        let mut req = self.client.request(method, &url).headers(headers);

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await?;
            error!("API error ({}): {}", status, error_text);
            return Err(DatabaseError::from_response(status.as_u16(), &error_text));
        }

        Ok(response)
    }

    pub async fn request<T>(&self, method: Method, path: &str, body: Option<Value>)
                            -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        self.request_with_headers(method, path, body, None).await
    }

    pub async fn request_with_headers<T>(&self, method: Method, path: &str,
                                         body: Option<Value>, extra_headers: Option<HeaderMap>)
                                         -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        let response = self.send(method, path, body, extra_headers).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// `GET /rest/v1/{table}?{query}`
    pub async fn select<T>(&self, table: &str, query: &str) -> Result<Vec<T>, DatabaseError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}?{}", table, query);
        self.request(Method::GET, &path, None).await
    }

    /// POST one row and return it; `query` may carry a `select=` embed.
    pub async fn insert<T>(&self, table: &str, query: &str, body: Value) -> Result<T, DatabaseError>
    where T: DeserializeOwned {
        let path = if query.is_empty() {
            format!("/rest/v1/{}", table)
        } else {
            format!("/rest/v1/{}?{}", table, query)
        };
        let rows: Vec<T> = self.request_with_headers(
            Method::POST,
            &path,
            Some(body),
            Some(return_representation()),
        ).await?;

        rows.into_iter().next().ok_or_else(|| DatabaseError::Api {
            status: 201,
            message: format!("insert into {} returned no rows", table),
        })
    }

    /// PATCH rows matching `filter`; `None` when nothing matched.
    pub async fn update<T>(&self, table: &str, filter: &str, body: Value)
                           -> Result<Option<T>, DatabaseError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}?{}", table, filter);
        let rows: Vec<T> = self.request_with_headers(
            Method::PATCH,
            &path,
            Some(body),
            Some(return_representation()),
        ).await?;

        Ok(rows.into_iter().next())
    }

    /// DELETE rows matching `filter`; `None` when nothing matched.
    pub async fn delete<T>(&self, table: &str, filter: &str) -> Result<Option<T>, DatabaseError>
    where T: DeserializeOwned {
        let path = format!("/rest/v1/{}?{}", table, filter);
        let rows: Vec<T> = self.request_with_headers(
            Method::DELETE,
            &path,
            None,
            Some(return_representation()),
        ).await?;

        Ok(rows.into_iter().next())
    }

    /// Exact row count read from the `Content-Range` header.
    pub async fn count(&self, table: &str, filter: &str) -> Result<usize, DatabaseError> {
        let separator = if filter.is_empty() { "" } else { "&" };
        let path = format!("/rest/v1/{}?select=id&limit=1{}{}", table, separator, filter);

        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("count=exact"));

        let response = self.send(Method::GET, &path, None, Some(headers)).await?;
        let content_range = response
            .headers()
            .get("content-range")
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        parse_content_range_total(&content_range).ok_or_else(|| DatabaseError::Api {
            status: response.status().as_u16(),
            message: format!("missing count in Content-Range '{}'", content_range),
        })
    }
}

fn return_representation() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    headers
}

/// `0-0/42` and `*/0` both carry the total after the slash.
fn parse_content_range_total(value: &str) -> Option<usize> {
    value.rsplit_once('/').and_then(|(_, total)| total.trim().parse().ok())
}
