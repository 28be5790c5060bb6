use std::time::Duration;

use async_trait::async_trait;
use carebook_storage::{BlobStore, Query, RecordStore, StorageError};
use reqwest::{Method, RequestBuilder};
use serde_json::{Value, json};
use url::Url;

use crate::error::{status_error, transport_error};

const RETURN_REPRESENTATION: &str = "return=representation";

/// Client for a hosted table + object storage backend.
#[derive(Debug, Clone)]
pub struct RestBackend {
    http: reqwest::Client,
    base_url: Url,
    anon_key: String,
}

impl RestBackend {
    /// Builds a backend for the project at `base_url`.
    ///
    /// Every request is aborted after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::InvalidRecord` if `base_url` is not an http(s)
    /// URL, or `StorageError::Internal` if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        anon_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StorageError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            StorageError::invalid_record(format!("invalid backend URL {base_url}: {e}"))
        })?;
        if !matches!(base_url.scheme(), "http" | "https") || base_url.cannot_be_a_base() {
            return Err(StorageError::invalid_record(format!(
                "backend URL must be http(s): {base_url}"
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StorageError::internal(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            anon_key: anon_key.into(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Appends percent-encoded path segments to the base URL.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, StorageError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| StorageError::internal("backend URL cannot be a base"))?
            .pop_if_empty()
            .extend(segments.iter().copied());
        Ok(url)
    }

    fn table_url(&self, collection: &str) -> Result<Url, StorageError> {
        self.endpoint(&["rest", "v1", collection])
    }

    /// Object URL; `/` inside the key separates path segments.
    fn object_url(&self, action: &[&str], bucket: &str, key: &str) -> Result<Url, StorageError> {
        let mut segments = vec!["storage", "v1", "object"];
        segments.extend_from_slice(action);
        segments.push(bucket);
        segments.extend(key.split('/'));
        self.endpoint(&segments)
    }

    fn request(&self, method: Method, url: Url) -> RequestBuilder {
        tracing::debug!(backend = "rest", %method, %url, "sending request");
        self.http
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(&self.anon_key)
    }

    async fn send(
        &self,
        req: RequestBuilder,
        collection: &str,
        id: &str,
    ) -> Result<Value, StorageError> {
        let resp = req.send().await.map_err(transport_error)?;
        handle_response(resp, collection, id).await
    }
}

async fn handle_response(
    resp: reqwest::Response,
    collection: &str,
    id: &str,
) -> Result<Value, StorageError> {
    let status = resp.status();
    let body = resp.text().await.map_err(transport_error)?;

    if !status.is_success() {
        tracing::debug!(backend = "rest", status = status.as_u16(), body = %body, "request failed");
        return Err(status_error(status, &body, collection, id));
    }

    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    Ok(serde_json::from_str(&body)?)
}

/// First row of a table API response, which is always an array.
fn first_row(value: Value) -> Option<Value> {
    match value {
        Value::Array(rows) => rows.into_iter().next(),
        Value::Null => None,
        row => Some(row),
    }
}

fn select_clause(query: &Query) -> String {
    match &query.embed {
        Some(embed) => format!("*,{}({})", embed.collection, embed.columns.join(",")),
        None => "*".to_string(),
    }
}

fn order_clause(query: &Query) -> Option<String> {
    if query.order.is_empty() {
        return None;
    }
    Some(
        query
            .order
            .iter()
            .map(|key| format!("{}.{}", key.column, key.order.as_str()))
            .collect::<Vec<_>>()
            .join(","),
    )
}

#[async_trait]
impl RecordStore for RestBackend {
    async fn select(&self, query: &Query) -> Result<Vec<Value>, StorageError> {
        let mut url = self.table_url(&query.collection)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", &select_clause(query));
            for filter in &query.filters {
                pairs.append_pair(&filter.column, &format!("eq.{}", filter.value));
            }
            if let Some(order) = order_clause(query) {
                pairs.append_pair("order", &order);
            }
        }

        let value = self
            .send(self.request(Method::GET, url), &query.collection, "")
            .await?;
        match value {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(StorageError::serialization(format!(
                "expected an array of rows, got {other}"
            ))),
        }
    }

    async fn select_by_id(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<Value>, StorageError> {
        let mut url = self.table_url(collection)?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{id}"));

        let value = self
            .send(self.request(Method::GET, url), collection, id)
            .await?;
        Ok(first_row(value))
    }

    async fn insert(&self, collection: &str, row: &Value) -> Result<Value, StorageError> {
        let url = self.table_url(collection)?;
        let req = self
            .request(Method::POST, url)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(row);

        let value = self.send(req, collection, "").await?;
        first_row(value).ok_or_else(|| {
            StorageError::internal(format!("insert into {collection} returned no row"))
        })
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        changes: &Value,
    ) -> Result<Option<Value>, StorageError> {
        let mut url = self.table_url(collection)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        let req = self
            .request(Method::PATCH, url)
            .header("Prefer", RETURN_REPRESENTATION)
            .json(changes);

        let value = self.send(req, collection, id).await?;
        Ok(first_row(value))
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<Option<Value>, StorageError> {
        let mut url = self.table_url(collection)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        let req = self
            .request(Method::DELETE, url)
            .header("Prefer", RETURN_REPRESENTATION);

        let value = self.send(req, collection, id).await?;
        Ok(first_row(value))
    }

    async fn call(&self, procedure: &str, args: &Value) -> Result<Value, StorageError> {
        let url = self.endpoint(&["rest", "v1", "rpc", procedure])?;
        let req = self.request(Method::POST, url).json(args);
        self.send(req, "rpc", procedure).await
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

#[async_trait]
impl BlobStore for RestBackend {
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let url = self.object_url(&[], bucket, key)?;
        let req = self
            .request(Method::POST, url)
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(content);

        self.send(req, bucket, key).await?;
        Ok(())
    }

    async fn remove(&self, bucket: &str, keys: &[String]) -> Result<Vec<String>, StorageError> {
        let url = self.endpoint(&["storage", "v1", "object", bucket])?;
        let req = self
            .request(Method::DELETE, url)
            .json(&json!({ "prefixes": keys }));

        let value = self.send(req, bucket, "").await?;
        let removed = value
            .as_array()
            .map(|objects| {
                objects
                    .iter()
                    .filter_map(|o| o.get("name").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        Ok(removed)
    }

    async fn signed_url(
        &self,
        bucket: &str,
        key: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let url = self.object_url(&["sign"], bucket, key)?;
        let req = self
            .request(Method::POST, url)
            .json(&json!({ "expiresIn": ttl.as_secs() }));

        let value = self.send(req, bucket, key).await?;
        let signed = value
            .get("signedURL")
            .or_else(|| value.get("signedUrl"))
            .and_then(Value::as_str)
            .ok_or_else(|| StorageError::serialization("sign response has no signedURL"))?;

        // The storage API answers with a path relative to /storage/v1.
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(format!("{base}/storage/v1{signed}"))
    }

    fn backend_name(&self) -> &'static str {
        "rest"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carebook_storage::{Embed, SortOrder};

    fn backend(url: &str) -> RestBackend {
        RestBackend::new(url, "anon", Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_rejects_non_http_urls() {
        assert!(RestBackend::new("ftp://example.com", "k", Duration::from_secs(1)).is_err());
        assert!(RestBackend::new("not a url", "k", Duration::from_secs(1)).is_err());
        assert!(
            RestBackend::new("mailto:someone@example.com", "k", Duration::from_secs(1)).is_err()
        );
    }

    #[test]
    fn test_endpoint_encodes_segments() {
        let backend = backend("https://clinic.example.com/");
        let url = backend
            .object_url(&["sign"], "patient-files", "p1/1709287200250-rx panoramica.png")
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://clinic.example.com/storage/v1/object/sign/patient-files/\
             p1/1709287200250-rx%20panoramica.png"
        );

        let url = backend.table_url("medical_history").unwrap();
        assert_eq!(url.as_str(), "https://clinic.example.com/rest/v1/medical_history");
    }

    #[test]
    fn test_query_clauses() {
        let query = Query::new("appointments")
            .order_by("date", SortOrder::Ascending)
            .order_by("time", SortOrder::Ascending)
            .with_embed(Embed::new("patients", "patient_id", ["name"]));
        assert_eq!(select_clause(&query), "*,patients(name)");
        assert_eq!(order_clause(&query).as_deref(), Some("date.asc,time.asc"));

        let plain = Query::new("patients");
        assert_eq!(select_clause(&plain), "*");
        assert!(order_clause(&plain).is_none());
    }

    #[test]
    fn test_first_row() {
        assert_eq!(first_row(json!([{"id": "a"}, {"id": "b"}])), Some(json!({"id": "a"})));
        assert_eq!(first_row(json!([])), None);
        assert_eq!(first_row(Value::Null), None);
    }
}
