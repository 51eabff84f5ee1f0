//! JSON HTTP client shared by every backend call.

use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ApiError;

/// Thin wrapper over `reqwest::Client` rooted at a base URL.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    pub fn new(base_url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(endpoint)
            .map_err(|e| ApiError::InvalidRequest {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })
    }

    /// Send a JSON request.
    ///
    /// Non-2xx responses become [`ApiError::Status`], using the backend's
    /// `detail` field as the message when the error body has one. Successful
    /// non-JSON bodies come back as a JSON string.
    pub async fn request(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        headers: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let result = self.send(method, endpoint, body, headers).await;
        if let Err(ref e) = result {
            warn!(endpoint = %endpoint, "API request failed: {}", e);
        }
        result
    }

    async fn send(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        headers: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        let url = self.url(endpoint)?;
        let header_map = build_headers(endpoint, headers)?;

        debug!(method = %method, url = %url, "API request");

        let mut builder = self.client.request(method, url).headers(header_map);
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(|e| ApiError::Network {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| v.get("detail").and_then(Value::as_str).map(String::from));
            let message = detail.unwrap_or_else(|| {
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("")
                )
            });
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let is_json = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.contains("application/json"));

        if is_json {
            response
                .json::<Value>()
                .await
                .map_err(|e| ApiError::InvalidResponse {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })
        } else {
            response
                .text()
                .await
                .map(Value::String)
                .map_err(|e| ApiError::InvalidResponse {
                    endpoint: endpoint.to_string(),
                    reason: e.to_string(),
                })
        }
    }

    pub async fn get(&self, endpoint: &str, headers: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.request(Method::GET, endpoint, None, headers).await
    }

    pub async fn post(
        &self,
        endpoint: &str,
        data: &Value,
        headers: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        self.request(Method::POST, endpoint, Some(data), headers).await
    }

    pub async fn put(
        &self,
        endpoint: &str,
        data: &Value,
        headers: &[(&str, &str)],
    ) -> Result<Value, ApiError> {
        self.request(Method::PUT, endpoint, Some(data), headers).await
    }

    pub async fn delete(&self, endpoint: &str, headers: &[(&str, &str)]) -> Result<Value, ApiError> {
        self.request(Method::DELETE, endpoint, None, headers).await
    }
}

/// JSON content type plus the caller's headers, which win on conflict.
fn build_headers(endpoint: &str, headers: &[(&str, &str)]) -> Result<HeaderMap, ApiError> {
    let mut map = HeaderMap::new();
    map.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| ApiError::InvalidRequest {
            endpoint: endpoint.to_string(),
            reason: format!("bad header name {name}: {e}"),
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| ApiError::InvalidRequest {
            endpoint: endpoint.to_string(),
            reason: format!("bad header value for {name}: {e}"),
        })?;
        map.insert(name, value);
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_absolute_endpoints_onto_base() {
        let client = ApiClient::new(Url::parse("http://localhost:8000/app/").unwrap());
        assert_eq!(
            client.url("/api/user/profile").unwrap().as_str(),
            "http://localhost:8000/api/user/profile"
        );
        assert_eq!(
            client.url("api/x").unwrap().as_str(),
            "http://localhost:8000/app/api/x"
        );
    }

    #[test]
    fn caller_headers_override_content_type() {
        let map = build_headers("/e", &[("X-User-Id", "abc"), ("Content-Type", "text/plain")]).unwrap();
        assert_eq!(map["x-user-id"], "abc");
        assert_eq!(map[CONTENT_TYPE], "text/plain");
    }

    #[test]
    fn invalid_header_value_is_rejected() {
        assert!(build_headers("/e", &[("X-User-Id", "bad\nvalue")]).is_err());
    }

    #[tokio::test]
    async fn unreachable_backend_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let client = ApiClient::new(Url::parse(&format!("http://127.0.0.1:{port}")).unwrap());
        let err = client.get("/api/user/profile", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Network { .. }));
    }
}
