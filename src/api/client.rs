//! Credential-aware HTTP gateway.
//!
//! The [`ApiGateway`] issues the three kinds of requests every other component
//! (account queries, provider modules) builds on:
//!
//! - [`ApiGateway::graphql_request`]: JSON POST with session headers and `x-access-token`
//! - [`ApiGateway::get_request`]: GET that never follows redirects
//! - [`ApiGateway::post_form_request`]: form-encoded POST
//!
//! # Example
//!
//! ```rust,ignore
//! use casino_realtime::api::ApiGateway;
//! use casino_realtime::auth::{CredentialStore, Credentials};
//!
//! let store = CredentialStore::with_credentials(Credentials::new(ua, cookies, api_key));
//! let gateway = ApiGateway::new(store)?;
//! let body = gateway.graphql(&serde_json::json!({ "query": "query { user { id } }" })).await?;
//! ```

use std::collections::HashMap;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE, USER_AGENT};
use reqwest::{redirect, Client, Response};
use serde_json::Value;

use crate::api::error::{ApiError, ApiResult};
use crate::auth::CredentialStore;
use crate::network::{graphql_url, DEFAULT_MIRROR};

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the API key on GraphQL calls.
const ACCESS_TOKEN_HEADER: &str = "x-access-token";

/// Body and headers of a plain GET/POST response.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    /// Parsed JSON when the body is JSON, otherwise the raw body as a JSON string.
    pub data: Value,
    pub headers: HashMap<String, String>,
}

/// Builder for configuring [`ApiGateway`].
#[derive(Debug, Clone)]
pub struct ApiGatewayBuilder {
    credentials: CredentialStore,
    mirror: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    accept_invalid_certs: bool,
}

impl ApiGatewayBuilder {
    /// Create a new builder reading credentials from `credentials`.
    pub fn new(credentials: CredentialStore) -> Self {
        Self {
            credentials,
            mirror: DEFAULT_MIRROR.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            default_headers: Vec::new(),
            accept_invalid_certs: false,
        }
    }

    /// Set the casino mirror host used by [`ApiGateway::graphql`].
    pub fn mirror(mut self, mirror: impl Into<String>) -> Self {
        self.mirror = mirror.into();
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Add a default header to all requests.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Skip TLS certificate verification on every outbound call.
    ///
    /// Some casino mirrors serve certificates that fail validation. Enabling
    /// this trusts any certificate, exposing the session cookies and API key to
    /// anyone able to intercept the connection. Off by default.
    pub fn danger_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Build the gateway.
    pub fn build(self) -> ApiResult<ApiGateway> {
        let mut headers = HeaderMap::new();
        for (name, value) in self.default_headers {
            let header_name = HeaderName::try_from(name.as_str()).map_err(|e| {
                ApiError::InvalidParameter(format!("Invalid header name '{}': {}", name, e))
            })?;
            let header_value = HeaderValue::from_str(&value).map_err(|e| {
                ApiError::InvalidParameter(format!("Invalid header value for '{}': {}", name, e))
            })?;
            headers.insert(header_name, header_value);
        }

        if self.accept_invalid_certs {
            tracing::warn!("TLS certificate verification disabled for API gateway");
        }

        let http_client = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers.clone())
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()?;

        let no_redirect_client = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .redirect(redirect::Policy::none())
            .build()?;

        Ok(ApiGateway {
            http_client,
            no_redirect_client,
            credentials: self.credentials,
            graphql_url: graphql_url(&self.mirror),
        })
    }
}

/// Stateless, credential-aware HTTP gateway.
///
/// Cloning is cheap; clones share connection pools and the credential store.
#[derive(Debug, Clone)]
pub struct ApiGateway {
    http_client: Client,
    no_redirect_client: Client,
    credentials: CredentialStore,
    graphql_url: String,
}

impl ApiGateway {
    /// Create a gateway with default settings (30s timeout, TLS verification on).
    pub fn new(credentials: CredentialStore) -> ApiResult<Self> {
        ApiGatewayBuilder::new(credentials).build()
    }

    pub fn builder(credentials: CredentialStore) -> ApiGatewayBuilder {
        ApiGatewayBuilder::new(credentials)
    }

    /// The shared credential store.
    pub fn credentials(&self) -> &CredentialStore {
        &self.credentials
    }

    /// GraphQL endpoint of the configured mirror.
    pub fn graphql_url(&self) -> &str {
        &self.graphql_url
    }

    /// POST a GraphQL query to the configured mirror's endpoint.
    pub async fn graphql(&self, query: &Value) -> ApiResult<Value> {
        self.graphql_request(&self.graphql_url, query).await
    }

    /// POST a JSON query with the session headers.
    ///
    /// Adds `x-access-token` when `url` targets a GraphQL endpoint. Fails with
    /// [`ApiError::MissingCredentials`] before any network activity when the
    /// session is incomplete.
    pub async fn graphql_request(&self, url: &str, query: &Value) -> ApiResult<Value> {
        if url.trim().is_empty() || query.is_null() {
            tracing::error!(url, "URL or query is missing");
            return Err(ApiError::MissingArguments("URL or query is missing".to_string()));
        }

        let credentials = self.credentials.snapshot().await;
        if !credentials.is_complete() {
            return Err(ApiError::MissingCredentials);
        }

        let mut request = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .header(USER_AGENT, credentials.user_agent.as_str())
            .header(COOKIE, credentials.cookie_header.as_str());

        if url.contains("graphql") {
            request = request.header(ACCESS_TOKEN_HEADER, credentials.api_key.as_str());
        }

        let response = request.json(query).send().await.map_err(|e| {
            tracing::error!(url, error = %e, "API call error");
            ApiError::Transport(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::error_from_response(url, response).await);
        }

        let text = response.text().await?;
        Ok(parse_body(&text))
    }

    /// GET `url` with the session headers, treating any status below 400 as success.
    ///
    /// Redirects are returned as-is (with their `location` header) rather than followed.
    pub async fn get_request(&self, url: &str) -> ApiResult<HttpResponse> {
        if url.trim().is_empty() {
            return Err(ApiError::MissingArguments("URL is missing".to_string()));
        }

        let credentials = self.credentials.snapshot().await;
        let response = self
            .no_redirect_client
            .get(url)
            .header(USER_AGENT, credentials.user_agent.as_str())
            .header(COOKIE, credentials.cookie_header.as_str())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url, error = %e, "GET request error");
                ApiError::Transport(e)
            })?;

        if response.status().as_u16() >= 400 {
            return Err(Self::error_from_response(url, response).await);
        }

        Self::into_http_response(response).await
    }

    /// POST `params` (a JSON object) as an urlencoded form with the session headers.
    pub async fn post_form_request(&self, url: &str, params: &Value) -> ApiResult<HttpResponse> {
        let params = match params {
            Value::Object(map) if !url.trim().is_empty() => map,
            _ => {
                return Err(ApiError::MissingArguments(
                    "URL or params are missing".to_string(),
                ))
            }
        };

        let body = encode_form(params)?;
        let credentials = self.credentials.snapshot().await;
        let response = self
            .http_client
            .post(url)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(USER_AGENT, credentials.user_agent.as_str())
            .header(COOKIE, credentials.cookie_header.as_str())
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url, error = %e, "POST request error");
                ApiError::Transport(e)
            })?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(url, response).await);
        }

        Self::into_http_response(response).await
    }

    async fn into_http_response(response: Response) -> ApiResult<HttpResponse> {
        let status = response.status().as_u16();
        let headers = flatten_headers(response.headers());
        let text = response.text().await?;
        Ok(HttpResponse {
            status,
            data: parse_body(&text),
            headers,
        })
    }

    /// Log an upstream error response and convert it, keeping status and body.
    async fn error_from_response(url: &str, response: Response) -> ApiError {
        let status = response.status().as_u16();
        let headers = flatten_headers(response.headers());
        let body = response.text().await.unwrap_or_default();
        tracing::error!(url, status, body = %body, headers = ?headers, "Upstream error response");
        ApiError::Http { status, body }
    }
}

/// Parse a body as JSON, falling back to a JSON string of the raw text.
pub(crate) fn parse_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Urlencode a JSON object: strings verbatim, other values as their JSON text.
pub(crate) fn encode_form(params: &serde_json::Map<String, Value>) -> ApiResult<String> {
    let pairs: Vec<(&str, String)> = params
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.as_str(), value)
        })
        .collect();

    serde_urlencoded::to_string(&pairs).map_err(|e| ApiError::InvalidParameter(e.to_string()))
}

fn flatten_headers(headers: &HeaderMap) -> HashMap<String, String> {
    let mut flattened: HashMap<String, String> = HashMap::new();
    for (name, value) in headers {
        let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
        flattened
            .entry(name.as_str().to_string())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }
    flattened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Credentials;
    use serde_json::json;

    fn gateway(credentials: Credentials) -> ApiGateway {
        ApiGateway::new(CredentialStore::with_credentials(credentials)).unwrap()
    }

    #[test]
    fn test_parse_body_json_and_text() {
        assert_eq!(parse_body(r#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(parse_body("<html>"), json!("<html>"));
    }

    #[test]
    fn test_encode_form_preserves_order_and_stringifies() {
        let params = json!({"symbol": "a b", "amount": 1.5, "auto": true});
        let encoded = encode_form(params.as_object().unwrap()).unwrap();
        assert_eq!(encoded, "symbol=a+b&amount=1.5&auto=true");
    }

    #[test]
    fn test_builder_rejects_invalid_header() {
        let result = ApiGateway::builder(CredentialStore::new())
            .header("bad header", "x")
            .build();
        assert!(matches!(result, Err(ApiError::InvalidParameter(_))));
    }

    #[test]
    fn test_graphql_url_from_mirror() {
        let gateway = ApiGateway::builder(CredentialStore::new())
            .mirror("stake.example")
            .build()
            .unwrap();
        assert_eq!(gateway.graphql_url(), "https://stake.example/_api/graphql");
    }

    #[tokio::test]
    async fn test_graphql_missing_cookie_fails_before_network() {
        // Port 9 on localhost is never contacted: the credential check comes first.
        let gateway = gateway(Credentials::new("ua", "", "key"));
        let result = gateway
            .graphql_request("http://127.0.0.1:9/_api/graphql", &json!({"query": "{}"}))
            .await;
        assert!(matches!(result, Err(ApiError::MissingCredentials)));
    }

    #[tokio::test]
    async fn test_graphql_missing_arguments() {
        let gateway = gateway(Credentials::new("ua", "a=b", "key"));
        let result = gateway.graphql_request("", &json!({"query": "{}"})).await;
        assert!(matches!(result, Err(ApiError::MissingArguments(_))));

        let result = gateway.graphql_request("http://x/graphql", &Value::Null).await;
        assert!(matches!(result, Err(ApiError::MissingArguments(_))));
    }

    #[tokio::test]
    async fn test_get_and_post_missing_arguments() {
        let gateway = gateway(Credentials::default());
        assert!(matches!(
            gateway.get_request(" ").await,
            Err(ApiError::MissingArguments(_))
        ));
        assert!(matches!(
            gateway.post_form_request("http://x", &Value::Null).await,
            Err(ApiError::MissingArguments(_))
        ));
        assert!(matches!(
            gateway.post_form_request("", &json!({"a": 1})).await,
            Err(ApiError::MissingArguments(_))
        ));
    }
}
