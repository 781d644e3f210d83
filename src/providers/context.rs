//! Request functions handed to provider modules.

use serde_json::Value;

use crate::api::{ApiGateway, ApiResult, HttpResponse};

/// Credential-aware request functions for one dispatch.
///
/// Built fresh for every invocation; shares the caller's credential store
/// through the gateway.
#[derive(Debug, Clone)]
pub struct DispatchContext {
    gateway: ApiGateway,
}

impl DispatchContext {
    pub fn new(gateway: ApiGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    pub async fn graphql_request(&self, url: &str, query: &Value) -> ApiResult<Value> {
        self.gateway.graphql_request(url, query).await
    }

    pub async fn get_request(&self, url: &str) -> ApiResult<HttpResponse> {
        self.gateway.get_request(url).await
    }

    pub async fn post_form_request(&self, url: &str, params: &Value) -> ApiResult<HttpResponse> {
        self.gateway.post_form_request(url, params).await
    }
}
