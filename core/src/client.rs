//! Convenience entry points over `RequestExecutor`.
//!
//! # Design
//! `get` and `post` never patch a shared request: each builds a brand new
//! `RequestDescriptor` with the method forced and hands it to `request`'s
//! executor. Caller-owned headers and data are consumed, not mutated.

use serde_json::Value;

use crate::config::ExecutorConfig;
use crate::error::RequestError;
use crate::executor::{RequestExecutor, Transport, UreqTransport};
use crate::http::{Headers, HttpMethod, RequestDescriptor, ResponseDescriptor};

/// Stateless HTTP client exposing `get`, `post` and `request`.
#[derive(Debug, Clone)]
pub struct HttpClient<T = UreqTransport> {
    executor: RequestExecutor<T>,
}

impl HttpClient<UreqTransport> {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            executor: RequestExecutor::new(config),
        }
    }
}

impl Default for HttpClient<UreqTransport> {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl<T: Transport> HttpClient<T> {
    pub fn with_executor(executor: RequestExecutor<T>) -> Self {
        Self { executor }
    }

    pub fn executor(&self) -> &RequestExecutor<T> {
        &self.executor
    }

    pub fn get(&self, url: &str, headers: Option<Headers>) -> Result<ResponseDescriptor, RequestError> {
        self.request(url, Some(HttpMethod::Get), headers, None)
    }

    pub fn post(
        &self,
        url: &str,
        headers: Option<Headers>,
        data: Option<Value>,
    ) -> Result<ResponseDescriptor, RequestError> {
        self.request(url, Some(HttpMethod::Post), headers, data)
    }

    /// General entry point. `method` defaults to GET.
    pub fn request(
        &self,
        url: &str,
        method: Option<HttpMethod>,
        headers: Option<Headers>,
        data: Option<Value>,
    ) -> Result<ResponseDescriptor, RequestError> {
        let descriptor = RequestDescriptor::builder(url)
            .method(method.unwrap_or_default())
            .headers(headers.unwrap_or_default())
            .body(data.filter(|v| !v.is_null()))
            .build()?;
        self.executor.execute(&descriptor)
    }
}
