//! JSON-shaped entry points for a host plugin layer.
//!
//! # Overview
//! A host hands over the same payload its script side sends
//! (`{ url, method?, headers?, data? }`) and gets back either the resolved
//! payload (`{ status, headers, data }`) or a `Rejection` carrying a
//! human-readable message and the underlying `RequestError`.
//!
//! # Design
//! - `get` and `post` build a new `HttpOptions` with the method forced; the
//!   caller's options are taken by value and never patched in place.
//! - `call` is the string-in/string-out variant for hosts that only move
//!   JSON text across their boundary.
//! - Running the call off the host's UI thread is the host's job; see
//!   `dispatch::BackgroundClient`.

use log::error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::client::HttpClient;
use crate::error::RequestError;
use crate::executor::{Transport, UreqTransport};
use crate::http::{Headers, HttpMethod, ResponseDescriptor};

const REQUEST_FAILED: &str = "Error making HTTP request";

/// Call payload as sent by the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A rejected call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Rejection {
    pub message: String,
    #[source]
    pub cause: Option<RequestError>,
}

impl Rejection {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }
}

impl From<RequestError> for Rejection {
    fn from(err: RequestError) -> Self {
        Self {
            message: format!("{REQUEST_FAILED}: {err}"),
            cause: Some(err),
        }
    }
}

/// Serves `request`, `get` and `post` calls over an `HttpClient`.
#[derive(Debug, Clone)]
pub struct PluginBridge<T = UreqTransport> {
    client: HttpClient<T>,
}

impl Default for PluginBridge<UreqTransport> {
    fn default() -> Self {
        Self::new(HttpClient::default())
    }
}

impl<T: Transport> PluginBridge<T> {
    pub fn new(client: HttpClient<T>) -> Self {
        Self { client }
    }

    pub fn request(&self, options: HttpOptions) -> Result<ResponseDescriptor, Rejection> {
        let Some(url) = options.url else {
            return Err(Rejection::new("URL is required"));
        };

        let result = options
            .method
            .as_deref()
            .map(str::parse::<HttpMethod>)
            .transpose()
            .and_then(|method| self.client.request(&url, method, options.headers, options.data));

        result.map_err(|err| {
            error!("{REQUEST_FAILED}: {err}");
            Rejection::from(err)
        })
    }

    pub fn get(&self, options: HttpOptions) -> Result<ResponseDescriptor, Rejection> {
        self.request(HttpOptions {
            method: Some(HttpMethod::Get.to_string()),
            ..options
        })
    }

    pub fn post(&self, options: HttpOptions) -> Result<ResponseDescriptor, Rejection> {
        self.request(HttpOptions {
            method: Some(HttpMethod::Post.to_string()),
            ..options
        })
    }

    /// Dispatch a call by name with a JSON payload; returns the JSON-encoded
    /// response payload.
    pub fn call(&self, method_name: &str, payload: &str) -> Result<String, Rejection> {
        let options: HttpOptions = serde_json::from_str(payload)
            .map_err(|e| Rejection::new(format!("invalid call payload: {e}")))?;

        let response = match method_name {
            "request" => self.request(options)?,
            "get" => self.get(options)?,
            "post" => self.post(options)?,
            other => return Err(Rejection::new(format!("unknown method: {other}"))),
        };

        serde_json::to_string(&response).map_err(|e| {
            Rejection::from(RequestError::Serialization(e.to_string()))
        })
    }
}
