//! Request and response descriptors.
//!
//! # Design
//! Both descriptors are immutable value objects built fresh for every call.
//! A `RequestDescriptor` can only be obtained through `RequestBuilder::build`,
//! which validates the URL, the method and every header up front. Code
//! downstream of the builder therefore never sees an unsendable request.
//!
//! All fields use owned types (`String`, `Vec`, `serde_json::Value`) so values
//! can be handed across threads and host boundaries without lifetime concerns.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use ureq::http::{HeaderName, HeaderValue, Uri};

use crate::error::RequestError;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const APPLICATION_JSON: &str = "application/json";

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
    Head,
    Options,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Every method except GET may carry a payload and gets a default
    /// `Content-Type`.
    pub fn sends_body(&self) -> bool {
        *self != HttpMethod::Get
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            "HEAD" => Ok(HttpMethod::Head),
            "OPTIONS" => Ok(HttpMethod::Options),
            other => Err(RequestError::invalid(format!(
                "unsupported HTTP method: {other}"
            ))),
        }
    }
}

/// Header list with case-insensitive names.
///
/// Names keep the spelling they were first inserted with. Inserting a name
/// that is already present (ignoring ASCII case) replaces its value in place.
/// Serializes as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers(Vec<(String, String)>);

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Insert only when `name` is absent. Returns `true` if inserted.
    ///
    /// Used to collapse repeated upstream headers: the first value wins.
    pub fn insert_if_absent(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.0.push((name, value.into()));
        true
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn into_vec(self) -> Vec<(String, String)> {
        self.0
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (k, v) in iter {
            headers.insert(k, v);
        }
        headers
    }
}

impl Serialize for Headers {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Headers {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct HeadersVisitor;

        impl<'de> Visitor<'de> for HeadersVisitor {
            type Value = Headers;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of header names to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Headers, A::Error> {
                let mut headers = Headers::new();
                while let Some((k, v)) = access.next_entry::<String, String>()? {
                    headers.insert(k, v);
                }
                Ok(headers)
            }
        }

        deserializer.deserialize_map(HeadersVisitor)
    }
}

/// One HTTP request described as plain data.
///
/// Built with `RequestDescriptor::builder`. The body is kept even for GET so
/// the descriptor reflects what the caller supplied; the executor decides
/// what goes on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    url: String,
    method: HttpMethod,
    headers: Headers,
    body: Option<Value>,
}

impl RequestDescriptor {
    pub fn builder(url: impl Into<String>) -> RequestBuilder {
        RequestBuilder {
            url: url.into(),
            method: HttpMethod::Get,
            headers: Headers::new(),
            body: None,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn headers(&self) -> &Headers {
        &self.headers
    }

    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }
}

/// Collects the parts of a `RequestDescriptor` and validates them in `build`.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    url: String,
    method: HttpMethod,
    headers: Headers,
    body: Option<Value>,
}

impl RequestBuilder {
    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn headers(mut self, headers: Headers) -> Self {
        for (k, v) in headers.into_vec() {
            self.headers.insert(k, v);
        }
        self
    }

    pub fn body(mut self, body: Option<Value>) -> Self {
        self.body = body;
        self
    }

    pub fn build(self) -> Result<RequestDescriptor, RequestError> {
        validate_url(&self.url)?;
        for (name, value) in self.headers.iter() {
            HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| RequestError::invalid(format!("invalid header name: {name:?}")))?;
            HeaderValue::from_str(value).map_err(|_| {
                RequestError::invalid(format!("invalid value for header {name}"))
            })?;
        }
        Ok(RequestDescriptor {
            url: self.url,
            method: self.method,
            headers: self.headers,
            body: self.body,
        })
    }
}

/// Accept only absolute `http`/`https` URIs.
fn validate_url(url: &str) -> Result<(), RequestError> {
    if url.trim().is_empty() {
        return Err(RequestError::invalid("URL is required"));
    }
    let uri: Uri = url
        .parse()
        .map_err(|e| RequestError::invalid(format!("malformed URL {url:?}: {e}")))?;
    match (uri.scheme_str(), uri.authority()) {
        (Some(scheme), Some(_))
            if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") =>
        {
            Ok(())
        }
        (Some(scheme), Some(_)) => Err(RequestError::invalid(format!(
            "unsupported URL scheme: {scheme}"
        ))),
        _ => Err(RequestError::invalid(format!("URL is not absolute: {url:?}"))),
    }
}

/// One HTTP response described as plain data.
///
/// `data` holds the top-level members of a JSON object body, or a single
/// `text` member with the decoded body when content negotiation falls back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseDescriptor {
    pub status: u16,
    pub headers: Headers,
    pub data: Map<String, Value>,
}

impl ResponseDescriptor {
    /// The `text` member when the body was not decoded as JSON.
    pub fn text(&self) -> Option<&str> {
        self.data.get("text").and_then(Value::as_str)
    }
}
