//! One blocking HTTP round trip per call.
//!
//! # Design
//! `execute` is split into three stages so the I/O boundary is explicit:
//!
//! 1. `prepare` turns a `RequestDescriptor` into a `WireRequest` (final URL,
//!    final header list, body bytes). Pure.
//! 2. A `Transport` performs the round trip and hands back a `RawResponse`.
//!    `UreqTransport` is the default; tests substitute their own.
//! 3. `interpret` turns the `RawResponse` into a `ResponseDescriptor`
//!    (body decoding, header collapsing, content negotiation). Pure.
//!
//! The executor holds no mutable state. Each call owns its connection for
//! the duration of `Transport::send` and nothing outlives the call.

use std::fmt;

use log::{debug, warn};
use serde_json::{Map, Value};
use ureq::Agent;
use url::Url;

use crate::config::{BodyDecoding, ExecutorConfig};
use crate::error::RequestError;
use crate::http::{
    Headers, HttpMethod, RequestDescriptor, ResponseDescriptor, APPLICATION_JSON, CONTENT_TYPE,
};

const USER_AGENT: &str = "User-Agent";

/// The request exactly as it goes on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

/// The response exactly as it came off the wire.
///
/// `headers` lists every received header line in order, so a name may repeat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// Performs a single round trip.
///
/// Status codes >= 400 are responses, not errors: implementations must
/// return them as `Ok(RawResponse)` with the error body.
pub trait Transport: Send + Sync {
    fn send(&self, request: &WireRequest) -> Result<RawResponse, RequestError>;
}

/// `Transport` backed by a ureq agent.
#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn send(&self, request: &WireRequest) -> Result<RawResponse, RequestError> {
        let mut builder = ureq::http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let mut response = match &request.body {
            Some(bytes) => {
                let req = builder
                    .body(bytes.as_slice())
                    .map_err(|e| RequestError::invalid(e.to_string()))?;
                self.agent.run(req)?
            }
            None => {
                let req = builder
                    .body(())
                    .map_err(|e| RequestError::invalid(e.to_string()))?;
                self.agent.run(req)?
            }
        };

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        // ureq caps read_to_vec at 10 MiB by default; the full body is wanted.
        let body = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

/// Executes `RequestDescriptor`s over a `Transport`.
#[derive(Debug, Clone)]
pub struct RequestExecutor<T = UreqTransport> {
    config: ExecutorConfig,
    transport: T,
}

impl RequestExecutor<UreqTransport> {
    pub fn new(config: ExecutorConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl Default for RequestExecutor<UreqTransport> {
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl<T: Transport> RequestExecutor<T> {
    pub fn with_transport(config: ExecutorConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn execute(&self, descriptor: &RequestDescriptor) -> Result<ResponseDescriptor, RequestError> {
        let wire = prepare(descriptor, &self.config)?;
        debug!("{} {}", wire.method, wire.url);

        let raw = self.transport.send(&wire)?;
        debug!("{} {} -> {}", wire.method, wire.url, raw.status);

        Ok(interpret(raw, self.config.body_decoding))
    }
}

/// Build the on-the-wire request for `descriptor`.
///
/// GET never carries a body. Every other method gets
/// `Content-Type: application/json` unless the caller set one.
pub fn prepare(descriptor: &RequestDescriptor, config: &ExecutorConfig) -> Result<WireRequest, RequestError> {
    let method = descriptor.method();

    let url = match descriptor.body() {
        Some(data) if method == HttpMethod::Get && config.get_data_as_query => {
            append_query(descriptor.url(), data)?
        }
        _ => descriptor.url().to_string(),
    };

    let mut headers = descriptor.headers().clone();
    if method.sends_body() && !headers.contains(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, APPLICATION_JSON);
    }
    if let Some(agent) = &config.user_agent {
        if !headers.contains(USER_AGENT) {
            headers.insert(USER_AGENT, agent.as_str());
        }
    }

    let body = match descriptor.body() {
        Some(data) if method.sends_body() => Some(encode_body(data)?),
        _ => None,
    };

    Ok(WireRequest {
        method,
        url,
        headers: headers.into_vec(),
        body,
    })
}

/// Turn a received response into a `ResponseDescriptor`.
pub fn interpret(raw: RawResponse, decoding: BodyDecoding) -> ResponseDescriptor {
    let mut headers = Headers::new();
    for (name, value) in raw.headers {
        headers.insert_if_absent(name, value);
    }

    let text = decode_body(&raw.body, decoding);
    let data = negotiate(headers.get(CONTENT_TYPE), text);

    ResponseDescriptor {
        status: raw.status,
        headers,
        data,
    }
}

/// Decode body bytes as UTF-8, replacing invalid sequences.
///
/// `LineJoined` breaks on `\n`, `\r\n` and `\r`, trims control characters
/// and spaces around every line, and concatenates the pieces.
pub fn decode_body(body: &[u8], decoding: BodyDecoding) -> String {
    let text = String::from_utf8_lossy(body);
    match decoding {
        BodyDecoding::Raw => text.into_owned(),
        BodyDecoding::LineJoined => text
            .split(['\n', '\r'])
            .map(|line| line.trim_matches(|c: char| c <= ' '))
            .collect(),
    }
}

/// Pick the `data` shape from the content type and the decoded text.
fn negotiate(content_type: Option<&str>, text: String) -> Map<String, Value> {
    let is_json = content_type
        .map(|ct| ct.to_ascii_lowercase().contains(APPLICATION_JSON))
        .unwrap_or(false);

    if is_json {
        match serde_json::from_str::<Map<String, Value>>(&text) {
            Ok(object) => return object,
            Err(e) => warn!("JSON response body is not an object, returning text: {e}"),
        }
    }

    let mut data = Map::new();
    data.insert("text".to_string(), Value::String(text));
    data
}

/// JSON strings go out as their raw text; everything else is JSON-encoded.
fn encode_body(data: &Value) -> Result<Vec<u8>, RequestError> {
    match data {
        Value::String(s) => Ok(s.clone().into_bytes()),
        other => serde_json::to_vec(other).map_err(|e| RequestError::Serialization(e.to_string())),
    }
}

fn append_query(base: &str, data: &Value) -> Result<String, RequestError> {
    let Value::Object(members) = data else {
        debug!("GET data is not an object, not appending it to the query");
        return Ok(base.to_string());
    };
    let mut url = Url::parse(base).map_err(|e| RequestError::invalid(format!("malformed URL {base:?}: {e}")))?;
    {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in members {
            match value {
                Value::String(s) => pairs.append_pair(key, s),
                other => pairs.append_pair(key, &other.to_string()),
            };
        }
    }
    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request and replies with a canned response.
    struct CannedTransport {
        response: RawResponse,
        seen: Mutex<Vec<WireRequest>>,
    }

    impl CannedTransport {
        fn new(status: u16, content_type: &str, body: &str) -> Self {
            Self {
                response: RawResponse {
                    status,
                    headers: vec![("content-type".to_string(), content_type.to_string())],
                    body: body.as_bytes().to_vec(),
                },
                seen: Mutex::new(Vec::new()),
            }
        }

        fn last(&self) -> WireRequest {
            self.seen.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl Transport for CannedTransport {
        fn send(&self, request: &WireRequest) -> Result<RawResponse, RequestError> {
            self.seen.lock().unwrap().push(request.clone());
            Ok(self.response.clone())
        }
    }

    struct FailingTransport;

    impl Transport for FailingTransport {
        fn send(&self, _request: &WireRequest) -> Result<RawResponse, RequestError> {
            Err(RequestError::Network("Connection refused".to_string()))
        }
    }

    fn descriptor(method: HttpMethod, body: Option<Value>) -> RequestDescriptor {
        RequestDescriptor::builder("https://example.com/echo")
            .method(method)
            .body(body)
            .build()
            .unwrap()
    }

    fn header<'a>(wire: &'a WireRequest, name: &str) -> Option<&'a str> {
        wire.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn get_never_sends_body_or_content_type() {
        let req = descriptor(HttpMethod::Get, Some(json!({"a": 1})));
        let wire = prepare(&req, &ExecutorConfig::default()).unwrap();
        assert!(wire.body.is_none());
        assert!(header(&wire, "content-type").is_none());
        assert_eq!(wire.url, "https://example.com/echo");
    }

    #[test]
    fn non_get_defaults_content_type_to_json() {
        for method in [
            HttpMethod::Post,
            HttpMethod::Put,
            HttpMethod::Patch,
            HttpMethod::Delete,
            HttpMethod::Head,
            HttpMethod::Options,
        ] {
            let wire = prepare(&descriptor(method, None), &ExecutorConfig::default()).unwrap();
            assert_eq!(header(&wire, "Content-Type"), Some("application/json"), "{method}");
            assert!(wire.body.is_none(), "{method}");
        }
    }

    #[test]
    fn caller_content_type_is_kept_regardless_of_case() {
        let req = RequestDescriptor::builder("https://example.com/form")
            .method(HttpMethod::Post)
            .header("content-type", "text/plain")
            .body(Some(json!("hello")))
            .build()
            .unwrap();
        let wire = prepare(&req, &ExecutorConfig::default()).unwrap();
        let content_types: Vec<_> = wire
            .headers
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("content-type"))
            .collect();
        assert_eq!(content_types.len(), 1);
        assert_eq!(content_types[0].1, "text/plain");
        assert_eq!(wire.body.as_deref(), Some("hello".as_bytes()));
    }

    #[test]
    fn structured_body_is_json_encoded() {
        let wire = prepare(
            &descriptor(HttpMethod::Post, Some(json!({"a": 1, "b": [true, null]}))),
            &ExecutorConfig::default(),
        )
        .unwrap();
        let sent: Value = serde_json::from_slice(wire.body.as_deref().unwrap()).unwrap();
        assert_eq!(sent, json!({"a": 1, "b": [true, null]}));
    }

    #[test]
    fn delete_with_body_transmits_it() {
        let wire = prepare(
            &descriptor(HttpMethod::Delete, Some(json!({"id": 7}))),
            &ExecutorConfig::default(),
        )
        .unwrap();
        assert_eq!(wire.body.as_deref(), Some(br#"{"id":7}"#.as_slice()));
    }

    #[test]
    fn user_agent_is_added_unless_caller_set_one() {
        let config = ExecutorConfig {
            user_agent: Some("bridge/1".to_string()),
            ..ExecutorConfig::default()
        };
        let wire = prepare(&descriptor(HttpMethod::Get, None), &config).unwrap();
        assert_eq!(header(&wire, "user-agent"), Some("bridge/1"));

        let req = RequestDescriptor::builder("https://example.com")
            .header("User-Agent", "custom")
            .build()
            .unwrap();
        let wire = prepare(&req, &config).unwrap();
        assert_eq!(header(&wire, "user-agent"), Some("custom"));
    }

    #[test]
    fn get_data_goes_to_query_when_enabled() {
        let config = ExecutorConfig {
            get_data_as_query: true,
            ..ExecutorConfig::default()
        };
        let req = RequestDescriptor::builder("https://example.com/search?lang=en")
            .body(Some(json!({"q": "rust lang", "page": 2})))
            .build()
            .unwrap();
        let wire = prepare(&req, &config).unwrap();
        assert_eq!(wire.url, "https://example.com/search?lang=en&q=rust+lang&page=2");
        assert!(wire.body.is_none());
    }

    #[test]
    fn line_joined_decoding_drops_newlines_and_edge_whitespace() {
        let body = b"  line one  \r\n\tline  two\n\nthree\r";
        assert_eq!(decode_body(body, BodyDecoding::LineJoined), "line oneline  twothree");
        assert_eq!(
            decode_body(body, BodyDecoding::Raw),
            "  line one  \r\n\tline  two\n\nthree\r"
        );
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        assert_eq!(decode_body(b"ok\xff", BodyDecoding::Raw), "ok\u{fffd}");
    }

    #[test]
    fn repeated_headers_keep_first_value() {
        let raw = RawResponse {
            status: 200,
            headers: vec![
                ("set-cookie".to_string(), "a=1".to_string()),
                ("set-cookie".to_string(), "b=2".to_string()),
                ("content-type".to_string(), "text/plain".to_string()),
            ],
            body: b"hi".to_vec(),
        };
        let resp = interpret(raw, BodyDecoding::LineJoined);
        assert_eq!(resp.headers.len(), 2);
        assert_eq!(resp.headers.get("Set-Cookie"), Some("a=1"));
    }

    #[test]
    fn json_object_is_flattened_into_data() {
        let transport = CannedTransport::new(200, "application/json; charset=utf-8", r#"{"a":1,"b":{"c":"d"}}"#);
        let executor = RequestExecutor::with_transport(ExecutorConfig::default(), transport);
        let resp = executor.execute(&descriptor(HttpMethod::Get, None)).unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(Value::Object(resp.data), json!({"a": 1, "b": {"c": "d"}}));
    }

    #[test]
    fn invalid_json_falls_back_to_text() {
        let transport = CannedTransport::new(200, "application/json", "{invalid json");
        let executor = RequestExecutor::with_transport(ExecutorConfig::default(), transport);
        let resp = executor.execute(&descriptor(HttpMethod::Get, None)).unwrap();
        assert_eq!(Value::Object(resp.data), json!({"text": "{invalid json"}));
    }

    #[test]
    fn json_array_falls_back_to_text() {
        let transport = CannedTransport::new(200, "application/json", "[1,2]");
        let executor = RequestExecutor::with_transport(ExecutorConfig::default(), transport);
        let resp = executor.execute(&descriptor(HttpMethod::Get, None)).unwrap();
        assert_eq!(resp.text(), Some("[1,2]"));
    }

    #[test]
    fn json_body_without_json_content_type_stays_text() {
        let transport = CannedTransport::new(200, "text/plain", r#"{"a":1}"#);
        let executor = RequestExecutor::with_transport(ExecutorConfig::default(), transport);
        let resp = executor.execute(&descriptor(HttpMethod::Get, None)).unwrap();
        assert_eq!(resp.text(), Some(r#"{"a":1}"#));
    }

    #[test]
    fn error_status_body_is_decoded_like_success() {
        let transport = CannedTransport::new(404, "text/plain", "not found\n");
        let executor = RequestExecutor::with_transport(ExecutorConfig::default(), transport);
        let resp = executor.execute(&descriptor(HttpMethod::Get, None)).unwrap();
        assert_eq!(resp.status, 404);
        assert_eq!(Value::Object(resp.data), json!({"text": "not found"}));
    }

    #[test]
    fn executor_sends_prepared_request() {
        let transport = CannedTransport::new(200, "application/json", "{}");
        let executor = RequestExecutor::with_transport(ExecutorConfig::default(), transport);
        executor
            .execute(&descriptor(HttpMethod::Patch, Some(json!({"x": true}))))
            .unwrap();
        let wire = executor.transport.last();
        assert_eq!(wire.method, HttpMethod::Patch);
        assert_eq!(wire.body.as_deref(), Some(br#"{"x":true}"#.as_slice()));
    }

    #[test]
    fn transport_failure_surfaces_as_network_error() {
        let executor = RequestExecutor::with_transport(ExecutorConfig::default(), FailingTransport);
        let err = executor.execute(&descriptor(HttpMethod::Get, None)).unwrap_err();
        assert_eq!(err, RequestError::Network("Connection refused".to_string()));
    }
}
