//! Generic HTTP request capability for an application host.
//!
//! # Overview
//! A caller describes a request (URL, method, headers, optional JSON body),
//! the executor performs one blocking round trip, and a response descriptor
//! comes back with the status, the headers and a content-negotiated `data`
//! map.
//!
//! # Design
//! - `RequestExecutor` is stateless; `execute` is split into a pure
//!   `prepare`, a `Transport` round trip and a pure `interpret`, so the I/O
//!   boundary is explicit and tests can swap the transport.
//! - `HttpClient` exposes `get`, `post` and `request`; `bridge` wraps them in
//!   the JSON payload and rejection shape a plugin host expects.
//! - The executor never spawns threads. `dispatch::BackgroundClient` moves a
//!   call onto a tokio blocking pool when the host needs that.

pub mod bridge;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod executor;
pub mod http;

pub use bridge::{HttpOptions, PluginBridge, Rejection};
pub use client::HttpClient;
pub use config::{BodyDecoding, ExecutorConfig};
pub use dispatch::BackgroundClient;
pub use error::RequestError;
pub use executor::{RawResponse, RequestExecutor, Transport, UreqTransport, WireRequest};
pub use http::{Headers, HttpMethod, RequestBuilder, RequestDescriptor, ResponseDescriptor};
