//! Runs the blocking client on a tokio blocking pool.
//!
//! The executor itself stays synchronous. A host that must not block (UI
//! thread, async service) hands a runtime `Handle` to `BackgroundClient` and
//! gets a `JoinHandle` back; deadlines and cancellation are applied around
//! that handle by the host, e.g. with `tokio::time::timeout`.

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::client::HttpClient;
use crate::error::RequestError;
use crate::executor::{Transport, UreqTransport};
use crate::http::{RequestDescriptor, ResponseDescriptor};

#[derive(Debug, Clone)]
pub struct BackgroundClient<T = UreqTransport> {
    client: Arc<HttpClient<T>>,
    handle: Handle,
}

impl<T: Transport + 'static> BackgroundClient<T> {
    pub fn new(client: HttpClient<T>, handle: Handle) -> Self {
        Self {
            client: Arc::new(client),
            handle,
        }
    }

    /// Start `descriptor` on the blocking pool.
    pub fn spawn(&self, descriptor: RequestDescriptor) -> JoinHandle<Result<ResponseDescriptor, RequestError>> {
        let client = Arc::clone(&self.client);
        self.handle
            .spawn_blocking(move || client.executor().execute(&descriptor))
    }

    /// Run `descriptor` and wait for it. A task that panicked or was dropped
    /// with its runtime is reported as a network failure.
    pub async fn execute(&self, descriptor: RequestDescriptor) -> Result<ResponseDescriptor, RequestError> {
        self.spawn(descriptor)
            .await
            .map_err(|e| RequestError::Network(format!("request task failed: {e}")))?
    }
}
