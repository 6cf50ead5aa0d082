//! Executor configuration.
//!
//! Hosts usually hand configuration over as a JSON blob, so `ExecutorConfig`
//! is a serde type where every field has a default.

use serde::{Deserialize, Serialize};

/// How the response body bytes become the `text` the executor works with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyDecoding {
    /// Split into lines, trim each line and concatenate without separators.
    /// Embedded newlines and leading/trailing whitespace per line are lost;
    /// existing consumers rely on this shape.
    #[default]
    LineJoined,
    /// Keep the decoded text untouched.
    Raw,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub body_decoding: BodyDecoding,
    /// Append GET `data` members to the query string instead of dropping them.
    pub get_data_as_query: bool,
    pub user_agent: Option<String>,
}

impl ExecutorConfig {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
