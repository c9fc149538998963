//! Validated request data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Values produced by request validation, one slot per request field.
///
/// A slot is `None` when the route declares no schema for that field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRequest {
    /// Validated path parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Validated query parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queries: Option<Value>,
    /// Validated headers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<Value>,
    /// Validated body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}
