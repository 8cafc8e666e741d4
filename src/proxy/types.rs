//! Request and response bodies exchanged with callers and the upstream.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::UpstreamConfig;

/// Chat request as sent by the browser.
///
/// Every field stays an opaque JSON value so it is forwarded exactly as
/// received; a wrongly typed field is the provider's problem, not ours.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub model: Option<Value>,
    pub messages: Option<Value>,
    pub temperature: Option<Value>,
    pub max_tokens: Option<Value>,
}

/// Payload sent to the completion API, built fresh for every call.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpstreamRequest {
    pub model: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Value>,
    pub temperature: Value,
    pub max_tokens: Value,
}

impl ChatRequest {
    /// Parse an inbound body.
    ///
    /// Any JSON value is accepted except `null`, which has no fields to read.
    /// Non-object bodies carry no fields, so everything is defaulted.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        match serde_json::from_slice::<Value>(body)? {
            Value::Null => Err(serde::de::Error::custom(
                "request body is null, expected a JSON object",
            )),
            Value::Object(mut fields) => Ok(Self {
                model: take_set(&mut fields, "model"),
                // `null` messages are forwarded as null, absent ones are left out.
                messages: fields.remove("messages"),
                temperature: take_set(&mut fields, "temperature"),
                max_tokens: take_set(&mut fields, "max_tokens"),
            }),
            _ => Ok(Self::default()),
        }
    }

    /// Fill in the configured defaults for every field the caller left out.
    pub fn into_upstream(self, upstream: &UpstreamConfig) -> UpstreamRequest {
        UpstreamRequest {
            model: self
                .model
                .unwrap_or_else(|| Value::from(upstream.default_model.clone())),
            messages: self.messages,
            temperature: self
                .temperature
                .unwrap_or_else(|| Value::from(upstream.default_temperature)),
            max_tokens: self
                .max_tokens
                .unwrap_or_else(|| Value::from(upstream.default_max_tokens)),
        }
    }
}

/// Remove `name` from the object, treating `null` as absent.
fn take_set(fields: &mut Map<String, Value>, name: &str) -> Option<Value> {
    fields.remove(name).filter(|value| !value.is_null())
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub message: &'static str,
}

impl HealthStatus {
    pub const OK: HealthStatus = HealthStatus {
        status: "ok",
        message: "Wolf server is running!",
    };
}

/// JSON error body: `{"error": "..."}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
