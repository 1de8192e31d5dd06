//! Result envelopes returned by the core.
//!
//! ```json
//! {"type":"ok","payload":{"type":"getInfo","payload":{...}}}
//! {"type":"error","payload":{"type":"client","error":"no healthy node available"}}
//! {"type":"panic","payload":"Api was destroyed"}
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::Error;

use super::TransportError;

/// One response of the core, as it travels over the transport.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum ResultEnvelope {
    /// The method succeeded
    Ok(OkPayload),
    /// The method failed in its domain
    Error(ErrorPayload),
    /// The core itself faulted
    Panic(String),
}

/// Payload of an `ok` envelope
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OkPayload {
    /// Method that produced the value
    #[serde(rename = "type")]
    pub kind: String,
    /// The value
    #[serde(default)]
    pub payload: Value,
}

/// Payload of an `error` envelope
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Domain tag, e.g. `client`
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable message
    pub error: String,
}

impl ResultEnvelope {
    /// Success of `method`
    #[must_use]
    pub fn ok(method: &str, payload: Value) -> Self {
        Self::Ok(OkPayload {
            kind: method.to_string(),
            payload,
        })
    }

    /// Domain failure
    #[must_use]
    pub fn error(kind: &str, error: impl Into<String>) -> Self {
        Self::Error(ErrorPayload {
            kind: kind.to_string(),
            error: error.into(),
        })
    }

    /// Render for the transport
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"panic","payload":"unserializable response: {e}"}}"#)
        })
    }
}

/// A raw response, classified once.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// Inner payload of an `ok` envelope
    Ok(Value),
    /// Domain error
    Error {
        /// Domain tag
        kind: String,
        /// Human-readable message
        message: String,
    },
    /// Core fault
    Panic(String),
    /// Not an envelope at all
    Unparsed(String),
}

impl Decoded {
    /// Classify a raw response
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<ResultEnvelope>(raw) {
            Ok(ResultEnvelope::Ok(ok)) => Self::Ok(ok.payload),
            Ok(ResultEnvelope::Error(e)) => Self::Error {
                kind: e.kind,
                message: e.error,
            },
            Ok(ResultEnvelope::Panic(message)) => Self::Panic(message),
            Err(_) => Self::Unparsed(raw.to_string()),
        }
    }

    /// The payload, or the error the envelope stands for
    pub fn into_result(self) -> crate::Result<Value> {
        match self {
            Self::Ok(value) => Ok(value),
            Self::Error { kind, message } => Err(Error::Domain { kind, message }),
            Self::Panic(message) => Err(Error::CoreFault(message)),
            Self::Unparsed(raw) => Err(Error::Transport(TransportError::Unparsed(raw))),
        }
    }
}
