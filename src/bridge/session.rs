//! The in-process computation core.
//!
//! Answers serialized [`MethodCall`]s with serialized [`ResultEnvelope`]s.
//! Utility methods run inline, node calls run on a spawned task; a panic in
//! either becomes a `panic` envelope instead of unwinding into the caller.

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;

use super::envelope::ResultEnvelope;
use super::method::{ApiMethod, MethodCall, UtilsMethod};
use super::transport::{Transport, TransportError};
use crate::api::{Api, ApiError};
use crate::metadata::{AgentId, EncodingError, Request};
use crate::types::{AddressError, ChainId};

/// Message of the panic envelope answered after [`CoreHandle::destroy`]
pub const DESTROYED: &str = "Api was destroyed";

/// Failures of a method, rendered as `error` envelopes
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// Node request failed
    #[error("{0}")]
    Client(#[from] ApiError),
    /// Request could not be encoded or decoded
    #[error("{0}")]
    Encoding(#[from] EncodingError),
    /// Malformed hex payload
    #[error("invalid hex payload: {0}")]
    Hex(#[from] hex::FromHexError),
    /// Malformed address or chain id
    #[error("{0}")]
    InvalidAddress(#[from] AddressError),
    /// Method call or result is not valid JSON for its type
    #[error("{0}")]
    SerdeJson(#[from] serde_json::Error),
}

impl CoreError {
    /// Stable `type` tag of the error envelope
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Client(_) => "client",
            Self::Encoding(_) | Self::Hex(_) => "encoding",
            Self::InvalidAddress(_) => "invalidAddress",
            Self::SerdeJson(_) => "serdeJson",
        }
    }
}

/// Opaque session with the core.
///
/// Clones share the session. After [`destroy`](Self::destroy) node calls
/// are answered with a `panic` envelope; utility methods keep working since
/// they hold no session state.
#[derive(Clone)]
pub struct CoreHandle {
    api: Arc<RwLock<Option<Api>>>,
}

impl std::fmt::Debug for CoreHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreHandle").finish_non_exhaustive()
    }
}

impl CoreHandle {
    /// Open a session against the node at `url`
    pub fn create(url: Url) -> Result<Self, ApiError> {
        Ok(Self::from_api(Api::new(url)?))
    }

    /// Open a session with an existing client
    #[must_use]
    pub fn from_api(api: Api) -> Self {
        Self {
            api: Arc::new(RwLock::new(Some(api))),
        }
    }

    /// Close the session
    pub async fn destroy(&self) {
        *self.api.write().await = None;
        debug!("core session destroyed");
    }

    /// Whether [`destroy`](Self::destroy) was called
    pub async fn is_destroyed(&self) -> bool {
        self.api.read().await.is_none()
    }

    /// Answer one serialized method call with a serialized envelope
    pub async fn call_method(&self, request: &str) -> String {
        let call = match serde_json::from_str::<MethodCall>(request) {
            Ok(call) => call,
            Err(e) => return error_envelope(&CoreError::from(e)).to_json(),
        };
        let name = call.name();

        let envelope = match call {
            MethodCall::Utils(method) => {
                debug!(method = name, "utils method");
                call_utils_method(name, method)
            }
            MethodCall::Api(method) => {
                debug!(method = name, "api method");
                // Read lock only long enough to take a client clone.
                let api = self.api.read().await.clone();
                match api {
                    Some(api) => call_api_method(name, api, method).await,
                    None => ResultEnvelope::Panic(DESTROYED.to_string()),
                }
            }
        };

        debug!(method = name, response = ?envelope, "core response");
        envelope.to_json()
    }
}

#[async_trait]
impl Transport for CoreHandle {
    async fn call(&self, request: &str) -> Result<String, TransportError> {
        Ok(self.call_method(request).await)
    }
}

fn call_utils_method(name: &str, method: UtilsMethod) -> ResultEnvelope {
    match catch_unwind(AssertUnwindSafe(|| utils_method_internal(method))) {
        Ok(result) => into_envelope(name, result),
        Err(panic) => ResultEnvelope::Panic(panic_message(panic.as_ref())),
    }
}

async fn call_api_method(name: &str, api: Api, method: ApiMethod) -> ResultEnvelope {
    let task = tokio::spawn(async move { api_method_internal(&api, method).await });
    match task.await {
        Ok(result) => into_envelope(name, result),
        Err(e) if e.is_panic() => ResultEnvelope::Panic(panic_message(e.into_panic().as_ref())),
        Err(e) => ResultEnvelope::Panic(e.to_string()),
    }
}

fn utils_method_internal(method: UtilsMethod) -> Result<Value, CoreError> {
    match method {
        UtilsMethod::Hname { name } => to_value(crate::metadata::hname(&name)),
        UtilsMethod::EncodeRequest { request } => to_value(request.encode()?.to_hex()),
        UtilsMethod::DecodeRequest { payload } => {
            let bytes = hex::decode(payload.strip_prefix("0x").unwrap_or(&payload))?;
            to_value(Request::decode(&bytes)?)
        }
        UtilsMethod::EthereumAgentId { chain, address } => {
            let chain = ChainId::parse(&chain)?;
            to_value(AgentId::ethereum(chain, address).to_bytes())
        }
    }
}

async fn api_method_internal(api: &Api, method: ApiMethod) -> Result<Value, CoreError> {
    match method {
        ApiMethod::GetInfo => to_value(api.info().await?),
        ApiMethod::GetBalance { chain, address } => {
            to_value(api.get_balance(&chain, &address).await?)
        }
        ApiMethod::GetReceipt { chain, request_id } => {
            to_value(api.get_receipt(&chain, &request_id).await?)
        }
        ApiMethod::EstimateGasOnLedger {
            chain,
            output_bytes,
        } => to_value(api.estimate_gas_on_ledger(&chain, &output_bytes).await?),
        ApiMethod::EstimateGasOffLedger { chain, request } => {
            to_value(api.estimate_gas_off_ledger(&chain, &request).await?)
        }
    }
}

fn to_value<T: Serialize>(value: T) -> Result<Value, CoreError> {
    Ok(serde_json::to_value(value)?)
}

fn into_envelope(name: &str, result: Result<Value, CoreError>) -> ResultEnvelope {
    match result {
        Ok(value) => ResultEnvelope::ok(name, value),
        Err(e) => error_envelope(&e),
    }
}

fn error_envelope(e: &CoreError) -> ResultEnvelope {
    ResultEnvelope::error(e.kind(), e.to_string())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "core panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::spawn_stub_node;
    use serde_json::json;

    fn offline() -> CoreHandle {
        CoreHandle::create(Url::parse("http://127.0.0.1:1").unwrap()).unwrap()
    }

    async fn call(core: &CoreHandle, request: Value) -> Value {
        serde_json::from_str(&core.call_method(&request.to_string()).await).unwrap()
    }

    #[tokio::test]
    async fn test_hname() {
        let request = json!({ "name": "hname", "data": { "name": "accounts" } });
        let response = call(&offline(), request).await;
        assert_eq!(
            response,
            json!({ "type": "ok", "payload": { "type": "hname", "payload": 1_011_572_226u32 } })
        );
    }

    #[tokio::test]
    async fn test_decode_request_error_kinds() {
        let core = offline();

        let request = json!({ "name": "decodeRequest", "data": { "payload": "0x00" } });
        let response = call(&core, request).await;
        assert_eq!(response["type"], "error");
        assert_eq!(response["payload"]["type"], "encoding");

        let request = json!({ "name": "decodeRequest", "data": { "payload": "0xzz" } });
        let response = call(&core, request).await;
        assert_eq!(response["payload"]["type"], "encoding");

        let request = json!({
            "name": "ethereumAgentId",
            "data": { "chain": "abc", "address": "0x1074000000000000000000000000000000000000" }
        });
        let response = call(&core, request).await;
        assert_eq!(response["payload"]["type"], "invalidAddress");

        let response = call(&core, json!({ "name": "nope" })).await;
        assert_eq!(response["payload"]["type"], "serdeJson");
    }

    #[tokio::test]
    async fn test_api_method_against_node() {
        let core = CoreHandle::create(spawn_stub_node().await).unwrap();
        let response = call(&core, json!({ "name": "getInfo" })).await;

        assert_eq!(response["type"], "ok");
        assert_eq!(response["payload"]["type"], "getInfo");
        assert_eq!(response["payload"]["payload"]["l1Params"]["protocol"]["bech32Hrp"], "rms");
    }

    #[tokio::test]
    async fn test_unreachable_node_is_client_error() {
        let response = call(&offline(), json!({ "name": "getInfo" })).await;
        assert_eq!(response["type"], "error");
        assert_eq!(response["payload"]["type"], "client");
    }

    #[tokio::test]
    async fn test_destroyed_session_panics() {
        let core = offline();
        let other = core.clone();
        core.destroy().await;

        assert!(other.is_destroyed().await);
        let response = call(&other, json!({ "name": "getInfo" })).await;
        assert_eq!(response, json!({ "type": "panic", "payload": DESTROYED }));

        let response = call(&other, json!({ "name": "hname", "data": { "name": "" } })).await;
        assert_eq!(response["type"], "ok");
    }

    #[test]
    fn test_panic_message() {
        let panic = catch_unwind(|| panic!("boom")).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "boom");

        let panic = catch_unwind(|| panic!("{} {}", "formatted", 1)).unwrap_err();
        assert_eq!(panic_message(panic.as_ref()), "formatted 1");
    }
}
