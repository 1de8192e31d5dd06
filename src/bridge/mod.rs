//! Method dispatch between callers and the computation core.
//!
//! A [`Bridge`] serializes a [`MethodCall`], hands it to a [`Transport`],
//! and classifies the [`ResultEnvelope`] that comes back:
//!
//! | envelope | result |
//! |----------|--------|
//! | `ok`     | inner payload, unchanged |
//! | `error`  | [`Error::Domain`] with the envelope's kind and message |
//! | `panic`  | [`Error::CoreFault`]; the bridge is faulted from then on |
//! | other    | [`TransportError::Unparsed`] |

mod envelope;
mod method;
mod session;
mod transport;

pub use envelope::{Decoded, ErrorPayload, OkPayload, ResultEnvelope};
pub use method::{ApiMethod, MethodCall, UtilsMethod};
pub use session::{CoreError, CoreHandle, DESTROYED};
pub use transport::{Transport, TransportError};

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, error, warn};
use url::Url;

use crate::api::{ApiError, AssetsResponse, ReceiptResponse, WaspInfo};
use crate::metadata::{Hname, MetadataPayload, Request};
use crate::types::{Bech32Address, EvmAddress};
use crate::{Error, Result};

/// Front for a computation core behind a [`Transport`].
///
/// Safe to share between tasks; calls do not serialize on each other.
#[derive(Debug)]
pub struct Bridge<T> {
    transport: T,
    timeout: Option<Duration>,
    faulted: AtomicBool,
}

impl Bridge<CoreHandle> {
    /// Bridge to an in-process core talking to the node at `url`
    pub fn connect(url: Url) -> std::result::Result<Self, ApiError> {
        Ok(Self::new(CoreHandle::create(url)?))
    }
}

impl<T: Transport> Bridge<T> {
    /// Bridge without a timeout
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeout: None,
            faulted: AtomicBool::new(false),
        }
    }

    /// Fail calls that take longer than `timeout` with
    /// [`TransportError::TimedOut`]
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether the core reported a panic.
    ///
    /// A faulted bridge refuses further calls; recreate the core session.
    pub fn is_faulted(&self) -> bool {
        self.faulted.load(Ordering::Acquire)
    }

    /// The underlying transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one call and return the inner payload of an `ok` envelope
    pub async fn dispatch(&self, call: &MethodCall) -> Result<Value> {
        let method = call.name();
        if self.is_faulted() {
            return Err(Error::CoreFault(format!(
                "core faulted earlier, refusing {method}"
            )));
        }

        let request = serde_json::to_string(call)
            .map_err(|e| TransportError::Io(format!("cannot serialize {method}: {e}")))?;
        debug!(method, "dispatching");

        let raw = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.transport.call(&request))
                .await
                .map_err(|_| {
                    warn!(method, ?limit, "core call timed out");
                    TransportError::TimedOut
                })??,
            None => self.transport.call(&request).await?,
        };

        let decoded = Decoded::parse(&raw);
        match &decoded {
            Decoded::Panic(message) => {
                self.faulted.store(true, Ordering::Release);
                error!(method, %message, "core panicked");
            }
            Decoded::Error { kind, message } => debug!(method, %kind, %message, "domain error"),
            Decoded::Unparsed(_) => warn!(method, "response is not an envelope"),
            Decoded::Ok(_) => {}
        }
        decoded.into_result()
    }

    /// Dispatch and deserialize the payload as `R`
    pub async fn call<R: DeserializeOwned>(&self, call: impl Into<MethodCall>) -> Result<R> {
        let call = call.into();
        let value = self.dispatch(&call).await?;
        serde_json::from_value(value).map_err(|e| {
            TransportError::UnexpectedPayload(format!("{}: {e}", call.name())).into()
        })
    }

    /// Hname of `name`, computed by the core
    pub async fn hname(&self, name: &str) -> Result<Hname> {
        self.call(UtilsMethod::Hname {
            name: name.to_string(),
        })
        .await
    }

    /// Encode `request` in the core
    pub async fn encode_request(&self, request: &Request) -> Result<MetadataPayload> {
        let encoded: String = self
            .call(UtilsMethod::EncodeRequest {
                request: request.clone(),
            })
            .await?;
        let bytes = hex::decode(encoded.strip_prefix("0x").unwrap_or(&encoded))
            .map_err(|e| TransportError::UnexpectedPayload(format!("encodeRequest: {e}")))?;
        Ok(MetadataPayload::new(bytes))
    }

    /// Decode a payload in the core
    pub async fn decode_request(&self, payload: &[u8]) -> Result<Request> {
        self.call(UtilsMethod::DecodeRequest {
            payload: format!("0x{}", hex::encode(payload)),
        })
        .await
    }

    /// Agent id bytes of `address` on `chain`
    pub async fn ethereum_agent_id(&self, chain: &str, address: EvmAddress) -> Result<Vec<u8>> {
        self.call(UtilsMethod::EthereumAgentId {
            chain: chain.to_string(),
            address,
        })
        .await
    }

    /// Node info
    pub async fn get_info(&self) -> Result<WaspInfo> {
        self.call(ApiMethod::GetInfo).await
    }

    /// L2 balance of `address` on `chain`
    pub async fn get_balance(
        &self,
        chain: &str,
        address: &Bech32Address,
    ) -> Result<AssetsResponse> {
        self.call(ApiMethod::GetBalance {
            chain: chain.to_string(),
            address: address.clone(),
        })
        .await
    }

    /// Receipt of a processed request
    pub async fn get_receipt(&self, chain: &str, request_id: &str) -> Result<ReceiptResponse> {
        self.call(ApiMethod::GetReceipt {
            chain: chain.to_string(),
            request_id: request_id.to_string(),
        })
        .await
    }

    /// Gas estimate of an on-ledger request, as the node reports it
    pub async fn estimate_gas_on_ledger(
        &self,
        chain: &str,
        output_bytes: &str,
    ) -> Result<ReceiptResponse> {
        self.call(ApiMethod::EstimateGasOnLedger {
            chain: chain.to_string(),
            output_bytes: output_bytes.to_string(),
        })
        .await
    }

    /// Gas estimate of an off-ledger request
    pub async fn estimate_gas_off_ledger(
        &self,
        chain: &str,
        request: &Request,
    ) -> Result<ReceiptResponse> {
        self.call(ApiMethod::EstimateGasOffLedger {
            chain: chain.to_string(),
            request: request.clone(),
        })
        .await
    }
}
