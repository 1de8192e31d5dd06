//! Methods the core answers, as `{"name": ..., "data": ...}` JSON.

use serde::{Deserialize, Serialize};

use crate::metadata::Request;
use crate::types::{Bech32Address, EvmAddress};

/// Stateless computations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "camelCase")]
pub enum UtilsMethod {
    /// Hname of a contract or entry point name. Answers a number.
    Hname {
        /// Name to hash
        name: String,
    },
    /// Encode a request. Answers the `0x` hex of the payload.
    EncodeRequest {
        /// Request to encode
        request: Request,
    },
    /// Decode a payload. Answers the request.
    DecodeRequest {
        /// `0x` hex of the payload
        payload: String,
    },
    /// Agent id of an EVM address. Answers a byte array.
    EthereumAgentId {
        /// Chain id, hex or bech32 alias address
        chain: String,
        /// EVM address
        address: EvmAddress,
    },
}

/// Calls to the ISC node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "data", rename_all = "camelCase")]
pub enum ApiMethod {
    /// Node info
    GetInfo,
    /// L2 balance of an L1 address
    GetBalance {
        /// Chain, as the node addresses it
        chain: String,
        /// L1 address
        address: Bech32Address,
    },
    /// Receipt of a processed request
    #[serde(rename_all = "camelCase")]
    GetReceipt {
        /// Chain, as the node addresses it
        chain: String,
        /// Request id
        request_id: String,
    },
    /// Gas estimate of an on-ledger request
    #[serde(rename_all = "camelCase")]
    EstimateGasOnLedger {
        /// Chain, as the node addresses it
        chain: String,
        /// Hex of the serialized output carrying the request
        output_bytes: String,
    },
    /// Gas estimate of an off-ledger request
    EstimateGasOffLedger {
        /// Chain, as the node addresses it
        chain: String,
        /// Request to estimate
        request: Request,
    },
}

/// Any method, as sent over the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MethodCall {
    /// Stateless computation
    Utils(UtilsMethod),
    /// Node call
    Api(ApiMethod),
}

impl MethodCall {
    /// Method name as it appears on the wire
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Utils(method) => match method {
                UtilsMethod::Hname { .. } => "hname",
                UtilsMethod::EncodeRequest { .. } => "encodeRequest",
                UtilsMethod::DecodeRequest { .. } => "decodeRequest",
                UtilsMethod::EthereumAgentId { .. } => "ethereumAgentId",
            },
            Self::Api(method) => match method {
                ApiMethod::GetInfo => "getInfo",
                ApiMethod::GetBalance { .. } => "getBalance",
                ApiMethod::GetReceipt { .. } => "getReceipt",
                ApiMethod::EstimateGasOnLedger { .. } => "estimateGasOnLedger",
                ApiMethod::EstimateGasOffLedger { .. } => "estimateGasOffLedger",
            },
        }
    }
}

impl From<UtilsMethod> for MethodCall {
    fn from(method: UtilsMethod) -> Self {
        Self::Utils(method)
    }
}

impl From<ApiMethod> for MethodCall {
    fn from(method: ApiMethod) -> Self {
        Self::Api(method)
    }
}
