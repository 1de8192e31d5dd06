//! Payloads returned by the ISC node REST API.

use serde::{Deserialize, Serialize};

use super::ApiError;
use crate::isc::RentStructure;

/// `GET /v1/node/info`
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WaspInfo {
    /// Peering endpoint of the node
    pub peering_url: String,
    /// Parameters of the L1 network the node follows
    pub l1_params: L1Params,
    /// Node public key
    #[serde(default)]
    pub public_key: String,
    /// Node software version
    pub version: String,
}

/// L1 network parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct L1Params {
    /// Protocol parameters
    pub protocol: Protocol,
    /// Largest block payload
    pub max_payload_size: u32,
    /// Base token description
    pub base_token: BaseToken,
}

/// L1 protocol parameters
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Protocol {
    /// Storage deposit parameters
    pub rent_structure: RentStructure,
    /// Minimum proof-of-work score
    #[serde(default)]
    pub min_pow_score: u32,
    /// Total supply, decimal string
    pub token_supply: String,
    /// Network name, e.g. `testnet`
    pub network_name: String,
    /// Max depth for tips
    #[serde(default)]
    pub below_max_depth: u32,
    /// Protocol version
    pub version: u32,
    /// Human readable part of L1 addresses
    pub bech32_hrp: String,
}

/// Base token description
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseToken {
    /// Token unit, e.g. `SMR`
    pub unit: String,
    /// Decimal places of the unit
    pub decimals: u32,
    /// Token name
    pub name: String,
    /// Ticker
    pub ticker_symbol: String,
    /// Subunit name
    #[serde(default)]
    pub subunit: String,
    /// Whether amounts use metric prefixes
    #[serde(default)]
    pub use_metric_prefix: bool,
}

/// L2 balance of an account
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetsResponse {
    /// Base tokens, decimal string
    pub base_tokens: String,
    /// Native token balances
    #[serde(default)]
    pub native_tokens: Vec<NativeTokenBalance>,
}

impl AssetsResponse {
    /// Base tokens as a number
    pub fn base_tokens(&self) -> Result<u64, ApiError> {
        self.base_tokens.parse().map_err(|_| {
            ApiError::Decode(format!("invalid base token amount: {}", self.base_tokens))
        })
    }
}

/// One native token balance
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeTokenBalance {
    /// Token id, hex
    pub id: String,
    /// Amount, hex or decimal string as the node renders it
    pub amount: String,
}

/// Receipt of a processed (or simulated) request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptResponse {
    /// The request as the chain saw it
    pub request: ReceiptRequest,
    /// Error code and params, if the request failed
    pub raw_error: Option<NodeError>,
    /// Rendered error, if the request failed
    pub error_message: Option<String>,
    /// Gas budget, decimal string
    pub gas_budget: String,
    /// Gas burned, decimal string
    pub gas_burned: String,
    /// Fee charged for the gas burned, decimal string
    pub gas_fee_charged: String,
    /// Storage deposit charged, decimal string
    pub storage_deposit_charged: String,
    /// Block the request landed in
    pub block_index: u32,
    /// Index of the request within the block
    pub request_index: u16,
    /// Per-operation gas breakdown
    pub gas_burn_log: Vec<GasBurned>,
}

impl ReceiptResponse {
    /// True if the chain rejected the request
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.raw_error.is_some() || self.error_message.as_deref().is_some_and(|m| !m.is_empty())
    }

    /// Fee charged as a number
    pub fn gas_fee_charged(&self) -> Result<u64, ApiError> {
        self.gas_fee_charged
            .parse()
            .map_err(|_| ApiError::Decode(format!("invalid gas fee: {}", self.gas_fee_charged)))
    }
}

/// Request details inside a receipt
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptRequest {
    /// Request id (output id for on-ledger requests)
    pub request_id: String,
    /// Sender agent id
    pub sender_account: String,
    /// Target contract and function
    pub call_target: CallTarget,
    /// Gas budget, decimal string
    pub gas_budget: String,
    /// Whether the request came through the EVM
    #[serde(rename = "isEVM")]
    pub is_evm: bool,
    /// Whether the request was sent off-ledger
    pub is_off_ledger: bool,
    /// Params by key, as byte arrays
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// Target of a request, hnames as hex strings
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CallTarget {
    /// Contract hname
    #[serde(rename = "contractHName")]
    pub contract_hname: String,
    /// Entry point hname
    #[serde(rename = "functionHName")]
    pub function_hname: String,
}

/// Error carried by a receipt
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeError {
    /// Error code
    pub code: String,
    /// Message params
    pub params: Vec<String>,
}

/// Gas burned by one operation
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GasBurned {
    /// Operation code
    pub code: u16,
    /// Gas burned
    pub gas_burned: u64,
}
