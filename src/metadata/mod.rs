//! Request metadata: the binary payload an L1 output carries to an ISC chain.
//!
//! - [`hname()`]: 32-bit handles for contract and entry point names
//! - [`ContractIdentity`]: sender of a request
//! - [`Request`]: the call descriptor, built once by [`RequestBuilder`]
//! - [`derive_agent_id`]: chain-scoped agent id for an EVM address

mod agent_id;
pub(crate) mod codec;
mod hname;
mod identity;
mod request;

pub use agent_id::{derive_agent_id, AgentId, ETHEREUM_AGENT_KIND};
pub use hname::{core_contracts, hname, Hname};
pub use identity::ContractIdentity;
pub use request::{Request, RequestBuilder};

use std::fmt;

/// Largest payload the chain accepts in a metadata feature
pub const MAX_METADATA_LENGTH: usize = 8192;

/// Encoded request bytes, ready to be attached to an output.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MetadataPayload(Vec<u8>);

impl MetadataPayload {
    pub(crate) fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Raw bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Never true for a payload produced by [`Request::encode`]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Hex rendering with `0x` prefix
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(&self.0))
    }

    /// Take the bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl fmt::Debug for MetadataPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MetadataPayload({})", self.to_hex())
    }
}

impl fmt::Display for MetadataPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl AsRef<[u8]> for MetadataPayload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Errors encoding or decoding request metadata
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodingError {
    /// A parameter value is larger than a metadata feature can hold
    #[error("param {key:?} is {len} bytes, max {max}")]
    ParamTooLarge {
        /// Param key
        key: String,
        /// Value length
        len: usize,
        /// Bound
        max: usize,
    },
    /// The encoded request is larger than a metadata feature can hold
    #[error("payload is {len} bytes, max {max}")]
    PayloadTooLarge {
        /// Encoded length
        len: usize,
        /// Bound
        max: usize,
    },
    /// `gas_budget + 1` does not fit in 64 bits
    #[error("gas budget does not fit the chain's integer width")]
    GasBudgetOverflow,
    /// Requests must carry gas
    #[error("gas budget must be greater than zero")]
    ZeroGasBudget,
    /// Input ended inside a field
    #[error("unexpected end of input at offset {offset}, needed {needed} bytes")]
    UnexpectedEnd {
        /// Offset of the field
        offset: usize,
        /// Bytes the field needs
        needed: usize,
    },
    /// Sender identity kind byte is not known
    #[error("invalid contract identity kind: {0}")]
    InvalidIdentityKind(u8),
    /// Param key is not UTF-8
    #[error("param key is not valid UTF-8")]
    InvalidUtf8,
    /// Varint longer than 64 bits
    #[error("size64 value overflows u64")]
    Size64Overflow,
    /// Native token amount wider than 128 bits
    #[error("native token amount overflows u128")]
    AmountOverflow,
    /// Native token or NFT listed twice
    #[error("duplicate asset id: {0}")]
    DuplicateAsset(String),
    /// Param key listed twice
    #[error("duplicate param key: {0:?}")]
    DuplicateParam(String),
    /// Bytes left after the allowance
    #[error("{0} trailing bytes after request")]
    TrailingBytes(usize),
}
