//! The request descriptor and its canonical encoding.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::codec::{Reader, Writer};
use super::{ContractIdentity, EncodingError, Hname, MetadataPayload, MAX_METADATA_LENGTH};
use crate::types::Assets;

/// A call to a contract entry point on an ISC chain.
///
/// Immutable once built. [`Request::builder`] hashes contract and entry
/// point from names; [`Request::decode`] and deserialization take the
/// numeric hnames as given. Two requests are equal exactly when they
/// encode to the same bytes, so param order counts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    #[serde(default)]
    sender_contract: ContractIdentity,
    target_contract: Hname,
    target_entry_point: Hname,
    #[serde(with = "hex_u64")]
    gas_budget: u64,
    #[serde(default)]
    params: IndexMap<String, Vec<u8>>,
    #[serde(default)]
    allowance: Assets,
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.sender_contract == other.sender_contract
            && self.target_contract == other.target_contract
            && self.target_entry_point == other.target_entry_point
            && self.gas_budget == other.gas_budget
            && self.params.iter().eq(other.params.iter())
            && self.allowance == other.allowance
    }
}

impl Eq for Request {}

impl Request {
    /// Start a request to `entry_point` of `contract`
    #[must_use]
    pub fn builder(contract: &str, entry_point: &str) -> RequestBuilder {
        RequestBuilder {
            sender_contract: ContractIdentity::Null,
            target_contract: Hname::of(contract),
            target_entry_point: Hname::of(entry_point),
            gas_budget: 0,
            params: IndexMap::new(),
            allowance: Assets::default(),
        }
    }

    /// Sender identity
    #[must_use]
    pub const fn sender_contract(&self) -> &ContractIdentity {
        &self.sender_contract
    }

    /// Target contract hname
    #[must_use]
    pub const fn target_contract(&self) -> Hname {
        self.target_contract
    }

    /// Target entry point hname
    #[must_use]
    pub const fn target_entry_point(&self) -> Hname {
        self.target_entry_point
    }

    /// Gas budget in the smallest base token unit
    #[must_use]
    pub const fn gas_budget(&self) -> u64 {
        self.gas_budget
    }

    /// Params in insertion order
    #[must_use]
    pub const fn params(&self) -> &IndexMap<String, Vec<u8>> {
        &self.params
    }

    /// Single param value
    #[must_use]
    pub fn param(&self, key: &str) -> Option<&[u8]> {
        self.params.get(key).map(Vec::as_slice)
    }

    /// Assets the target may take from the sender
    #[must_use]
    pub const fn allowance(&self) -> &Assets {
        &self.allowance
    }

    /// Encode into the payload of a metadata feature.
    ///
    /// Fails without producing anything if a param value or the whole
    /// payload exceeds [`MAX_METADATA_LENGTH`], or if the gas budget is
    /// zero or `u64::MAX`.
    pub fn encode(&self) -> Result<MetadataPayload, EncodingError> {
        // Deserialized requests skip the builder.
        if self.gas_budget == 0 {
            return Err(EncodingError::ZeroGasBudget);
        }
        // The chain stores the budget shifted by one.
        let gas = self
            .gas_budget
            .checked_add(1)
            .ok_or(EncodingError::GasBudgetOverflow)?;

        if let Some((key, value)) = self
            .params
            .iter()
            .find(|(_, value)| value.len() > MAX_METADATA_LENGTH)
        {
            return Err(EncodingError::ParamTooLarge {
                key: key.clone(),
                len: value.len(),
                max: MAX_METADATA_LENGTH,
            });
        }

        let mut w = Writer::new();
        self.sender_contract.encode(&mut w);
        w.u32_le(self.target_contract.value());
        w.u32_le(self.target_entry_point.value());
        w.size64(gas);

        w.size64(self.params.len() as u64);
        for (key, value) in &self.params {
            w.blob(key.as_bytes());
            w.blob(value);
        }

        self.allowance.encode(&mut w);

        let bytes = w.into_inner();
        if bytes.len() > MAX_METADATA_LENGTH {
            return Err(EncodingError::PayloadTooLarge {
                len: bytes.len(),
                max: MAX_METADATA_LENGTH,
            });
        }
        Ok(MetadataPayload::new(bytes))
    }

    /// Decode a payload produced by [`Request::encode`] or captured from the chain
    pub fn decode(bytes: &[u8]) -> Result<Self, EncodingError> {
        let mut r = Reader::new(bytes);

        let sender_contract = ContractIdentity::decode(&mut r)?;
        let target_contract = Hname::from_raw(r.u32_le()?);
        let target_entry_point = Hname::from_raw(r.u32_le()?);
        let gas_budget = r
            .size64()?
            .checked_sub(1)
            .ok_or(EncodingError::GasBudgetOverflow)?;

        let count = r.size64()?;
        let mut params = IndexMap::new();
        for _ in 0..count {
            let key = std::str::from_utf8(r.blob()?)
                .map_err(|_| EncodingError::InvalidUtf8)?
                .to_owned();
            let value = r.blob()?.to_vec();
            if params.contains_key(&key) {
                return Err(EncodingError::DuplicateParam(key));
            }
            params.insert(key, value);
        }

        let allowance = Assets::decode(&mut r)?;
        r.finish()?;

        Ok(Self {
            sender_contract,
            target_contract,
            target_entry_point,
            gas_budget,
            params,
            allowance,
        })
    }
}

/// One-step construction of a [`Request`].
#[derive(Clone, Debug)]
pub struct RequestBuilder {
    sender_contract: ContractIdentity,
    target_contract: Hname,
    target_entry_point: Hname,
    gas_budget: u64,
    params: IndexMap<String, Vec<u8>>,
    allowance: Assets,
}

impl RequestBuilder {
    /// Sender identity, `Null` if not set
    #[must_use]
    pub fn sender(mut self, sender: ContractIdentity) -> Self {
        self.sender_contract = sender;
        self
    }

    /// Gas budget, must be set to a non-zero value
    #[must_use]
    pub fn gas_budget(mut self, gas_budget: u64) -> Self {
        self.gas_budget = gas_budget;
        self
    }

    /// Add a param. Setting a key again replaces its value in place.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Allowance, empty if not set
    #[must_use]
    pub fn allowance(mut self, allowance: Assets) -> Self {
        self.allowance = allowance;
        self
    }

    /// Finish the request
    pub fn build(self) -> Result<Request, EncodingError> {
        if self.gas_budget == 0 {
            return Err(EncodingError::ZeroGasBudget);
        }
        Ok(Request {
            sender_contract: self.sender_contract,
            target_contract: self.target_contract,
            target_entry_point: self.target_entry_point,
            gas_budget: self.gas_budget,
            params: self.params,
            allowance: self.allowance,
        })
    }
}

/// `u64` as a `0x`-prefixed hex string
mod hex_u64 {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &u64, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&format!("0x{value:x}"))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<u64, D::Error> {
        let s = String::deserialize(d)?;
        u64::from_str_radix(s.strip_prefix("0x").unwrap_or(&s), 16).map_err(de::Error::custom)
    }
}
