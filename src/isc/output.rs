//! L1 basic outputs carrying a request, and their storage deposit.

use serde::{Deserialize, Serialize};

use crate::metadata::MetadataPayload;
use crate::types::Bech32Address;

// Output id (34) is weighted as key, block id (32) plus milestone index and
// timestamp (4 + 4) as data.
const OFFSET_KEY_BYTES: u64 = 34;
const OFFSET_DATA_BYTES: u64 = 40;

/// Storage deposit parameters of the L1 network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentStructure {
    /// Base tokens per virtual byte
    #[serde(alias = "vByteCost")]
    pub v_byte_cost: u32,
    /// Weight of data bytes
    #[serde(alias = "vByteFactorData")]
    pub v_byte_factor_data: u8,
    /// Weight of key bytes
    #[serde(alias = "vByteFactorKey")]
    pub v_byte_factor_key: u8,
}

impl Default for RentStructure {
    /// Shimmer testnet parameters
    fn default() -> Self {
        Self {
            v_byte_cost: 100,
            v_byte_factor_data: 1,
            v_byte_factor_key: 10,
        }
    }
}

impl RentStructure {
    /// Smallest amount an output of `packed_len` bytes must hold
    #[must_use]
    pub fn minimum_deposit(&self, packed_len: usize) -> u64 {
        let data = u64::from(self.v_byte_factor_data);
        let key = u64::from(self.v_byte_factor_key);
        let v_bytes = (packed_len as u64)
            .saturating_mul(data)
            .saturating_add(OFFSET_KEY_BYTES * key)
            .saturating_add(OFFSET_DATA_BYTES * data);
        u64::from(self.v_byte_cost).saturating_mul(v_bytes)
    }
}

/// A basic output sending tokens and a request to a chain.
///
/// One address unlock condition (the chain), a sender feature and a
/// metadata feature; no native tokens.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BasicOutputSpec {
    amount: u64,
    chain_address: Bech32Address,
    sender: Bech32Address,
    metadata: MetadataPayload,
}

impl BasicOutputSpec {
    /// Describe the output
    #[must_use]
    pub const fn new(
        amount: u64,
        chain_address: Bech32Address,
        sender: Bech32Address,
        metadata: MetadataPayload,
    ) -> Self {
        Self {
            amount,
            chain_address,
            sender,
            metadata,
        }
    }

    /// Base tokens held by the output
    #[must_use]
    pub const fn amount(&self) -> u64 {
        self.amount
    }

    /// Address of the address unlock condition
    #[must_use]
    pub const fn chain_address(&self) -> &Bech32Address {
        &self.chain_address
    }

    /// Address of the sender feature
    #[must_use]
    pub const fn sender(&self) -> &Bech32Address {
        &self.sender
    }

    /// Payload of the metadata feature
    #[must_use]
    pub const fn metadata(&self) -> &MetadataPayload {
        &self.metadata
    }
}

/// Serialized size of a basic output with a metadata feature of `metadata_len` bytes
#[must_use]
pub fn packed_len(metadata_len: usize) -> usize {
    let address = Bech32Address::PACKED_LENGTH;
    1 // output kind
        + 8 // amount
        + 1 // native token count
        + 1 // unlock condition count
        + 1 + address // address unlock condition
        + 1 // feature count
        + 1 + address // sender feature
        + 1 + 2 + metadata_len // metadata feature, u16 length prefix
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packed_len() {
        assert_eq!(packed_len(0), 83);
        assert_eq!(packed_len(16), 99);
    }

    #[test]
    fn test_minimum_deposit_testnet() {
        let rent = RentStructure::default();
        // 100 * (99 + 340 + 40)
        assert_eq!(rent.minimum_deposit(99), 47_900);
        assert!(rent.minimum_deposit(100) > rent.minimum_deposit(99));
    }

    #[test]
    fn test_rent_structure_accepts_node_field_names() {
        let rent: RentStructure =
            serde_json::from_str(r#"{"vByteCost":500,"vByteFactorData":1,"vByteFactorKey":10}"#)
                .unwrap();
        assert_eq!(rent.v_byte_cost, 500);

        let toml_rent: RentStructure =
            toml::from_str("v_byte_cost = 100\nv_byte_factor_data = 1\nv_byte_factor_key = 10")
                .unwrap();
        assert_eq!(toml_rent, RentStructure::default());
    }
}
