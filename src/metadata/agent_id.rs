//! Agent ids for EVM accounts on an ISC chain.

use std::fmt;

use crate::types::{AddressError, ChainId, EvmAddress, CHAIN_ID_LENGTH, EVM_ADDRESS_LENGTH};

/// Agent id kind byte of an EVM account
pub const ETHEREUM_AGENT_KIND: u8 = 3;

const AGENT_ID_LENGTH: usize = 1 + CHAIN_ID_LENGTH + EVM_ADDRESS_LENGTH;

/// An EVM account scoped to one chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct AgentId {
    chain: ChainId,
    address: EvmAddress,
}

impl AgentId {
    /// Agent id of `address` on `chain`
    #[must_use]
    pub const fn ethereum(chain: ChainId, address: EvmAddress) -> Self {
        Self { chain, address }
    }

    /// Chain the account lives on
    #[must_use]
    pub const fn chain(&self) -> &ChainId {
        &self.chain
    }

    /// EVM address of the account
    #[must_use]
    pub const fn address(&self) -> &EvmAddress {
        &self.address
    }

    /// `[3] ++ chain id ++ address`
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(AGENT_ID_LENGTH);
        bytes.push(ETHEREUM_AGENT_KIND);
        bytes.extend_from_slice(self.chain.as_bytes());
        bytes.extend_from_slice(self.address.as_bytes());
        bytes
    }

    /// Parse the bytes produced by [`AgentId::to_bytes`]
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != AGENT_ID_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: AGENT_ID_LENGTH,
                got: bytes.len(),
            });
        }
        if bytes[0] != ETHEREUM_AGENT_KIND {
            return Err(AddressError::UnexpectedKind(bytes[0]));
        }

        let (chain, address) = bytes[1..].split_at(CHAIN_ID_LENGTH);
        let mut chain_bytes = [0u8; CHAIN_ID_LENGTH];
        chain_bytes.copy_from_slice(chain);
        Ok(Self {
            chain: ChainId::from_bytes(chain_bytes),
            address: EvmAddress::from_slice(address)?,
        })
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({}@{})", self.address, self.chain)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.address, self.chain)
    }
}

/// Agent id bytes for a 20-byte EVM `address` on the chain `chain_id`.
///
/// `chain_id` is either 64 hex characters (with or without `0x`) or the
/// chain's bech32 alias address.
pub fn derive_agent_id(chain_id: &str, address: &[u8]) -> crate::Result<Vec<u8>> {
    let chain = ChainId::parse(chain_id)?;
    let address = EvmAddress::from_slice(address)?;
    Ok(AgentId::ethereum(chain, address).to_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use proptest::prelude::*;

    const CHAIN_HEX: &str = "e14c3499349cb8d2fd771e09829883e4ecfae02e6b09c9b6a0fb3c7504b4e2f4";
    const TESTNET_CHAIN: &str = "rms1ppp00k5mmd2m8my8ukkp58nd3rskw6rx8l09aj35984k74uuc5u2cywn3ex";

    #[test]
    fn test_layout() {
        let address = [0xab; 20];
        let id = derive_agent_id(CHAIN_HEX, &address).unwrap();

        assert_eq!(id.len(), 53);
        assert_eq!(id[0], ETHEREUM_AGENT_KIND);
        assert_eq!(hex::encode(&id[1..33]), CHAIN_HEX);
        assert_eq!(&id[33..], &address);
    }

    #[test]
    fn test_hex_prefix_and_bech32_chain() {
        let address = [1u8; 20];
        assert_eq!(
            derive_agent_id(&format!("0x{CHAIN_HEX}"), &address).unwrap(),
            derive_agent_id(CHAIN_HEX, &address).unwrap()
        );

        let id = derive_agent_id(TESTNET_CHAIN, &address).unwrap();
        assert_eq!(
            hex::encode(&id[1..33]),
            "42f7da9bdb55b3ec87e5ac1a1e6d88e16768663fde5eca3429eb6f579cc538ac"
        );
    }

    #[test]
    fn test_invalid_inputs() {
        assert!(matches!(
            derive_agent_id(CHAIN_HEX, &[0u8; 19]),
            Err(Error::InvalidAddress(AddressError::InvalidLength { got: 19, .. }))
        ));
        assert!(matches!(
            derive_agent_id("not a chain", &[0u8; 20]),
            Err(Error::InvalidAddress(_))
        ));
    }

    proptest! {
        #[test]
        fn test_distinct_addresses_distinct_ids(a in any::<[u8; 20]>(), b in any::<[u8; 20]>()) {
            prop_assume!(a != b);
            prop_assert_ne!(
                derive_agent_id(CHAIN_HEX, &a).unwrap(),
                derive_agent_id(CHAIN_HEX, &b).unwrap()
            );
        }
    }

    #[test]
    fn test_from_bytes_roundtrip() {
        let id = AgentId::ethereum(
            ChainId::parse(CHAIN_HEX).unwrap(),
            EvmAddress::from_bytes([7; 20]),
        );
        assert_eq!(AgentId::from_bytes(&id.to_bytes()).unwrap(), id);
        assert!(AgentId::from_bytes(&[0u8; 53]).is_err());
    }
}
