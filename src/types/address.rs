//! Addresses on both sides of the bridge.
//!
//! - [`EvmAddress`]: 20-byte account on the chain's EVM side
//! - [`ChainId`]: 32-byte alias id identifying an ISC chain
//! - [`Bech32Address`]: L1 (Stardust) address, e.g. `rms1...`

use bech32::{Bech32, Hrp};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Length of an EVM address in bytes
pub const EVM_ADDRESS_LENGTH: usize = 20;

/// Length of a chain id (alias id) in bytes
pub const CHAIN_ID_LENGTH: usize = 32;

/// An account address on the EVM side of a chain.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EvmAddress([u8; EVM_ADDRESS_LENGTH]);

impl EvmAddress {
    /// The zero address
    pub const ZERO: Self = Self([0u8; EVM_ADDRESS_LENGTH]);

    /// Create an address from raw bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; EVM_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create an address from a slice that must be exactly 20 bytes long
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let arr: [u8; EVM_ADDRESS_LENGTH] = bytes
            .try_into()
            .map_err(|_| AddressError::InvalidLength {
                expected: EVM_ADDRESS_LENGTH,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    /// Get the underlying bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; EVM_ADDRESS_LENGTH] {
        &self.0
    }

    /// Convert to hex string with 0x prefix
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parse from hex string (with or without 0x prefix, any case)
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let bytes = decode_hex(s)?;
        Self::from_slice(&bytes)
    }

    /// Check if this is the zero address
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; EVM_ADDRESS_LENGTH]
    }
}

impl fmt::Debug for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EvmAddress({})", self.to_hex())
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for EvmAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for EvmAddress {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for EvmAddress {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::from_hex(&s).map_err(de::Error::custom)
    }
}

/// Identifier of an ISC chain: the id of the alias output anchoring it on L1.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId([u8; CHAIN_ID_LENGTH]);

impl ChainId {
    /// Create a chain id from raw bytes
    #[must_use]
    pub const fn from_bytes(bytes: [u8; CHAIN_ID_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Get the underlying bytes
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; CHAIN_ID_LENGTH] {
        &self.0
    }

    /// Hex string without prefix, as the node API expects it
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Parse a chain id given either as 64 hex characters or as the
    /// bech32 chain address (an alias address).
    pub fn parse(s: &str) -> Result<Self, AddressError> {
        let s = s.trim();
        if let Ok(address) = s.parse::<Bech32Address>() {
            return Self::try_from(&address);
        }

        let bytes = decode_hex(s)?;
        let arr: [u8; CHAIN_ID_LENGTH] =
            bytes
                .as_slice()
                .try_into()
                .map_err(|_| AddressError::InvalidLength {
                    expected: CHAIN_ID_LENGTH,
                    got: bytes.len(),
                })?;
        Ok(Self(arr))
    }
}

impl TryFrom<&Bech32Address> for ChainId {
    type Error = AddressError;

    fn try_from(address: &Bech32Address) -> Result<Self, Self::Error> {
        match address.kind() {
            AddressKind::Alias => Ok(Self(*address.as_bytes())),
            other => Err(AddressError::UnexpectedKind(other as u8)),
        }
    }
}

impl fmt::Debug for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChainId(0x{})", self.to_hex())
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for ChainId {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Kind byte of a Stardust address
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AddressKind {
    /// Key-controlled address
    Ed25519 = 0,
    /// Alias output (ISC chains live behind one)
    Alias = 8,
    /// NFT output
    Nft = 16,
}

impl TryFrom<u8> for AddressKind {
    type Error = AddressError;

    fn try_from(kind: u8) -> Result<Self, Self::Error> {
        match kind {
            0 => Ok(Self::Ed25519),
            8 => Ok(Self::Alias),
            16 => Ok(Self::Nft),
            k => Err(AddressError::UnexpectedKind(k)),
        }
    }
}

/// A bech32-encoded L1 address.
///
/// Packed form is the kind byte followed by 32 bytes, which is also what the
/// bech32 data part carries.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Bech32Address {
    hrp: Hrp,
    kind: AddressKind,
    bytes: [u8; 32],
}

impl Bech32Address {
    /// Length of a packed address (kind byte + 32 bytes)
    pub const PACKED_LENGTH: usize = 33;

    /// Build an address from its parts
    pub fn new(hrp: &str, kind: AddressKind, bytes: [u8; 32]) -> Result<Self, AddressError> {
        let hrp = Hrp::parse(hrp).map_err(|e| AddressError::InvalidBech32(e.to_string()))?;
        Ok(Self { hrp, kind, bytes })
    }

    /// Human readable part, e.g. `rms`
    #[must_use]
    pub fn hrp(&self) -> String {
        self.hrp.to_string()
    }

    /// Address kind
    #[must_use]
    pub const fn kind(&self) -> AddressKind {
        self.kind
    }

    /// The 32 address bytes (without kind)
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.bytes
    }

    /// Kind byte followed by the address bytes
    #[must_use]
    pub fn packed(&self) -> Vec<u8> {
        let mut packed = Vec::with_capacity(Self::PACKED_LENGTH);
        packed.push(self.kind as u8);
        packed.extend_from_slice(&self.bytes);
        packed
    }
}

impl FromStr for Bech32Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hrp, data) =
            bech32::decode(s).map_err(|e| AddressError::InvalidBech32(e.to_string()))?;
        if data.len() != Self::PACKED_LENGTH {
            return Err(AddressError::InvalidLength {
                expected: Self::PACKED_LENGTH,
                got: data.len(),
            });
        }

        let kind = AddressKind::try_from(data[0])?;
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&data[1..]);
        Ok(Self { hrp, kind, bytes })
    }
}

impl fmt::Display for Bech32Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded =
            bech32::encode::<Bech32>(self.hrp, &self.packed()).map_err(|_| fmt::Error)?;
        f.write_str(&encoded)
    }
}

impl fmt::Debug for Bech32Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Bech32Address({self})")
    }
}

impl Serialize for Bech32Address {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Bech32Address {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(de::Error::custom)
    }
}

fn decode_hex(s: &str) -> Result<Vec<u8>, AddressError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|_| AddressError::InvalidHex)
}

/// Address parsing errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AddressError {
    /// Invalid hex encoding
    #[error("invalid hex encoding")]
    InvalidHex,
    /// Invalid byte length
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength {
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },
    /// Bech32 decoding failed
    #[error("invalid bech32 address: {0}")]
    InvalidBech32(String),
    /// Address kind is unknown or not allowed here
    #[error("unexpected address kind: {0}")]
    UnexpectedKind(u8),
}
