//! Hnames: 32-bit on-chain handles for contract and entry point names.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use std::fmt;

type Blake2b256 = Blake2b<U32>;

/// Hash a name into its hname: the first 4 bytes of BLAKE2b-256 over the
/// UTF-8 bytes, read little-endian.
#[must_use]
pub fn hname(name: &str) -> u32 {
    let digest = Blake2b256::digest(name.as_bytes());
    u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]])
}

/// Numeric on-chain identifier of a contract or entry point.
///
/// Built from a name with [`Hname::of`]. Decoded payloads and deserialized
/// requests carry the numeric value as given, since the name behind it is
/// not recoverable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Hname(u32);

impl Hname {
    /// Hash a contract or entry point name
    #[must_use]
    pub fn of(name: &str) -> Self {
        Self(hname(name))
    }

    pub(crate) const fn from_raw(value: u32) -> Self {
        Self(value)
    }

    /// The numeric value
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl From<Hname> for u32 {
    fn from(h: Hname) -> Self {
        h.0
    }
}

impl fmt::Debug for Hname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Hname({:08x})", self.0)
    }
}

impl fmt::Display for Hname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}", self.0)
    }
}

/// Core contracts deployed on every chain, and the entry points this crate calls.
pub mod core_contracts {
    /// Chain initialization and registry of deployed contracts
    pub const ROOT: &str = "root";
    /// On-chain ledger of accounts
    pub const ACCOUNTS: &str = "accounts";
    /// Registry of binary objects of arbitrary size
    pub const BLOB: &str = "blob";
    /// Blocks and receipts of processed requests
    pub const BLOCK_LOG: &str = "blocklog";
    /// Committee rotation, fees and other chain configuration
    pub const GOVERNANCE: &str = "governance";
    /// Error code templates referenced by receipts
    pub const ERRORS: &str = "errors";
    /// Ethereum transaction execution
    pub const EVM: &str = "evm";

    /// `accounts` entry points
    pub mod accounts {
        /// Credit the attached tokens to the sender's L2 account
        pub const DEPOSIT: &str = "deposit";
        /// Move the allowance to the agent given in param `a`
        pub const TRANSFER_ALLOWANCE_TO: &str = "transferAllowanceTo";
        /// Send the allowance back to the sender on L1
        pub const WITHDRAW: &str = "withdraw";
        /// Param key carrying the target agent id
        pub const PARAM_AGENT_ID: &str = "a";
    }
}
