//! # ISC Bridge
//!
//! Request metadata codec and method dispatch bridge for IOTA Smart
//! Contracts (ISC) chains.
//!
//! ## Architecture
//!
//! - **Metadata**: canonical binary payload of a request to an on-chain
//!   entry point, hnames, and agent ids
//! - **Bridge**: typed method calls to a computation core behind a
//!   transport, with a stable error taxonomy for `ok | error | panic`
//!   envelopes
//! - **ISC calls**: deposit and withdraw requests, L1 output sizing with
//!   storage deposit accounting, and submission through a ledger client
//! - **API**: the chain node's REST surface, served through the bridge
//!
//! ## Example
//!
//! ```
//! use isc_bridge::metadata::{core_contracts::{accounts, ACCOUNTS}, Request};
//! use isc_bridge::types::Assets;
//!
//! let request = Request::builder(ACCOUNTS, accounts::WITHDRAW)
//!     .gas_budget(10_000)
//!     .allowance(Assets::base(1_304_600))
//!     .build()?;
//! assert_eq!(request.encode()?.to_hex(), "0x00025e4b3c410fcc9d914e008098d04f");
//! # Ok::<(), isc_bridge::Error>(())
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::all, rust_2018_idioms)]
#![warn(clippy::pedantic, clippy::nursery, missing_docs)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::future_not_send,
    clippy::too_many_lines,
    clippy::too_many_arguments,
    // Amounts and lengths on the wire are bounded
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::missing_const_for_fn,
    clippy::unused_self,
    clippy::must_use_candidate,
    clippy::needless_pass_by_value,
    // Field naming matches domain terminology
    clippy::struct_field_names,
    clippy::match_same_arms
)]

pub mod api;
pub mod bridge;
pub mod config;
pub mod error;
pub mod isc;
pub mod ledger;
pub mod logger;
pub mod metadata;
pub mod types;

pub use bridge::{Bridge, CoreHandle, MethodCall, Transport, TransportError};
pub use config::NetworkConfig;
pub use error::{Error, Result};
pub use isc::{CallKind, IscCallBuilder, PreparedOutput};
pub use ledger::{BlockId, LedgerClient, TransactionId};
pub use metadata::{derive_agent_id, hname, ContractIdentity, Hname, MetadataPayload, Request};
pub use types::{Assets, Bech32Address, ChainId, EvmAddress};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Alias address of the public Shimmer EVM testnet chain
pub const TESTNET_CHAIN_ADDRESS: &str =
    "rms1ppp00k5mmd2m8my8ukkp58nd3rskw6rx8l09aj35984k74uuc5u2cywn3ex";

/// ISC node serving the testnet chain
pub const DEFAULT_WASP_URL: &str = "https://archive.evm.testnet.shimmer.network";

/// Minimum gas fee in base token units (0.0001 SMR)
pub const MIN_GAS_FEE: u64 = 100;

/// Gas budget of constructed requests, as a multiple of [`MIN_GAS_FEE`]
pub const GAS_BUDGET_MULTIPLIER: u64 = 100;

/// ISC magic contract on the EVM side
pub const ISC_MAGIC_ADDRESS: &str = "0x1074000000000000000000000000000000000000";

/// ERC20 view of the chain's base tokens
pub const ISC_ERC20BASETOKENS_ADDRESS: &str = "0x1074010000000000000000000000000000000000";

/// ERC721 view of L1 NFTs
pub const ISC_ERC721_ADDRESS: &str = "0x1074030000000000000000000000000000000000";
