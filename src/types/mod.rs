//! Value types shared by the codec, the call constructor and the API client.

mod address;
mod assets;

pub use address::{
    AddressError, AddressKind, Bech32Address, ChainId, EvmAddress, CHAIN_ID_LENGTH,
    EVM_ADDRESS_LENGTH,
};
pub use assets::{Assets, NftId, TokenId, NFT_ID_LENGTH, TOKEN_ID_LENGTH};
