//! Asset bundles: base tokens, native tokens and NFTs.

use indexmap::{IndexMap, IndexSet};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::metadata::codec::{Reader, Writer};
use crate::metadata::EncodingError;
use crate::types::AddressError;

/// Length of a native token id (foundry id)
pub const TOKEN_ID_LENGTH: usize = 38;

/// Length of an NFT id
pub const NFT_ID_LENGTH: usize = 32;

const BASE_TOKENS_FLAG: u8 = 0x80;
const NATIVE_TOKENS_FLAG: u8 = 0x40;
const NFTS_FLAG: u8 = 0x20;

macro_rules! fixed_id {
    ($(#[$doc:meta])* $name:ident, $len:expr) => {
        $(#[$doc])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name([u8; $len]);

        impl $name {
            /// Create from raw bytes
            #[must_use]
            pub const fn from_bytes(bytes: [u8; $len]) -> Self {
                Self(bytes)
            }

            /// Get the underlying bytes
            #[must_use]
            pub const fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            /// Hex string with 0x prefix
            #[must_use]
            pub fn to_hex(&self) -> String {
                format!("0x{}", hex::encode(self.0))
            }
        }

        impl FromStr for $name {
            type Err = AddressError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))
                    .map_err(|_| AddressError::InvalidHex)?;
                let arr: [u8; $len] =
                    bytes
                        .as_slice()
                        .try_into()
                        .map_err(|_| AddressError::InvalidLength {
                            expected: $len,
                            got: bytes.len(),
                        })?;
                Ok(Self(arr))
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                s.parse().map_err(de::Error::custom)
            }
        }
    };
}

fixed_id!(
    /// Native token (foundry) id
    TokenId,
    TOKEN_ID_LENGTH
);

fixed_id!(
    /// NFT id
    NftId,
    NFT_ID_LENGTH
);

/// A bundle of assets, used as the allowance of a request.
///
/// Native tokens and NFTs are unique by id and keep insertion order, which
/// is the order they are encoded in.
#[derive(Clone, Debug, Default)]
pub struct Assets {
    base_tokens: u64,
    native_tokens: IndexMap<TokenId, u128>,
    nfts: IndexSet<NftId>,
}

// Equal bundles encode to equal bytes, so order matters.
impl PartialEq for Assets {
    fn eq(&self, other: &Self) -> bool {
        self.base_tokens == other.base_tokens
            && self.native_tokens.iter().eq(other.native_tokens.iter())
            && self.nfts.iter().eq(other.nfts.iter())
    }
}

impl Eq for Assets {}

impl Assets {
    /// Empty bundle
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bundle holding only base tokens
    #[must_use]
    pub fn base(amount: u64) -> Self {
        Self {
            base_tokens: amount,
            ..Self::default()
        }
    }

    /// Set the base token amount
    #[must_use]
    pub fn with_base_tokens(mut self, amount: u64) -> Self {
        self.base_tokens = amount;
        self
    }

    /// Add a native token; amounts of an id already present are summed
    #[must_use]
    pub fn with_native_token(mut self, id: TokenId, amount: u128) -> Self {
        let entry = self.native_tokens.entry(id).or_insert(0);
        *entry = entry.saturating_add(amount);
        self
    }

    /// Add an NFT; adding the same id twice keeps one
    #[must_use]
    pub fn with_nft(mut self, id: NftId) -> Self {
        self.nfts.insert(id);
        self
    }

    /// Base token amount
    #[must_use]
    pub const fn base_tokens(&self) -> u64 {
        self.base_tokens
    }

    /// Native tokens in insertion order
    pub fn native_tokens(&self) -> impl Iterator<Item = (&TokenId, &u128)> {
        self.native_tokens.iter()
    }

    /// NFT ids in insertion order
    pub fn nfts(&self) -> impl Iterator<Item = &NftId> {
        self.nfts.iter()
    }

    /// True if nothing is held
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.base_tokens == 0 && self.native_tokens.is_empty() && self.nfts.is_empty()
    }

    fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.base_tokens != 0 {
            flags |= BASE_TOKENS_FLAG;
        }
        if !self.native_tokens.is_empty() {
            flags |= NATIVE_TOKENS_FLAG;
        }
        if !self.nfts.is_empty() {
            flags |= NFTS_FLAG;
        }
        flags
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        let flags = self.flags();
        w.u8(flags);
        if flags & BASE_TOKENS_FLAG != 0 {
            w.size64(self.base_tokens);
        }
        if flags & NATIVE_TOKENS_FLAG != 0 {
            w.size64(self.native_tokens.len() as u64);
            for (id, amount) in &self.native_tokens {
                w.bytes(id.as_bytes());
                w.compact_u128(*amount);
            }
        }
        if flags & NFTS_FLAG != 0 {
            w.size64(self.nfts.len() as u64);
            for id in &self.nfts {
                w.bytes(id.as_bytes());
            }
        }
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, EncodingError> {
        let flags = r.u8()?;
        let mut assets = Self::default();

        if flags & BASE_TOKENS_FLAG != 0 {
            assets.base_tokens = r.size64()?;
        }
        if flags & NATIVE_TOKENS_FLAG != 0 {
            let count = r.size64()?;
            for _ in 0..count {
                let id = TokenId::from_bytes(r.array()?);
                let amount = r.compact_u128()?;
                if assets.native_tokens.insert(id, amount).is_some() {
                    return Err(EncodingError::DuplicateAsset(id.to_hex()));
                }
            }
        }
        if flags & NFTS_FLAG != 0 {
            let count = r.size64()?;
            for _ in 0..count {
                let id = NftId::from_bytes(r.array()?);
                if !assets.nfts.insert(id) {
                    return Err(EncodingError::DuplicateAsset(id.to_hex()));
                }
            }
        }

        Ok(assets)
    }
}

/// JSON shape of [`Assets`]: amounts as 0x-prefixed hex strings
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetsJson {
    base_tokens: String,
    #[serde(default)]
    native_tokens: Vec<NativeTokenJson>,
    #[serde(default)]
    nfts: Vec<NftId>,
}

#[derive(Serialize, Deserialize)]
struct NativeTokenJson {
    id: TokenId,
    amount: String,
}

fn parse_hex_amount<T, E>(s: &str) -> Result<T, E>
where
    T: TryFrom<u128>,
    E: de::Error,
{
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let value = u128::from_str_radix(digits, 16).map_err(E::custom)?;
    T::try_from(value).map_err(|_| E::custom(format!("amount out of range: {s}")))
}

impl Serialize for Assets {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        AssetsJson {
            base_tokens: format!("0x{:x}", self.base_tokens),
            native_tokens: self
                .native_tokens
                .iter()
                .map(|(id, amount)| NativeTokenJson {
                    id: *id,
                    amount: format!("0x{amount:x}"),
                })
                .collect(),
            nfts: self.nfts.iter().copied().collect(),
        }
        .serialize(s)
    }
}

impl<'de> Deserialize<'de> for Assets {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let json = AssetsJson::deserialize(d)?;
        let mut assets = Self::base(parse_hex_amount::<u64, D::Error>(&json.base_tokens)?);
        for token in json.native_tokens {
            let amount = parse_hex_amount::<u128, D::Error>(&token.amount)?;
            assets = assets.with_native_token(token.id, amount);
        }
        for nft in json.nfts {
            assets = assets.with_nft(nft);
        }
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(byte: u8) -> TokenId {
        TokenId::from_bytes([byte; TOKEN_ID_LENGTH])
    }

    fn encode(assets: &Assets) -> Vec<u8> {
        let mut w = Writer::new();
        assets.encode(&mut w);
        w.into_inner()
    }

    #[test]
    fn test_empty_assets_is_single_flag_byte() {
        assert_eq!(encode(&Assets::new()), vec![0x00]);
        assert!(Assets::new().is_empty());
    }

    #[test]
    fn test_base_tokens_encoding() {
        assert_eq!(encode(&Assets::base(1_304_600)), vec![0x80, 0x98, 0xd0, 0x4f]);
    }

    #[test]
    fn test_native_tokens_unique_by_id() {
        let assets = Assets::new()
            .with_native_token(token(1), 10)
            .with_native_token(token(2), 5)
            .with_native_token(token(1), 15);

        let tokens: Vec<_> = assets.native_tokens().collect();
        assert_eq!(tokens, vec![(&token(1), &25), (&token(2), &5)]);
    }

    #[test]
    fn test_nfts_unique_by_id() {
        let nft = NftId::from_bytes([9; NFT_ID_LENGTH]);
        let assets = Assets::new().with_nft(nft).with_nft(nft);
        assert_eq!(assets.nfts().count(), 1);
    }

    #[test]
    fn test_decode_rejects_duplicate_nft() {
        let nft = [9u8; NFT_ID_LENGTH];
        let mut bytes = vec![NFTS_FLAG, 0x02];
        bytes.extend_from_slice(&nft);
        bytes.extend_from_slice(&nft);

        let err = Assets::decode(&mut Reader::new(&bytes)).unwrap_err();
        assert!(matches!(err, EncodingError::DuplicateAsset(_)));
    }

    #[test]
    fn test_equality_follows_order() {
        let nft = |byte| NftId::from_bytes([byte; NFT_ID_LENGTH]);
        let tokens_ab = Assets::new().with_native_token(token(1), 1).with_native_token(token(2), 2);
        let tokens_ba = Assets::new().with_native_token(token(2), 2).with_native_token(token(1), 1);
        assert_ne!(tokens_ab, tokens_ba);
        assert_ne!(encode(&tokens_ab), encode(&tokens_ba));

        let nfts_ab = Assets::new().with_nft(nft(1)).with_nft(nft(2));
        let nfts_ba = Assets::new().with_nft(nft(2)).with_nft(nft(1));
        assert_ne!(nfts_ab, nfts_ba);
        assert_eq!(nfts_ab, nfts_ab.clone());

        let decoded = Assets::decode(&mut Reader::new(&encode(&tokens_ba))).unwrap();
        assert_eq!(decoded, tokens_ba);
    }

    #[test]
    fn test_json_shape() {
        let assets = Assets::base(16).with_native_token(token(0xaa), 0x32);
        let json = serde_json::to_value(&assets).unwrap();
        assert_eq!(json["baseTokens"], "0x10");
        assert_eq!(json["nativeTokens"][0]["amount"], "0x32");
        assert_eq!(json["nfts"], serde_json::json!([]));

        let back: Assets = serde_json::from_value(json).unwrap();
        assert_eq!(back, assets);
    }

    #[test]
    fn test_token_id_parse() {
        let id: TokenId = "0x08e14c3499349cb8d2fd771e09829883e4ecfae02e6b09c9b6a0fb3c7504b4e2f40100000000"
            .parse()
            .unwrap();
        assert_eq!(id.as_bytes()[0], 0x08);
        assert!("0x08e1".parse::<TokenId>().is_err());
    }
}
