//! Sender identity of a request.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use super::codec::{Reader, Writer};
use super::{EncodingError, Hname};
use crate::types::EvmAddress;

const NULL_KIND: u8 = 0;
const HNAME_KIND: u8 = 1;
const EVM_KIND: u8 = 2;

/// Who is sending a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ContractIdentity {
    /// No sender contract (plain L1 deposit)
    #[default]
    Null,
    /// An ISC contract, by hname
    Account(Hname),
    /// An EVM contract
    Ethereum(EvmAddress),
}

impl ContractIdentity {
    /// Kind byte on the wire
    #[must_use]
    pub const fn kind(&self) -> u8 {
        match self {
            Self::Null => NULL_KIND,
            Self::Account(_) => HNAME_KIND,
            Self::Ethereum(_) => EVM_KIND,
        }
    }

    pub(crate) fn encode(&self, w: &mut Writer) {
        w.u8(self.kind());
        match self {
            Self::Null => {}
            Self::Account(h) => w.u32_le(h.value()),
            Self::Ethereum(address) => w.bytes(address.as_bytes()),
        }
    }

    pub(crate) fn decode(r: &mut Reader<'_>) -> Result<Self, EncodingError> {
        match r.u8()? {
            NULL_KIND => Ok(Self::Null),
            HNAME_KIND => Ok(Self::Account(Hname::from_raw(r.u32_le()?))),
            EVM_KIND => Ok(Self::Ethereum(EvmAddress::from_bytes(r.array()?))),
            k => Err(EncodingError::InvalidIdentityKind(k)),
        }
    }

    /// Packed bytes of this identity alone
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        self.encode(&mut w);
        w.into_inner()
    }
}

// JSON form is the hex of the packed bytes, e.g. `"00"` for `Null`.
impl Serialize for ContractIdentity {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(self.to_bytes()))
    }
}

impl<'de> Deserialize<'de> for ContractIdentity {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        let bytes = hex::decode(s.trim_start_matches("0x")).map_err(de::Error::custom)?;
        let mut r = Reader::new(&bytes);
        let identity = Self::decode(&mut r).map_err(de::Error::custom)?;
        r.finish().map_err(de::Error::custom)?;
        Ok(identity)
    }
}
