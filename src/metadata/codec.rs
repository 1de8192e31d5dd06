//! Low-level byte codec shared by the request metadata types.
//!
//! Integers follow the chain's serializer: hnames are fixed-width
//! little-endian, counts and token amounts use `size64` (7 bits per byte,
//! `0x80` marks a continuation byte), and native token amounts use a compact
//! big-endian form (one length byte, then the value without leading zeroes).

use super::EncodingError;

/// Append-only output buffer
#[derive(Debug, Default)]
pub(crate) struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub(crate) fn u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub(crate) fn bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn size64(&mut self, mut value: u64) {
        loop {
            let mut byte = (value & 0x7f) as u8;
            value >>= 7;
            if value != 0 {
                byte |= 0x80;
            }
            self.buf.push(byte);
            if value == 0 {
                break;
            }
        }
    }

    /// Length-prefixed byte string
    pub(crate) fn blob(&mut self, bytes: &[u8]) {
        self.size64(bytes.len() as u64);
        self.bytes(bytes);
    }

    pub(crate) fn compact_u128(&mut self, value: u128) {
        let be = value.to_be_bytes();
        let first = be.iter().position(|&b| b != 0).unwrap_or(be.len());
        self.u8((be.len() - first) as u8);
        self.bytes(&be[first..]);
    }

    pub(crate) fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an encoded payload
#[derive(Debug)]
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) const fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn take(&mut self, len: usize) -> Result<&'a [u8], EncodingError> {
        if self.remaining() < len {
            return Err(EncodingError::UnexpectedEnd {
                offset: self.pos,
                needed: len,
            });
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub(crate) fn array<const N: usize>(&mut self) -> Result<[u8; N], EncodingError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8, EncodingError> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u32_le(&mut self) -> Result<u32, EncodingError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub(crate) fn size64(&mut self) -> Result<u64, EncodingError> {
        let mut value: u64 = 0;
        for shift in (0..64).step_by(7) {
            let byte = self.u8()?;
            let chunk = u64::from(byte & 0x7f);
            if shift == 63 && chunk > 1 {
                return Err(EncodingError::Size64Overflow);
            }
            value |= chunk << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(EncodingError::Size64Overflow)
    }

    /// Length prefix that must fit in the remaining input
    pub(crate) fn length(&mut self) -> Result<usize, EncodingError> {
        let len = self.size64()?;
        usize::try_from(len)
            .ok()
            .filter(|&len| len <= self.remaining())
            .ok_or(EncodingError::UnexpectedEnd {
                offset: self.pos,
                needed: len.try_into().unwrap_or(usize::MAX),
            })
    }

    pub(crate) fn blob(&mut self) -> Result<&'a [u8], EncodingError> {
        let len = self.length()?;
        self.take(len)
    }

    pub(crate) fn compact_u128(&mut self) -> Result<u128, EncodingError> {
        let len = usize::from(self.u8()?);
        let bytes = self.take(len)?;
        let significant = bytes.iter().skip_while(|&&b| b == 0).count();
        if significant > 16 {
            return Err(EncodingError::AmountOverflow);
        }

        let mut be = [0u8; 16];
        be[16 - significant..].copy_from_slice(&bytes[len - significant..]);
        Ok(u128::from_be_bytes(be))
    }

    pub(crate) fn finish(self) -> Result<(), EncodingError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(EncodingError::TrailingBytes(n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size64(value: u64) -> Vec<u8> {
        let mut w = Writer::new();
        w.size64(value);
        w.into_inner()
    }

    #[test]
    fn test_size64_known_values() {
        assert_eq!(size64(0), vec![0x00]);
        assert_eq!(size64(127), vec![0x7f]);
        assert_eq!(size64(128), vec![0x80, 0x01]);
        assert_eq!(size64(10_001), vec![0x91, 0x4e]);
        assert_eq!(size64(1_304_600), vec![0x98, 0xd0, 0x4f]);
        assert_eq!(size64(u64::MAX).len(), 10);
    }

    #[test]
    fn test_size64_decode() {
        for value in [0, 1, 127, 128, 16_383, 16_384, 10_001, u64::MAX] {
            let bytes = size64(value);
            let mut r = Reader::new(&bytes);
            assert_eq!(r.size64().unwrap(), value);
            r.finish().unwrap();
        }
    }

    #[test]
    fn test_size64_rejects_overlong() {
        let bytes = [0xff; 11];
        assert_eq!(
            Reader::new(&bytes).size64().unwrap_err(),
            EncodingError::Size64Overflow
        );
    }

    #[test]
    fn test_compact_amount() {
        let mut w = Writer::new();
        w.compact_u128(50);
        w.compact_u128(0);
        w.compact_u128(0x0102_0304);
        let bytes = w.into_inner();
        assert_eq!(bytes, vec![0x01, 0x32, 0x00, 0x04, 0x01, 0x02, 0x03, 0x04]);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.compact_u128().unwrap(), 50);
        assert_eq!(r.compact_u128().unwrap(), 0);
        assert_eq!(r.compact_u128().unwrap(), 0x0102_0304);
    }

    #[test]
    fn test_compact_amount_too_wide() {
        let mut bytes = vec![17u8];
        bytes.extend_from_slice(&[0xff; 17]);
        assert_eq!(
            Reader::new(&bytes).compact_u128().unwrap_err(),
            EncodingError::AmountOverflow
        );
    }

    #[test]
    fn test_truncated_input() {
        let mut r = Reader::new(&[0x01, 0x02]);
        assert!(matches!(
            r.u32_le().unwrap_err(),
            EncodingError::UnexpectedEnd { offset: 0, needed: 4 }
        ));
    }
}
