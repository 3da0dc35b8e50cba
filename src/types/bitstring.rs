use super::Payload;
use crate::{Error, Result, Tag};
use bitvec::order::Msb0;
use bitvec::slice::BitSlice;
use bitvec::vec::BitVec;

/// ASN.1 `BIT STRING` type
///
/// This object owns its data (one copy is made during decoding). Internally,
/// it relies on [`BitVec`].
///
/// Use [`BitString::as_bitslice`] to access content and
/// [`BitString::as_mut_bitslice`] to modify content.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct BitString {
    bitvec: BitVec<u8, Msb0>,
}

impl BitString {
    /// Build a new `BitString` from content octets and a count of unused
    /// trailing bits.
    ///
    /// `unused_bits` must be in `0..=7` and must not exceed the number of
    /// bits in `s`.
    pub fn new(unused_bits: u8, s: &[u8]) -> Result<Self> {
        if unused_bits > 7 {
            return Err(Tag::BitString.invalid_value("unused bits must be in 0..=7"));
        }
        let mut bitvec = BitVec::from_slice(s);
        let new_len = bitvec
            .len()
            .checked_sub(usize::from(unused_bits))
            .ok_or_else(|| Tag::BitString.invalid_value("unused bits exceed data length"))?;
        bitvec.truncate(new_len);
        Ok(BitString { bitvec })
    }

    /// Gets the length of the `BitString` (number of bits)
    pub fn len(&self) -> usize {
        self.bitvec.len()
    }

    /// Tests if the `BitString` is empty
    pub fn is_empty(&self) -> bool {
        self.bitvec.is_empty()
    }

    /// Test if bit `bitnum` is set
    ///
    /// Return false if bit is not set, or if index is outside range.
    pub fn is_set(&self, bitnum: usize) -> bool {
        self.as_bitslice()
            .get(bitnum)
            .map(|bitref| bitref == true)
            .unwrap_or(false)
    }

    /// Return a shared `BitSlice` over the object data.
    pub fn as_bitslice(&self) -> &BitSlice<u8, Msb0> {
        self.bitvec.as_bitslice()
    }

    /// Return a mutable `BitSlice` over the object data.
    pub fn as_mut_bitslice(&mut self) -> &mut BitSlice<u8, Msb0> {
        self.bitvec.as_mut_bitslice()
    }

    /// Number of trailing bits of the final content octet that carry no data
    pub fn unused_bits(&self) -> u8 {
        ((8 - self.bitvec.len() % 8) % 8) as u8
    }

    /// Content octets in wire layout: unused-bits count followed by the data,
    /// with unused trailing bits cleared
    pub(crate) fn to_content_bytes(&self) -> Vec<u8> {
        let bits = self.bitvec.len();
        let nbytes = (bits + 7) / 8;
        let mut data = self.bitvec.as_raw_slice()[..nbytes].to_vec();
        let unused = (8 - bits % 8) % 8;
        if unused > 0 {
            if let Some(last) = data.last_mut() {
                *last &= 0xffu8 << unused;
            }
        }
        let mut out = Vec::with_capacity(1 + data.len());
        out.push(unused as u8);
        out.extend_from_slice(&data);
        out
    }
}

impl From<&BitSlice<u8, Msb0>> for BitString {
    fn from(slice: &BitSlice<u8, Msb0>) -> Self {
        let bitvec = BitVec::from_bitslice(slice);
        Self { bitvec }
    }
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Payload> {
    match bytes.split_first() {
        None => Err(Tag::BitString.invalid_value("missing unused-bits octet")),
        Some((&unused, data)) => {
            if unused > 7 {
                return Err(Tag::BitString.invalid_value("invalid unused bits"));
            }
            BitString::new(unused, data).map(Payload::BitString)
        }
    }
}

pub(crate) fn encode(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::BitString(bs) => Ok(bs.to_content_bytes()),
        _ => Err(Error::BerTypeError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn bitstring_codec() {
        let input = hex!("06 6e 5d c0");
        let decoded = decode(&input).expect("decoding failed");
        let bs = decoded.as_bit_string().expect("not a bit string");
        assert_eq!(bs.unused_bits(), 6);
        assert_eq!(bs.len(), 18);
        assert!(bs.is_set(0));
        assert!(!bs.is_set(1));
        assert!(!bs.is_set(1000));
        assert_eq!(encode(&decoded).unwrap(), input);

        // unused bits out of range
        assert!(decode(&hex!("08 6e")).is_err());
        // empty content
        assert!(decode(&[]).is_err());
        // unused bits with no data octets
        assert!(decode(&hex!("03")).is_err());
        // empty bit string
        let decoded = decode(&hex!("00")).expect("decoding failed");
        assert!(decoded.as_bit_string().unwrap().is_empty());
    }

    #[test]
    fn bitstring_new_bounds() {
        assert!(BitString::new(8, &[0xff]).is_err());
        assert!(BitString::new(1, &[]).is_err());
        let bs = BitString::new(0, &[0xaa]).unwrap();
        assert_eq!(bs.len(), 8);
    }

    #[test]
    fn bitstring_encode_masks_unused() {
        // unused trailing bits are cleared on encode
        let bs = BitString::new(6, &hex!("6e 5d ff")).unwrap();
        assert_eq!(
            encode(&Payload::BitString(bs)).unwrap(),
            hex!("06 6e 5d c0")
        );
    }
}
