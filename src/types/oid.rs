use super::Payload;
use crate::{Error, Result, Tag};
use core::fmt;
use core::str::FromStr;
use displaydoc::Display;
use thiserror::Error;

/// An error for OID building and parsing functions.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Error)]
pub enum OidParseError {
    /// Encoded data length too short
    TooShort,
    /** Signalizes that the first or second component is too large.
     * The first component must be 0, 1 or 2; the second must be
     * less than 40 when the first is 0 or 1.
     */
    FirstComponentsTooLarge,
    /// Component is not a valid integer
    ParseIntError,
}

/// Object identifier (OID): a sequence of nonnegative integer arcs.
///
/// The value is stored in its X.690 content encoding (8.19): the first octet
/// sequence carries `40·arc1 + arc2`, subsequent arcs use base-128 with
/// high-bit continuation. An example in string representation is
/// `"1.2.840.113549.1.1.5"`.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Oid {
    bytes: Vec<u8>,
}

impl Oid {
    /// Create an OID from the encoded content octets, validating them
    pub fn new(bytes: Vec<u8>) -> Result<Self> {
        validate_content(&bytes)?;
        Ok(Oid { bytes })
    }

    /// Build an OID from an array of object identifier components.
    pub fn from_arcs(arcs: &[u64]) -> core::result::Result<Oid, OidParseError> {
        if arcs.len() < 2 {
            return Err(OidParseError::TooShort);
        }
        if arcs[0] > 2 || (arcs[0] < 2 && arcs[1] >= 40) {
            return Err(OidParseError::FirstComponentsTooLarge);
        }
        // the folded leading sub-identifier must itself fit u64
        let first = arcs[0]
            .checked_mul(40)
            .and_then(|x| x.checked_add(arcs[1]))
            .ok_or(OidParseError::FirstComponentsTooLarge)?;
        let mut bytes = Vec::new();
        push_base128(&mut bytes, first);
        for &arc in &arcs[2..] {
            push_base128(&mut bytes, arc);
        }
        Ok(Oid { bytes })
    }

    /// The encoded content octets
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// The arcs of this OID, in order
    pub fn arcs(&self) -> Vec<u64> {
        let mut out = Vec::new();
        let mut cur: u64 = 0;
        let mut first = true;
        for &b in &self.bytes {
            cur = (cur << 7) | u64::from(b & 0x7f);
            if b & 0x80 == 0 {
                if first {
                    // X.690 8.19.4: the leading sub-identifier folds the
                    // first two arcs together
                    if cur < 40 {
                        out.push(0);
                        out.push(cur);
                    } else if cur < 80 {
                        out.push(1);
                        out.push(cur - 40);
                    } else {
                        out.push(2);
                        out.push(cur - 80);
                    }
                    first = false;
                } else {
                    out.push(cur);
                }
                cur = 0;
            }
        }
        out
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let arcs = self.arcs();
        for (i, arc) in arcs.iter().enumerate() {
            if i > 0 {
                write!(f, ".")?;
            }
            write!(f, "{}", arc)?;
        }
        Ok(())
    }
}

impl FromStr for Oid {
    type Err = OidParseError;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        let arcs = s
            .split('.')
            .map(u64::from_str)
            .collect::<core::result::Result<Vec<_>, _>>()
            .map_err(|_| OidParseError::ParseIntError)?;
        Oid::from_arcs(&arcs)
    }
}

fn push_base128(out: &mut Vec<u8>, arc: u64) {
    let bit_count = 64 - arc.leading_zeros();
    let octets_needed = ((bit_count + 6) / 7).max(1);
    for i in 0..octets_needed {
        let flag = if i == octets_needed - 1 { 0 } else { 1 << 7 };
        out.push(((arc >> (7 * (octets_needed - 1 - i))) & 0b111_1111) as u8 | flag);
    }
}

fn validate_content(bytes: &[u8]) -> Result<()> {
    if bytes.is_empty() {
        return Err(Tag::Oid.invalid_value("empty OBJECT IDENTIFIER"));
    }
    let mut cur: u64 = 0;
    let mut in_subid = false;
    for &b in bytes {
        if cur & 0xfe00_0000_0000_0000 != 0 {
            // sub-identifier does not fit u64
            return Err(Error::IntegerTooLarge);
        }
        cur = (cur << 7) | u64::from(b & 0x7f);
        in_subid = b & 0x80 != 0;
        if !in_subid {
            cur = 0;
        }
    }
    if in_subid {
        return Err(Tag::Oid.invalid_value("truncated sub-identifier"));
    }
    Ok(())
}

pub(crate) fn decode(bytes: &[u8]) -> Result<Payload> {
    Oid::new(bytes.to_vec()).map(Payload::Oid)
}

pub(crate) fn encode(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Oid(oid) => Ok(oid.as_bytes().to_vec()),
        _ => Err(Error::BerTypeError),
    }
}
