mod bitstring;
mod boolean;
mod integer;
mod null;
mod octetstring;
mod oid;
mod strings;
mod time;

pub use bitstring::BitString;
pub use oid::{Oid, OidParseError};

use crate::{Asn1DateTime, Result, Tag};
use num_bigint::BigInt;
use num_traits::ToPrimitive;

/// Semantic value decoded from (or destined for) a universal primitive
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Payload {
    Boolean(bool),
    /// INTEGER and ENUMERATED
    Integer(BigInt),
    BitString(BitString),
    OctetString(Vec<u8>),
    Null,
    Oid(Oid),
    /// All character string types
    Text(String),
    /// UTCTime instant (two-digit year text form)
    UtcTime(Asn1DateTime),
    /// GeneralizedTime instant (four-digit year text form)
    GeneralizedTime(Asn1DateTime),
    /// Identity fallback for universal tags with no dedicated codec
    Bytes(Vec<u8>),
}

impl Payload {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Payload::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<&BigInt> {
        match self {
            Payload::Integer(i) => Some(i),
            _ => None,
        }
    }

    /// Shortcut for integers that fit a machine word
    pub fn as_i64(&self) -> Option<i64> {
        self.as_integer().and_then(ToPrimitive::to_i64)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Content bytes of OCTET STRING values and identity-decoded values
    pub fn as_slice(&self) -> Option<&[u8]> {
        match self {
            Payload::OctetString(b) | Payload::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_oid(&self) -> Option<&Oid> {
        match self {
            Payload::Oid(oid) => Some(oid),
            _ => None,
        }
    }

    pub fn as_bit_string(&self) -> Option<&BitString> {
        match self {
            Payload::BitString(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&Asn1DateTime> {
        match self {
            Payload::UtcTime(t) | Payload::GeneralizedTime(t) => Some(t),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Payload::Null)
    }

    /// Content octets for this payload, independent of any tag override.
    ///
    /// Used when a value carries a non-universal tag (implicit tagging), so
    /// the codec table cannot be consulted.
    pub(crate) fn to_content_bytes(&self) -> Result<Vec<u8>> {
        match self {
            Payload::Boolean(_) => boolean::encode(self),
            Payload::Integer(_) => integer::encode(self),
            Payload::BitString(_) => bitstring::encode(self),
            Payload::OctetString(b) | Payload::Bytes(b) => Ok(b.clone()),
            Payload::Null => Ok(Vec::new()),
            Payload::Oid(_) => oid::encode(self),
            Payload::Text(s) => Ok(s.as_bytes().to_vec()),
            Payload::UtcTime(_) => time::encode_utc(self),
            Payload::GeneralizedTime(_) => time::encode_generalized(self),
        }
    }
}

impl From<BigInt> for Payload {
    fn from(i: BigInt) -> Self {
        Payload::Integer(i)
    }
}

impl From<i64> for Payload {
    fn from(i: i64) -> Self {
        Payload::Integer(BigInt::from(i))
    }
}

impl From<bool> for Payload {
    fn from(b: bool) -> Self {
        Payload::Boolean(b)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_string())
    }
}

/// Decode/encode function pair for one universal tag
#[derive(Clone, Copy, Debug)]
pub(crate) struct ValueCodec {
    pub(crate) decode: fn(&[u8]) -> Result<Payload>,
    pub(crate) encode: fn(&Payload) -> Result<Vec<u8>>,
}

const fn entry(
    decode: fn(&[u8]) -> Result<Payload>,
    encode: fn(&Payload) -> Result<Vec<u8>>,
) -> Option<ValueCodec> {
    Some(ValueCodec { decode, encode })
}

/// Value codecs indexed by universal tag number.
///
/// Reserved universal tags have no entry; the generic decoder falls back to
/// an identity byte representation for them. SEQUENCE and SET have no entry
/// either: they are handled structurally.
pub(crate) static CODECS: [Option<ValueCodec>; 31] = [
    /*  0 EndOfContent     */ None,
    /*  1 Boolean          */ entry(boolean::decode, boolean::encode),
    /*  2 Integer          */ entry(integer::decode, integer::encode),
    /*  3 BitString        */ entry(bitstring::decode, bitstring::encode),
    /*  4 OctetString      */ entry(octetstring::decode, octetstring::encode),
    /*  5 Null             */ entry(null::decode, null::encode),
    /*  6 Oid              */ entry(oid::decode, oid::encode),
    /*  7 ObjectDescriptor */ None,
    /*  8 External         */ None,
    /*  9 RealType         */ None,
    /* 10 Enumerated       */ entry(integer::decode, integer::encode),
    /* 11 EmbeddedPdv      */ None,
    /* 12 Utf8String       */ entry(strings::decode_utf8, strings::encode_utf8),
    /* 13 RelativeOid      */ None,
    /* 14                  */ None,
    /* 15                  */ None,
    /* 16 Sequence         */ None,
    /* 17 Set              */ None,
    /* 18 NumericString    */ entry(strings::decode_utf8, strings::encode_utf8),
    /* 19 PrintableString  */ entry(strings::decode_utf8, strings::encode_utf8),
    /* 20 TeletexString    */ entry(strings::decode_utf8, strings::encode_utf8),
    /* 21 VideotexString   */ entry(strings::decode_utf8, strings::encode_utf8),
    /* 22 Ia5String        */ entry(strings::decode_utf8, strings::encode_utf8),
    /* 23 UtcTime          */ entry(time::decode_utc, time::encode_utc),
    /* 24 GeneralizedTime  */ entry(time::decode_generalized, time::encode_generalized),
    /* 25 GraphicString    */ entry(strings::decode_utf8, strings::encode_utf8),
    /* 26 VisibleString    */ entry(strings::decode_utf8, strings::encode_utf8),
    /* 27 GeneralString    */ entry(strings::decode_utf8, strings::encode_utf8),
    /* 28 UniversalString  */ entry(strings::decode_universal, strings::encode_universal),
    /* 29 CharacterString  */ None,
    /* 30 BmpString        */ entry(strings::decode_bmp, strings::encode_bmp),
];

/// Look up the value codec for a universal tag, if one is defined
pub(crate) fn codec(tag: Tag) -> Option<&'static ValueCodec> {
    CODECS.get(tag.0 as usize).and_then(Option::as_ref)
}
