use super::Payload;
use crate::{Error, Result, Tag};
use num_bigint::BigInt;

/// Decode a two's-complement, most-significant-first integer.
///
/// BER does not require the minimal-length form on input, so redundant
/// leading octets are accepted.
pub(crate) fn decode(bytes: &[u8]) -> Result<Payload> {
    if bytes.is_empty() {
        return Err(Tag::Integer.invalid_value("integer must have at least one content octet"));
    }
    Ok(Payload::Integer(BigInt::from_signed_bytes_be(bytes)))
}

pub(crate) fn encode(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Integer(i) => Ok(i.to_signed_bytes_be()),
        _ => Err(Error::BerTypeError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn integer_codec() {
        assert_eq!(decode(&hex!("01")).unwrap(), Payload::Integer(1.into()));
        assert_eq!(decode(&hex!("ff")).unwrap(), Payload::Integer((-1).into()));
        assert_eq!(
            decode(&hex!("00 80")).unwrap(),
            Payload::Integer(128.into())
        );
        // redundant leading octets are tolerated on decode
        assert_eq!(
            decode(&hex!("00 00 01")).unwrap(),
            Payload::Integer(1.into())
        );
        assert!(decode(&[]).is_err());

        // minimal two's complement on encode
        assert_eq!(encode(&Payload::Integer(0.into())).unwrap(), hex!("00"));
        assert_eq!(encode(&Payload::Integer(128.into())).unwrap(), hex!("00 80"));
        assert_eq!(encode(&Payload::Integer((-129).into())).unwrap(), hex!("ff 7f"));
        assert!(encode(&Payload::Null).is_err());
    }

    #[test]
    fn integer_codec_large() {
        let input = hex!("3f c7 71 8b 0a 70 45 30 9c 5d d2 11");
        let decoded = decode(&input).unwrap();
        assert_eq!(encode(&decoded).unwrap(), input);
    }
}
