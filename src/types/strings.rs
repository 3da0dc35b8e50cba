use super::Payload;
use crate::{Error, Result};

/// Decoder for the UTF-8-compatible string types (UTF8String and the
/// ASCII-subset alphabets).
///
/// Per-alphabet validation is not performed; only well-formed UTF-8 is
/// required so the value can be exposed as text.
pub(crate) fn decode_utf8(bytes: &[u8]) -> Result<Payload> {
    let s = core::str::from_utf8(bytes)?;
    Ok(Payload::Text(s.to_string()))
}

pub(crate) fn encode_utf8(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Text(s) => Ok(s.as_bytes().to_vec()),
        _ => Err(Error::BerTypeError),
    }
}

/// BMPString: UCS-2 big-endian
pub(crate) fn decode_bmp(bytes: &[u8]) -> Result<Payload> {
    if bytes.len() % 2 != 0 {
        return Err(Error::StringInvalidCharset);
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|c| u16::from_be_bytes([c[0], c[1]]))
        .collect();
    let s = String::from_utf16(&units)?;
    Ok(Payload::Text(s))
}

pub(crate) fn encode_bmp(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Text(s) => Ok(s.encode_utf16().flat_map(u16::to_be_bytes).collect()),
        _ => Err(Error::BerTypeError),
    }
}

/// UniversalString: UCS-4 big-endian
pub(crate) fn decode_universal(bytes: &[u8]) -> Result<Payload> {
    if bytes.len() % 4 != 0 {
        return Err(Error::StringInvalidCharset);
    }
    let s = bytes
        .chunks_exact(4)
        .map(|c| {
            let cp = u32::from_be_bytes([c[0], c[1], c[2], c[3]]);
            char::from_u32(cp).ok_or(Error::StringInvalidCharset)
        })
        .collect::<Result<String>>()?;
    Ok(Payload::Text(s))
}

pub(crate) fn encode_universal(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Text(s) => Ok(s.chars().flat_map(|c| (c as u32).to_be_bytes()).collect()),
        _ => Err(Error::BerTypeError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn utf8_codec() {
        let decoded = decode_utf8(b"abc  ").expect("decoding failed");
        assert_eq!(decoded.as_str(), Some("abc  "));
        assert_eq!(encode_utf8(&decoded).unwrap(), b"abc  ");
        // invalid UTF-8
        assert!(decode_utf8(&hex!("c3 28")).is_err());
    }

    #[test]
    fn bmp_codec() {
        // "User" as UCS-2
        let input = hex!("00 55 00 73 00 65 00 72");
        let decoded = decode_bmp(&input).expect("decoding failed");
        assert_eq!(decoded.as_str(), Some("User"));
        assert_eq!(encode_bmp(&decoded).unwrap(), input);
        // odd length
        assert!(decode_bmp(&hex!("00 55 00")).is_err());
    }

    #[test]
    fn universal_codec() {
        let input = hex!("00 00 00 61 00 00 00 62");
        let decoded = decode_universal(&input).expect("decoding failed");
        assert_eq!(decoded.as_str(), Some("ab"));
        assert_eq!(encode_universal(&decoded).unwrap(), input);
        assert!(decode_universal(&hex!("00 00 61")).is_err());
        // surrogate code point
        assert!(decode_universal(&hex!("00 00 d8 00")).is_err());
    }
}
