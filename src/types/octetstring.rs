use super::Payload;
use crate::{Error, Result};

pub(crate) fn decode(bytes: &[u8]) -> Result<Payload> {
    Ok(Payload::OctetString(bytes.to_vec()))
}

pub(crate) fn encode(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::OctetString(b) | Payload::Bytes(b) => Ok(b.clone()),
        _ => Err(Error::BerTypeError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn octetstring_codec() {
        assert_eq!(
            decode(b"AAAAA").unwrap(),
            Payload::OctetString(b"AAAAA".to_vec())
        );
        assert_eq!(decode(&[]).unwrap(), Payload::OctetString(Vec::new()));
        assert_eq!(
            encode(&Payload::OctetString(vec![1, 2])).unwrap(),
            vec![1, 2]
        );
    }
}
