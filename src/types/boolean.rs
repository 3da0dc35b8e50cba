use super::Payload;
use crate::{Error, Result, Tag};

pub(crate) fn decode(bytes: &[u8]) -> Result<Payload> {
    match bytes {
        // any non-zero octet encodes TRUE (X.690: 8.2.2)
        [b] => Ok(Payload::Boolean(*b != 0)),
        _ => Err(Tag::Boolean.invalid_value("boolean value must be exactly one octet")),
    }
}

pub(crate) fn encode(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Boolean(true) => Ok(vec![0xff]),
        Payload::Boolean(false) => Ok(vec![0x00]),
        _ => Err(Error::BerTypeError),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boolean_codec() {
        assert_eq!(decode(&[0x00]).unwrap(), Payload::Boolean(false));
        assert_eq!(decode(&[0xff]).unwrap(), Payload::Boolean(true));
        // any non-zero value is true
        assert_eq!(decode(&[0x7f]).unwrap(), Payload::Boolean(true));
        assert!(decode(&[]).is_err());
        assert!(decode(&[0, 0]).is_err());

        assert_eq!(encode(&Payload::Boolean(true)).unwrap(), vec![0xff]);
        assert_eq!(encode(&Payload::Boolean(false)).unwrap(), vec![0x00]);
        assert!(encode(&Payload::Null).is_err());
    }
}
