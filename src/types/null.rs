use super::Payload;
use crate::{Error, Result, Tag};

pub(crate) fn decode(bytes: &[u8]) -> Result<Payload> {
    if bytes.is_empty() {
        Ok(Payload::Null)
    } else {
        Err(Tag::Null.invalid_value("unexpected content octets"))
    }
}

pub(crate) fn encode(payload: &Payload) -> Result<Vec<u8>> {
    match payload {
        Payload::Null => Ok(Vec::new()),
        _ => Err(Error::BerTypeError),
    }
}
