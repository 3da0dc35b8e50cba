use crate::ber::parser::parse_object;
use crate::debug::macros::log_error;
use crate::error::*;
use crate::value::{Object, Value};
use nom::Err;
use std::io::Read;

impl Value {
    /// Read and parse a single BER object from a blocking byte source.
    ///
    /// The reader is polled until a full TLV is available; short reads are
    /// tolerated and simply trigger another read. End of stream in the
    /// middle of an object is an error.
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Value> {
        read_one(reader, Value::from_ber)
    }
}

pub(crate) fn object_from_reader<R: Read>(reader: &mut R) -> Result<Object> {
    read_one(reader, parse_object)
}

/// Accumulate bytes from `reader` until `parse` no longer reports that its
/// input is incomplete.
///
/// The streaming parsers report missing input as `Err::Incomplete`, which
/// maps directly onto the refill-and-retry loop here.
fn read_one<R, T, F>(reader: &mut R, parse: F) -> Result<T>
where
    R: Read,
    F: for<'a> Fn(&'a [u8]) -> ParseResult<'a, T>,
{
    let mut buf: Vec<u8> = Vec::with_capacity(256);
    let mut chunk = [0u8; 4096];
    loop {
        let needed = match parse(&buf) {
            Ok((_, value)) => return Ok(value),
            Err(Err::Incomplete(needed)) => needed,
            Err(e) => return Err(Error::from(e)),
        };
        let n = match reader.read(&mut chunk) {
            Ok(n) => n,
            Err(e) => {
                log_error!("stream read failed: {}", e);
                return Err(Error::Io(e.to_string()));
            }
        };
        if n == 0 {
            // end of stream inside a TLV
            return Err(Error::Incomplete(needed));
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

#[cfg(test)]
mod tests {
    use crate::*;
    use hex_literal::hex;
    use std::io::Read;

    /// Reader yielding one byte per call, to exercise short reads
    struct Trickle<'a> {
        data: &'a [u8],
        pos: usize,
    }

    impl<'a> Read for Trickle<'a> {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.data.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.data[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    #[test]
    fn read_value_from_short_reads() {
        let input = hex!("30 0a 02 01 01 13 05 61 62 63 20 20");
        let mut reader = Trickle {
            data: &input,
            pos: 0,
        };
        let value = Value::from_reader(&mut reader).expect("parsing failed");
        assert_eq!(value.tag(), Tag::Sequence);
        assert_eq!(value.children().map(<[Value]>::len), Some(2));
    }

    #[test]
    fn read_value_eof_mid_tlv() {
        let input = hex!("30 0a 02 01");
        let mut reader = Trickle {
            data: &input,
            pos: 0,
        };
        assert!(matches!(
            Value::from_reader(&mut reader),
            Err(Error::Incomplete(_))
        ));
    }

    #[test]
    fn read_value_ignores_trailing_bytes() {
        let input = hex!("02 01 2a ff ff");
        let mut value = Value::from_reader(&mut &input[..]).expect("parsing failed");
        assert_eq!(value.payload().unwrap().as_i64(), Some(42));
    }
}
