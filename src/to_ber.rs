use crate::error::*;
use crate::types::codec;
use crate::value::Value;
use crate::{Class, Length, Tag};
use std::borrow::Cow;
use std::io::{self, Write};

/// Write tag, constructed bit, and class to `target`
pub(crate) fn write_tag_octets<W: Write>(
    class: Class,
    constructed: bool,
    tag: Tag,
    target: &mut W,
) -> io::Result<usize> {
    const CONSTRUCTED_BIT: u8 = 0b0010_0000;
    let b0 = ((class as u8) << 6) | if constructed { CONSTRUCTED_BIT } else { 0 };
    if tag.0 < 31 {
        target.write_all(&[b0 | tag.0 as u8])?;
        Ok(1)
    } else {
        // multi-octet form: base-128, most-significant-first (X.690: 8.1.2.4)
        let mut groups = [0u8; 5];
        let mut n = 0;
        let mut val = tag.0;
        loop {
            groups[n] = (val & 0x7f) as u8;
            n += 1;
            val >>= 7;
            if val == 0 {
                break;
            }
        }
        target.write_all(&[b0 | 0b0001_1111])?;
        let mut sz = 1;
        while n > 1 {
            n -= 1;
            target.write_all(&[groups[n] | 0x80])?;
            sz += 1;
        }
        target.write_all(&[groups[0]])?;
        Ok(sz + 1)
    }
}

/// Write the length of the encoded object content (without header) to `target`
pub(crate) fn write_length_octets<W: Write>(length: Length, target: &mut W) -> io::Result<usize> {
    const INDEFINITE: u8 = 0b1000_0000;
    match length {
        Length::Indefinite => {
            target.write_all(&[INDEFINITE])?;
            Ok(1)
        }
        Length::Definite(n) => {
            if n <= 127 {
                // short form
                target.write_all(&[n as u8])?;
                Ok(1)
            } else {
                // long form
                let b = n.to_be_bytes();
                // skip leading zeroes
                // we do not have to test for length, n cannot be 0
                let mut idx = 0;
                while b[idx] == 0 {
                    idx += 1;
                }
                let b = &b[idx..];
                // first byte: 0x80 + length of length
                let b0 = 0x80 | (b.len() as u8);
                target.write_all(&[b0])?;
                target.write_all(b)?;
                Ok(1 + b.len())
            }
        }
    }
}

/// Returns the length (in bytes) required for the given tag
pub(crate) fn ber_tag_length(tag: Tag) -> usize {
    match tag.0 {
        0..=30 => 1,
        t => {
            let mut sz = 1;
            let mut val = t;
            loop {
                if val <= 127 {
                    return sz + 1;
                } else {
                    val >>= 7;
                    sz += 1;
                }
            }
        }
    }
}

/// Returns the length (in bytes) required for the given length
pub(crate) fn ber_length_length(length: Length) -> usize {
    match length {
        Length::Indefinite => 1,
        Length::Definite(l) => {
            if l <= 127 {
                1
            } else {
                let b = l.to_be_bytes();
                let significant = b.len() - b.iter().take_while(|&&x| x == 0).count();
                1 + significant
            }
        }
    }
}

impl Value {
    /// Encode and write the object (header + content) to the writer `target`
    ///
    /// Returns the number of bytes written.
    ///
    /// Content octets cached by the decoder are written verbatim, making an
    /// unmodified round trip bit-exact; synthesised or modified values have
    /// their content derived from the semantic payload. A constructed value
    /// whose header says indefinite is emitted in the indefinite form,
    /// closed by an End-Of-Contents marker; otherwise children are measured
    /// first and a definite length is emitted.
    pub fn write_ber<W: Write>(&self, target: &mut W) -> SerializeResult<usize> {
        match self {
            Value::Primitive(p) => {
                let content: Cow<[u8]> = match (&p.raw, &p.decoded) {
                    (Some(raw), _) => Cow::Borrowed(raw.as_slice()),
                    (None, Some(payload)) => {
                        let encoded = match codec(p.header.tag()) {
                            Some(codec) if p.header.is_universal() => (codec.encode)(payload)?,
                            _ => payload.to_content_bytes()?,
                        };
                        Cow::Owned(encoded)
                    }
                    (None, None) => {
                        return Err(SerializeError::ASN1Error(Error::BerValueError))
                    }
                };
                let mut sz = p.header.write_ber(Length::Definite(content.len()), target)?;
                target.write_all(&content)?;
                sz += content.len();
                Ok(sz)
            }
            Value::Constructed(c) => match c.header.length() {
                Length::Indefinite => {
                    let mut sz = c.header.write_ber(Length::Indefinite, target)?;
                    for child in c.children() {
                        sz += child.write_ber(target)?;
                    }
                    target.write_all(&[0x00, 0x00])?;
                    Ok(sz + 2)
                }
                Length::Definite(_) => {
                    // serialise children to a scratch buffer to learn the length
                    let mut scratch = Vec::new();
                    for child in c.children() {
                        child.write_ber(&mut scratch)?;
                    }
                    let mut sz = c.header.write_ber(Length::Definite(scratch.len()), target)?;
                    target.write_all(&scratch)?;
                    Ok(sz + scratch.len())
                }
            },
            Value::Opaque(o) => match o.header.length() {
                Length::Indefinite => {
                    let mut sz = o.header.write_ber(Length::Indefinite, target)?;
                    target.write_all(o.raw())?;
                    target.write_all(&[0x00, 0x00])?;
                    Ok(sz + o.raw().len() + 2)
                }
                Length::Definite(_) => {
                    let mut sz = o.header.write_ber(Length::Definite(o.raw().len()), target)?;
                    target.write_all(o.raw())?;
                    Ok(sz + o.raw().len())
                }
            },
        }
    }

    /// Write the BER encoded representation to a newly allocated `Vec<u8>`
    pub fn to_ber_vec(&self) -> SerializeResult<Vec<u8>> {
        let mut v = Vec::new();
        self.write_ber(&mut v)?;
        Ok(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hex_literal::hex;

    #[test]
    fn tober_write_length() {
        let mut v: Vec<u8> = Vec::new();

        // test: Indefinite length
        v.clear();
        write_length_octets(Length::Indefinite, &mut v).expect("serialization failed");
        assert_eq!(&v, &hex!("80"));

        // test: definite length, short-form
        v.clear();
        write_length_octets(Length::Definite(2), &mut v).expect("serialization failed");
        assert_eq!(&v, &hex!("02"));

        // test: definite length, long-form
        v.clear();
        write_length_octets(Length::Definite(300), &mut v).expect("serialization failed");
        assert_eq!(&v, &hex!("82 01 2c"));

        assert_eq!(ber_length_length(Length::Definite(2)), 1);
        assert_eq!(ber_length_length(Length::Definite(300)), 3);
        assert_eq!(ber_length_length(Length::Indefinite), 1);
    }

    #[test]
    fn tober_write_tag() {
        let mut v: Vec<u8> = Vec::new();
        write_tag_octets(Class::Universal, false, Tag::Integer, &mut v)
            .expect("serialization failed");
        assert_eq!(&v, &hex!("02"));

        v.clear();
        write_tag_octets(Class::ContextSpecific, true, Tag(0), &mut v)
            .expect("serialization failed");
        assert_eq!(&v, &hex!("a0"));

        // multi-octet tag
        v.clear();
        write_tag_octets(Class::Application, false, Tag(1027), &mut v)
            .expect("serialization failed");
        assert_eq!(&v, &hex!("5f 88 03"));
        assert_eq!(ber_tag_length(Tag(1027)), 3);
        assert_eq!(ber_tag_length(Tag(2)), 1);
    }

    #[test]
    fn encode_synthesised_values() {
        use crate::Value;

        assert_eq!(Value::boolean(true).to_ber_vec().unwrap(), hex!("01 01 ff"));
        assert_eq!(Value::null().to_ber_vec().unwrap(), hex!("05 00"));
        assert_eq!(
            Value::integer(128).to_ber_vec().unwrap(),
            hex!("02 02 00 80")
        );
        assert_eq!(
            Value::printable_string("abc").to_ber_vec().unwrap(),
            hex!("13 03 61 62 63")
        );
        assert_eq!(
            Value::sequence(vec![Value::integer(1), Value::boolean(false)])
                .to_ber_vec()
                .unwrap(),
            hex!("30 06 02 01 01 01 01 00")
        );
        // value-level implicit tagging
        assert_eq!(
            Value::integer(1)
                .with_tag(Tag(0))
                .with_class(Class::ContextSpecific)
                .to_ber_vec()
                .unwrap(),
            hex!("80 01 01")
        );
    }

    #[test]
    fn encode_retagged_time_values() {
        use crate::{Asn1DateTime, Asn1TimeZone, Value};

        // the content format follows the constructor's type, not the tag
        let dt = Asn1DateTime::new(99, 1, 2, 3, 4, 5, None, Asn1TimeZone::Z);
        assert_eq!(
            Value::utc_time(dt)
                .with_tag(Tag(0))
                .with_class(Class::ContextSpecific)
                .to_ber_vec()
                .unwrap(),
            hex!("80 0d 39 39 30 31 30 32 30 33 30 34 30 35 5a")
        );

        let dt = Asn1DateTime::new(2002, 12, 13, 14, 29, 23, None, Asn1TimeZone::Z);
        assert_eq!(
            Value::generalized_time(dt)
                .with_tag(Tag(1))
                .with_class(Class::ContextSpecific)
                .to_ber_vec()
                .unwrap(),
            hex!("81 0f 32 30 30 32 31 32 31 33 31 34 32 39 32 33 5a")
        );
    }

    #[test]
    fn encode_indefinite_form() {
        use crate::Value;

        let mut v = Value::sequence(vec![Value::integer(1)]);
        v.header_mut().set_length(Length::Indefinite);
        assert_eq!(v.to_ber_vec().unwrap(), hex!("30 80 02 01 01 00 00"));
    }

    #[test]
    fn encode_without_content_fails() {
        use crate::{Header, Value};

        let v = Value::Primitive(crate::Primitive {
            header: Header::new_simple(Tag::Integer),
            raw: None,
            decoded: None,
        });
        assert!(v.write_ber(&mut Vec::new()).is_err());
    }
}
