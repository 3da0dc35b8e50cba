use crate::error::*;
use crate::header::parse_header;
use crate::value::{Constructed, Object, Opaque, Primitive, Value};
use crate::{Header, Length, Tag};
use nom::bytes::streaming::take;
use nom::Err;

/// Default maximum recursion limit
pub const MAX_RECURSION: usize = 50;

impl Value {
    /// Parse a single BER object from `bytes`, returning the remaining input
    /// and the parsed value tree.
    ///
    /// Children of constructed values are parsed eagerly; primitive payloads
    /// stay raw until observed through [`Value::payload`].
    pub fn from_ber(bytes: &[u8]) -> ParseResult<Value> {
        parse_value(bytes, MAX_RECURSION)
    }

    /// Parse a single BER object from `bytes`, requiring that the whole
    /// input is consumed.
    pub fn from_ber_complete(bytes: &[u8]) -> Result<Value> {
        let (rem, value) = Self::from_ber(bytes).map_err(Error::from)?;
        if !rem.is_empty() {
            return Err(Error::TrailingData);
        }
        Ok(value)
    }
}

/// Map `Incomplete` to a hard error, for parsers running inside a region
/// whose extent is already known
fn complete<T>(result: ParseResult<T>) -> ParseResult<T> {
    result.map_err(|e| match e {
        Err::Incomplete(_) => Err::Error(Error::InvalidLength),
        e => e,
    })
}

fn is_eoc(header: &Header) -> bool {
    header.is_universal() && header.tag() == Tag::EndOfContent
}

pub(crate) fn parse_value(i: &[u8], depth: usize) -> ParseResult<Value> {
    if depth == 0 {
        return Err(Err::Error(Error::BerMaxDepth));
    }
    let (rem, header) = parse_header(i)?;
    if is_eoc(&header) {
        // End-Of-Contents is only valid as an indefinite-length terminator,
        // which the constructed branch below consumes itself
        return Err(Err::Error(Error::unexpected_tag(None, Tag::EndOfContent)));
    }
    if !header.is_universal() {
        let (rem, raw) = take_content(rem, &header, depth)?;
        return Ok((
            rem,
            Value::Opaque(Opaque {
                header,
                raw: raw.to_vec(),
            }),
        ));
    }
    if !header.is_constructed() {
        // parse_header rejects an indefinite length on a primitive
        let len = match header.length() {
            Length::Definite(len) => len,
            Length::Indefinite => return Err(Err::Error(Error::IndefiniteLengthUnexpected)),
        };
        let (rem, raw) = take(len)(rem)?;
        Ok((
            rem,
            Value::Primitive(Primitive {
                header,
                raw: Some(raw.to_vec()),
                decoded: None,
            }),
        ))
    } else {
        let mut children = Vec::new();
        match header.length() {
            Length::Definite(len) => {
                let (rem_after, content) = take(len)(rem)?;
                let mut content: &[u8] = content;
                while !content.is_empty() {
                    let (rest, child) = complete(parse_value(content, depth - 1))?;
                    children.push(child);
                    content = rest;
                }
                check_segment_tags(&header, &children)?;
                Ok((
                    rem_after,
                    Value::Constructed(Constructed {
                        header,
                        children,
                        decoded: None,
                    }),
                ))
            }
            Length::Indefinite => {
                let mut cur = rem;
                loop {
                    let (after, child_header) = parse_header(cur)?;
                    if is_eoc(&child_header) {
                        if !child_header.length().is_null() {
                            return Err(Err::Error(Error::InvalidLength));
                        }
                        check_segment_tags(&header, &children)?;
                        return Ok((
                            after,
                            Value::Constructed(Constructed {
                                header,
                                children,
                                decoded: None,
                            }),
                        ));
                    }
                    let (rest, child) = parse_value(cur, depth - 1)?;
                    children.push(child);
                    cur = rest;
                }
            }
        }
    }
}

/// Parse one TLV without interpreting its content: header plus raw content
/// octets. For the indefinite form the terminating End-Of-Contents marker is
/// consumed but not part of the returned content.
pub(crate) fn parse_object(i: &[u8]) -> ParseResult<Object> {
    let (rem, header) = parse_header(i)?;
    if is_eoc(&header) {
        return Err(Err::Error(Error::unexpected_tag(None, Tag::EndOfContent)));
    }
    let (rem, content) = take_content(rem, &header, MAX_RECURSION)?;
    Ok((rem, Object::new(header, content.to_vec())))
}

/// Return the content octets of an object whose header was just parsed.
///
/// For the indefinite form, nested objects are skipped until the matching
/// End-Of-Contents marker; the marker is consumed but excluded from the
/// returned content.
pub(crate) fn take_content<'a>(
    i: &'a [u8],
    header: &Header,
    depth: usize,
) -> ParseResult<'a, &'a [u8]> {
    match header.length() {
        Length::Definite(len) => take(len)(i),
        Length::Indefinite => {
            let mut cur = i;
            loop {
                let (after, child_header) = parse_header(cur)?;
                if is_eoc(&child_header) {
                    if !child_header.length().is_null() {
                        return Err(Err::Error(Error::InvalidLength));
                    }
                    let content = &i[..i.len() - cur.len()];
                    return Ok((after, content));
                }
                let (rest, ()) = skip_object_content(after, &child_header, depth - 1)?;
                cur = rest;
            }
        }
    }
}

/// Skip object content; recursive for the indefinite form
fn skip_object_content<'a>(
    i: &'a [u8],
    header: &Header,
    depth: usize,
) -> ParseResult<'a, ()> {
    if depth == 0 {
        return Err(Err::Error(Error::BerMaxDepth));
    }
    match header.length() {
        Length::Definite(len) => {
            let (rem, _) = take(len)(i)?;
            Ok((rem, ()))
        }
        Length::Indefinite => {
            let mut i = i;
            loop {
                let (i2, header2) = parse_header(i)?;
                if is_eoc(&header2) {
                    if !header2.length().is_null() {
                        return Err(Err::Error(Error::InvalidLength));
                    }
                    return Ok((i2, ()));
                }
                let (i3, ()) = skip_object_content(i2, &header2, depth - 1)?;
                i = i3;
            }
        }
    }
}

/// Segments of a constructed string encoding must repeat the outer tag
fn check_segment_tags(header: &Header, children: &[Value]) -> core::result::Result<(), Err<Error>> {
    let tag = header.tag();
    if tag == Tag::Sequence || tag == Tag::Set {
        return Ok(());
    }
    for child in children {
        if !child.header().is_universal() || child.tag() != tag {
            return Err(Err::Error(Error::unexpected_tag(Some(tag), child.tag())));
        }
    }
    Ok(())
}

/// Build a value tree from an unparsed object
pub(crate) fn value_from_object(object: &Object) -> Result<Value> {
    let bytes = object.bytes().ok_or(Error::BerValueError)?;
    let header = object.header().clone();
    if !header.is_universal() {
        return Ok(Value::Opaque(Opaque {
            header,
            raw: bytes.to_vec(),
        }));
    }
    if !header.is_constructed() {
        return Ok(Value::Primitive(Primitive {
            header,
            raw: Some(bytes.to_vec()),
            decoded: None,
        }));
    }
    let children = parse_children(bytes)?;
    check_segment_tags(&header, &children).map_err(Error::from)?;
    Ok(Value::Constructed(Constructed {
        header,
        children,
        decoded: None,
    }))
}

/// Parse a content region into the sequence of values it concatenates
pub(crate) fn parse_children(bytes: &[u8]) -> Result<Vec<Value>> {
    let mut children = Vec::new();
    let mut content = bytes;
    while !content.is_empty() {
        let (rest, child) = complete(parse_value(content, MAX_RECURSION)).map_err(Error::from)?;
        children.push(child);
        content = rest;
    }
    Ok(children)
}

/// Try to parse *all* input bytes as u64
#[inline]
pub(crate) fn bytes_to_u64(s: &[u8]) -> Result<u64> {
    let mut u: u64 = 0;
    for &c in s {
        if u & 0xff00_0000_0000_0000 != 0 {
            return Err(Error::IntegerTooLarge);
        }
        u <<= 8;
        u |= u64::from(c);
    }
    Ok(u)
}

#[cfg(test)]
mod tests {
    use crate::*;
    use hex_literal::hex;

    #[test]
    fn parse_primitive() {
        let input = &hex!("02 01 01 ff ff");
        let (rem, mut value) = Value::from_ber(input).expect("parsing failed");
        assert_eq!(rem, &[0xff, 0xff]);
        assert_eq!(value.tag(), Tag::Integer);
        assert_eq!(value.payload().unwrap().as_i64(), Some(1));
    }

    #[test]
    fn parse_complete_rejects_trailing_data() {
        let input = &hex!("02 01 01 ff");
        assert!(matches!(
            Value::from_ber_complete(input),
            Err(Error::TrailingData)
        ));
        assert!(Value::from_ber_complete(&hex!("02 01 01")).is_ok());
    }

    #[test]
    fn parse_constructed() {
        // SEQUENCE { INTEGER 1, OCTET STRING 'AA' }
        let input = &hex!("30 07 02 01 01 04 02 41 41");
        let value = Value::from_ber_complete(input).expect("parsing failed");
        let children = value.children().expect("not constructed");
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].tag(), Tag::Integer);
        assert_eq!(children[1].tag(), Tag::OctetString);

        // child extending past the declared length
        let input = &hex!("30 03 02 04 01");
        assert!(Value::from_ber(input).is_err());
    }

    #[test]
    fn parse_opaque() {
        // [APPLICATION 4], constructed content left unparsed
        let input = &hex!("64 03 02 01 01");
        let value = Value::from_ber_complete(input).expect("parsing failed");
        assert!(value.is_opaque());
        assert_eq!(value.raw(), Some(&hex!("02 01 01")[..]));
    }

    #[test]
    fn parse_indefinite_length() {
        // constructed OCTET STRING, indefinite length, two segments
        let input = &hex!("24 80 04 02 aa bb 04 02 cc dd 00 00");
        let mut value = Value::from_ber_complete(input).expect("parsing failed");
        assert_eq!(value.children().map(<[Value]>::len), Some(2));
        assert_eq!(
            value.payload().unwrap(),
            &Payload::OctetString(hex!("aa bb cc dd").to_vec())
        );

        // missing End-Of-Contents
        let input = &hex!("24 80 04 02 aa bb");
        assert!(matches!(
            Value::from_ber(input),
            Err(Err::Incomplete(_))
        ));

        // segment tag differs from the outer tag
        let input = &hex!("24 80 05 00 00 00");
        assert!(Value::from_ber(input).is_err());
    }

    #[test]
    fn parse_indefinite_opaque() {
        // [0] constructed, indefinite, containing one INTEGER
        let input = &hex!("a0 80 02 01 07 00 00");
        let value = Value::from_ber_complete(input).expect("parsing failed");
        assert!(value.is_opaque());
        assert_eq!(value.raw(), Some(&hex!("02 01 07")[..]));
        assert_eq!(value.header().length(), Length::Indefinite);
    }

    #[test]
    fn parse_eoc_outside_indefinite() {
        assert!(Value::from_ber(&hex!("00 00")).is_err());
    }

    #[test]
    fn parse_recursion_bound() {
        // deeply nested SEQUENCEs
        let mut input = Vec::new();
        for _ in 0..MAX_RECURSION + 1 {
            input.extend_from_slice(&hex!("30 80"));
        }
        assert!(matches!(
            Value::from_ber(&input),
            Err(Err::Error(Error::BerMaxDepth))
        ));
    }
}
