use crate::error::*;
use crate::types::{self, BitString, Oid, Payload};
use crate::{Asn1DateTime, Class, Header, Length, Tag};
use num_bigint::BigInt;

/// Raw TLV: a header plus (possibly absent) undecoded content octets.
///
/// This is the currency of the template engine: content stays unparsed until
/// a definition says how to interpret it. `bytes` is `None` once ownership
/// of the content has moved elsewhere (e.g. to parsed sub-fields).
#[derive(Clone, Debug)]
pub struct Object {
    pub(crate) header: Header,
    pub(crate) bytes: Option<Vec<u8>>,
}

impl Object {
    pub(crate) fn new(header: Header, bytes: Vec<u8>) -> Self {
        Object {
            header,
            bytes: Some(bytes),
        }
    }

    #[inline]
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The raw content octets, if still owned by this object
    #[inline]
    pub fn bytes(&self) -> Option<&[u8]> {
        self.bytes.as_deref()
    }
}

/// A parsed or synthesised TLV.
///
/// Parsed primitives keep their content octets and decode the semantic value
/// only when it is first observed; the octets are retained afterwards so an
/// unmodified value re-serialises byte-identically. Replacing the payload
/// with [`Value::set_payload`] drops the cached octets and the next encoding
/// derives fresh ones.
#[derive(Clone, Debug)]
pub enum Value {
    Primitive(Primitive),
    Constructed(Constructed),
    /// Non-universal class or unknown universal tag; content stays unparsed
    /// until the caller supplies an interpretation
    Opaque(Opaque),
}

#[derive(Clone, Debug)]
pub struct Primitive {
    pub(crate) header: Header,
    pub(crate) raw: Option<Vec<u8>>,
    pub(crate) decoded: Option<Payload>,
}

#[derive(Clone, Debug)]
pub struct Constructed {
    pub(crate) header: Header,
    pub(crate) children: Vec<Value>,
    pub(crate) decoded: Option<Payload>,
}

#[derive(Clone, Debug)]
pub struct Opaque {
    pub(crate) header: Header,
    pub(crate) raw: Vec<u8>,
}

impl Primitive {
    /// Lazily decode and return the semantic value
    pub fn payload(&mut self) -> Result<&Payload> {
        if self.decoded.is_none() {
            let raw = self.raw.as_deref().ok_or(Error::BerValueError)?;
            let payload = match types::codec(self.header.tag()) {
                Some(codec) if self.header.is_universal() => (codec.decode)(raw)?,
                _ => Payload::Bytes(raw.to_vec()),
            };
            self.decoded = Some(payload);
        }
        match &self.decoded {
            Some(p) => Ok(p),
            None => Err(Error::BerValueError),
        }
    }

    /// Replace the semantic value; cached content octets are dropped
    pub fn set_payload(&mut self, payload: Payload) {
        self.decoded = Some(payload);
        self.raw = None;
        self.header.invalidate_length_cache();
    }

    /// The raw content octets, as read from the input
    pub fn raw(&self) -> Option<&[u8]> {
        self.raw.as_deref()
    }
}

impl Constructed {
    /// Child values, in encoding order
    pub fn children(&self) -> &[Value] {
        &self.children
    }

    /// Mutable access to the children; the memoised semantic value is
    /// dropped. A cached length octet encoding is only reused if the
    /// children still serialise to that length.
    pub fn children_mut(&mut self) -> &mut Vec<Value> {
        self.decoded = None;
        &mut self.children
    }

    /// Semantic value of a constructed string encoding: the concatenation of
    /// its segments, decoded as the outer type
    pub fn payload(&mut self) -> Result<&Payload> {
        if self.decoded.is_none() {
            let tag = self.header.tag();
            if !self.header.is_universal() || !is_string_like(tag) {
                return Err(Error::BerTypeError);
            }
            let content = assemble_segments(tag, &self.children)?;
            let payload = match types::codec(tag) {
                Some(codec) => (codec.decode)(&content)?,
                None => Payload::Bytes(content),
            };
            self.decoded = Some(payload);
        }
        match &self.decoded {
            Some(p) => Ok(p),
            None => Err(Error::BerValueError),
        }
    }
}

impl Opaque {
    /// The raw content octets
    pub fn raw(&self) -> &[u8] {
        &self.raw
    }
}

impl Value {
    /// The header of this value
    pub fn header(&self) -> &Header {
        match self {
            Value::Primitive(p) => &p.header,
            Value::Constructed(c) => &c.header,
            Value::Opaque(o) => &o.header,
        }
    }

    /// Mutable access to the header; setters on it drop the octet caches
    pub fn header_mut(&mut self) -> &mut Header {
        match self {
            Value::Primitive(p) => &mut p.header,
            Value::Constructed(c) => &mut c.header,
            Value::Opaque(o) => &mut o.header,
        }
    }

    #[inline]
    pub fn tag(&self) -> Tag {
        self.header().tag()
    }

    #[inline]
    pub fn class(&self) -> Class {
        self.header().class()
    }

    #[inline]
    pub fn is_primitive(&self) -> bool {
        matches!(self, Value::Primitive(_))
    }

    #[inline]
    pub fn is_constructed(&self) -> bool {
        matches!(self, Value::Constructed(_))
    }

    #[inline]
    pub fn is_opaque(&self) -> bool {
        matches!(self, Value::Opaque(_))
    }

    /// Child values of a constructed value
    pub fn children(&self) -> Option<&[Value]> {
        match self {
            Value::Constructed(c) => Some(c.children()),
            _ => None,
        }
    }

    /// Mutable children of a constructed value; cached encodings are
    /// invalidated
    pub fn children_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Constructed(c) => Some(c.children_mut()),
            _ => None,
        }
    }

    /// The semantic value, decoding it on first access.
    ///
    /// For a constructed string encoding this is the decoded concatenation
    /// of its segments. Constructed SEQUENCE/SET values and opaque values
    /// have no single payload and return an error.
    pub fn payload(&mut self) -> Result<&Payload> {
        match self {
            Value::Primitive(p) => p.payload(),
            Value::Constructed(c) => c.payload(),
            Value::Opaque(_) => Err(Error::BerTypeError),
        }
    }

    /// Replace the semantic value of a primitive; cached octets are dropped
    pub fn set_payload(&mut self, payload: Payload) -> Result<()> {
        match self {
            Value::Primitive(p) => {
                p.set_payload(payload);
                Ok(())
            }
            _ => Err(Error::BerTypeError),
        }
    }

    /// The raw content octets, when they are still cached
    pub fn raw(&self) -> Option<&[u8]> {
        match self {
            Value::Primitive(p) => p.raw(),
            Value::Constructed(_) => None,
            Value::Opaque(o) => Some(o.raw()),
        }
    }

    //--- constructors

    fn primitive(tag: Tag, payload: Payload) -> Value {
        Value::Primitive(Primitive {
            header: Header::new(Class::Universal, false, tag, Length::Definite(0)),
            raw: None,
            decoded: Some(payload),
        })
    }

    fn constructed(tag: Tag, children: Vec<Value>) -> Value {
        Value::Constructed(Constructed {
            header: Header::new(Class::Universal, true, tag, Length::Definite(0)),
            children,
            decoded: None,
        })
    }

    fn text(tag: Tag, s: impl Into<String>) -> Value {
        Self::primitive(tag, Payload::Text(s.into()))
    }

    pub fn boolean(b: bool) -> Value {
        Self::primitive(Tag::Boolean, Payload::Boolean(b))
    }

    pub fn integer(i: impl Into<BigInt>) -> Value {
        Self::primitive(Tag::Integer, Payload::Integer(i.into()))
    }

    pub fn enumerated(i: impl Into<BigInt>) -> Value {
        Self::primitive(Tag::Enumerated, Payload::Integer(i.into()))
    }

    /// Build a BIT STRING value; `unused_bits` must be in `0..=7`
    pub fn bit_string(unused_bits: u8, data: &[u8]) -> Result<Value> {
        let bs = BitString::new(unused_bits, data)?;
        Ok(Self::primitive(Tag::BitString, Payload::BitString(bs)))
    }

    pub fn octet_string(data: impl Into<Vec<u8>>) -> Value {
        Self::primitive(Tag::OctetString, Payload::OctetString(data.into()))
    }

    pub fn null() -> Value {
        Self::primitive(Tag::Null, Payload::Null)
    }

    pub fn oid(oid: Oid) -> Value {
        Self::primitive(Tag::Oid, Payload::Oid(oid))
    }

    pub fn utf8_string(s: impl Into<String>) -> Value {
        Self::text(Tag::Utf8String, s)
    }

    pub fn numeric_string(s: impl Into<String>) -> Value {
        Self::text(Tag::NumericString, s)
    }

    pub fn printable_string(s: impl Into<String>) -> Value {
        Self::text(Tag::PrintableString, s)
    }

    pub fn teletex_string(s: impl Into<String>) -> Value {
        Self::text(Tag::TeletexString, s)
    }

    pub fn videotex_string(s: impl Into<String>) -> Value {
        Self::text(Tag::VideotexString, s)
    }

    pub fn ia5_string(s: impl Into<String>) -> Value {
        Self::text(Tag::Ia5String, s)
    }

    pub fn graphic_string(s: impl Into<String>) -> Value {
        Self::text(Tag::GraphicString, s)
    }

    pub fn visible_string(s: impl Into<String>) -> Value {
        Self::text(Tag::VisibleString, s)
    }

    pub fn general_string(s: impl Into<String>) -> Value {
        Self::text(Tag::GeneralString, s)
    }

    pub fn universal_string(s: impl Into<String>) -> Value {
        Self::text(Tag::UniversalString, s)
    }

    pub fn bmp_string(s: impl Into<String>) -> Value {
        Self::text(Tag::BmpString, s)
    }

    pub fn utc_time(dt: Asn1DateTime) -> Value {
        Self::primitive(Tag::UtcTime, Payload::UtcTime(dt))
    }

    pub fn generalized_time(dt: Asn1DateTime) -> Value {
        Self::primitive(Tag::GeneralizedTime, Payload::GeneralizedTime(dt))
    }

    pub fn sequence(children: Vec<Value>) -> Value {
        Self::constructed(Tag::Sequence, children)
    }

    pub fn set(children: Vec<Value>) -> Value {
        Self::constructed(Tag::Set, children)
    }

    /// Build a value from raw parts, leaving the content uninterpreted
    pub fn opaque(class: Class, constructed: bool, tag: Tag, bytes: Vec<u8>) -> Value {
        let header = Header::new(class, constructed, tag, Length::Definite(bytes.len()));
        Value::Opaque(Opaque { header, raw: bytes })
    }

    /// Override the tag (implicit tagging at the value level)
    pub fn with_tag(mut self, tag: Tag) -> Value {
        self.header_mut().set_tag(tag);
        self
    }

    /// Override the class
    pub fn with_class(mut self, class: Class) -> Value {
        self.header_mut().set_class(class);
        self
    }
}

pub(crate) fn is_string_like(tag: Tag) -> bool {
    matches!(tag.0, 3 | 4 | 12 | 18..=22 | 25..=28 | 30)
}

/// Re-assemble the content of a constructed string encoding.
///
/// Returns the content octets an equivalent primitive encoding would carry.
/// Every segment must be universal and carry the same tag as the outer
/// value; for BIT STRING only the final segment may have unused bits.
pub(crate) fn assemble_segments(tag: Tag, children: &[Value]) -> Result<Vec<u8>> {
    let mut raws: Vec<&[u8]> = Vec::new();
    collect_segment_raw(tag, children, &mut raws)?;
    if tag == Tag::BitString {
        let mut out = vec![0u8];
        let count = raws.len();
        for (i, raw) in raws.iter().enumerate() {
            let (unused, data) = raw
                .split_first()
                .ok_or_else(|| Tag::BitString.invalid_value("missing unused-bits octet"))?;
            if *unused > 7 {
                return Err(Tag::BitString.invalid_value("invalid unused bits"));
            }
            if *unused != 0 && i + 1 < count {
                return Err(
                    Tag::BitString.invalid_value("only the final segment may have unused bits")
                );
            }
            if i + 1 == count {
                out[0] = *unused;
            }
            out.extend_from_slice(data);
        }
        Ok(out)
    } else {
        let total: usize = raws.iter().map(|r| r.len()).sum();
        let mut out = Vec::with_capacity(total);
        for raw in raws {
            out.extend_from_slice(raw);
        }
        Ok(out)
    }
}

fn collect_segment_raw<'a>(tag: Tag, children: &'a [Value], out: &mut Vec<&'a [u8]>) -> Result<()> {
    for child in children {
        match child {
            Value::Primitive(p) => {
                p.header.assert_tag(tag)?;
                out.push(p.raw.as_deref().ok_or(Error::BerValueError)?);
            }
            Value::Constructed(c) => {
                c.header.assert_tag(tag)?;
                collect_segment_raw(tag, &c.children, out)?;
            }
            Value::Opaque(o) => {
                return Err(Error::unexpected_class(
                    Some(Class::Universal),
                    o.header.class(),
                ));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_default_headers() {
        let v = Value::integer(1);
        assert_eq!(v.tag(), Tag::Integer);
        assert_eq!(v.class(), Class::Universal);
        assert!(v.is_primitive());

        let v = Value::sequence(vec![Value::integer(1)]);
        assert_eq!(v.tag(), Tag::Sequence);
        assert!(v.is_constructed());
        assert_eq!(v.children().map(<[Value]>::len), Some(1));

        // every universal tag is reachable through a constructor
        for (value, tag) in [
            (Value::boolean(true), Tag::Boolean),
            (Value::null(), Tag::Null),
            (Value::octet_string(vec![1]), Tag::OctetString),
            (Value::utf8_string("x"), Tag::Utf8String),
            (Value::printable_string("x"), Tag::PrintableString),
            (Value::ia5_string("x"), Tag::Ia5String),
            (Value::enumerated(4), Tag::Enumerated),
            (Value::bmp_string("x"), Tag::BmpString),
        ] {
            assert_eq!(value.tag(), tag);
        }
    }

    #[test]
    fn with_tag_and_class() {
        let v = Value::integer(7)
            .with_tag(Tag(0))
            .with_class(Class::ContextSpecific);
        assert_eq!(v.tag(), Tag(0));
        assert_eq!(v.class(), Class::ContextSpecific);
    }

    #[test]
    fn set_payload_invalidates_raw() {
        let (_, mut v) = Value::from_ber(&[0x02, 0x01, 0x2a]).expect("parsing failed");
        assert_eq!(v.raw(), Some(&[0x2a][..]));
        assert_eq!(v.payload().unwrap().as_i64(), Some(42));
        // raw is retained after a lazy decode
        assert_eq!(v.raw(), Some(&[0x2a][..]));

        v.set_payload(Payload::from(1000i64)).unwrap();
        assert!(v.raw().is_none());
        assert_eq!(v.payload().unwrap().as_i64(), Some(1000));
        assert_eq!(v.to_ber_vec().unwrap(), vec![0x02, 0x02, 0x03, 0xe8]);
    }

    #[test]
    fn payload_on_structural_values() {
        let mut v = Value::sequence(vec![]);
        assert!(v.payload().is_err());
        let mut v = Value::opaque(Class::ContextSpecific, false, Tag(0), vec![1]);
        assert!(v.payload().is_err());
    }
}
