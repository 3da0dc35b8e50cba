use crate::ber::bytes_to_u64;
use crate::error::*;
use crate::to_ber::{ber_length_length, ber_tag_length, write_length_octets, write_tag_octets};
use crate::{Class, Length, Tag};
use core::convert::TryFrom;
use nom::bytes::streaming::take;
use nom::number::streaming::be_u8;
use nom::Err;
use std::io::Write;

/// BER/DER object header (identifier and length octets)
///
/// A `Header` parsed from input keeps the raw tag and length octets around,
/// so an unmodified object re-serialises to exactly the bytes it was read
/// from (e.g. a non-minimal long-form length survives a round trip). Any
/// setter drops the corresponding cache and the next encoding re-derives the
/// octets canonically.
#[derive(Clone, Debug)]
pub struct Header {
    /// Object class: universal, application, context-specific, or private
    pub(crate) class: Class,
    /// Constructed attribute: true if constructed, else false
    pub(crate) constructed: bool,
    /// Tag number
    pub(crate) tag: Tag,
    /// Object length: value if definite, or indefinite
    pub(crate) length: Length,

    /// Raw encoding of the tag, as read from the input
    pub(crate) raw_tag: Option<Vec<u8>>,
    /// Raw encoding of the length octets, as read from the input
    pub(crate) raw_length: Option<Vec<u8>>,
}

impl Header {
    /// Build a new BER/DER header from the provided values
    pub const fn new(class: Class, constructed: bool, tag: Tag, length: Length) -> Self {
        Header {
            tag,
            constructed,
            class,
            length,
            raw_tag: None,
            raw_length: None,
        }
    }

    /// Build a new BER/DER header from the provided tag, with default values for other fields
    #[inline]
    pub fn new_simple(tag: Tag) -> Self {
        let constructed = matches!(tag, Tag::Sequence | Tag::Set);
        Self::new(Class::Universal, constructed, tag, Length::Definite(0))
    }

    /// Set the class of this `Header`
    #[inline]
    pub fn with_class(mut self, class: Class) -> Self {
        self.set_class(class);
        self
    }

    /// Set the constructed flag of this `Header`
    #[inline]
    pub fn with_constructed(mut self, constructed: bool) -> Self {
        self.set_constructed(constructed);
        self
    }

    /// Set the tag of this `Header`
    #[inline]
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.set_tag(tag);
        self
    }

    /// Set the length of this `Header`
    #[inline]
    pub fn with_length(mut self, length: Length) -> Self {
        self.set_length(length);
        self
    }

    /// Return the class of this header.
    #[inline]
    pub const fn class(&self) -> Class {
        self.class
    }

    /// Return true if this header has the 'constructed' flag.
    #[inline]
    pub const fn constructed(&self) -> bool {
        self.constructed
    }

    /// Return the tag of this header.
    #[inline]
    pub const fn tag(&self) -> Tag {
        self.tag
    }

    /// Return the length of this header.
    #[inline]
    pub const fn length(&self) -> Length {
        self.length
    }

    /// Change the tag; the cached tag octets are dropped
    #[inline]
    pub fn set_tag(&mut self, tag: Tag) {
        self.tag = tag;
        self.raw_tag = None;
    }

    /// Change the class; the cached tag octets are dropped
    #[inline]
    pub fn set_class(&mut self, class: Class) {
        self.class = class;
        self.raw_tag = None;
    }

    /// Change the constructed flag; the cached tag octets are dropped
    #[inline]
    pub fn set_constructed(&mut self, constructed: bool) {
        self.constructed = constructed;
        self.raw_tag = None;
    }

    /// Change the length; the cached length octets are dropped
    #[inline]
    pub fn set_length(&mut self, length: Length) {
        self.length = length;
        self.raw_length = None;
    }

    #[inline]
    pub(crate) fn invalidate_length_cache(&mut self) {
        self.raw_length = None;
    }

    /// Return the raw tag encoding, if it was stored in this object
    #[inline]
    pub fn raw_tag(&self) -> Option<&[u8]> {
        self.raw_tag.as_deref()
    }

    /// Return the raw length encoding, if it was stored in this object
    #[inline]
    pub fn raw_length(&self) -> Option<&[u8]> {
        self.raw_length.as_deref()
    }

    /// Total size in octets of the encoded header (tag + length octets)
    pub fn header_len(&self) -> usize {
        let tag_len = match &self.raw_tag {
            Some(raw) => raw.len(),
            None => ber_tag_length(self.tag),
        };
        let length_len = match &self.raw_length {
            Some(raw) => raw.len(),
            None => ber_length_length(self.length),
        };
        tag_len + length_len
    }

    /// Test if object is primitive
    #[inline]
    pub const fn is_primitive(&self) -> bool {
        !self.constructed
    }

    /// Test if object is constructed
    #[inline]
    pub const fn is_constructed(&self) -> bool {
        self.constructed
    }

    /// Return error if class is not the expected class
    #[inline]
    pub const fn assert_class(&self, class: Class) -> Result<()> {
        self.class.assert_eq(class)
    }

    /// Return error if tag is not the expected tag
    #[inline]
    pub const fn assert_tag(&self, tag: Tag) -> Result<()> {
        self.tag.assert_eq(tag)
    }

    /// Return error if object is not primitive
    #[inline]
    pub const fn assert_primitive(&self) -> Result<()> {
        if self.is_primitive() {
            Ok(())
        } else {
            Err(Error::ConstructUnexpected)
        }
    }

    /// Return error if object is primitive
    #[inline]
    pub const fn assert_constructed(&self) -> Result<()> {
        if !self.is_primitive() {
            Ok(())
        } else {
            Err(Error::ConstructExpected)
        }
    }

    /// Test if object class is Universal
    #[inline]
    pub const fn is_universal(&self) -> bool {
        self.class as u8 == Class::Universal as u8
    }
    /// Test if object class is Application
    #[inline]
    pub const fn is_application(&self) -> bool {
        self.class as u8 == Class::Application as u8
    }
    /// Test if object class is Context-specific
    #[inline]
    pub const fn is_contextspecific(&self) -> bool {
        self.class as u8 == Class::ContextSpecific as u8
    }
    /// Test if object class is Private
    #[inline]
    pub const fn is_private(&self) -> bool {
        self.class as u8 == Class::Private as u8
    }

    /// Return error if object length is not definite
    #[inline]
    pub const fn assert_definite(&self) -> Result<()> {
        if self.length.is_definite() {
            Ok(())
        } else {
            Err(Error::IndefiniteLengthUnexpected)
        }
    }

    /// Encode and write this header for content of length `content_length`
    ///
    /// The cached tag octets are written verbatim when present. The cached
    /// length octets are used only when `content_length` still equals the
    /// parsed length; otherwise the length octets are re-derived (short form
    /// iff the length is below 128).
    pub fn write_ber<W: Write>(
        &self,
        content_length: Length,
        target: &mut W,
    ) -> SerializeResult<usize> {
        if matches!(content_length, Length::Indefinite) && !self.constructed {
            return Err(SerializeError::ASN1Error(Error::IndefiniteLengthUnexpected));
        }
        if self.class as u8 == Class::Universal as u8 && self.tag.0 > Tag::MAX_UNIVERSAL {
            return Err(SerializeError::ASN1Error(Error::UniversalTagTooLarge(
                self.tag.0,
            )));
        }
        let mut sz = 0;
        match &self.raw_tag {
            Some(raw) => {
                target.write_all(raw)?;
                sz += raw.len();
            }
            None => sz += write_tag_octets(self.class, self.constructed, self.tag, target)?,
        }
        match &self.raw_length {
            Some(raw) if self.length == content_length => {
                target.write_all(raw)?;
                sz += raw.len();
            }
            _ => sz += write_length_octets(content_length, target)?,
        }
        Ok(sz)
    }
}

impl From<Tag> for Header {
    #[inline]
    fn from(tag: Tag) -> Self {
        Self::new_simple(tag)
    }
}

/// Compare two headers; the cached raw octets do not take part in equality
impl PartialEq<Header> for Header {
    fn eq(&self, other: &Header) -> bool {
        self.class == other.class
            && self.tag == other.tag
            && self.constructed == other.constructed
            && self.length == other.length
    }
}

impl Eq for Header {}

pub(crate) fn parse_header(input: &[u8]) -> ParseResult<Header> {
    // parse identifier octets (X.690: 8.1.2)
    let (rem, b0) = be_u8(input)?;

    // bits 8 and 7 represent the class of the tag
    let class = match Class::try_from(b0 >> 6) {
        Ok(c) => c,
        Err(_) => unreachable!(), // Cannot fail, we have read exactly 2 bits
    };

    const CONSTRUCTED_BIT: u8 = 0b0010_0000;
    // bit 6 shall be a 0 (primitive) or 1 (constructed)
    let constructed = (b0 & CONSTRUCTED_BIT) != 0;

    const TAG_MASK0: u8 = 0b0001_1111;
    // bits 5 to 1 encode the number of the tag
    let tag0 = b0 & TAG_MASK0;

    let mut rem = rem;
    let mut tag = u32::from(tag0);
    let mut tag_byte_count = 1;
    // test if tag >= 31 (X.690: 8.1.2.4)
    if tag0 == TAG_MASK0 {
        // the universal table stops at 30, so the multi-octet form can never
        // carry a universal tag
        if class as u8 == Class::Universal as u8 {
            return Err(Err::Error(Error::UniversalTagTooLarge(u32::from(tag0))));
        }
        // read next bytes as specified in 8.1.2.4.2
        let mut c = 0u32;
        loop {
            let (r, b) = be_u8(rem)?;
            rem = r;

            // With tag defined as u32 the most we can fit in is four tag bytes.
            // (X.690 doesn't actually specify maximum tag width.)
            if tag_byte_count > 5 || c & 0xfe00_0000 != 0 {
                return Err(Err::Error(Error::InvalidTag));
            }

            c = (c << 7) | (u32::from(b) & 0x7f);
            let done = b & 0x80 == 0;
            tag_byte_count += 1;
            if done {
                break;
            }
        }
        tag = c;
    }
    if class as u8 == Class::Universal as u8 && tag > Tag::MAX_UNIVERSAL {
        return Err(Err::Error(Error::UniversalTagTooLarge(tag)));
    }

    let raw_tag = input[..tag_byte_count].to_vec();

    // now parse length octets (X.690: 8.1.3)
    let (r, len_b0) = be_u8(rem)?;
    let mut rem = r;

    const INDEFINITE: u8 = 0b1000_0000;
    let length = if len_b0 == INDEFINITE {
        // indefinite form (X.690: 8.1.3.6)
        if !constructed {
            return Err(Err::Error(Error::IndefiniteLengthUnexpected));
        }
        Length::Indefinite
    } else if len_b0 & INDEFINITE == 0 {
        // definite, short form (X.690: 8.1.3.4)
        Length::Definite(usize::from(len_b0))
    } else {
        // definite, long form (X.690: 8.1.3.5)

        // value 0b1111_1111 shall not be used (X.690: 8.1.3.5)
        if len_b0 == 0xff {
            return Err(Err::Error(Error::InvalidLength));
        }
        let (r, len_bytes) = take(len_b0 & !INDEFINITE)(rem)?;
        rem = r;

        if len_bytes[0] == 0 {
            // leading zero octet, not a minimal length encoding
            return Err(Err::Error(Error::InvalidLength));
        }
        match bytes_to_u64(len_bytes) {
            Ok(l) => {
                let l =
                    usize::try_from(l).map_err(|_| Err::Error(Error::InvalidLength))?;
                Length::Definite(l)
            }
            Err(_) => return Err(Err::Error(Error::InvalidLength)),
        }
    };

    let header_len = input.len() - rem.len();
    let raw_length = input[tag_byte_count..header_len].to_vec();

    let header = Header {
        class,
        constructed,
        tag: Tag(tag),
        length,
        raw_tag: Some(raw_tag),
        raw_length: Some(raw_length),
    };
    Ok((rem, header))
}
