//! Parser and encoder for ASN.1 values in Basic/Distinguished Encoding Rules
//! (BER/DER), together with a declarative template layer mapping ASN.1 type
//! definitions onto application records.
//!
//! # Generic decoding
//!
//! [`Value::from_ber`] parses a single TLV from a byte slice into a tagged
//! tree ([`Value`]); semantic payloads are decoded lazily on first access.
//! [`Value::from_reader`] does the same from any blocking [`std::io::Read`]
//! source, tolerating short reads.
//!
//! ```
//! use asn1_template::{Payload, Value};
//!
//! let (rem, mut value) = Value::from_ber(&[0x02, 0x01, 0x01]).expect("parsing failed");
//! assert!(rem.is_empty());
//! assert_eq!(value.payload().unwrap(), &Payload::Integer(1.into()));
//! ```
//!
//! Re-serialisation of an unmodified value is byte-identical to its input
//! (header and content octets are cached on parse), so signatures computed
//! over the original encoding stay verifiable.
//!
//! # Templates
//!
//! A [`Registry`] maps type names to [`Definition`]s describing the expected
//! shape of a SEQUENCE or SET: field layout, tagging, optionality and
//! defaults. [`Registry::parse`] matches an input TLV against a registered
//! definition and yields a lazily-parsed [`Instance`] whose fields are
//! materialised on access.

#![deny(unstable_features, unused_import_braces, unused_qualifications)]
#![forbid(unsafe_code)]
#![warn(missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod ber;
mod class;
mod datetime;
mod debug;
mod error;
mod header;
mod length;
mod tag;
mod template;
mod to_ber;
mod types;
mod value;

pub use ber::MAX_RECURSION;
pub use class::*;
pub use datetime::*;
pub use error::*;
pub use header::*;
pub use length::*;
pub use tag::*;
pub use template::*;
pub use types::*;
pub use value::*;

pub use nom;
pub use nom::{Err, IResult, Needed};
