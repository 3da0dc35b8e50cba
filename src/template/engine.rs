//! The template interpreter: for every definition kind, a `match` step
//! comparing an incoming TLV against the expected shape, a `parse` step
//! binding the TLV to the host record, and a `decode` step materialising the
//! semantic value.

use super::definition::{DefKind, DefMap, Definition};
use super::{resolve_type, FieldSlot, FieldValue, Instance};
use crate::ber::{parse_children, parse_object, value_from_object};
use crate::debug::macros::log_trace;
use crate::error::*;
use crate::types::codec;
use crate::value::{assemble_segments, is_string_like, Object};
use crate::{Header, Tag};
use std::collections::HashMap;
use std::sync::Arc;

/// Result of matching one TLV against one sub-definition
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum MatchOutcome {
    /// Header fits the definition; parse may proceed
    Matched,
    /// No fit, but the definition is optional: keep the TLV for the next one
    NotPresent,
    /// No fit; the definition's default value was installed on the host
    DefaultApplied,
}

pub(crate) fn template_error(msg: impl Into<String>) -> Error {
    Error::Template(TemplateError::new(msg))
}

/// Attach a context line to an unwinding failure
pub(crate) trait TemplateContext<T> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T>;
}

impl<T> TemplateContext<T> for Result<T> {
    fn with_context<F: FnOnce() -> String>(self, f: F) -> Result<T> {
        self.map_err(|e| {
            let mut te = match e {
                Error::Template(te) => te,
                other => TemplateError::new(other.to_string()),
            };
            te.push(f());
            Error::Template(te)
        })
    }
}

fn describe(def: &Definition) -> String {
    match &def.name {
        Some(name) => format!("value {}", name),
        None => "value".to_string(),
    }
}

fn field_name(def: &Definition) -> Result<&str> {
    def.name
        .as_deref()
        .ok_or_else(|| template_error("'name' is missing in ASN.1 definition"))
}

//--- match

fn matches_tag_class(header: &Header, def: &Definition, default_tag: Tag) -> bool {
    header.tag() == def.expected_tag(default_tag) && header.class() == def.expected_class()
}

/// Side-effect-free shape test: would this header satisfy the definition?
///
/// Used both as the core of `match_def` and for probing CHOICE alternatives,
/// where a failing branch must not install defaults or record errors.
fn probe(header: &Header, def: &Definition, registry: &DefMap) -> Result<bool> {
    match &def.kind {
        DefKind::Primitive { tag } => Ok(matches_tag_class(header, def, *tag)),
        DefKind::Sequence { .. } | DefKind::SequenceOf { .. } => {
            Ok(header.is_constructed() && matches_tag_class(header, def, Tag::Sequence))
        }
        DefKind::Set { .. } | DefKind::SetOf { .. } => {
            Ok(header.is_constructed() && matches_tag_class(header, def, Tag::Set))
        }
        DefKind::Template { type_name } => {
            let resolved = resolve_type(registry, type_name)?;
            let effective = effective_definition(&resolved, def);
            probe(header, &effective, registry)
        }
        DefKind::Any => Ok(true),
        DefKind::Choice { alternatives } => {
            for alt in alternatives {
                if probe(header, alt, registry)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// The referenced type's kind with the referencing field's options
fn effective_definition(type_def: &Definition, site: &Definition) -> Definition {
    Definition {
        kind: type_def.kind.clone(),
        name: site.name.clone(),
        tag: site.tag,
        class: site.class,
        tagging: site.tagging,
        optional: site.optional,
        default: site.default.clone(),
    }
}

fn default_tag_of(def: &Definition, registry: &DefMap) -> Result<Tag> {
    match &def.kind {
        DefKind::Primitive { tag } => Ok(*tag),
        DefKind::Sequence { .. } | DefKind::SequenceOf { .. } => Ok(Tag::Sequence),
        DefKind::Set { .. } | DefKind::SetOf { .. } => Ok(Tag::Set),
        DefKind::Template { type_name } => {
            let resolved = resolve_type(registry, type_name)?;
            default_tag_of(&resolved, registry)
        }
        DefKind::Any | DefKind::Choice { .. } => Ok(Tag::EndOfContent),
    }
}

fn mandatory_mismatch(header: &Header, def: &Definition, default_tag: Tag) -> Error {
    let expected_tag = def.expected_tag(default_tag);
    let expected_class = def.expected_class();
    let mut e = TemplateError::new(format!("mandatory {} is missing", describe(def)));
    if header.tag() != expected_tag {
        e.push(format!(
            "tag mismatch (expected: {}, got: {})",
            expected_tag.0,
            header.tag().0
        ));
    }
    if header.class() != expected_class {
        e.push(format!(
            "tag class mismatch (expected: {}, got: {})",
            expected_class,
            header.class()
        ));
    }
    Error::Template(e)
}

fn check_optional_or_default(
    def: &Definition,
    staging: &mut HashMap<String, FieldSlot>,
) -> Result<MatchOutcome> {
    if let Some(default) = def.default.clone() {
        install_default(staging, def, default)?;
        return Ok(MatchOutcome::DefaultApplied);
    }
    Ok(MatchOutcome::NotPresent)
}

fn install_default(
    staging: &mut HashMap<String, FieldSlot>,
    def: &Definition,
    default: crate::types::Payload,
) -> Result<()> {
    let name = field_name(def)?.to_string();
    staging.insert(
        name,
        FieldSlot {
            object: None,
            definition: def.clone(),
            value: Some(FieldValue::Payload(default)),
        },
    );
    Ok(())
}

/// Match one TLV header against one sub-definition.
///
/// A fit yields `Matched`. A miss on an optional definition yields
/// `NotPresent`, or `DefaultApplied` after installing the default. A miss on
/// a mandatory definition is an error carrying the tag/class diagnosis.
pub(crate) fn match_def(
    header: &Header,
    def: &Definition,
    registry: &DefMap,
    staging: &mut HashMap<String, FieldSlot>,
) -> Result<MatchOutcome> {
    if probe(header, def, registry)? {
        return Ok(MatchOutcome::Matched);
    }
    match &def.kind {
        DefKind::Sequence { .. } | DefKind::Set { .. } => {
            if !def.optional {
                if !header.is_constructed() {
                    return Err(template_error("constructed bit not set"))
                        .with_context(|| format!("mandatory {} not found", describe(def)));
                }
                return Err(mandatory_mismatch(header, def, default_tag_of(def, registry)?));
            }
            check_optional_or_default(def, staging)
        }
        DefKind::Choice { alternatives } => {
            if !def.optional {
                return Err(template_error(format!(
                    "no alternative matched {} (got tag {} class {}, {} alternatives tried)",
                    describe(def),
                    header.tag().0,
                    header.class(),
                    alternatives.len()
                )));
            }
            check_optional_or_default(def, staging)
        }
        _ => {
            if !def.optional {
                return Err(mandatory_mismatch(header, def, default_tag_of(def, registry)?));
            }
            check_optional_or_default(def, staging)
        }
    }
}

//--- parse

/// Bind a matched TLV to the host record per its definition
pub(crate) fn parse_def(
    object: Object,
    def: &Definition,
    registry: &Arc<DefMap>,
    staging: &mut HashMap<String, FieldSlot>,
) -> Result<()> {
    match &def.kind {
        DefKind::Sequence { layout, min_size } | DefKind::Set { layout, min_size } => {
            // inline composite: its sub-fields land on the same record
            parse_composite(&object, def, layout, *min_size, registry, staging)
        }
        DefKind::Template { type_name } => {
            let resolved = resolve_type(registry, type_name)?;
            let name = field_name(def)?.to_string();
            let instance = Instance::new(
                object,
                resolved,
                Some(def.clone()),
                Arc::clone(registry),
            );
            staging.insert(
                name,
                FieldSlot {
                    object: None,
                    definition: def.clone(),
                    value: Some(FieldValue::Struct(instance)),
                },
            );
            Ok(())
        }
        _ => {
            // leaf kinds keep the TLV; decoding happens on field access
            let name = field_name(def)?.to_string();
            staging.insert(
                name,
                FieldSlot {
                    object: Some(object),
                    definition: def.clone(),
                    value: None,
                },
            );
            Ok(())
        }
    }
}

/// Unwrap an explicitly tagged object: parse the single inner TLV from its
/// content and return that TLV's content octets
fn unpack_explicit(object: &Object) -> Result<Object> {
    if !object.header().is_constructed() {
        return Err(template_error(
            "constructed bit not set for explicitly tagged value",
        ));
    }
    let bytes = object.bytes().ok_or(Error::BerValueError)?;
    let (rem, inner) = parse_object(bytes)
        .map_err(Error::from)
        .with_context(|| "could not unpack explicitly tagged value".to_string())?;
    if !rem.is_empty() {
        return Err(template_error(
            "data left after explicitly tagged value",
        ));
    }
    Ok(inner)
}

/// The iterative SEQUENCE/SET layout walk.
///
/// Reads inner TLVs one at a time, attempting each sub-definition in layout
/// order: a match consumes the TLV, a recoverable miss advances to the next
/// sub-definition with the TLV kept. When the stream runs dry the remaining
/// sub-definitions must all be optional. After the walk, the matched count
/// is checked against `min_size` (installed defaults do not count) and the
/// stream must be fully consumed.
pub(crate) fn parse_composite(
    object: &Object,
    site: &Definition,
    layout: &[Definition],
    min_size: Option<usize>,
    registry: &Arc<DefMap>,
    staging: &mut HashMap<String, FieldSlot>,
) -> Result<()> {
    let inner_object;
    let content: &[u8] = if site.is_explicit() {
        inner_object = unpack_explicit(object)?;
        inner_object.bytes().ok_or(Error::BerValueError)?
    } else {
        object.bytes().ok_or(Error::BerValueError)?
    };

    let mut stream: &[u8] = content;
    let mut cur: Option<Object> = next_object(&mut stream)?;
    let mut matched = 0usize;

    for sub in layout {
        let outcome = match cur.as_ref() {
            Some(obj) => Some(
                match_def(obj.header(), sub, registry, staging)
                    .with_context(|| format!("could not parse {}", describe(sub)))?,
            ),
            None => None,
        };
        match outcome {
            Some(MatchOutcome::Matched) => {
                let obj = match cur.take() {
                    Some(obj) => obj,
                    None => return Err(Error::BerValueError),
                };
                parse_def(obj, sub, registry, staging)
                    .with_context(|| format!("could not parse {}", describe(sub)))?;
                matched += 1;
                cur = next_object(&mut stream)?;
            }
            Some(MatchOutcome::NotPresent) | Some(MatchOutcome::DefaultApplied) => {
                // keep the TLV for the next sub-definition
            }
            None => {
                // stream exhausted before the layout
                if !sub.optional {
                    return Err(template_error(format!(
                        "mandatory {} not found",
                        describe(sub)
                    )));
                }
                if let Some(default) = sub.default.clone() {
                    install_default(staging, sub, default)?;
                }
            }
        }
    }

    let min = min_size.unwrap_or_else(|| layout.iter().filter(|d| !d.optional).count());
    if matched < min {
        return Err(template_error(format!(
            "expected {}..{} values, got {}",
            min,
            layout.len(),
            matched
        )));
    }
    if cur.is_some() || !stream.is_empty() {
        return Err(template_error("data left that could not be parsed"));
    }
    Ok(())
}

fn next_object(stream: &mut &[u8]) -> Result<Option<Object>> {
    if stream.is_empty() {
        return Ok(None);
    }
    let (rest, object) = parse_object(stream)
        .map_err(Error::from)
        .with_context(|| "error while trying to read next value".to_string())?;
    *stream = rest;
    Ok(Some(object))
}

/// Match the instance's own header and bind its layout to field slots.
///
/// Fields are staged in a scratch map and committed only when the whole
/// layout parsed; a failure leaves the instance untouched.
pub(crate) fn parse_instance(instance: &mut Instance) -> Result<()> {
    let type_def = Arc::clone(&instance.type_def);
    let registry = Arc::clone(&instance.registry);
    let effective = match &instance.site {
        Some(site) => effective_definition(&type_def, site),
        None => (*type_def).clone(),
    };
    log_trace!("parsing template instance ({})", describe(&effective));

    let (layout, min_size) = match &type_def.kind {
        DefKind::Sequence { layout, min_size } | DefKind::Set { layout, min_size } => {
            (layout, *min_size)
        }
        _ => {
            return Err(template_error(
                "top-level definition must be a SEQUENCE or SET",
            ))
        }
    };

    if !probe(instance.object.header(), &effective, &registry)? {
        return Err(mandatory_mismatch(
            instance.object.header(),
            &effective,
            default_tag_of(&effective, &registry)?,
        ));
    }

    let mut staging = HashMap::new();
    parse_composite(
        &instance.object,
        &effective,
        layout,
        min_size,
        &registry,
        &mut staging,
    )
    .with_context(|| format!("could not parse {}", describe(&effective)))?;

    instance.fields = staging;
    instance.parsed = true;
    // the field slots own the content now
    instance.object.bytes = None;
    Ok(())
}

//--- decode

/// Materialise the semantic value bound to a field slot
pub(crate) fn decode_slot(slot: &mut FieldSlot, registry: &Arc<DefMap>) -> Result<()> {
    if slot.value.is_some() {
        return Ok(());
    }
    let object = match &slot.object {
        Some(object) => object,
        None => return Err(Error::BerValueError),
    };
    let value = decode_for(object, &slot.definition, registry)
        .with_context(|| format!("error while decoding {}", describe(&slot.definition)))?;
    slot.value = Some(value);
    Ok(())
}

fn decode_for(object: &Object, def: &Definition, registry: &Arc<DefMap>) -> Result<FieldValue> {
    match &def.kind {
        DefKind::Primitive { tag } => decode_primitive(object, def, *tag),
        DefKind::SequenceOf { inner } | DefKind::SetOf { inner } => {
            decode_list(object, def, inner, registry)
        }
        DefKind::Any => Ok(FieldValue::Raw(value_from_object(object)?)),
        DefKind::Template { type_name } => {
            let resolved = resolve_type(registry, type_name)?;
            Ok(FieldValue::Struct(Instance::new(
                object.clone(),
                resolved,
                Some(def.clone()),
                Arc::clone(registry),
            )))
        }
        DefKind::Sequence { .. } | DefKind::Set { .. } => {
            // anonymous composite, e.g. a CHOICE alternative
            Ok(FieldValue::Struct(Instance::new(
                object.clone(),
                Arc::new(def.clone()),
                None,
                Arc::clone(registry),
            )))
        }
        DefKind::Choice { alternatives } => {
            for (index, alt) in alternatives.iter().enumerate() {
                if probe(object.header(), alt, registry)? {
                    let value = decode_for(object, alt, registry)?;
                    return Ok(FieldValue::Chosen {
                        index,
                        value: Box::new(value),
                    });
                }
            }
            Err(template_error(format!(
                "no alternative matched {}",
                describe(def)
            )))
        }
    }
}

fn decode_primitive(object: &Object, def: &Definition, default_tag: Tag) -> Result<FieldValue> {
    if def.is_explicit() {
        let inner = unpack_explicit(object)?;
        return decode_primitive_content(&inner, default_tag);
    }
    decode_primitive_content(object, default_tag)
}

/// Decode primitive content by its declared type, re-assembling segmented
/// (constructed, possibly indefinite-length) encodings first
fn decode_primitive_content(object: &Object, default_tag: Tag) -> Result<FieldValue> {
    let bytes = object.bytes().ok_or(Error::BerValueError)?;
    let content: Vec<u8> = if object.header().is_constructed() {
        // only the string types have a segmented encoding
        if !is_string_like(default_tag) {
            return Err(template_error("constructed bit set"));
        }
        let children = parse_children(bytes)?;
        assemble_segments(default_tag, &children)?
    } else {
        bytes.to_vec()
    };
    let codec = codec(default_tag).ok_or_else(|| {
        template_error(format!(
            "no codec available for default tag {}",
            default_tag.0
        ))
    })?;
    let payload = (codec.decode)(&content)?;
    Ok(FieldValue::Payload(payload))
}

fn decode_list(
    object: &Object,
    def: &Definition,
    inner: &Definition,
    registry: &Arc<DefMap>,
) -> Result<FieldValue> {
    let inner_object;
    let content: &[u8] = if def.is_explicit() {
        inner_object = unpack_explicit(object)?;
        inner_object.bytes().ok_or(Error::BerValueError)?
    } else {
        object.bytes().ok_or(Error::BerValueError)?
    };

    let mut elements = Vec::new();
    let mut stream = content;
    while let Some(element) = next_object(&mut stream)? {
        if !probe(element.header(), inner, registry)? {
            return Err(template_error(format!(
                "unexpected element in {} (tag {} class {})",
                describe(def),
                element.header().tag().0,
                element.header().class()
            )));
        }
        elements.push(decode_for(&element, inner, registry)?);
    }
    if elements.is_empty() && !def.optional {
        return Err(template_error(format!(
            "mandatory {} could not be parsed: collection is empty",
            describe(def)
        )));
    }
    Ok(FieldValue::List(elements))
}
