mod definition;
mod engine;

pub use definition::{DefKind, Definition, Registry, Tagging};

use crate::ber::{object_from_reader, parse_object};
use crate::error::*;
use crate::types::Payload;
use crate::value::{Object, Value};
use crate::Header;
use definition::DefMap;
use std::collections::HashMap;
use std::io::Read;
use std::sync::Arc;

impl Registry {
    /// Match `bytes` against the definition registered under `type_name` and
    /// return a lazily-parsed instance.
    ///
    /// Only the outer TLV is read here; field matching, parsing, and value
    /// decoding happen on first access through [`Instance::get`]. The input
    /// must consist of exactly one TLV.
    pub fn parse(&self, type_name: &str, bytes: &[u8]) -> Result<Instance> {
        let registry = self.snapshot();
        let type_def = resolve_type(&registry, type_name)?;
        let (rem, object) = parse_object(bytes).map_err(Error::from)?;
        if !rem.is_empty() {
            return Err(Error::TrailingData);
        }
        Ok(Instance::new(object, type_def, None, registry))
    }

    /// Like [`Registry::parse`], reading one TLV from a blocking byte source
    pub fn parse_reader<R: Read>(&self, type_name: &str, reader: &mut R) -> Result<Instance> {
        let registry = self.snapshot();
        let type_def = resolve_type(&registry, type_name)?;
        let object = object_from_reader(reader)?;
        Ok(Instance::new(object, type_def, None, registry))
    }
}

/// Follow `Template` references until a concrete definition is found
pub(crate) fn resolve_type(registry: &DefMap, name: &str) -> Result<Arc<Definition>> {
    let mut name = name.to_string();
    // references to references are legal, cycles are not
    for _ in 0..16 {
        let def = registry
            .get(&name)
            .ok_or_else(|| Error::UndefinedType(name.clone()))?;
        match &def.kind {
            DefKind::Template { type_name } => name = type_name.clone(),
            _ => return Ok(Arc::clone(def)),
        }
    }
    Err(Error::Template(TemplateError::new(format!(
        "too many template indirections resolving {}",
        name
    ))))
}

/// A typed record parsed against a registered definition.
///
/// The instance starts out holding only the raw TLV. Accessing a field
/// first matches and parses the whole layout (binding sub-TLVs to field
/// slots), then decodes the requested field's semantic value; both steps are
/// memoised. A failed parse leaves no fields bound, so the instance is never
/// observed half-populated.
#[derive(Clone, Debug)]
pub struct Instance {
    /// Resolved definition describing the record's layout
    pub(crate) type_def: Arc<Definition>,
    /// Field-site options when this instance is nested inside another record
    pub(crate) site: Option<Definition>,
    pub(crate) object: Object,
    pub(crate) registry: Arc<DefMap>,
    pub(crate) fields: HashMap<String, FieldSlot>,
    pub(crate) parsed: bool,
}

/// One bound field: the TLV it came from (absent for installed defaults),
/// its sub-definition, and the decoded value once materialised
#[derive(Clone, Debug)]
pub(crate) struct FieldSlot {
    pub(crate) object: Option<Object>,
    pub(crate) definition: Definition,
    pub(crate) value: Option<FieldValue>,
}

/// Decoded value of one template field
#[derive(Clone, Debug)]
pub enum FieldValue {
    /// Decoded primitive payload (or an installed default)
    Payload(Payload),
    /// Raw TLV bound by an ANY definition
    Raw(Value),
    /// Nested template instance, itself lazily parsed
    Struct(Instance),
    /// Elements of a SEQUENCE OF / SET OF
    List(Vec<FieldValue>),
    /// A CHOICE: which alternative matched, and its value
    Chosen { index: usize, value: Box<FieldValue> },
}

impl FieldValue {
    pub fn as_payload(&self) -> Option<&Payload> {
        match self {
            FieldValue::Payload(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            FieldValue::Raw(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&Instance> {
        match self {
            FieldValue::Struct(i) => Some(i),
            _ => None,
        }
    }

    /// Mutable access to a nested instance, needed to drive its lazy parse
    pub fn as_struct_mut(&mut self) -> Option<&mut Instance> {
        match self {
            FieldValue::Struct(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut [FieldValue]> {
        match self {
            FieldValue::List(l) => Some(l),
            _ => None,
        }
    }

    /// The matched CHOICE alternative, as (index, value)
    pub fn chosen(&self) -> Option<(usize, &FieldValue)> {
        match self {
            FieldValue::Chosen { index, value } => Some((*index, &**value)),
            _ => None,
        }
    }

    pub fn chosen_mut(&mut self) -> Option<(usize, &mut FieldValue)> {
        match self {
            FieldValue::Chosen { index, value } => Some((*index, &mut **value)),
            _ => None,
        }
    }
}

impl Instance {
    pub(crate) fn new(
        object: Object,
        type_def: Arc<Definition>,
        site: Option<Definition>,
        registry: Arc<DefMap>,
    ) -> Self {
        Instance {
            type_def,
            site,
            object,
            registry,
            fields: HashMap::new(),
            parsed: false,
        }
    }

    /// Header of the TLV this record was built from
    pub fn header(&self) -> &Header {
        self.object.header()
    }

    /// Whether the layout has been matched and bound yet
    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    /// Access a field by name, lazily parsing the record and decoding the
    /// field value as needed.
    ///
    /// Returns `Ok(None)` for a field that is declared in the layout but was
    /// absent from the input (OPTIONAL without DEFAULT). Asking for a name
    /// the layout does not declare is an error.
    pub fn get(&mut self, name: &str) -> Result<Option<&mut FieldValue>> {
        self.ensure_parsed()?;
        if !self.fields.contains_key(name) {
            if layout_declares(&self.type_def, name) {
                return Ok(None);
            }
            return Err(Error::Template(TemplateError::new(format!(
                "record has no field '{}'",
                name
            ))));
        }
        let registry = Arc::clone(&self.registry);
        match self.fields.get_mut(name) {
            Some(slot) => {
                engine::decode_slot(slot, &registry)?;
                Ok(slot.value.as_mut())
            }
            None => Ok(None),
        }
    }

    fn ensure_parsed(&mut self) -> Result<()> {
        if self.parsed {
            return Ok(());
        }
        engine::parse_instance(self)
    }
}

/// Does the (possibly nested) layout declare a field of this name?
fn layout_declares(def: &Definition, name: &str) -> bool {
    match &def.kind {
        DefKind::Sequence { layout, .. } | DefKind::Set { layout, .. } => {
            layout.iter().any(|sub| {
                sub.name.as_deref() == Some(name)
                    || matches!(sub.kind, DefKind::Sequence { .. } | DefKind::Set { .. })
                        && layout_declares(sub, name)
            })
        }
        _ => false,
    }
}
