use crate::types::Payload;
use crate::{Class, Tag};
use std::collections::HashMap;
use std::sync::Arc;

/// Tagging discipline for a schema tag override
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Tagging {
    /// The override wraps the underlying TLV in an outer constructed TLV
    Explicit,
    /// The override replaces the underlying type's tag and class
    Implicit,
}

/// The shape a definition matches and how its content is interpreted
#[derive(Clone, Debug)]
pub enum DefKind {
    /// A universal primitive type, given by its default tag
    Primitive { tag: Tag },
    Sequence {
        layout: Vec<Definition>,
        /// Minimum number of matched (non-default) fields; when absent, the
        /// count of mandatory fields in the layout
        min_size: Option<usize>,
    },
    Set {
        layout: Vec<Definition>,
        min_size: Option<usize>,
    },
    SequenceOf { inner: Box<Definition> },
    SetOf { inner: Box<Definition> },
    /// Reference to a definition registered under `type_name`
    Template { type_name: String },
    Any,
    /// Alternatives tried in declaration order
    Choice { alternatives: Vec<Definition> },
}

/// Declarative schema for one value: a codec kind plus field-site options
/// (field name, tag override, tagging discipline, optionality, default).
///
/// Definitions are built with the constructor for the wanted kind, then
/// refined through the chained builder methods:
///
/// ```
/// use asn1_template::Definition;
///
/// let def = Definition::sequence(vec![
///     Definition::integer().name("serial"),
///     Definition::printable_string().name("subject").tagged(0).explicit().optional(),
/// ]);
/// ```
#[derive(Clone, Debug)]
pub struct Definition {
    pub(crate) kind: DefKind,
    pub(crate) name: Option<String>,
    pub(crate) tag: Option<u32>,
    pub(crate) class: Option<Class>,
    pub(crate) tagging: Option<Tagging>,
    pub(crate) optional: bool,
    pub(crate) default: Option<Payload>,
}

impl Definition {
    fn with_kind(kind: DefKind) -> Self {
        Definition {
            kind,
            name: None,
            tag: None,
            class: None,
            tagging: None,
            optional: false,
            default: None,
        }
    }

    /// A universal primitive type, matched and decoded by its default tag
    pub fn primitive(tag: Tag) -> Self {
        Self::with_kind(DefKind::Primitive { tag })
    }

    pub fn boolean() -> Self {
        Self::primitive(Tag::Boolean)
    }

    pub fn integer() -> Self {
        Self::primitive(Tag::Integer)
    }

    pub fn enumerated() -> Self {
        Self::primitive(Tag::Enumerated)
    }

    pub fn bit_string() -> Self {
        Self::primitive(Tag::BitString)
    }

    pub fn octet_string() -> Self {
        Self::primitive(Tag::OctetString)
    }

    pub fn null() -> Self {
        Self::primitive(Tag::Null)
    }

    pub fn oid() -> Self {
        Self::primitive(Tag::Oid)
    }

    pub fn utf8_string() -> Self {
        Self::primitive(Tag::Utf8String)
    }

    pub fn printable_string() -> Self {
        Self::primitive(Tag::PrintableString)
    }

    pub fn ia5_string() -> Self {
        Self::primitive(Tag::Ia5String)
    }

    pub fn utc_time() -> Self {
        Self::primitive(Tag::UtcTime)
    }

    pub fn generalized_time() -> Self {
        Self::primitive(Tag::GeneralizedTime)
    }

    pub fn sequence(layout: Vec<Definition>) -> Self {
        Self::with_kind(DefKind::Sequence {
            layout,
            min_size: None,
        })
    }

    pub fn set(layout: Vec<Definition>) -> Self {
        Self::with_kind(DefKind::Set {
            layout,
            min_size: None,
        })
    }

    pub fn sequence_of(inner: Definition) -> Self {
        Self::with_kind(DefKind::SequenceOf {
            inner: Box::new(inner),
        })
    }

    pub fn set_of(inner: Definition) -> Self {
        Self::with_kind(DefKind::SetOf {
            inner: Box::new(inner),
        })
    }

    /// Reference a definition registered under `type_name`
    pub fn template(type_name: impl Into<String>) -> Self {
        Self::with_kind(DefKind::Template {
            type_name: type_name.into(),
        })
    }

    pub fn any() -> Self {
        Self::with_kind(DefKind::Any)
    }

    pub fn choice(alternatives: Vec<Definition>) -> Self {
        Self::with_kind(DefKind::Choice { alternatives })
    }

    //--- builder options

    /// The field name this definition binds to on the host record
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Override the expected tag; the class defaults to context-specific
    /// once an override is present
    pub fn tagged(mut self, tag: u32) -> Self {
        self.tag = Some(tag);
        self
    }

    /// Use explicit tagging for the tag override
    pub fn explicit(mut self) -> Self {
        self.tagging = Some(Tagging::Explicit);
        self
    }

    /// Use implicit tagging for the tag override
    pub fn implicit(mut self) -> Self {
        self.tagging = Some(Tagging::Implicit);
        self
    }

    /// Override the expected class
    pub fn class(mut self, class: Class) -> Self {
        self.class = Some(class);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Value installed when the field is absent; implies `optional`
    pub fn default_value(mut self, default: impl Into<Payload>) -> Self {
        self.default = Some(default.into());
        self.optional = true;
        self
    }

    /// Require at least `min` matched fields (defaults excluded); only
    /// meaningful for SEQUENCE and SET definitions
    pub fn min_size(mut self, min: usize) -> Self {
        match &mut self.kind {
            DefKind::Sequence { min_size, .. } | DefKind::Set { min_size, .. } => {
                *min_size = Some(min)
            }
            _ => {}
        }
        self
    }

    //--- internal accessors

    pub(crate) fn is_explicit(&self) -> bool {
        matches!(self.tagging, Some(Tagging::Explicit))
    }

    pub(crate) fn expected_tag(&self, default_tag: Tag) -> Tag {
        match self.tag {
            Some(t) => Tag(t),
            None => default_tag,
        }
    }

    pub(crate) fn expected_class(&self) -> Class {
        if let Some(class) = self.class {
            class
        } else if self.tag.is_some() || self.tagging.is_some() {
            Class::ContextSpecific
        } else {
            Class::Universal
        }
    }
}

pub(crate) type DefMap = HashMap<String, Arc<Definition>>;

/// Registry of named template definitions.
///
/// `parse` snapshots the current contents (the map is copy-on-write), so
/// registering further types never affects parses already in flight.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    defs: Arc<DefMap>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            defs: Arc::new(HashMap::new()),
        }
    }

    /// Register `definition` under `name`, replacing any previous entry
    pub fn register(&mut self, name: impl Into<String>, definition: Definition) {
        Arc::make_mut(&mut self.defs).insert(name.into(), Arc::new(definition));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub(crate) fn snapshot(&self) -> Arc<DefMap> {
        Arc::clone(&self.defs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_options() {
        let def = Definition::integer()
            .name("version")
            .tagged(0)
            .explicit()
            .default_value(0i64);
        assert_eq!(def.name.as_deref(), Some("version"));
        assert_eq!(def.expected_tag(Tag::Integer), Tag(0));
        assert_eq!(def.expected_class(), Class::ContextSpecific);
        assert!(def.is_explicit());
        // a default implies optional
        assert!(def.optional);

        let def = Definition::integer();
        assert_eq!(def.expected_tag(Tag::Integer), Tag::Integer);
        assert_eq!(def.expected_class(), Class::Universal);
    }

    #[test]
    fn registry_snapshots_are_immune_to_later_registration() {
        let mut registry = Registry::new();
        registry.register("A", Definition::sequence(vec![]));
        let snapshot = registry.snapshot();
        registry.register("B", Definition::sequence(vec![]));
        assert!(snapshot.get("B").is_none());
        assert!(registry.contains("B"));
        assert!(snapshot.get("A").is_some());
    }
}
