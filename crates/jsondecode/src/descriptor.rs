//! Schema descriptors.
//!
//! A [`Descriptor`] tells the decoder what shape of value to expect at a
//! position: which structural mode to enter, how object keys map to field
//! indices, which fields accept `null`, and which enum names exist. The kind
//! of a descriptor is a closed enum, so every place that branches on it is an
//! exhaustive `match`.

use alloc::{borrow::Cow, boxed::Box, format, vec, vec::Vec};

/// Names are usually `&'static str` literals but may be built at runtime.
pub type Name = Cow<'static, str>;

/// Scalar types a literal can be converted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Char,
    String,
}

/// A named element of a [`Kind::Class`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: Name,
    pub descriptor: Descriptor,
}

impl Field {
    pub fn new(name: impl Into<Name>, descriptor: Descriptor) -> Self {
        Self {
            name: name.into(),
            descriptor,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Kind {
    Primitive(PrimitiveKind),
    /// A string drawn from a fixed set of names; the ordinal is the index
    /// into `variants`.
    Enum {
        variants: Vec<Name>,
    },
    /// An object with named fields.
    Class {
        fields: Vec<Field>,
    },
    /// An array; every element shares one descriptor.
    List {
        element: Box<Descriptor>,
    },
    /// An object read as alternating keys and values.
    Map {
        key: Box<Descriptor>,
        value: Box<Descriptor>,
    },
    /// An object `{"type": <name>, "value": <payload>}`. `variants` lists the
    /// accepted type names; an empty list accepts any name.
    Polymorphic {
        variants: Vec<Name>,
        fields: Vec<Field>,
    },
    /// A wrapper around a single value that has no JSON structure of its own.
    Inline {
        inner: Box<Descriptor>,
        unsigned: bool,
    },
    /// A value whose descriptor is only known while decoding, such as the
    /// payload of a polymorphic wrapper.
    Contextual,
}

/// Describes the expected shape of a value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    name: Name,
    kind: Kind,
    nullable: bool,
}

impl Descriptor {
    fn with_kind(name: impl Into<Name>, kind: Kind) -> Self {
        Self {
            name: name.into(),
            kind,
            nullable: false,
        }
    }

    pub fn primitive(name: impl Into<Name>, kind: PrimitiveKind) -> Self {
        Self::with_kind(name, Kind::Primitive(kind))
    }

    pub fn enumeration<N: Into<Name>>(
        name: impl Into<Name>,
        variants: impl IntoIterator<Item = N>,
    ) -> Self {
        Self::with_kind(
            name,
            Kind::Enum {
                variants: variants.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn class(name: impl Into<Name>, fields: impl IntoIterator<Item = Field>) -> Self {
        Self::with_kind(
            name,
            Kind::Class {
                fields: fields.into_iter().collect(),
            },
        )
    }

    #[must_use]
    pub fn list(element: Descriptor) -> Self {
        Self::with_kind(
            format!("Vec<{}>", element.name),
            Kind::List {
                element: Box::new(element),
            },
        )
    }

    #[must_use]
    pub fn map(key: Descriptor, value: Descriptor) -> Self {
        Self::with_kind(
            format!("BTreeMap<{}, {}>", key.name, value.name),
            Kind::Map {
                key: Box::new(key),
                value: Box::new(value),
            },
        )
    }

    /// A polymorphic wrapper whose `"type"` must be one of `variants` (any
    /// name if empty).
    pub fn polymorphic<N: Into<Name>>(
        name: impl Into<Name>,
        variants: impl IntoIterator<Item = N>,
    ) -> Self {
        let fields = vec![
            Field::new("type", Self::primitive("string", PrimitiveKind::String)),
            Field::new("value", Self::with_kind("value", Kind::Contextual)),
        ];
        Self::with_kind(
            name,
            Kind::Polymorphic {
                variants: variants.into_iter().map(Into::into).collect(),
                fields,
            },
        )
    }

    pub fn inline(name: impl Into<Name>, inner: Descriptor) -> Self {
        Self::with_kind(
            name,
            Kind::Inline {
                inner: Box::new(inner),
                unsigned: false,
            },
        )
    }

    /// An inline wrapper whose value is an unsigned integer carried in the
    /// signed `inner` type of the same width.
    pub fn unsigned(name: impl Into<Name>, inner: Descriptor) -> Self {
        Self::with_kind(
            name,
            Kind::Inline {
                inner: Box::new(inner),
                unsigned: true,
            },
        )
    }

    /// Marks the value as accepting `null`.
    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    /// Whether this value itself accepts `null`.
    #[must_use]
    pub fn accepts_null(&self) -> bool {
        self.nullable
    }

    /// Number of named elements: fields, enum variants, or the two elements
    /// of a polymorphic wrapper. Lists and maps report zero; their elements
    /// are unbounded.
    #[must_use]
    pub fn element_count(&self) -> usize {
        match &self.kind {
            Kind::Enum { variants } => variants.len(),
            Kind::Class { fields } | Kind::Polymorphic { fields, .. } => fields.len(),
            Kind::Inline { .. } => 1,
            Kind::Primitive(_) | Kind::List { .. } | Kind::Map { .. } | Kind::Contextual => 0,
        }
    }

    /// Resolves a field or variant name to its index. `None` means the name
    /// is unknown.
    #[must_use]
    pub fn element_index(&self, name: &str) -> Option<usize> {
        match &self.kind {
            Kind::Enum { variants } => variants.iter().position(|v| v == name),
            Kind::Class { fields } | Kind::Polymorphic { fields, .. } => {
                fields.iter().position(|f| f.name == name)
            }
            Kind::Primitive(_)
            | Kind::List { .. }
            | Kind::Map { .. }
            | Kind::Inline { .. }
            | Kind::Contextual => None,
        }
    }

    /// The descriptor of element `index`. Map elements alternate between the
    /// key (even) and value (odd) descriptors.
    #[must_use]
    pub fn element_descriptor(&self, index: usize) -> Option<&Descriptor> {
        match &self.kind {
            Kind::Class { fields } | Kind::Polymorphic { fields, .. } => {
                fields.get(index).map(|f| &f.descriptor)
            }
            Kind::List { element } => Some(&**element),
            Kind::Map { key, value } => Some(if index % 2 == 0 { &**key } else { &**value }),
            Kind::Inline { inner, .. } if index == 0 => Some(&**inner),
            Kind::Primitive(_) | Kind::Enum { .. } | Kind::Inline { .. } | Kind::Contextual => None,
        }
    }

    /// Whether element `index` accepts `null`.
    #[must_use]
    pub fn is_nullable(&self, index: usize) -> bool {
        self.element_descriptor(index)
            .is_some_and(Descriptor::accepts_null)
    }

    #[must_use]
    pub fn is_unsigned_numeric(&self) -> bool {
        matches!(self.kind, Kind::Inline { unsigned: true, .. })
    }

    /// Whether `name` is accepted as the type of a polymorphic wrapper.
    #[must_use]
    pub fn accepts_variant(&self, name: &str) -> bool {
        match &self.kind {
            Kind::Polymorphic { variants, .. } => {
                variants.is_empty() || variants.iter().any(|v| v == name)
            }
            _ => false,
        }
    }
}
