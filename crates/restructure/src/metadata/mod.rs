//! Static metadata describing decoding destinations.
//!
//! Metadata is produced at compile time: by the [`Decode`](macro@crate::Decode) derive macro for structs, and by the library
//! for standard types. It is available via [`DescribeType::TYPE`](crate::DescribeType::TYPE).

use std::{any, fmt};

pub use self::tags::FieldTag;

mod tags;

/// Representation of a Rust type.
#[derive(Clone, Copy)]
pub struct RustType {
    id: fn() -> any::TypeId,
    name_in_code: &'static str,
}

impl fmt::Debug for RustType {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.name_in_code)
    }
}

impl PartialEq for RustType {
    fn eq(&self, other: &Self) -> bool {
        (self.id)() == (other.id)()
    }
}

impl RustType {
    /// Creates a new type.
    pub const fn of<T: 'static>(name_in_code: &'static str) -> Self {
        Self {
            id: any::TypeId::of::<T>,
            name_in_code,
        }
    }

    /// Returns the unique ID of this type.
    pub fn id(&self) -> any::TypeId {
        (self.id)()
    }

    /// Returns the name of this type as specified in code.
    pub const fn name_in_code(&self) -> &'static str {
        self.name_in_code
    }
}

/// Kind of a scalar destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ScalarKind {
    /// Boolean.
    Bool,
    /// Signed integer.
    Int,
    /// Unsigned integer.
    Uint,
    /// Floating-point number.
    Float,
    /// Single char.
    Char,
    /// String.
    String,
    /// Time duration.
    Duration,
    /// Value parsed from a string, such as an IP address.
    Parsed,
    /// Value deserialized via `serde`.
    Deserialize,
}

/// Structural kind of a destination type. Each kind corresponds to a single variant of [`Node`](crate::de::Node).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// Leaf value.
    Scalar(ScalarKind),
    /// Optional or boxed value.
    Pointer,
    /// Struct with named fields.
    Struct,
    /// Variable-length sequence.
    Slice,
    /// Fixed-length sequence.
    Array,
    /// Keyed collection.
    Map,
    /// Dynamically typed [`Value`](crate::Value).
    Interface,
}

impl fmt::Display for Kind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            Self::Scalar(_) => "scalar",
            Self::Pointer => "pointer",
            Self::Struct => "struct",
            Self::Slice => "slice",
            Self::Array => "array",
            Self::Map => "map",
            Self::Interface => "interface",
        })
    }
}

/// Receiver of the [custom decode method](crate::de::UnmarshalValue).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Receiver {
    /// The method is invoked on the destination itself, so its mutations persist.
    Pointer,
    /// The method is invoked on a copy of the destination, so its mutations are discarded after the call.
    Value,
}

/// Metadata of a decoding destination type.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TypeMetadata {
    /// Rust type.
    pub ty: RustType,
    /// Structural kind.
    pub kind: Kind,
    /// Receiver of the custom decode method, if the type (or the type it points to) decodes itself.
    pub unmarshal: Option<Receiver>,
}

impl TypeMetadata {
    /// Creates metadata for a type without custom decoding.
    pub const fn new(ty: RustType, kind: Kind) -> Self {
        Self {
            ty,
            kind,
            unmarshal: None,
        }
    }

    /// Sets the custom decode receiver.
    #[must_use]
    pub const fn with_unmarshal(mut self, receiver: Option<Receiver>) -> Self {
        self.unmarshal = receiver;
        self
    }

    /// Checks whether this metadata describes the specified type.
    pub fn is<T: 'static>(&self) -> bool {
        self.ty.id() == any::TypeId::of::<T>()
    }
}

/// Metadata for a struct field.
#[derive(Debug, Clone, Copy)]
pub struct FieldMetadata {
    /// Canonical field name. This is the name of the field in Rust code, or the type name for embedded fields.
    pub name: &'static str,
    /// Name of the field in Rust code.
    pub rust_field_name: &'static str,
    /// Raw field tags as `(tag_name, tag_value)` tuples. Tag values are parsed with [`FieldTag::parse()`].
    pub tags: &'static [(&'static str, &'static str)],
    /// Is this field embedded?
    pub embedded: bool,
    /// Field type.
    pub ty: TypeMetadata,
}

impl FieldMetadata {
    /// Returns the raw tag value for the specified tag name.
    pub fn tag(&self, tag_name: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find_map(|&(name, value)| (name == tag_name).then_some(value))
    }

    /// Parses the tag for the specified tag name.
    pub fn parsed_tag(&self, tag_name: &str) -> FieldTag<'static> {
        FieldTag::parse(self.tag(tag_name))
    }

    /// Checks whether the field type decodes itself.
    pub fn is_self_decoding(&self) -> bool {
        self.ty.unmarshal.is_some()
    }
}
