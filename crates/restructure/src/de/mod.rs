//! Decoding logic.
//!
//! # How it works
//!
//! Decoding walks the source [`Value`] and the destination in lockstep. The destination is accessed
//! via the object-safe [`Decode`] trait; its [`node()`](Decode::node()) method exposes the destination as one of a closed set
//! of structural kinds ([`Node`]). At each node, the following steps are performed, with the first applicable step winning:
//!
//! 1. A null source leaves the destination untouched (or resets it to the zero value if
//!    [`zero_fields`](DecoderConfig::zero_fields) is set).
//! 2. If the source is an [`AnyValue`] of exactly the destination type, it is assigned as is.
//! 3. The [hook](DecodeHook) (if any) is invoked and may transform the source value.
//! 4. If the destination [decodes itself](UnmarshalValue), its custom decode method is invoked with the source value.
//!    Options and boxes leading to such a type are allocated beforehand.
//! 5. Otherwise, the destination is decoded structurally according to its kind.
//!
//! Unlike `serde` deserialization, decoding does not stop early on error: errors for all struct fields
//! and collection elements are collected into [`DecodeErrors`](crate::DecodeErrors).
//!
//! # Implementing `Decode`
//!
//! For structs, [`Decode`] should be derived using the [corresponding macro](macro@crate::Decode).
//! Types that can be parsed from a string or otherwise deserialized via `serde` can be wrapped in [`Serde`].
//! Types with custom decoding logic should implement [`UnmarshalValue`] and be marked with `#[decode(unmarshal)]`.

use std::fmt;

pub use self::{
    config::{
        DEFAULT_TAG_NAME, Decoder, DecoderConfig, decode, decode_into, decode_metadata,
        weak_decode, weak_decode_metadata,
    },
    hooks::DecodeHook,
    impls::MapKey,
    report::Metadata,
    serde::Serde,
};
use crate::{
    DescribeType,
    metadata::{FieldMetadata, Receiver, TypeMetadata},
    value::{AnyValue, Value},
};

mod config;
mod deserializer;
pub mod hooks;
mod impls;
mod report;
mod scalar;
mod serde;
#[cfg(test)]
mod tests;
mod walker;

/// Type-erased operations on a decoding destination. This trait is automatically implemented
/// for all types with [static metadata](DescribeType).
pub trait DecodeBase {
    /// Returns metadata for the destination type.
    fn type_metadata(&self) -> TypeMetadata;

    /// Assigns a typed value to the destination if the value has exactly the destination type.
    ///
    /// # Errors
    ///
    /// Returns the value back if it has another type.
    fn set_exact(&mut self, value: AnyValue) -> Result<(), AnyValue>;

    /// Resets the destination to its [zero value](DescribeType::zero()).
    fn reset(&mut self);
}

impl<T: DescribeType> DecodeBase for T {
    fn type_metadata(&self) -> TypeMetadata {
        T::TYPE
    }

    fn set_exact(&mut self, value: AnyValue) -> Result<(), AnyValue> {
        *self = value.downcast::<T>()?;
        Ok(())
    }

    fn reset(&mut self) {
        *self = T::zero();
    }
}

/// Decoding destination.
///
/// This trait is object-safe; the decoder works with `&mut dyn Decode` references.
pub trait Decode: DecodeBase {
    /// Returns the structural view of this destination.
    fn node(&mut self) -> Node<'_>;

    /// Returns the custom decode method for this destination, if any. Must return `Some(_)` if and only if
    /// [`TypeMetadata::unmarshal`] is set. Options and boxes should allocate the value they point to.
    fn unmarshaler(&mut self) -> Option<Unmarshaler<'_>> {
        None
    }
}

/// Structural view of a [`Decode`] destination. Each variant corresponds to a [`Kind`](crate::metadata::Kind).
#[non_exhaustive]
pub enum Node<'a> {
    /// Leaf value.
    Scalar(&'a mut dyn ScalarNode),
    /// Optional or boxed value.
    Pointer(&'a mut dyn PointerNode),
    /// Struct with named fields.
    Struct(&'a mut dyn StructNode),
    /// Variable-length sequence.
    Slice(&'a mut dyn SliceNode),
    /// Fixed-length sequence.
    Array(&'a mut dyn ArrayNode),
    /// Keyed collection.
    Map(&'a mut dyn MapNode),
    /// Dynamically typed value.
    Interface(&'a mut Value),
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            Self::Scalar(_) => "Scalar",
            Self::Pointer(_) => "Pointer",
            Self::Struct(_) => "Struct",
            Self::Slice(_) => "Slice",
            Self::Array(_) => "Array",
            Self::Map(_) => "Map",
            Self::Interface(value) => return formatter.debug_tuple("Interface").field(value).finish(),
        };
        formatter.debug_tuple(kind).finish_non_exhaustive()
    }
}

/// Error assigning a scalar value.
#[derive(Debug)]
pub enum ScalarError {
    /// The source value has an incompatible type.
    Mismatch,
    /// The source value has a compatible type, but its conversion has failed (e.g., because of an overflow).
    Invalid(anyhow::Error),
}

/// Leaf destination.
pub trait ScalarNode {
    /// Assigns the value to this destination.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be converted to the destination type.
    fn assign(&mut self, value: &Value, weakly_typed: bool) -> Result<(), ScalarError>;
}

/// Optional or boxed destination.
pub trait PointerNode {
    /// Checks whether the pointer is unset.
    fn is_nil(&self) -> bool;
    /// Unsets the pointer. No-op for pointers that cannot be unset.
    fn set_nil(&mut self);
    /// Returns the value this pointer points to, allocating it if necessary.
    fn pointee_mut(&mut self) -> &mut dyn Decode;
}

/// Struct destination.
pub trait StructNode {
    /// Returns metadata for all fields of the struct.
    fn fields(&self) -> &'static [FieldMetadata];
    /// Returns a field by its index in [`Self::fields()`].
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    fn field_mut(&mut self, index: usize) -> &mut dyn Decode;
}

/// Variable-length sequence destination.
pub trait SliceNode {
    /// Returns metadata for the element type.
    fn element_type(&self) -> TypeMetadata;
    /// Removes all elements.
    fn clear(&mut self);
    /// Truncates or extends the sequence to the specified length. New elements have zero values.
    fn resize(&mut self, len: usize);
    /// Returns an element by index.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    fn element_mut(&mut self, index: usize) -> &mut dyn Decode;
}

/// Fixed-length sequence destination.
pub trait ArrayNode {
    /// Returns metadata for the element type.
    fn element_type(&self) -> TypeMetadata;
    /// Returns the length of the array.
    fn len(&self) -> usize;
    /// Returns an element by index.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    fn element_mut(&mut self, index: usize) -> &mut dyn Decode;
}

/// Keyed collection destination.
pub trait MapNode {
    /// Removes all entries.
    fn clear(&mut self);
    /// Checks whether the collection contains the specified key.
    fn contains_key(&self, key: &str) -> bool;
    /// Returns an entry for the specified key, inserting a zero value if necessary.
    ///
    /// # Errors
    ///
    /// Returns an error if the key cannot be converted to the key type of the collection.
    fn entry(&mut self, key: &str) -> anyhow::Result<&mut dyn Decode>;
    /// Removes an entry with the specified key.
    fn remove(&mut self, key: &str);
}

/// Custom decode method for a type.
///
/// To be used by the decoder, a type must also mark itself as self-decoding in its [metadata](TypeMetadata::unmarshal).
/// When deriving [`Decode`](macro@crate::Decode), this is done with the `#[decode(unmarshal)]` attribute.
///
/// # Examples
///
/// ```
/// use anyhow::Context as _;
/// use restructure::{de::UnmarshalValue, Decode, Value};
///
/// #[derive(Debug, Default, PartialEq, Decode)]
/// #[decode(unmarshal)]
/// struct Pair {
///     tag: String,
///     id: u64,
/// }
///
/// impl UnmarshalValue for Pair {
///     fn unmarshal_value(&mut self, raw: &Value) -> anyhow::Result<()> {
///         let raw = raw.as_str().context("expected a string")?;
///         let (tag, id) = raw.split_once('-').context("missing separator")?;
///         self.tag = tag.to_owned();
///         self.id = id.parse()?;
///         Ok(())
///     }
/// }
///
/// let pair: Pair = restructure::decode("TAG-123")?;
/// assert_eq!(pair, Pair { tag: "TAG".into(), id: 123 });
/// # anyhow::Ok(())
/// ```
pub trait UnmarshalValue {
    /// Decodes this value from the raw source value.
    ///
    /// # Errors
    ///
    /// Errors are propagated to the caller of the decoder verbatim, wrapped with the path to the decoded value.
    fn unmarshal_value(&mut self, raw: &Value) -> anyhow::Result<()>;
}

/// Custom decode method bound to a destination.
pub enum Unmarshaler<'a> {
    /// The method mutates the destination in place.
    Pointer(&'a mut dyn UnmarshalValue),
    /// The method is invoked on a copy of the destination. Mutations of the copy are discarded.
    Value(Box<dyn UnmarshalValue + 'a>),
}

impl fmt::Debug for Unmarshaler<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Unmarshaler")
            .field("receiver", &self.receiver())
            .finish_non_exhaustive()
    }
}

impl Unmarshaler<'_> {
    /// Returns the receiver kind of this method.
    pub fn receiver(&self) -> Receiver {
        match self {
            Self::Pointer(_) => Receiver::Pointer,
            Self::Value(_) => Receiver::Value,
        }
    }

    pub(crate) fn invoke(self, raw: &Value) -> anyhow::Result<()> {
        match self {
            Self::Pointer(target) => target.unmarshal_value(raw),
            Self::Value(mut copy) => copy.unmarshal_value(raw),
        }
    }
}
