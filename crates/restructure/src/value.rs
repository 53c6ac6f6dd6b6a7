//! Loosely typed object model used as decoding input.

use std::{
    any::{self, Any, TypeId},
    collections::{BTreeMap, HashMap},
    fmt,
};

use crate::metadata::{FieldTag, RustType};

/// Loosely typed value serving as decoding input.
///
/// Besides the JSON object model, a value may hold a [typed struct](StructValue) (e.g., produced by
/// [`Encode`](crate::Encode)) or an [arbitrary Rust value](AnyValue) (e.g., produced by a [hook](crate::de::DecodeHook)).
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    Uint(u64),
    /// Floating-point number.
    Float(f64),
    /// String value.
    String(String),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// Keyed collection of values.
    Object(Map),
    /// Typed struct together with its field tags.
    Struct(StructValue),
    /// Arbitrary typed value.
    Any(AnyValue),
}

/// Keyed collection of [`Value`]s.
pub type Map<V = Value> = BTreeMap<String, V>;

/// Runtime type of a [`Value`]. This is what [hooks](crate::de::DecodeHook) receive as the source type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ValueKind {
    /// [`Value::Null`]
    Null,
    /// [`Value::Bool`]
    Bool,
    /// [`Value::Int`]
    Int,
    /// [`Value::Uint`]
    Uint,
    /// [`Value::Float`]
    Float,
    /// [`Value::String`]
    String,
    /// [`Value::Array`]
    Array,
    /// [`Value::Object`]
    Object,
    /// [`Value::Struct`]
    Struct,
    /// [`Value::Any`]
    Any,
}

impl ValueKind {
    /// Returns the human-readable name of this kind.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Float => "float",
            Self::String => "string",
            Self::Array => "array",
            Self::Object => "map",
            Self::Struct => "struct",
            Self::Any => "any",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl Value {
    /// Returns the runtime kind of this value.
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Uint(_) => ValueKind::Uint,
            Self::Float(_) => ValueKind::Float,
            Self::String(_) => ValueKind::String,
            Self::Array(_) => ValueKind::Array,
            Self::Object(_) => ValueKind::Object,
            Self::Struct(_) => ValueKind::Struct,
            Self::Any(_) => ValueKind::Any,
        }
    }

    /// Returns a type name for use in error messages. Unlike [`Self::kind()`], this returns the name
    /// of the Rust type for typed values.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Struct(value) => value.ty.name_in_code(),
            Self::Any(value) => value.type_name(),
            _ => self.kind().as_str(),
        }
    }

    /// Checks whether this value is [`Self::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Checks whether this value equals the zero value of its type. This is used by the `omitzero` tag option.
    ///
    /// Arrays and maps are never zero; to express an absent collection, wrap it into an `Option`.
    /// Typed values are never zero either.
    pub fn is_zero(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(value) => !value,
            Self::Int(value) => *value == 0,
            Self::Uint(value) => *value == 0,
            Self::Float(value) => *value == 0.0,
            Self::String(value) => value.is_empty(),
            Self::Struct(value) => value.fields.iter().all(|field| field.value.is_zero()),
            Self::Array(_) | Self::Object(_) | Self::Any(_) => false,
        }
    }

    /// Checks whether this value is zero or an empty collection. This is used by the `omitempty` tag option.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Array(items) => items.is_empty(),
            Self::Object(map) => map.is_empty(),
            _ => self.is_zero(),
        }
    }

    /// Attempts to convert this value to a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Attempts to convert this value to an object.
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Replaces all [`Self::Struct`] values (including nested ones) with their projections as maps.
    pub(crate) fn into_projection(self, tag_name: &str, squash_embedded: bool) -> Self {
        match self {
            Self::Struct(value) => Self::Object(value.into_map(tag_name, squash_embedded)),
            Self::Array(items) => Self::Array(
                items
                    .into_iter()
                    .map(|item| item.into_projection(tag_name, squash_embedded))
                    .collect(),
            ),
            Self::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, value.into_projection(tag_name, squash_embedded)))
                    .collect(),
            ),
            value => value,
        }
    }
}

/// Arbitrary typed Rust value wrapped into a [`Value`].
///
/// A value of this kind is assigned to a destination of exactly the same type without any conversions.
pub struct AnyValue {
    inner: Box<dyn Any + Send + Sync>,
    type_name: &'static str,
    clone_fn: fn(&dyn Any) -> Box<dyn Any + Send + Sync>,
    eq_fn: fn(&dyn Any, &dyn Any) -> bool,
    debug_fn: fn(&dyn Any, &mut fmt::Formatter<'_>) -> fmt::Result,
}

fn downcast<T: Any>(value: &dyn Any) -> &T {
    value
        .downcast_ref()
        .expect("Internal error: `AnyValue` type mismatch")
}

fn clone_any<T: Any + Clone + Send + Sync>(value: &dyn Any) -> Box<dyn Any + Send + Sync> {
    Box::new(downcast::<T>(value).clone())
}

fn eq_any<T: Any + PartialEq>(lhs: &dyn Any, rhs: &dyn Any) -> bool {
    rhs.downcast_ref::<T>()
        .is_some_and(|rhs| downcast::<T>(lhs) == rhs)
}

fn debug_any<T: Any + fmt::Debug>(value: &dyn Any, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Debug::fmt(downcast::<T>(value), formatter)
}

impl AnyValue {
    /// Wraps the provided value.
    pub fn new<T>(value: T) -> Self
    where
        T: Any + Clone + PartialEq + fmt::Debug + Send + Sync,
    {
        Self {
            inner: Box::new(value),
            type_name: any::type_name::<T>(),
            clone_fn: clone_any::<T>,
            eq_fn: eq_any::<T>,
            debug_fn: debug_any::<T>,
        }
    }

    /// Returns the name of the wrapped type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the ID of the wrapped type.
    pub fn type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    /// Checks whether the wrapped value has the specified type.
    pub fn is<T: Any>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Returns a reference to the wrapped value if it has the specified type.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    /// Extracts the wrapped value if it has the specified type.
    ///
    /// # Errors
    ///
    /// Returns `self` if the wrapped value has another type.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        let Self {
            inner,
            type_name,
            clone_fn,
            eq_fn,
            debug_fn,
        } = self;
        match inner.downcast::<T>() {
            Ok(value) => Ok(*value),
            Err(inner) => Err(Self {
                inner,
                type_name,
                clone_fn,
                eq_fn,
                debug_fn,
            }),
        }
    }
}

impl Clone for AnyValue {
    fn clone(&self) -> Self {
        Self {
            inner: (self.clone_fn)(&*self.inner),
            type_name: self.type_name,
            clone_fn: self.clone_fn,
            eq_fn: self.eq_fn,
            debug_fn: self.debug_fn,
        }
    }
}

impl PartialEq for AnyValue {
    fn eq(&self, other: &Self) -> bool {
        (self.eq_fn)(&*self.inner, &*other.inner)
    }
}

impl fmt::Debug for AnyValue {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "AnyValue<{}>(", self.type_name)?;
        (self.debug_fn)(&*self.inner, formatter)?;
        formatter.write_str(")")
    }
}

/// Typed struct used as a decoding source. Usually produced by [`Encode`](crate::Encode).
#[derive(Debug, Clone, PartialEq)]
pub struct StructValue {
    ty: RustType,
    fields: Vec<StructField>,
}

/// Field of a [`StructValue`].
#[derive(Debug, Clone, PartialEq)]
pub struct StructField {
    /// Canonical field name. For embedded fields, this is the name of the field type.
    pub name: &'static str,
    /// Raw tags of the field, as `(tag_name, tag_value)` tuples.
    pub tags: &'static [(&'static str, &'static str)],
    /// Is this field embedded?
    pub embedded: bool,
    /// Field value.
    pub value: Value,
}

impl StructField {
    /// Creates a new field.
    pub fn new(
        name: &'static str,
        tags: &'static [(&'static str, &'static str)],
        embedded: bool,
        value: Value,
    ) -> Self {
        Self {
            name,
            tags,
            embedded,
            value,
        }
    }

    fn tag(&self, tag_name: &str) -> Option<&'static str> {
        self.tags
            .iter()
            .find_map(|&(name, value)| (name == tag_name).then_some(value))
    }
}

impl StructValue {
    /// Creates a struct value.
    pub fn new(ty: RustType, fields: Vec<StructField>) -> Self {
        Self { ty, fields }
    }

    /// Returns the type of this struct.
    pub fn ty(&self) -> RustType {
        self.ty
    }

    /// Returns fields of this struct in the declaration order.
    pub fn fields(&self) -> &[StructField] {
        &self.fields
    }

    /// Projects this struct into a keyed mapping. This is the intermediate representation used to decode
    /// a struct into another struct or a map.
    ///
    /// - Field keys are taken from the tag under `tag_name` (falling back to the canonical field name).
    /// - Fields with the `omitzero` option are omitted if their value [is zero](Value::is_zero());
    ///   fields with the `omitempty` option are omitted if their value [is empty](Value::is_empty()).
    /// - Fields with the `squash` option (or all embedded fields if `squash_embedded` is set)
    ///   are flattened into the produced map.
    /// - Nested structs are projected recursively, so the output contains no [`Value::Struct`]s.
    pub fn into_map(self, tag_name: &str, squash_embedded: bool) -> Map {
        let mut map = Map::new();
        self.project_into(&mut map, tag_name, squash_embedded);
        map
    }

    fn project_into(self, map: &mut Map, tag_name: &str, squash_embedded: bool) {
        for field in self.fields {
            let tag = FieldTag::parse(field.tag(tag_name));
            if tag.skip
                || (tag.omitzero && field.value.is_zero())
                || (tag.omitempty && field.value.is_empty())
            {
                continue;
            }

            let squash = tag.squash || (squash_embedded && field.embedded);
            match field.value {
                Value::Struct(inner) if squash => {
                    inner.project_into(map, tag_name, squash_embedded);
                }
                value => {
                    let key = tag.name.unwrap_or(field.name);
                    map.insert(
                        key.to_owned(),
                        value.into_projection(tag_name, squash_embedded),
                    );
                }
            }
        }
    }
}

macro_rules! impl_from_int {
    ($variant:ident($target:ty): $($int:ty),+) => {
        $(
        impl From<$int> for Value {
            fn from(value: $int) -> Self {
                Self::$variant(<$target>::from(value))
            }
        }
        )+
    };
}

impl_from_int!(Int(i64): i8, i16, i32, i64);
impl_from_int!(Uint(u64): u8, u16, u32, u64);

impl From<isize> for Value {
    fn from(value: isize) -> Self {
        Self::Int(value as i64)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Self::Uint(value as u64)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Float(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::Array(items.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<Value>, S> From<HashMap<String, V, S>> for Value {
    fn from(map: HashMap<String, V, S>) -> Self {
        Self::Object(map.into_iter().map(|(key, value)| (key, value.into())).collect())
    }
}

impl<V: Into<Value>> From<BTreeMap<String, V>> for Value {
    fn from(map: BTreeMap<String, V>) -> Self {
        Self::Object(map.into_iter().map(|(key, value)| (key, value.into())).collect())
    }
}

impl From<StructValue> for Value {
    fn from(value: StructValue) -> Self {
        Self::Struct(value)
    }
}

impl From<AnyValue> for Value {
    fn from(value: AnyValue) -> Self {
        Self::Any(value)
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(value),
            serde_json::Value::Number(number) => {
                if let Some(value) = number.as_i64() {
                    Self::Int(value)
                } else if let Some(value) = number.as_u64() {
                    Self::Uint(value)
                } else {
                    Self::Float(number.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(value) => Self::String(value),
            serde_json::Value::Array(items) => {
                Self::Array(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Self::from(value)))
                    .collect(),
            ),
        }
    }
}

/// Dot-separated path to a destination node, like `Outer.Inner[2]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Path<'a>(pub &'a str);

impl Path<'_> {
    pub(crate) fn join(self, field: &str) -> String {
        if field.is_empty() {
            self.0.to_owned()
        } else if self.0.is_empty() {
            field.to_owned()
        } else {
            format!("{}.{field}", self.0)
        }
    }

    pub(crate) fn index(self, index: usize) -> String {
        format!("{}[{index}]", self.0)
    }

    pub(crate) fn key(self, key: &str) -> String {
        format!("{}[{key}]", self.0)
    }
}
