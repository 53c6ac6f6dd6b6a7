//! Decoding via `serde`.

use std::borrow::Cow;

use serde::de::DeserializeOwned;

use super::{DEFAULT_TAG_NAME, Decode, Node, ScalarError, ScalarNode, deserializer::ValueDeserializer};
use crate::{
    DescribeType,
    metadata::{Kind, RustType, ScalarKind, TypeMetadata},
    value::Value,
};

/// Wrapper decoding the contained value via its [`Deserialize`](serde::Deserialize) implementation.
///
/// The wrapped value is treated as a scalar: it is deserialized from the source value as a whole.
/// [`Value::Struct`]s in the source are projected to maps using the [configured tag name](crate::DecoderConfig::tag_name)
/// (or the [default one](DEFAULT_TAG_NAME) if the wrapper is assigned outside a decoder).
/// If weak typing is enabled, numbers and bools are parsed from strings.
///
/// # Examples
///
/// ```
/// use restructure::{de::Serde, value, Decode};
/// use serde::Deserialize;
///
/// #[derive(Debug, Default, PartialEq, Deserialize)]
/// #[serde(rename_all = "snake_case")]
/// enum Level {
///     #[default]
///     Info,
///     Warn,
/// }
///
/// #[derive(Debug, Default, Decode)]
/// struct Logging {
///     level: Serde<Level>,
/// }
///
/// let logging: Logging = restructure::decode(value!({ "level": "warn" }))?;
/// assert_eq!(logging.level.0, Level::Warn);
/// # anyhow::Ok(())
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Serde<T>(pub T);

impl<T: DeserializeOwned + Default + 'static> DescribeType for Serde<T> {
    const TYPE: TypeMetadata = TypeMetadata::new(
        RustType::of::<Self>("Serde"),
        Kind::Scalar(ScalarKind::Deserialize),
    );

    fn zero() -> Self {
        Self(T::default())
    }
}

impl<T: DeserializeOwned + Default + 'static> Decode for Serde<T> {
    fn node(&mut self) -> Node<'_> {
        Node::Scalar(self)
    }
}

fn contains_structs(value: &Value) -> bool {
    match value {
        Value::Struct(_) => true,
        Value::Array(items) => items.iter().any(contains_structs),
        Value::Object(map) => map.values().any(contains_structs),
        _ => false,
    }
}

impl<T: DeserializeOwned> ScalarNode for Serde<T> {
    fn assign(&mut self, value: &Value, weakly_typed: bool) -> Result<(), ScalarError> {
        let value = if contains_structs(value) {
            Cow::Owned(value.clone().into_projection(DEFAULT_TAG_NAME, false))
        } else {
            Cow::Borrowed(value)
        };
        let deserializer = ValueDeserializer::new(&value, weakly_typed);
        self.0 = T::deserialize(deserializer).map_err(|err| ScalarError::Invalid(err.into()))?;
        Ok(())
    }
}
