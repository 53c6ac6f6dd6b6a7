//! Encoding of Rust values as [`Value`]s.

use std::{
    any,
    collections::{BTreeMap, HashMap},
    fmt,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use serde::Serialize;

use crate::{
    de::Serde,
    value::{AnyValue, Map, Value},
};

/// Conversion of a Rust value into a [`Value`]. Encoded structs can be used as decoding sources, e.g. to convert
/// one struct into another.
///
/// For structs, this trait should be derived using the [corresponding macro](macro@crate::Encode).
/// Struct fields are encoded as [`StructValue`](crate::value::StructValue)s retaining field tags, so that
/// options like `omitzero` are respected when decoding.
pub trait Encode {
    /// Encodes this value.
    fn encode(&self) -> Value;
}

macro_rules! impl_encode_via_from {
    ($($ty:ty),+) => {
        $(
        impl Encode for $ty {
            fn encode(&self) -> Value {
                Value::from(*self)
            }
        }
        )+
    };
}

impl_encode_via_from!(bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, char);

impl Encode for i128 {
    fn encode(&self) -> Value {
        if let Ok(value) = i64::try_from(*self) {
            Value::Int(value)
        } else if let Ok(value) = u64::try_from(*self) {
            Value::Uint(value)
        } else {
            Value::Any(AnyValue::new(*self))
        }
    }
}

impl Encode for u128 {
    fn encode(&self) -> Value {
        u64::try_from(*self).map_or_else(|_| Value::Any(AnyValue::new(*self)), Value::Uint)
    }
}

impl Encode for String {
    fn encode(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Encode for str {
    fn encode(&self) -> Value {
        Value::String(self.to_owned())
    }
}

/// Durations are encoded as the number of nanoseconds. Durations not fitting into `u64` are encoded as is.
impl Encode for Duration {
    fn encode(&self) -> Value {
        u64::try_from(self.as_nanos()).map_or_else(|_| Value::Any(AnyValue::new(*self)), Value::Uint)
    }
}

macro_rules! impl_encode_via_display {
    ($($ty:ty),+) => {
        $(
        impl Encode for $ty {
            fn encode(&self) -> Value {
                Value::String(self.to_string())
            }
        }
        )+
    };
}

impl_encode_via_display!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

impl Encode for Value {
    fn encode(&self) -> Value {
        self.clone()
    }
}

impl<T: Encode + ?Sized> Encode for &T {
    fn encode(&self) -> Value {
        (**self).encode()
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self) -> Value {
        (**self).encode()
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self) -> Value {
        self.as_ref().map_or(Value::Null, Encode::encode)
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self) -> Value {
        Value::Array(self.iter().map(Encode::encode).collect())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self) -> Value {
        self.as_slice().encode()
    }
}

impl<T: Encode, const N: usize> Encode for [T; N] {
    fn encode(&self) -> Value {
        self.as_slice().encode()
    }
}

fn encode_entries<'a, K, V>(entries: impl Iterator<Item = (&'a K, &'a V)>) -> Value
where
    K: fmt::Display + 'a,
    V: Encode + 'a,
{
    let map: Map = entries
        .map(|(key, value)| (key.to_string(), value.encode()))
        .collect();
    Value::Object(map)
}

/// Keys are encoded using their `Display` implementation.
impl<K: fmt::Display, V: Encode, S> Encode for HashMap<K, V, S> {
    fn encode(&self) -> Value {
        encode_entries(self.iter())
    }
}

/// Keys are encoded using their `Display` implementation.
impl<K: fmt::Display, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self) -> Value {
        encode_entries(self.iter())
    }
}

/// Encodes the wrapped value via its `Serialize` implementation. Values not representable in the JSON data model
/// (e.g., maps with non-string keys) are encoded as [`AnyValue`]s, which can only be decoded into `Serde<T>` itself.
impl<T> Encode for Serde<T>
where
    T: Serialize + Clone + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn encode(&self) -> Value {
        match serde_json::to_value(&self.0) {
            Ok(value) => value.into(),
            Err(err) => {
                tracing::debug!(
                    ty = any::type_name::<T>(),
                    %err,
                    "value is not representable as JSON; encoding it as a typed value"
                );
                Value::Any(AnyValue::new(self.clone()))
            }
        }
    }
}
