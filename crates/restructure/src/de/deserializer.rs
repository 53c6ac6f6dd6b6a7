//! `serde`-compatible deserializer based on a borrowed [`Value`].

use serde::{
    Deserialize, Deserializer,
    de::{
        self, DeserializeSeed, Error as DeError, IntoDeserializer,
        value::{MapDeserializer, SeqDeserializer},
    },
};

use crate::value::{Map, Value};

impl Value {
    #[cold]
    pub(crate) fn invalid_type(&self, expected: &str) -> serde_json::Error {
        let actual = match self {
            Self::Null => de::Unexpected::Unit,
            Self::Bool(value) => de::Unexpected::Bool(*value),
            Self::Int(value) => de::Unexpected::Signed(*value),
            Self::Uint(value) => de::Unexpected::Unsigned(*value),
            Self::Float(value) => de::Unexpected::Float(*value),
            Self::String(s) => de::Unexpected::Str(s),
            Self::Array(_) => de::Unexpected::Seq,
            Self::Object(_) => de::Unexpected::Map,
            Self::Struct(_) | Self::Any(_) => de::Unexpected::Other(self.type_name()),
        };
        DeError::invalid_type(actual, &expected)
    }
}

macro_rules! parse_int_value {
    ($($ty:ident => $method:ident,)*) => {
        $(
        fn $method<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
            match self.value {
                Value::String(s) if self.weakly_typed => {
                    match s.parse::<$ty>() {
                        Ok(val) => val.into_deserializer().$method(visitor),
                        Err(err) => Err(DeError::custom(format_args!(
                            "{err} while parsing {} value '{s}'",
                            stringify!($ty)
                        ))),
                    }
                }
                Value::Int(_) | Value::Uint(_) | Value::Float(_) => self.deserialize_any(visitor),
                _ => Err(self.value.invalid_type(&format!("{} number", stringify!($ty)))),
            }
        }
        )*
    }
}

/// Deserializer for [`Value`]s. [`Value::Struct`]s must be projected to maps beforehand.
///
/// If weak typing is enabled, primitive values are parsed from strings and converted to strings.
#[derive(Debug, Clone, Copy)]
pub(super) struct ValueDeserializer<'a> {
    value: &'a Value,
    weakly_typed: bool,
}

impl<'a> ValueDeserializer<'a> {
    pub(super) fn new(value: &'a Value, weakly_typed: bool) -> Self {
        Self {
            value,
            weakly_typed,
        }
    }

    fn parse_array<'de, V: de::Visitor<'de>>(
        &self,
        array: &[Value],
        visitor: V,
    ) -> Result<V::Value, serde_json::Error> {
        let mut deserializer = SeqDeserializer::new(
            array
                .iter()
                .map(|val| ValueDeserializer::new(val, self.weakly_typed)),
        );
        let seq = visitor.visit_seq(&mut deserializer)?;
        deserializer.end()?;
        Ok(seq)
    }

    fn parse_object<'de, V: de::Visitor<'de>>(
        &self,
        object: &Map,
        visitor: V,
    ) -> Result<V::Value, serde_json::Error> {
        let mut deserializer = MapDeserializer::new(object.iter().map(|(key, value)| {
            (
                key.as_str(),
                ValueDeserializer::new(value, self.weakly_typed),
            )
        }));
        let map = visitor.visit_map(&mut deserializer)?;
        deserializer.end()?;
        Ok(map)
    }
}

impl<'de> Deserializer<'de> for ValueDeserializer<'_> {
    type Error = serde_json::Error;

    fn deserialize_any<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            Value::Bool(value) => visitor.visit_bool(*value),
            Value::Int(value) => visitor.visit_i64(*value),
            Value::Uint(value) => visitor.visit_u64(*value),
            Value::Float(value) => visitor.visit_f64(*value),
            Value::String(value) => visitor.visit_str(value),
            Value::Array(array) => self.parse_array(array, visitor),
            Value::Object(object) => self.parse_object(object, visitor),
            Value::Struct(_) | Value::Any(_) => Err(self.value.invalid_type("untyped value")),
        }
    }

    fn deserialize_option<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Null => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_newtype_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Array(array) => self.parse_array(array, visitor),
            _ => Err(self.value.invalid_type("array")),
        }
    }

    fn deserialize_tuple<V: de::Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_tuple_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_seq(visitor)
    }

    fn deserialize_map<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Object(object) => self.parse_object(object, visitor),
            _ => Err(self.value.invalid_type("object")),
        }
    }

    fn deserialize_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Array(array) => self.parse_array(array, visitor),
            Value::Object(object) => self.parse_object(object, visitor),
            _ => Err(self.value.invalid_type("array or object")),
        }
    }

    fn deserialize_enum<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        let (variant, value) = match self.value {
            Value::Object(object) if object.len() == 1 => {
                let (variant, value) = object.iter().next().expect("checked length");
                (variant.as_str(), Some(value))
            }
            Value::String(s) => (s.as_str(), None),
            _ => return Err(self.value.invalid_type("string or object with single key")),
        };

        visitor.visit_enum(EnumDeserializer {
            variant,
            inner: VariantDeserializer {
                value,
                weakly_typed: self.weakly_typed,
            },
        })
    }

    // Primitive values

    fn deserialize_bool<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Bool(value) => visitor.visit_bool(*value),
            Value::String(s) if self.weakly_typed => match crate::parsing::parse_bool(s) {
                Ok(val) => visitor.visit_bool(val),
                Err(err) => Err(DeError::custom(format_args!("{err:#}"))),
            },
            _ => Err(self.value.invalid_type("boolean")),
        }
    }

    parse_int_value! {
        u8 => deserialize_u8,
        u16 => deserialize_u16,
        u32 => deserialize_u32,
        u64 => deserialize_u64,
        i8 => deserialize_i8,
        i16 => deserialize_i16,
        i32 => deserialize_i32,
        i64 => deserialize_i64,
        u128 => deserialize_u128,
        i128 => deserialize_i128,
        f32 => deserialize_f32,
        f64 => deserialize_f64,
    }

    fn deserialize_string<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::String(s) => visitor.visit_str(s),
            Value::Bool(value) if self.weakly_typed => {
                visitor.visit_str(if *value { "1" } else { "0" })
            }
            Value::Int(value) if self.weakly_typed => visitor.visit_string(value.to_string()),
            Value::Uint(value) if self.weakly_typed => visitor.visit_string(value.to_string()),
            Value::Float(value) if self.weakly_typed => visitor.visit_string(value.to_string()),
            _ => Err(self.value.invalid_type("string")),
        }
    }

    fn deserialize_char<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_str<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_byte_buf<V: de::Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::String(s) => visitor.visit_str(s),
            Value::Array(array) => self.parse_array(array, visitor),
            _ => Err(self.value.invalid_type("string or array")),
        }
    }

    fn deserialize_bytes<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        self.deserialize_byte_buf(visitor)
    }

    fn deserialize_identifier<V: de::Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_string(visitor)
    }

    fn deserialize_unit<V: de::Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self.value {
            Value::Null => visitor.visit_unit(),
            _ => Err(self.value.invalid_type("null")),
        }
    }

    fn deserialize_unit_struct<V: de::Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_ignored_any<V: de::Visitor<'de>>(
        self,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }
}

impl IntoDeserializer<'_, serde_json::Error> for ValueDeserializer<'_> {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

#[derive(Debug)]
struct EnumDeserializer<'a> {
    variant: &'a str,
    inner: VariantDeserializer<'a>,
}

impl<'a, 'de> de::EnumAccess<'de> for EnumDeserializer<'a> {
    type Error = serde_json::Error;
    type Variant = VariantDeserializer<'a>;

    fn variant_seed<V: DeserializeSeed<'de>>(
        self,
        seed: V,
    ) -> Result<(V::Value, Self::Variant), Self::Error> {
        let variant: de::value::StrDeserializer<'_, serde_json::Error> =
            self.variant.into_deserializer();
        let value = seed.deserialize(variant)?;
        Ok((value, self.inner))
    }
}

#[derive(Debug)]
struct VariantDeserializer<'a> {
    value: Option<&'a Value>,
    weakly_typed: bool,
}

impl<'de> de::VariantAccess<'de> for VariantDeserializer<'_> {
    type Error = serde_json::Error;

    fn unit_variant(self) -> Result<(), Self::Error> {
        if let Some(value) = self.value {
            Deserialize::deserialize(ValueDeserializer::new(value, self.weakly_typed))
        } else {
            Ok(())
        }
    }

    fn newtype_variant_seed<T>(self, seed: T) -> Result<T::Value, Self::Error>
    where
        T: DeserializeSeed<'de>,
    {
        if let Some(value) = self.value {
            seed.deserialize(ValueDeserializer::new(value, self.weakly_typed))
        } else {
            Err(DeError::invalid_type(
                de::Unexpected::Unit,
                &"newtype variant",
            ))
        }
    }

    fn tuple_variant<V: de::Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if let Some(value) = self.value {
            Deserializer::deserialize_seq(ValueDeserializer::new(value, self.weakly_typed), visitor)
        } else {
            Err(DeError::invalid_type(de::Unexpected::Unit, &"tuple variant"))
        }
    }

    fn struct_variant<V: de::Visitor<'de>>(
        self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        if let Some(value) = self.value {
            Deserializer::deserialize_map(ValueDeserializer::new(value, self.weakly_typed), visitor)
        } else {
            Err(DeError::invalid_type(
                de::Unexpected::Unit,
                &"struct variant",
            ))
        }
    }
}
