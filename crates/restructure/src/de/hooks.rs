//! Decode hooks transforming source values before they are decoded.
//!
//! A [`DecodeHook`] is invoked at each destination node with the source [kind](ValueKind), the destination [metadata](TypeMetadata)
//! and the source value. It returns the value to decode; a hook that doesn't apply must return its input unchanged.
//! Multiple hooks can be [composed](DecodeHook::compose()) into a chain.
//!
//! # Examples
//!
//! ```
//! use std::{net::IpAddr, time::Duration};
//! use restructure::{de::hooks, value, Decode, DecodeHook, Decoder, DecoderConfig};
//!
//! #[derive(Debug, Default, Decode)]
//! struct Server {
//!     addr: Option<IpAddr>,
//!     timeout: Duration,
//! }
//!
//! let mut server = Server::default();
//! let config = DecoderConfig {
//!     decode_hook: Some(DecodeHook::compose([
//!         hooks::string_to::<IpAddr>(),
//!         hooks::string_to_duration(),
//!     ])),
//!     ..DecoderConfig::new(&mut server)
//! };
//! Decoder::new(config).decode(value!({ "addr": "10.0.0.1", "timeout": "1m30s" }))?;
//! assert_eq!(server.addr, Some(IpAddr::from([10, 0, 0, 1])));
//! assert_eq!(server.timeout, Duration::from_secs(90));
//! # anyhow::Ok(())
//! ```

use std::{any::Any, fmt, sync::Arc, time::Duration};

use crate::{
    metadata::{Kind, TypeMetadata},
    parsing::ParseStr,
    value::{AnyValue, Value, ValueKind},
};

type HookFn = dyn Fn(ValueKind, &TypeMetadata, Value) -> anyhow::Result<Value> + Send + Sync;

/// Hook transforming source values before they are decoded. See the [module docs](self) for details.
#[derive(Clone)]
pub struct DecodeHook(Arc<HookFn>);

impl fmt::Debug for DecodeHook {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_tuple("DecodeHook").finish_non_exhaustive()
    }
}

impl DecodeHook {
    /// Creates a hook from the provided function.
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(ValueKind, &TypeMetadata, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    /// Composes hooks into a chain. Each hook receives the output of the previous one (with the updated source kind).
    /// The chain stops on the first error.
    pub fn compose(hooks: impl IntoIterator<Item = Self>) -> Self {
        let hooks: Vec<_> = hooks.into_iter().collect();
        Self::new(move |_, to, mut value| {
            for hook in &hooks {
                value = hook.call(value.kind(), to, value)?;
            }
            Ok(value)
        })
    }

    /// Invokes this hook.
    ///
    /// # Errors
    ///
    /// Propagates hook errors.
    pub fn call(&self, from: ValueKind, to: &TypeMetadata, value: Value) -> anyhow::Result<Value> {
        (self.0)(from, to, value)
    }
}

/// Creates a hook that parses strings into the exact type `T` using the provided parser.
/// The hook doesn't apply to other source kinds or destination types.
pub fn string_parser<T, F>(parse: F) -> DecodeHook
where
    T: Any + Clone + PartialEq + fmt::Debug + Send + Sync,
    F: Fn(&str) -> anyhow::Result<T> + Send + Sync + 'static,
{
    DecodeHook::new(move |from, to, value| {
        if from != ValueKind::String || !to.is::<T>() {
            return Ok(value);
        }
        let Value::String(s) = &value else {
            return Ok(value);
        };
        Ok(Value::Any(AnyValue::new(parse(s)?)))
    })
}

/// Creates a hook that parses strings into the exact type `T` using the [built-in parser](ParseStr).
pub fn string_to<T>() -> DecodeHook
where
    T: ParseStr + Any + Clone + PartialEq + fmt::Debug + Send + Sync,
{
    string_parser(T::parse_str)
}

/// Creates a hook that parses strings like `1h30m` into [`Duration`]s.
pub fn string_to_duration() -> DecodeHook {
    string_to::<Duration>()
}

/// Creates a hook that splits strings by the separator if the destination is a sequence. An empty string
/// is converted to an empty sequence.
pub fn string_to_slice(separator: impl Into<String>) -> DecodeHook {
    let separator = separator.into();
    DecodeHook::new(move |from, to, value| {
        if from != ValueKind::String || !matches!(to.kind, Kind::Slice | Kind::Array) {
            return Ok(value);
        }
        let Value::String(s) = value else {
            return Ok(value);
        };
        if s.is_empty() {
            return Ok(Value::Array(vec![]));
        }
        Ok(Value::Array(s.split(separator.as_str()).map(Value::from).collect()))
    })
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use assert_matches::assert_matches;

    use super::*;
    use crate::DescribeType;

    fn call_hook<T: DescribeType>(hook: &DecodeHook, value: impl Into<Value>) -> anyhow::Result<Value> {
        let value = value.into();
        hook.call(value.kind(), &T::TYPE, value)
    }

    #[test]
    fn custom_string_parser() {
        let hook = string_parser(|s| Ok(s.parse::<i32>()? * 2));
        let value = call_hook::<i32>(&hook, "21").unwrap();
        assert_eq!(value, Value::Any(AnyValue::new(42_i32)));

        // Non-string source
        let value = call_hook::<i32>(&hook, 42_i64).unwrap();
        assert_eq!(value, Value::Int(42));
        // Wrong target type
        let value = call_hook::<i64>(&hook, "42").unwrap();
        assert_eq!(value, Value::from("42"));

        let err = call_hook::<i32>(&hook, "not-a-number").unwrap_err();
        assert!(err.to_string().contains("invalid digit"), "{err}");
    }

    #[test]
    fn built_in_string_parsers() {
        let hook = string_to::<i32>();
        let value = call_hook::<i32>(&hook, "0x2a").unwrap();
        assert_eq!(value, Value::Any(AnyValue::new(42_i32)));
        call_hook::<i32>(&hook, "2147483648").unwrap_err();

        let hook = string_to::<IpAddr>();
        let value = call_hook::<IpAddr>(&hook, "192.168.1.1").unwrap();
        let expected = IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(value, Value::Any(AnyValue::new(expected)));
        call_hook::<IpAddr>(&hook, "invalid").unwrap_err();

        let hook = string_to_duration();
        let value = call_hook::<Duration>(&hook, "1h30m").unwrap();
        assert_eq!(value, Value::Any(AnyValue::new(Duration::from_secs(5_400))));
        // Hooks match exact types, not pointers to them.
        let value = call_hook::<Option<Duration>>(&hook, "1h30m").unwrap();
        assert_eq!(value, Value::from("1h30m"));
    }

    #[test]
    fn splitting_strings() {
        let hook = string_to_slice(",");
        let value = call_hook::<Vec<String>>(&hook, "a,b,c").unwrap();
        assert_eq!(value, Value::from(vec!["a", "b", "c"]));
        let value = call_hook::<Vec<String>>(&hook, "").unwrap();
        assert_eq!(value, Value::Array(vec![]));
        let value = call_hook::<String>(&hook, "a,b").unwrap();
        assert_eq!(value, Value::from("a,b"));
    }

    #[test]
    fn composing_hooks() {
        let uppercase = DecodeHook::new(|from, _, value| {
            Ok(match value {
                Value::String(s) if from == ValueKind::String => Value::String(s.to_uppercase()),
                value => value,
            })
        });
        let prefix = DecodeHook::new(|from, to, value| {
            if from == ValueKind::Int && to.is::<String>() {
                return Ok(Value::String(format!("hook-{}", value.type_name())));
            }
            Ok(value)
        });
        let hook = DecodeHook::compose([prefix, uppercase]);

        // The second hook sees the updated source kind.
        let value = call_hook::<String>(&hook, 123_i64).unwrap();
        assert_eq!(value, Value::from("HOOK-INT"));
        let value = call_hook::<String>(&hook, true).unwrap();
        assert_eq!(value, Value::Bool(true));

        let failing = DecodeHook::new(|_, _, _| Err(anyhow::anyhow!("oops")));
        let hook = DecodeHook::compose([failing, string_to_duration()]);
        let err = call_hook::<Duration>(&hook, "1s").unwrap_err();
        assert_matches!(err.to_string().as_str(), "oops");
    }
}
