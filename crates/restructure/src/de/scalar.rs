//! Scalar conversions.
//!
//! Without weak typing, only conversions between numeric kinds are performed (with range checks); integer
//! destinations accept floats only if they have no fractional part. Weak typing additionally enables
//! conversions between numbers, bools and strings.

use std::{
    borrow::Cow,
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use anyhow::Context as _;

use super::{ScalarError, ScalarNode};
use crate::{
    parsing::{ParseStr, parse_bool, parse_duration, parse_float, parse_int, parse_uint},
    value::Value,
};

fn invalid(err: anyhow::Error) -> ScalarError {
    ScalarError::Invalid(err)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)] // checked
fn float_to_integer(value: f64, weakly_typed: bool) -> Result<i128, ScalarError> {
    const BOUND: f64 = 1.7e38; // slightly less than `i128::MAX`

    if !value.is_finite() || value.abs() >= BOUND {
        return Err(invalid(anyhow::anyhow!("{value} cannot be represented as an integer")));
    }
    if value.fract() != 0.0 && !weakly_typed {
        return Err(invalid(anyhow::anyhow!("{value} has a fractional part")));
    }
    Ok(value.trunc() as i128)
}

fn to_signed(value: &Value, weakly_typed: bool) -> Result<i128, ScalarError> {
    match value {
        Value::Int(value) => Ok((*value).into()),
        Value::Uint(value) => Ok((*value).into()),
        Value::Float(value) => float_to_integer(*value, weakly_typed),
        Value::Bool(value) if weakly_typed => Ok((*value).into()),
        Value::String(s) if weakly_typed => {
            if s.is_empty() {
                Ok(0)
            } else {
                parse_int(s).map_err(invalid)
            }
        }
        _ => Err(ScalarError::Mismatch),
    }
}

fn to_unsigned(value: &Value, weakly_typed: bool) -> Result<u128, ScalarError> {
    match value {
        Value::String(s) if weakly_typed && !s.is_empty() => parse_uint(s).map_err(invalid),
        _ => {
            let value = to_signed(value, weakly_typed)?;
            u128::try_from(value)
                .map_err(|_| invalid(anyhow::anyhow!("cannot assign negative value {value} to an unsigned integer")))
        }
    }
}

#[allow(clippy::cast_precision_loss)] // intentional
fn to_float(value: &Value, weakly_typed: bool) -> Result<f64, ScalarError> {
    match value {
        Value::Int(value) => Ok(*value as f64),
        Value::Uint(value) => Ok(*value as f64),
        Value::Float(value) => Ok(*value),
        Value::Bool(value) if weakly_typed => Ok(if *value { 1.0 } else { 0.0 }),
        Value::String(s) if weakly_typed => {
            if s.is_empty() {
                Ok(0.0)
            } else {
                parse_float(s).map_err(invalid)
            }
        }
        _ => Err(ScalarError::Mismatch),
    }
}

fn to_bool(value: &Value, weakly_typed: bool) -> Result<bool, ScalarError> {
    match value {
        Value::Bool(value) => Ok(*value),
        Value::Int(value) if weakly_typed => Ok(*value != 0),
        Value::Uint(value) if weakly_typed => Ok(*value != 0),
        Value::Float(value) if weakly_typed => Ok(*value != 0.0),
        Value::String(s) if weakly_typed => {
            if s.is_empty() {
                Ok(false)
            } else {
                parse_bool(s).map_err(invalid)
            }
        }
        _ => Err(ScalarError::Mismatch),
    }
}

fn bytes_to_string(items: &[Value]) -> Option<String> {
    let bytes = items
        .iter()
        .map(|item| match item {
            Value::Int(value) => u8::try_from(*value).ok(),
            Value::Uint(value) => u8::try_from(*value).ok(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}

fn to_string(value: &Value, weakly_typed: bool) -> Result<Cow<'_, str>, ScalarError> {
    match value {
        Value::String(s) => Ok(Cow::Borrowed(s)),
        Value::Bool(value) if weakly_typed => Ok(Cow::Borrowed(if *value { "1" } else { "0" })),
        Value::Int(value) if weakly_typed => Ok(value.to_string().into()),
        Value::Uint(value) if weakly_typed => Ok(value.to_string().into()),
        Value::Float(value) if weakly_typed => Ok(value.to_string().into()),
        Value::Array(items) if weakly_typed => bytes_to_string(items)
            .map(Cow::Owned)
            .ok_or(ScalarError::Mismatch),
        _ => Err(ScalarError::Mismatch),
    }
}

macro_rules! impl_scalar_for_ints {
    ($conversion:ident: $($int:ty),+) => {
        $(
        impl ScalarNode for $int {
            fn assign(&mut self, value: &Value, weakly_typed: bool) -> Result<(), ScalarError> {
                let wide = $conversion(value, weakly_typed)?;
                *self = <$int>::try_from(wide).map_err(|_| {
                    invalid(anyhow::anyhow!("value {wide} overflows `{}`", stringify!($int)))
                })?;
                Ok(())
            }
        }
        )+
    };
}

impl_scalar_for_ints!(to_signed: i8, i16, i32, i64, i128, isize);
impl_scalar_for_ints!(to_unsigned: u8, u16, u32, u64, u128, usize);

impl ScalarNode for f64 {
    fn assign(&mut self, value: &Value, weakly_typed: bool) -> Result<(), ScalarError> {
        *self = to_float(value, weakly_typed)?;
        Ok(())
    }
}

impl ScalarNode for f32 {
    #[allow(clippy::cast_possible_truncation)] // intentional
    fn assign(&mut self, value: &Value, weakly_typed: bool) -> Result<(), ScalarError> {
        let value = to_float(value, weakly_typed)?;
        if value.is_finite() && value.abs() > f64::from(f32::MAX) {
            return Err(invalid(anyhow::anyhow!("value {value} overflows `f32`")));
        }
        *self = value as f32;
        Ok(())
    }
}

impl ScalarNode for bool {
    fn assign(&mut self, value: &Value, weakly_typed: bool) -> Result<(), ScalarError> {
        *self = to_bool(value, weakly_typed)?;
        Ok(())
    }
}

impl ScalarNode for String {
    fn assign(&mut self, value: &Value, weakly_typed: bool) -> Result<(), ScalarError> {
        *self = to_string(value, weakly_typed)?.into_owned();
        Ok(())
    }
}

impl ScalarNode for char {
    fn assign(&mut self, value: &Value, weakly_typed: bool) -> Result<(), ScalarError> {
        *self = match value {
            Value::String(s) => {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => ch,
                    _ => return Err(invalid(anyhow::anyhow!("expected a single char, got {s:?}"))),
                }
            }
            Value::Int(_) | Value::Uint(_) if weakly_typed => {
                let code = to_unsigned(value, false)?;
                u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .with_context(|| format!("{code} is not a valid char code"))
                    .map_err(invalid)?
            }
            _ => return Err(ScalarError::Mismatch),
        };
        Ok(())
    }
}

/// Integers are interpreted as nanoseconds. Strings like `1h30m` are parsed if weak typing is enabled.
impl ScalarNode for Duration {
    fn assign(&mut self, value: &Value, weakly_typed: bool) -> Result<(), ScalarError> {
        *self = match value {
            Value::String(s) if weakly_typed => parse_duration(s).map_err(invalid)?,
            Value::Int(_) | Value::Uint(_) | Value::Float(_) => {
                let nanos = to_unsigned(value, weakly_typed)?;
                let nanos = u64::try_from(nanos)
                    .map_err(|_| invalid(anyhow::anyhow!("duration of {nanos}ns overflows")))?;
                Duration::from_nanos(nanos)
            }
            _ => return Err(ScalarError::Mismatch),
        };
        Ok(())
    }
}

macro_rules! impl_scalar_via_parsing {
    ($($ty:ty),+) => {
        $(
        impl ScalarNode for $ty {
            fn assign(&mut self, value: &Value, _weakly_typed: bool) -> Result<(), ScalarError> {
                let Value::String(s) = value else {
                    return Err(ScalarError::Mismatch);
                };
                *self = <$ty>::parse_str(s).map_err(invalid)?;
                Ok(())
            }
        }
        )+
    };
}

impl_scalar_via_parsing!(IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr);

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn assign<T: ScalarNode + Default>(value: impl Into<Value>, weakly_typed: bool) -> Result<T, ScalarError> {
        let mut dest = T::default();
        dest.assign(&value.into(), weakly_typed)?;
        Ok(dest)
    }

    #[test]
    fn converting_between_numbers() {
        assert_eq!(assign::<u8>(42_i64, false).unwrap(), 42);
        assert_eq!(assign::<i32>(42_u64, false).unwrap(), 42);
        assert_eq!(assign::<i32>(42.0, false).unwrap(), 42);
        assert_eq!(assign::<f32>(42_i64, false).unwrap(), 42.0);
        assert_eq!(assign::<f64>(u64::MAX, false).unwrap(), 1.844_674_407_370_955_2e19);

        let err = assign::<u8>(256_i64, false).unwrap_err();
        assert_matches!(err, ScalarError::Invalid(err) if err.to_string().contains("overflows `u8`"));
        let err = assign::<u32>(-1_i64, false).unwrap_err();
        assert_matches!(err, ScalarError::Invalid(err) if err.to_string().contains("negative"));
        let err = assign::<i32>(1.5, false).unwrap_err();
        assert_matches!(err, ScalarError::Invalid(err) if err.to_string().contains("fractional"));
        assert_eq!(assign::<i32>(-1.5, true).unwrap(), -1);
        assign::<i64>(f64::NAN, true).unwrap_err();
    }

    #[test]
    fn strict_mismatches() {
        assert_matches!(assign::<i32>("42", false), Err(ScalarError::Mismatch));
        assert_matches!(assign::<bool>(1_i64, false), Err(ScalarError::Mismatch));
        assert_matches!(assign::<String>(42_i64, false), Err(ScalarError::Mismatch));
        assert_matches!(assign::<f64>(true, false), Err(ScalarError::Mismatch));
        assert_matches!(assign::<Duration>("1s", false), Err(ScalarError::Mismatch));
    }

    #[test]
    fn weak_conversions_to_numbers() {
        assert_eq!(assign::<i32>("0x2a", true).unwrap(), 42);
        assert_eq!(assign::<i32>("", true).unwrap(), 0);
        assert_eq!(assign::<u64>(true, true).unwrap(), 1);
        assert_eq!(assign::<u64>("18446744073709551615", true).unwrap(), u64::MAX);
        assert_eq!(assign::<f64>("1.5", true).unwrap(), 1.5);
        assert_eq!(assign::<f64>(false, true).unwrap(), 0.0);
        assert_matches!(assign::<i32>("foo", true), Err(ScalarError::Invalid(_)));
        assert_matches!(assign::<u8>(Value::Array(vec![]), true), Err(ScalarError::Mismatch));
    }

    #[test]
    fn weak_conversions_to_bools() {
        assert!(assign::<bool>(5_i64, true).unwrap());
        assert!(!assign::<bool>(0.0, true).unwrap());
        assert!(assign::<bool>("T", true).unwrap());
        assert!(!assign::<bool>("", true).unwrap());
        assert_matches!(assign::<bool>("yes", true), Err(ScalarError::Invalid(_)));
    }

    #[test]
    fn weak_conversions_to_strings() {
        assert_eq!(assign::<String>(true, true).unwrap(), "1");
        assert_eq!(assign::<String>(-42_i64, true).unwrap(), "-42");
        assert_eq!(assign::<String>(1.5, true).unwrap(), "1.5");
        assert_eq!(assign::<String>(2.0, true).unwrap(), "2");
        let bytes = Value::from(vec![104_u8, 105]);
        assert_eq!(assign::<String>(bytes, true).unwrap(), "hi");
        let not_bytes = Value::from(vec![1_000_u32]);
        assert_matches!(assign::<String>(not_bytes, true), Err(ScalarError::Mismatch));
    }

    #[test]
    fn converting_chars_and_durations() {
        assert_eq!(assign::<char>("x", false).unwrap(), 'x');
        assert_matches!(assign::<char>("xy", false), Err(ScalarError::Invalid(_)));
        assert_eq!(assign::<char>(120_i64, true).unwrap(), 'x');

        assert_eq!(assign::<Duration>(1_000_u64, false).unwrap(), Duration::from_micros(1));
        assert_eq!(assign::<Duration>("1m", true).unwrap(), Duration::from_secs(60));
        assert_matches!(assign::<Duration>(-1_i64, false), Err(ScalarError::Invalid(_)));
    }

    #[test]
    fn parsing_addresses() {
        let mut addr = IpAddr::from([0, 0, 0, 0]);
        addr.assign(&"::1".into(), false).unwrap();
        assert_eq!(addr, IpAddr::from(Ipv6Addr::LOCALHOST));
        assert_matches!(addr.assign(&1_i64.into(), true), Err(ScalarError::Mismatch));
    }
}
