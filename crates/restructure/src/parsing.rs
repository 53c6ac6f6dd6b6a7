//! Built-in string parsers used by [weak typing](crate::DecoderConfig::weakly_typed_input)
//! and by [string hooks](crate::de::hooks).
//!
//! Supported formats:
//!
//! - Integers may have a sign and a base prefix: `0x` (hex), `0o` or a leading `0` (octal), `0b` (binary).
//!   Underscores between digits are allowed if there is a base prefix.
//! - Booleans are one of `1`, `t`, `T`, `TRUE`, `true`, `True`, `0`, `f`, `F`, `FALSE`, `false`, `False`.
//! - Durations are a sequence of decimal numbers with a unit suffix, like `1h30m` or `1.5s`. Recognized units
//!   are `ns`, `us` (or `µs`), `ms`, `s`, `m` and `h`.

use std::{
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr},
    time::Duration,
};

use anyhow::Context as _;

/// Type that can be parsed from a string with one of the built-in parsers.
pub trait ParseStr: Sized {
    /// Parses a value from the string.
    ///
    /// # Errors
    ///
    /// Returns an error if the string has an invalid format.
    fn parse_str(s: &str) -> anyhow::Result<Self>;
}

macro_rules! impl_parse_str_for_ints {
    ($parser:ident: $($int:ty),+) => {
        $(
        impl ParseStr for $int {
            fn parse_str(s: &str) -> anyhow::Result<Self> {
                $parser(s)
            }
        }
        )+
    };
}

impl_parse_str_for_ints!(parse_int: i8, i16, i32, i64, i128, isize);
impl_parse_str_for_ints!(parse_uint: u8, u16, u32, u64, u128, usize);

impl ParseStr for f32 {
    #[allow(clippy::cast_possible_truncation)] // intentional
    fn parse_str(s: &str) -> anyhow::Result<Self> {
        parse_float(s).map(|value| value as f32)
    }
}

impl ParseStr for f64 {
    fn parse_str(s: &str) -> anyhow::Result<Self> {
        parse_float(s)
    }
}

impl ParseStr for bool {
    fn parse_str(s: &str) -> anyhow::Result<Self> {
        parse_bool(s)
    }
}

impl ParseStr for Duration {
    fn parse_str(s: &str) -> anyhow::Result<Self> {
        parse_duration(s)
    }
}

macro_rules! impl_parse_str_via_from_str {
    ($($ty:ty => $name:literal),+) => {
        $(
        impl ParseStr for $ty {
            fn parse_str(s: &str) -> anyhow::Result<Self> {
                s.parse().with_context(|| format!("failed parsing {s:?} as {}", $name))
            }
        }
        )+
    };
}

impl_parse_str_via_from_str!(
    IpAddr => "IP address",
    Ipv4Addr => "IPv4 address",
    Ipv6Addr => "IPv6 address",
    SocketAddr => "socket address"
);

fn split_sign(s: &str) -> (bool, &str) {
    if let Some(rest) = s.strip_prefix('-') {
        (true, rest)
    } else {
        (false, s.strip_prefix('+').unwrap_or(s))
    }
}

fn parse_magnitude(s: &str, original: &str) -> anyhow::Result<u128> {
    let (radix, digits, has_prefix) = if let Some(rest) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        (16, rest, true)
    } else if let Some(rest) = s.strip_prefix("0b").or_else(|| s.strip_prefix("0B")) {
        (2, rest, true)
    } else if let Some(rest) = s.strip_prefix("0o").or_else(|| s.strip_prefix("0O")) {
        (8, rest, true)
    } else if s.len() > 1 && s.starts_with('0') {
        (8, &s[1..], true)
    } else {
        (10, s, false)
    };

    let invalid_syntax = || anyhow::anyhow!("cannot parse {original:?} as integer: invalid syntax");
    let digits = if has_prefix && digits.contains('_') {
        if digits.starts_with('_') || digits.ends_with('_') || digits.contains("__") {
            return Err(invalid_syntax());
        }
        digits.replace('_', "")
    } else {
        digits.to_owned()
    };
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
        return Err(invalid_syntax());
    }
    u128::from_str_radix(&digits, radix)
        .map_err(|_| anyhow::anyhow!("cannot parse {original:?} as integer: value out of range"))
}

fn out_of_range(s: &str) -> anyhow::Error {
    anyhow::anyhow!("cannot parse {s:?} as integer: value out of range")
}

/// Parses a signed integer.
///
/// # Errors
///
/// Returns an error if the string is not an integer, or if it doesn't fit into the target type.
pub fn parse_int<T: TryFrom<i128>>(s: &str) -> anyhow::Result<T> {
    let (is_negative, unsigned) = split_sign(s);
    let magnitude = parse_magnitude(unsigned, s)?;
    let value = if is_negative {
        if magnitude > i128::MAX as u128 + 1 {
            return Err(out_of_range(s));
        }
        // Cannot overflow because of the check above.
        0_i128.wrapping_sub_unsigned(magnitude)
    } else {
        i128::try_from(magnitude).map_err(|_| out_of_range(s))?
    };
    T::try_from(value).map_err(|_| out_of_range(s))
}

/// Parses an unsigned integer. Unlike [`parse_int()`], a sign is not allowed.
///
/// # Errors
///
/// Returns an error if the string is not an integer, or if it doesn't fit into the target type.
pub fn parse_uint<T: TryFrom<u128>>(s: &str) -> anyhow::Result<T> {
    if s.starts_with(['+', '-']) {
        anyhow::bail!("cannot parse {s:?} as unsigned integer: invalid syntax");
    }
    let magnitude = parse_magnitude(s, s)?;
    T::try_from(magnitude).map_err(|_| out_of_range(s))
}

/// Parses a floating-point number.
///
/// # Errors
///
/// Returns an error if the string is not a number.
pub fn parse_float(s: &str) -> anyhow::Result<f64> {
    s.parse()
        .with_context(|| format!("cannot parse {s:?} as float"))
}

/// Parses a boolean value.
///
/// # Errors
///
/// Returns an error if the string is not one of recognized boolean values.
pub fn parse_bool(s: &str) -> anyhow::Result<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(anyhow::anyhow!("cannot parse {s:?} as bool: invalid syntax")),
    }
}

const NANOS_IN_MICRO: u128 = 1_000;
const NANOS_IN_MILLI: u128 = 1_000_000;
const NANOS_IN_SEC: u128 = 1_000_000_000;

fn unit_nanos(unit: &str) -> Option<u128> {
    Some(match unit {
        "ns" => 1,
        "us" | "\u{b5}s" | "\u{3bc}s" => NANOS_IN_MICRO,
        "ms" => NANOS_IN_MILLI,
        "s" => NANOS_IN_SEC,
        "m" => 60 * NANOS_IN_SEC,
        "h" => 3_600 * NANOS_IN_SEC,
        _ => return None,
    })
}

/// Parses a duration like `1h30m` or `1.5s`.
///
/// # Errors
///
/// Returns an error if the string has an invalid format, or if the duration is negative or overflows.
pub fn parse_duration(s: &str) -> anyhow::Result<Duration> {
    let invalid = || anyhow::anyhow!("invalid duration {s:?}");

    let (is_negative, mut rest) = split_sign(s);
    if rest == "0" {
        return Ok(Duration::ZERO);
    }
    if rest.is_empty() {
        return Err(invalid());
    }

    let mut total_nanos = 0_u128;
    while !rest.is_empty() {
        let int_len = rest.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(rest.len());
        let (int_digits, tail) = rest.split_at(int_len);
        let (frac_digits, tail) = match tail.strip_prefix('.') {
            Some(tail) => {
                let frac_len = tail.find(|ch: char| !ch.is_ascii_digit()).unwrap_or(tail.len());
                tail.split_at(frac_len)
            }
            None => ("", tail),
        };
        if int_digits.is_empty() && frac_digits.is_empty() {
            return Err(invalid());
        }

        let unit_len = tail.find(|ch: char| ch == '.' || ch.is_ascii_digit()).unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        if unit.is_empty() {
            return Err(anyhow::anyhow!("missing unit in duration {s:?}"));
        }
        let unit = unit_nanos(unit).ok_or_else(|| anyhow::anyhow!("unknown unit {unit:?} in duration {s:?}"))?;

        let int_part: u128 = if int_digits.is_empty() {
            0
        } else {
            int_digits.parse().map_err(|_| invalid())?
        };
        // Digits beyond nanosecond precision of the largest unit are insignificant.
        let frac_digits = &frac_digits[..frac_digits.len().min(18)];
        let mut frac_nanos = 0;
        if !frac_digits.is_empty() {
            let frac: u128 = frac_digits.parse().map_err(|_| invalid())?;
            let scale = 10_u128.pow(frac_digits.len() as u32);
            frac_nanos = frac * unit / scale;
        }

        total_nanos = int_part
            .checked_mul(unit)
            .and_then(|nanos| nanos.checked_add(frac_nanos))
            .and_then(|nanos| total_nanos.checked_add(nanos))
            .ok_or_else(|| anyhow::anyhow!("duration {s:?} overflows"))?;
        rest = tail;
    }

    if is_negative && total_nanos > 0 {
        anyhow::bail!("negative duration {s:?} is not supported");
    }
    let secs = u64::try_from(total_nanos / NANOS_IN_SEC)
        .map_err(|_| anyhow::anyhow!("duration {s:?} overflows"))?;
    #[allow(clippy::cast_possible_truncation)] // cannot happen: the value is less than 10^9
    let nanos = (total_nanos % NANOS_IN_SEC) as u32;
    Ok(Duration::new(secs, nanos))
}
