//! `restructure` – decoding of loosely typed, dynamically shaped values into strongly typed Rust data.
//!
//! # Overview
//!
//! The task solved by the library is converting generic data (e.g., parsed JSON, or a map produced by a config loader)
//! into Rust structs, collections and scalars. Unlike `serde`, decoding is *merging* and *lenient*:
//!
//! - Decoding writes into an existing destination; fields absent from the source keep their existing values.
//! - Decoding doesn't stop on the first error. All errors (with the paths to the erroneous values) are collected
//!   into [`DecodeErrors`].
//! - [Weak typing](DecoderConfig::weakly_typed_input) allows lossy conversions between scalar types,
//!   e.g. parsing numbers from strings.
//! - Struct fields are matched with source keys case-insensitively (by default), and unmatched keys can be
//!   captured into a `remain` field or [reported](Metadata).
//! - Types may [decode themselves](de::UnmarshalValue) from the raw source value, and [hooks](DecodeHook) may transform
//!   source values before they are decoded.
//!
//! Decoding input is represented by [`Value`], which follows the JSON object model extended with
//! [typed structs](value::StructValue) and [arbitrary typed values](value::AnyValue). Destinations are described by
//! static [metadata](metadata), which is derived for structs with the [`Decode`](macro@Decode) macro. Decoding is
//! implemented by a single generic walker working with the type-erased [`Decode`](trait@Decode) trait.
//!
//! # Examples
//!
//! ```
//! use std::{collections::HashMap, time::Duration};
//! use restructure::{value, Decode, Metadata};
//!
//! #[derive(Debug, Default, Decode)]
//! struct ServerConfig {
//!     #[tag(decode = "bind_addr")]
//!     addr: String,
//!     port: u16,
//!     timeout: Option<Duration>,
//!     #[tag(decode = ",remain")]
//!     other: HashMap<String, restructure::Value>,
//! }
//!
//! let input = value!({
//!     "bind_addr": "127.0.0.1",
//!     "Port": 8080,
//!     "timeout": 3_000_000_000_u64,
//!     "debug": true,
//! });
//! let (config, metadata): (ServerConfig, Metadata) = restructure::decode_metadata(input)?;
//! assert_eq!(config.addr, "127.0.0.1");
//! assert_eq!(config.port, 8080);
//! assert_eq!(config.timeout, Some(Duration::from_secs(3)));
//! assert_eq!(config.other["debug"], restructure::Value::Bool(true));
//! assert!(metadata.keys.contains(&"bind_addr".to_owned()));
//! assert!(metadata.unused.is_empty());
//! # anyhow::Ok(())
//! ```
//!
//! ## Errors
//!
//! ```
//! # use restructure::{value, Decode};
//! #[derive(Debug, Default, Decode)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! let errors = restructure::decode::<Vec<Point>>(value!([
//!     { "x": 1, "y": "2" },
//!     { "x": 1.5, "y": 0 },
//! ]))
//! .unwrap_err();
//! assert_eq!(errors.len(), 2);
//! let paths: Vec<_> = errors.iter().map(|err| err.path()).collect();
//! assert_eq!(paths, ["[0].y", "[1].x"]);
//! ```
//!
//! ## Encoding structs
//!
//! Structs can be converted to [`Value`]s with the [`Encode`](trait@Encode) trait. This allows decoding a struct
//! into another struct, e.g. to convert between representations.
//!
//! ```
//! # use restructure::{Decode, Encode};
//! #[derive(Debug, Encode)]
//! struct Legacy {
//!     #[tag(decode = "name")]
//!     full_name: String,
//!     age: u8,
//! }
//!
//! #[derive(Debug, Default, Decode)]
//! struct Person {
//!     name: String,
//!     age: u64,
//! }
//!
//! let legacy = Legacy { full_name: "Alice".into(), age: 42 };
//! let person: Person = restructure::decode(legacy.encode())?;
//! assert_eq!(person.name, "Alice");
//! assert_eq!(person.age, 42);
//! # anyhow::Ok(())
//! ```

// Linter settings
#![warn(missing_docs)]

/// Derives the [`Decode`](trait@Decode) trait (together with [`DescribeType`]) for a struct.
///
/// The macro supports structs with named fields, unit structs and newtype structs (tuple structs with a single field).
/// Newtypes inherit the structural kind of the wrapped type, but can [decode themselves](de::UnmarshalValue).
/// Generic structs and enums are not supported; for enums, consider [`Serde`](de::Serde).
///
/// The struct must implement [`Default`]; the default value is used as the [zero value](DescribeType::zero())
/// of the struct.
///
/// # Container attributes
///
/// ## `unmarshal`
///
/// **Type:** optional string; `"value"` if specified
///
/// Marks the struct as decoding itself. The struct must implement [`UnmarshalValue`](de::UnmarshalValue).
/// With `unmarshal = "value"`, the decode method is invoked on a copy of the destination, so its mutations are discarded;
/// the struct must implement [`Clone`] in this case.
///
/// ## `crate`
///
/// **Type:** path
///
/// Path to the `restructure` crate. Useful if the crate is re-exported from another crate.
///
/// # Field attributes
///
/// ## `tag`
///
/// **Type:** list of `name = "value"` pairs
///
/// Raw field tags. The decoder reads the tag under the [configured tag name](DecoderConfig::tag_name)
/// (`decode` by default). Tag values have the `name,option,...` format; see [`FieldTag`](metadata::FieldTag)
/// for the supported options. Multiple `#[tag(_)]` attributes on a single field are supported.
///
/// ## `embed`
///
/// Marks the field as embedded. The canonical name of an embedded field is the name of its type
/// (with `Option` and `Box` wrappers removed) rather than the field name. Embedded fields are
/// [squashed](DecoderConfig::squash) if requested.
///
/// ## `skip`
///
/// Excludes the field from decoding and encoding. The field is not present in the struct metadata.
///
/// # Examples
///
/// ```
/// use std::collections::HashMap;
/// use restructure::{value, Decode};
///
/// #[derive(Debug, Default, Decode)]
/// struct Base {
///     id: u64,
/// }
///
/// #[derive(Debug, Default, Decode)]
/// struct Record {
///     #[decode(embed)]
///     #[tag(decode = ",squash")]
///     base: Base,
///     #[tag(decode = "title", json = "Title")]
///     name: String,
///     #[decode(skip)]
///     cache: Option<String>,
///     #[tag(decode = ",remain")]
///     extra: HashMap<String, restructure::Value>,
/// }
///
/// let record: Record = restructure::decode(value!({ "id": 1, "title": "test", "cache": "?" }))?;
/// assert_eq!(record.base.id, 1);
/// assert_eq!(record.name, "test");
/// assert_eq!(record.cache, None);
/// assert_eq!(record.extra.len(), 1);
/// # anyhow::Ok(())
/// ```
pub use restructure_derive::Decode;
/// Derives the [`Encode`](trait@Encode) trait for a struct.
///
/// This macro is intended to be used together with [`Decode`](macro@Decode). It reuses the same attributes:
/// field tags and the `embed` marker are preserved in the produced [`StructValue`](value::StructValue),
/// and skipped fields are not encoded.
pub use restructure_derive::Encode;

pub use self::{
    de::{
        Decode, DecodeHook, Decoder, DecoderConfig, Metadata, decode, decode_into, decode_metadata,
        weak_decode, weak_decode_metadata,
    },
    encode::Encode,
    error::{DecodeError, DecodeErrors, ErrorKind},
    value::Value,
};
use self::metadata::TypeMetadata;

pub mod de;
mod encode;
mod error;
pub mod metadata;
pub mod parsing;
#[cfg(test)]
mod testonly;
pub mod value;

/// Describes a decoding destination type. This trait is implemented for standard types by the library,
/// and derived for structs by the [`Decode`](macro@Decode) macro.
pub trait DescribeType: 'static + Sized {
    /// Static metadata of the type.
    const TYPE: TypeMetadata;

    /// Returns the zero value of the type. This is the value destinations are reset to if
    /// [`zero_fields`](DecoderConfig::zero_fields) is set, and the value newly allocated
    /// collection elements and options start from.
    fn zero() -> Self;
}

/// Constructs a [`Value`] using the JSON syntax.
///
/// # Examples
///
/// ```
/// use restructure::{value, Value};
///
/// let value = value!({ "name": "test", "ports": [80, 443], "debug": null });
/// let Value::Object(map) = &value else { unreachable!() };
/// assert_eq!(map["name"], Value::from("test"));
/// assert_eq!(map["debug"], Value::Null);
/// ```
#[macro_export]
macro_rules! value {
    ($($json:tt)+) => {
        $crate::value::Value::from($crate::_private::serde_json::json!($($json)+))
    };
}

#[doc(hidden)] // used by the `value!` macro
pub mod _private {
    pub use serde_json;
}

#[cfg(doctest)]
doc_comment::doctest!("../README.md");
