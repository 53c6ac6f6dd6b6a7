//! Decoder configuration and entry points.

use std::fmt;

use super::{Decode, DecodeHook, Metadata, walker::Session};
use crate::{
    DescribeType,
    error::{DecodeError, DecodeErrors, ErrorKind},
    value::Value,
};

/// Default tag name used to look up field tags (i.e., `#[tag(decode = "...")]`).
pub const DEFAULT_TAG_NAME: &str = "decode";

fn eq_ignore_case(source_key: &str, field_name: &str) -> bool {
    source_key == field_name || source_key.to_lowercase() == field_name.to_lowercase()
}

/// Configuration of a [`Decoder`].
///
/// Should be created using [`Self::new()`] and then customized using struct update syntax.
///
/// # Examples
///
/// ```
/// use restructure::{value, Decode, Decoder, DecoderConfig, Metadata};
///
/// #[derive(Debug, Default, Decode)]
/// struct Person {
///     name: String,
///     age: u32,
/// }
///
/// let mut person = Person::default();
/// let mut metadata = Metadata::default();
/// let config = DecoderConfig {
///     metadata: Some(&mut metadata),
///     weakly_typed_input: true,
///     ..DecoderConfig::new(&mut person)
/// };
/// Decoder::new(config).decode(value!({ "Name": "Alice", "age": "42", "email": "alice@example.com" }))?;
///
/// assert_eq!(person.name, "Alice");
/// assert_eq!(person.age, 42);
/// assert_eq!(metadata.keys, ["name", "age"]);
/// assert_eq!(metadata.unused, ["email"]);
/// # anyhow::Ok(())
/// ```
pub struct DecoderConfig<'a> {
    /// Destination to decode into. Its existing contents are merged with the decoded data.
    pub result: &'a mut dyn Decode,
    /// Sink for metadata collected during decoding.
    pub metadata: Option<&'a mut Metadata>,
    /// Hook invoked for each destination node before decoding it.
    pub decode_hook: Option<DecodeHook>,
    /// Fail if the source has keys not consumed by any struct field.
    pub error_unused: bool,
    /// Fail if there are struct fields never matched with the source.
    pub error_unset: bool,
    /// Enable lossy conversions between scalar types, and lift scalars into sequences.
    pub weakly_typed_input: bool,
    /// Reset destinations to zero values before writing to them, instead of merging with existing values.
    /// Destinations decoding themselves are never reset.
    pub zero_fields: bool,
    /// Decode all types structurally, ignoring their custom decode methods.
    pub disable_unmarshaler: bool,
    /// Squash all embedded fields as if they had the `squash` tag option.
    pub squash: bool,
    /// Tag name to read field tags from. Defaults to [`DEFAULT_TAG_NAME`].
    pub tag_name: &'a str,
    /// Matches source keys against field names if there's no exact match. The first argument is the source key,
    /// the second one is the field name. Defaults to case-insensitive comparison.
    pub match_name: fn(&str, &str) -> bool,
}

impl fmt::Debug for DecoderConfig<'_> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DecoderConfig")
            .field("result", &self.result.type_metadata())
            .field("metadata", &self.metadata)
            .field("decode_hook", &self.decode_hook)
            .field("error_unused", &self.error_unused)
            .field("error_unset", &self.error_unset)
            .field("weakly_typed_input", &self.weakly_typed_input)
            .field("zero_fields", &self.zero_fields)
            .field("disable_unmarshaler", &self.disable_unmarshaler)
            .field("squash", &self.squash)
            .field("tag_name", &self.tag_name)
            .finish_non_exhaustive()
    }
}

impl<'a> DecoderConfig<'a> {
    /// Creates the default configuration for the specified destination.
    pub fn new(result: &'a mut dyn Decode) -> Self {
        Self {
            result,
            metadata: None,
            decode_hook: None,
            error_unused: false,
            error_unset: false,
            weakly_typed_input: false,
            zero_fields: false,
            disable_unmarshaler: false,
            squash: false,
            tag_name: DEFAULT_TAG_NAME,
            match_name: eq_ignore_case,
        }
    }
}

/// Decoder of [`Value`]s into a destination.
#[derive(Debug)]
pub struct Decoder<'a> {
    config: DecoderConfig<'a>,
}

impl<'a> Decoder<'a> {
    /// Creates a decoder with the specified configuration.
    pub fn new(config: DecoderConfig<'a>) -> Self {
        Self { config }
    }

    /// Decodes the input into the configured destination. The decoder can be used multiple times;
    /// metadata from each call is appended to the configured sink.
    ///
    /// # Errors
    ///
    /// Returns all errors encountered during decoding. Decoding doesn't stop on the first error, so the destination
    /// may be partially updated.
    #[tracing::instrument(
        level = "debug",
        name = "Decoder::decode",
        skip_all,
        fields(ty = ?self.config.result.type_metadata().ty)
    )]
    pub fn decode(&mut self, input: impl Into<Value>) -> Result<(), DecodeErrors> {
        let config = &mut self.config;
        let mut session = Session {
            hook: config.decode_hook.as_ref(),
            tag_name: config.tag_name,
            match_name: config.match_name,
            weakly_typed: config.weakly_typed_input,
            zero_fields: config.zero_fields,
            disable_unmarshaler: config.disable_unmarshaler,
            squash: config.squash,
            report: Metadata::default(),
        };
        let result = session.decode("", input.into(), config.result);
        let report = session.report;

        let mut errors = result.err().unwrap_or_else(DecodeErrors::empty);
        if !errors.is_fatal() {
            if config.error_unused && !report.unused.is_empty() {
                let kind = ErrorKind::UnusedKeys(report.unused.clone());
                errors.push(DecodeError::new("", kind));
            }
            if config.error_unset && !report.unset.is_empty() {
                let kind = ErrorKind::UnsetFields(report.unset.clone());
                errors.push(DecodeError::new("", kind));
            }
        }

        tracing::debug!(
            keys = report.keys.len(),
            unused = ?report.unused,
            unset = ?report.unset,
            errors = errors.len(),
            "finished decoding"
        );
        if let Some(metadata) = &mut config.metadata {
            metadata.append(report);
        }
        errors.into_result()
    }
}

fn decode_with<T: Decode + DescribeType>(
    input: Value,
    weakly_typed_input: bool,
    metadata: Option<&mut Metadata>,
) -> Result<T, DecodeErrors> {
    let mut result = T::zero();
    let config = DecoderConfig {
        metadata,
        weakly_typed_input,
        ..DecoderConfig::new(&mut result)
    };
    Decoder::new(config).decode(input)?;
    Ok(result)
}

/// Decodes a value of type `T` from the input using the default configuration.
///
/// # Errors
///
/// Returns all errors encountered during decoding.
pub fn decode<T: Decode + DescribeType>(input: impl Into<Value>) -> Result<T, DecodeErrors> {
    decode_with(input.into(), false, None)
}

/// Same as [`decode()`], but with [weak typing](DecoderConfig::weakly_typed_input) enabled.
///
/// # Errors
///
/// Returns all errors encountered during decoding.
pub fn weak_decode<T: Decode + DescribeType>(input: impl Into<Value>) -> Result<T, DecodeErrors> {
    decode_with(input.into(), true, None)
}

/// Same as [`decode()`], but also returns the metadata collected during decoding.
///
/// # Errors
///
/// Returns all errors encountered during decoding.
pub fn decode_metadata<T: Decode + DescribeType>(
    input: impl Into<Value>,
) -> Result<(T, Metadata), DecodeErrors> {
    let mut metadata = Metadata::default();
    let value = decode_with(input.into(), false, Some(&mut metadata))?;
    Ok((value, metadata))
}

/// Same as [`decode_metadata()`], but with [weak typing](DecoderConfig::weakly_typed_input) enabled.
///
/// # Errors
///
/// Returns all errors encountered during decoding.
pub fn weak_decode_metadata<T: Decode + DescribeType>(
    input: impl Into<Value>,
) -> Result<(T, Metadata), DecodeErrors> {
    let mut metadata = Metadata::default();
    let value = decode_with(input.into(), true, Some(&mut metadata))?;
    Ok((value, metadata))
}

/// Decodes the input into an existing destination using the default configuration.
///
/// # Errors
///
/// Returns all errors encountered during decoding.
pub fn decode_into(input: impl Into<Value>, dest: &mut dyn Decode) -> Result<(), DecodeErrors> {
    Decoder::new(DecoderConfig::new(dest)).decode(input)
}
