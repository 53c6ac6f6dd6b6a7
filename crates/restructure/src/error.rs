//! Decoding errors.

use std::fmt;

use crate::value::ValueKind;

/// Kind of a [`DecodeError`].
#[derive(Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Source and destination are structurally incompatible, and no coercion applies.
    TypeMismatch {
        /// Name of the destination type.
        expected: &'static str,
        /// Name of the source type.
        actual: &'static str,
    },
    /// A hook or a built-in parser failed to convert the source value.
    Coercion(anyhow::Error),
    /// The custom decode method of the destination returned an error.
    Unmarshal(anyhow::Error),
    /// Source keys not consumed by any destination field. Only produced if
    /// [`error_unused`](crate::DecoderConfig::error_unused) is set.
    UnusedKeys(Vec<String>),
    /// Destination fields never matched with the source. Only produced if
    /// [`error_unset`](crate::DecoderConfig::error_unset) is set.
    UnsetFields(Vec<String>),
    /// The source has an unexpected shape, e.g. a scalar provided for a struct, or an array of a wrong length.
    Shape(String),
}

impl ErrorKind {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        Self::Shape(message.into())
    }

    pub(crate) fn unexpected_source(expected: &str, actual: ValueKind) -> Self {
        Self::Shape(format!("expected {expected}, got '{actual}'"))
    }
}

/// Error decoding a single destination node.
pub struct DecodeError {
    path: String,
    kind: ErrorKind,
    is_fatal: bool,
}

impl fmt::Debug for DecodeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("DecodeError")
            .field("path", &self.path)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for DecodeError {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = &self.path;
        match &self.kind {
            ErrorKind::TypeMismatch { expected, actual } => write!(
                formatter,
                "'{path}' expected type '{expected}', got unconvertible type '{actual}'"
            ),
            ErrorKind::Coercion(err) => write!(formatter, "'{path}' cannot be converted: {err:#}"),
            ErrorKind::Unmarshal(err) => write!(formatter, "error decoding '{path}': {err:#}"),
            ErrorKind::UnusedKeys(keys) => {
                write!(formatter, "'{path}' has invalid keys: {}", keys.join(", "))
            }
            ErrorKind::UnsetFields(fields) => {
                write!(formatter, "'{path}' has unset fields: {}", fields.join(", "))
            }
            ErrorKind::Shape(message) => write!(formatter, "'{path}' {message}"),
        }
    }
}

impl std::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Coercion(err) | ErrorKind::Unmarshal(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl DecodeError {
    pub(crate) fn new(path: &str, kind: ErrorKind) -> Self {
        Self {
            path: path.to_owned(),
            kind,
            is_fatal: false,
        }
    }

    pub(crate) fn fatal(path: &str, kind: ErrorKind) -> Self {
        Self {
            is_fatal: true,
            ..Self::new(path, kind)
        }
    }

    /// Returns the path to the failing destination node, like `Outer.Inner[2]`. The path is empty for the root.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the kind of this error.
    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    /// Returns `true` if this error has aborted the entire decoding.
    pub fn is_fatal(&self) -> bool {
        self.is_fatal
    }
}

/// Collection of [`DecodeError`]s returned from a single decoding call. Guaranteed to be non-empty.
#[derive(Debug)]
pub struct DecodeErrors {
    errors: Vec<DecodeError>,
}

impl DecodeErrors {
    /// Creates an accumulator for errors. Must be converted with [`Self::into_result()`] before being returned.
    pub(crate) fn empty() -> Self {
        Self { errors: vec![] }
    }

    pub(crate) fn push(&mut self, err: DecodeError) {
        self.errors.push(err);
    }

    /// Merges `errors` into this collection. Returns an error if the merged errors contain a fatal one.
    pub(crate) fn extend(&mut self, errors: Self) -> Result<(), Self> {
        let is_fatal = errors.is_fatal();
        self.errors.extend(errors.errors);
        if is_fatal {
            Err(std::mem::replace(self, Self::empty()))
        } else {
            Ok(())
        }
    }

    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    pub(crate) fn is_fatal(&self) -> bool {
        self.errors.iter().any(DecodeError::is_fatal)
    }

    /// Iterates over the contained errors.
    pub fn iter(&self) -> impl Iterator<Item = &DecodeError> + '_ {
        self.errors.iter()
    }

    /// Returns the number of contained errors.
    #[allow(clippy::len_without_is_empty)] // is_empty should always return false
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Returns the first contained error.
    pub fn first(&self) -> &DecodeError {
        self.errors.first().expect("no errors")
    }
}

impl From<DecodeError> for DecodeErrors {
    fn from(err: DecodeError) -> Self {
        Self { errors: vec![err] }
    }
}

impl IntoIterator for DecodeErrors {
    type Item = DecodeError;
    type IntoIter = std::vec::IntoIter<DecodeError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl fmt::Display for DecodeErrors {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        for err in &self.errors {
            writeln!(formatter, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DecodeErrors {}
