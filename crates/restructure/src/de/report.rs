//! Decoding metadata.

/// Metadata collected during decoding. Can be requested via [`DecoderConfig::metadata`](crate::DecoderConfig::metadata).
///
/// All entries are full paths to the corresponding destination nodes, like `Outer.Inner[2]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    /// Destination nodes that were successfully decoded.
    pub keys: Vec<String>,
    /// Source keys that were not consumed by any struct field. Unused keys are tracked separately
    /// for each struct; keys inside values decoded by custom decode methods are never tracked.
    pub unused: Vec<String>,
    /// Struct fields that were never matched against source keys.
    pub unset: Vec<String>,
}

impl Metadata {
    pub(crate) fn append(&mut self, other: Self) {
        self.keys.extend(other.keys);
        self.unused.extend(other.unused);
        self.unset.extend(other.unset);
    }
}
