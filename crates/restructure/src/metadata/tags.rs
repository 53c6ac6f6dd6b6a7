//! Field tag micro-syntax.

/// Parsed field tag with the `name[,option...]` syntax.
///
/// Recognized options are `squash`, `omitzero`, `omitempty` and `remain`; unknown options are ignored.
/// A tag consisting of a single `-` skips the field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct FieldTag<'a> {
    /// Field name override, if any.
    pub name: Option<&'a str>,
    /// Flatten the field (must be a struct) into the enclosing struct namespace.
    pub squash: bool,
    /// Omit the field from struct projections if its value is zero.
    pub omitzero: bool,
    /// Omit the field from struct projections if its value is zero or an empty collection.
    pub omitempty: bool,
    /// Collect unused keys of the enclosing struct into this field.
    pub remain: bool,
    /// Skip the field entirely.
    pub skip: bool,
}

impl<'a> FieldTag<'a> {
    /// Parses a raw tag. `None` corresponds to an absent tag.
    pub fn parse(raw: Option<&'a str>) -> Self {
        let Some(raw) = raw else {
            return Self::default();
        };
        if raw.trim() == "-" {
            return Self {
                skip: true,
                ..Self::default()
            };
        }

        let mut parts = raw.split(',');
        let name = parts.next().map(str::trim).filter(|name| !name.is_empty());
        let mut tag = Self {
            name,
            ..Self::default()
        };
        for option in parts {
            match option.trim() {
                "squash" => tag.squash = true,
                "omitzero" => tag.omitzero = true,
                "omitempty" => tag.omitempty = true,
                "remain" => tag.remain = true,
                _ => { /* unknown options are ignored */ }
            }
        }
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsing_tags() {
        assert_eq!(FieldTag::parse(None), FieldTag::default());
        assert_eq!(FieldTag::parse(Some("")), FieldTag::default());

        let tag = FieldTag::parse(Some("product_code"));
        assert_eq!(tag.name, Some("product_code"));
        assert!(!tag.squash && !tag.omitzero && !tag.skip);

        let tag = FieldTag::parse(Some(",squash"));
        assert_eq!(tag.name, None);
        assert!(tag.squash);

        let tag = FieldTag::parse(Some("code, omitzero,omitempty,bogus"));
        assert_eq!(tag.name, Some("code"));
        assert!(tag.omitzero && tag.omitempty);
        assert!(!tag.remain);

        let tag = FieldTag::parse(Some(",remain"));
        assert!(tag.remain);
    }

    #[test]
    fn skipping_fields() {
        assert!(FieldTag::parse(Some("-")).skip);

        let tag = FieldTag::parse(Some("-,omitzero"));
        assert!(!tag.skip);
        assert_eq!(tag.name, Some("-"));
    }
}
