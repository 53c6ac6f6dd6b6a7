//! Structural walker.

use std::collections::BTreeSet;

use super::{
    ArrayNode, Decode, DecodeHook, MapNode, Metadata, Node, ScalarError, ScalarNode, SliceNode,
    StructNode,
};
use crate::{
    DescribeType,
    error::{DecodeError, DecodeErrors, ErrorKind},
    metadata::{Kind, ScalarKind, TypeMetadata},
    value::{Map, Path, Value, ValueKind},
};

/// State of a single decoding call.
#[derive(Debug)]
pub(super) struct Session<'a> {
    pub(super) hook: Option<&'a DecodeHook>,
    pub(super) tag_name: &'a str,
    pub(super) match_name: fn(&str, &str) -> bool,
    pub(super) weakly_typed: bool,
    pub(super) zero_fields: bool,
    pub(super) disable_unmarshaler: bool,
    pub(super) squash: bool,
    pub(super) report: Metadata,
}

type NodeResult = Result<bool, DecodeErrors>;

impl Session<'_> {
    /// Decodes `input` into `dest`, recording the path if the destination was written to.
    pub(super) fn decode(&mut self, path: &str, input: Value, dest: &mut dyn Decode) -> Result<(), DecodeErrors> {
        let written = self.decode_node(path, input, dest)?;
        if written && !path.is_empty() {
            self.report.keys.push(path.to_owned());
        }
        Ok(())
    }

    /// Returns whether the destination was written to.
    fn decode_node(&mut self, path: &str, mut input: Value, dest: &mut dyn Decode) -> NodeResult {
        let ty = dest.type_metadata();
        if input.is_null() {
            return Ok(self.decode_null(&ty, dest));
        }
        input = match Self::try_set_exact(input, dest) {
            Ok(()) => return Ok(true),
            Err(input) => input,
        };

        if let Some(hook) = self.hook {
            let from = input.kind();
            input = hook
                .call(from, &ty, input)
                .map_err(|err| DecodeError::new(path, ErrorKind::Coercion(err)))?;
            if input.kind() != from {
                tracing::trace!(path, %from, to = %input.kind(), "decode hook has transformed value");
            }
            if input.is_null() {
                return Ok(self.decode_null(&ty, dest));
            }
            input = match Self::try_set_exact(input, dest) {
                Ok(()) => return Ok(true),
                Err(input) => input,
            };
        }

        if !self.disable_unmarshaler
            && ty.unmarshal.is_some()
            && let Some(unmarshaler) = dest.unmarshaler()
        {
            tracing::trace!(
                path,
                ty = ?ty.ty,
                receiver = ?unmarshaler.receiver(),
                "invoking custom decode method"
            );
            unmarshaler
                .invoke(&input)
                .map_err(|err| DecodeError::new(path, ErrorKind::Unmarshal(err)))?;
            return Ok(true);
        }

        match dest.node() {
            Node::Scalar(node) => {
                if ty.kind == Kind::Scalar(ScalarKind::Deserialize) {
                    input = input.into_projection(self.tag_name, self.squash);
                }
                self.decode_scalar(path, &input, node, ty.ty.name_in_code())
            }
            Node::Pointer(node) => {
                let was_nil = node.is_nil();
                let result = self.decode_node(path, input, node.pointee_mut());
                if was_nil && !matches!(result, Ok(true)) {
                    node.set_nil();
                }
                result
            }
            Node::Struct(node) => self.decode_struct(path, input, node),
            Node::Slice(node) => self.decode_slice(path, input, node),
            Node::Array(node) => self.decode_array(path, input, node),
            Node::Map(node) => self.decode_map(path, input, node),
            Node::Interface(slot) => self.decode_interface(path, input, slot),
        }
    }

    fn decode_null(&self, ty: &TypeMetadata, dest: &mut dyn Decode) -> bool {
        if self.zero_fields && ty.unmarshal.is_none() {
            reset_retaining_self_decoding(dest);
            true
        } else {
            false
        }
    }

    fn try_set_exact(input: Value, dest: &mut dyn Decode) -> Result<(), Value> {
        match input {
            Value::Any(value) => dest.set_exact(value).map_err(Value::Any),
            input => Err(input),
        }
    }

    fn decode_scalar(
        &self,
        path: &str,
        input: &Value,
        node: &mut dyn ScalarNode,
        expected: &'static str,
    ) -> NodeResult {
        node.assign(input, self.weakly_typed).map_err(|err| {
            let kind = match err {
                ScalarError::Mismatch => ErrorKind::TypeMismatch {
                    expected,
                    actual: input.type_name(),
                },
                ScalarError::Invalid(err) => ErrorKind::Coercion(err),
            };
            DecodeError::new(path, kind)
        })?;
        Ok(true)
    }

    /// Converts the input into a keyed mapping, projecting structs.
    fn source_map(&self, path: &str, input: Value, expected: &str) -> Result<Map, DecodeError> {
        match input {
            Value::Object(map) => Ok(map),
            Value::Struct(value) => Ok(value.into_map(self.tag_name, self.squash)),
            other => Err(DecodeError::new(
                path,
                ErrorKind::unexpected_source(expected, other.kind()),
            )),
        }
    }

    fn decode_struct(&mut self, path: &str, input: Value, node: &mut dyn StructNode) -> NodeResult {
        let map = self.source_map(path, input, "a map or struct")?;
        let mut unused: BTreeSet<&str> = map.keys().map(String::as_str).collect();
        let mut errors = DecodeErrors::empty();
        self.decode_fields(path, &map, node, &mut unused, &mut errors, true)?;

        self.report
            .unused
            .extend(unused.into_iter().map(|key| Path(path).join(key)));
        errors.into_result()?;
        Ok(true)
    }

    /// Decodes fields of a struct. Squashed fields are decoded from the same `map`.
    fn decode_fields<'m>(
        &mut self,
        path: &str,
        map: &'m Map,
        node: &mut dyn StructNode,
        unused: &mut BTreeSet<&'m str>,
        errors: &mut DecodeErrors,
        is_outer: bool,
    ) -> Result<(), DecodeErrors> {
        let mut remain_index = None;
        for (i, field) in node.fields().iter().enumerate() {
            let tag = field.parsed_tag(self.tag_name);
            if tag.skip {
                continue;
            }

            if tag.squash || (self.squash && field.embedded && tag.name.is_none()) {
                let Some(inner) = squash_target(node.field_mut(i)) else {
                    let message = format!(
                        "cannot squash field `{}`: it is not a struct",
                        field.rust_field_name
                    );
                    return Err(DecodeError::fatal(path, ErrorKind::shape(message)).into());
                };
                self.decode_fields(path, map, inner, unused, errors, false)?;
                continue;
            }
            if tag.remain {
                if is_outer {
                    remain_index = Some(i);
                }
                continue;
            }

            let key = tag.name.unwrap_or(field.name);
            let field_path = Path(path).join(key);
            let dest = node.field_mut(i);
            if self.zero_fields {
                reset_retaining_self_decoding(dest);
            }
            let Some((source_key, value)) = self.lookup(map, key, field.name) else {
                self.report.unset.push(field_path);
                continue;
            };
            unused.remove(source_key.as_str());
            if let Err(err) = self.decode(&field_path, value.clone(), dest) {
                errors.extend(err)?;
            }
        }

        if let Some(i) = remain_index {
            let field = &node.fields()[i];
            let remaining: Map = unused
                .iter()
                .filter_map(|&key| map.get_key_value(key))
                .map(|(key, value)| (key.clone(), value.clone()))
                .collect();
            unused.clear();

            let field_path = Path(path).join(field.parsed_tag(self.tag_name).name.unwrap_or(field.name));
            let dest = node.field_mut(i);
            if self.zero_fields {
                reset_retaining_self_decoding(dest);
            }
            if let Err(err) = self.decode(&field_path, Value::Object(remaining), dest) {
                errors.extend(err)?;
            }
        }
        Ok(())
    }

    fn lookup<'m>(&self, map: &'m Map, key: &str, canonical_name: &str) -> Option<(&'m String, &'m Value)> {
        map.get_key_value(key)
            .or_else(|| map.get_key_value(canonical_name))
            .or_else(|| map.iter().find(|(source_key, _)| (self.match_name)(source_key, key)))
    }

    /// Converts the input into a sequence of items.
    fn sequence_items(&self, path: &str, input: Value, element: &TypeMetadata) -> Result<Vec<Value>, DecodeError> {
        Ok(match input {
            Value::Array(items) => items,
            Value::Object(map) if self.weakly_typed && map.is_empty() => vec![],
            Value::String(s) if self.weakly_typed && element.is::<u8>() => {
                s.into_bytes().into_iter().map(Value::from).collect()
            }
            other if self.weakly_typed => vec![other],
            other => {
                return Err(DecodeError::new(
                    path,
                    ErrorKind::unexpected_source("an array or slice", other.kind()),
                ));
            }
        })
    }

    fn decode_slice(&mut self, path: &str, input: Value, node: &mut dyn SliceNode) -> NodeResult {
        let items = self.sequence_items(path, input, &node.element_type())?;
        if self.zero_fields {
            node.clear();
        }
        node.resize(items.len());

        let mut errors = DecodeErrors::empty();
        for (i, item) in items.into_iter().enumerate() {
            if let Err(err) = self.decode(&Path(path).index(i), item, node.element_mut(i)) {
                errors.extend(err)?;
            }
        }
        errors.into_result()?;
        Ok(true)
    }

    fn decode_array(&mut self, path: &str, input: Value, node: &mut dyn ArrayNode) -> NodeResult {
        let items = self.sequence_items(path, input, &node.element_type())?;
        let len = node.len();
        if items.len() > len || (items.len() < len && !self.weakly_typed) {
            let message = format!(
                "expected source data to have length {len}, got {}",
                items.len()
            );
            return Err(DecodeError::new(path, ErrorKind::shape(message)).into());
        }

        for i in 0..len {
            if i >= items.len() {
                node.element_mut(i).reset();
            } else if self.zero_fields {
                reset_retaining_self_decoding(node.element_mut(i));
            }
        }
        let mut errors = DecodeErrors::empty();
        for (i, item) in items.into_iter().enumerate() {
            if let Err(err) = self.decode(&Path(path).index(i), item, node.element_mut(i)) {
                errors.extend(err)?;
            }
        }
        errors.into_result()?;
        Ok(true)
    }

    fn decode_map(&mut self, path: &str, input: Value, node: &mut dyn MapNode) -> NodeResult {
        if let Value::Array(items) = input {
            if !self.weakly_typed {
                let err = ErrorKind::unexpected_source("a map", ValueKind::Array);
                return Err(DecodeError::new(path, err).into());
            }
            if self.zero_fields {
                node.clear();
            }
            let mut errors = DecodeErrors::empty();
            for (i, item) in items.into_iter().enumerate() {
                let item_path = Path(path).index(i);
                let result = self
                    .source_map(&item_path, item, "a map")
                    .map_err(DecodeErrors::from)
                    .and_then(|map| self.decode_entries(&item_path, map, node));
                if let Err(err) = result {
                    errors.extend(err)?;
                }
            }
            errors.into_result()?;
            return Ok(true);
        }

        let map = self.source_map(path, input, "a map")?;
        if self.zero_fields {
            node.clear();
        }
        self.decode_entries(path, map, node)?;
        Ok(true)
    }

    fn decode_entries(&mut self, path: &str, map: Map, node: &mut dyn MapNode) -> Result<(), DecodeErrors> {
        let mut errors = DecodeErrors::empty();
        for (key, value) in map {
            let entry_path = Path(path).key(&key);
            let is_new = !node.contains_key(&key);
            let result = match node.entry(&key) {
                Ok(entry) => self.decode(&entry_path, value, entry),
                Err(err) => Err(DecodeError::new(&entry_path, ErrorKind::Coercion(err)).into()),
            };
            if let Err(err) = result {
                if is_new {
                    node.remove(&key);
                }
                errors.extend(err)?;
            }
        }
        errors.into_result()
    }

    fn decode_interface(&mut self, path: &str, input: Value, slot: &mut Value) -> NodeResult {
        match slot {
            Value::Bool(value) => self.decode_scalar(path, &input, value, bool::TYPE.ty.name_in_code()),
            Value::Int(value) => self.decode_scalar(path, &input, value, i64::TYPE.ty.name_in_code()),
            Value::Uint(value) => self.decode_scalar(path, &input, value, u64::TYPE.ty.name_in_code()),
            Value::Float(value) => self.decode_scalar(path, &input, value, f64::TYPE.ty.name_in_code()),
            Value::String(value) => {
                self.decode_scalar(path, &input, value, String::TYPE.ty.name_in_code())
            }
            Value::Array(items) => self.decode_slice(path, input, items),
            Value::Object(map) => self.decode_map(path, input, map),
            _ => {
                *slot = input;
                Ok(true)
            }
        }
    }
}

/// Checks whether the destination holds a self-decoding value, possibly nested in structs or pointers.
fn holds_self_decoding(dest: &mut dyn Decode) -> bool {
    if dest.type_metadata().unmarshal.is_some() {
        return true;
    }
    match dest.node() {
        Node::Struct(node) => (0..node.fields().len()).any(|i| holds_self_decoding(node.field_mut(i))),
        Node::Pointer(node) => !node.is_nil() && holds_self_decoding(node.pointee_mut()),
        _ => false,
    }
}

/// Resets the destination to its zero value for `zero_fields`. Self-decoding values are left untouched,
/// including ones nested in structs and pointers; their containers are reset field by field.
pub(super) fn reset_retaining_self_decoding(dest: &mut dyn Decode) {
    if !holds_self_decoding(dest) {
        dest.reset();
        return;
    }
    if dest.type_metadata().unmarshal.is_some() {
        return;
    }
    match dest.node() {
        Node::Struct(node) => {
            for i in 0..node.fields().len() {
                reset_retaining_self_decoding(node.field_mut(i));
            }
        }
        Node::Pointer(node) => reset_retaining_self_decoding(node.pointee_mut()),
        _ => {}
    }
}

/// Locates the struct to squash, allocating pointers along the way.
fn squash_target(dest: &mut dyn Decode) -> Option<&mut dyn StructNode> {
    match dest.node() {
        Node::Struct(node) => Some(node),
        Node::Pointer(node) => squash_target(node.pointee_mut()),
        _ => None,
    }
}
