//! Test-only functionality shared among multiple test modules.

use std::collections::{BTreeMap, HashMap};

use anyhow::Context as _;

use crate::{Decode, Encode, de::UnmarshalValue, value::Value};

#[derive(Debug, Default, Clone, PartialEq, Decode, Encode)]
#[decode(crate = crate)]
pub(crate) struct Address {
    pub street: String,
    #[tag(decode = "zip_code", json = "zipCode")]
    pub zip: u32,
}

#[derive(Debug, Default, Clone, PartialEq, Decode, Encode)]
#[decode(crate = crate)]
pub(crate) struct Person {
    pub name: String,
    pub age: u8,
    pub emails: Vec<String>,
    pub address: Option<Address>,
    pub scores: BTreeMap<String, i64>,
}

#[derive(Debug, Default, Clone, PartialEq, Decode, Encode)]
#[decode(crate = crate)]
pub(crate) struct Base {
    pub id: u64,
    #[tag(decode = "kind")]
    pub ty: String,
}

#[derive(Debug, Default, Clone, PartialEq, Decode, Encode)]
#[decode(crate = crate)]
pub(crate) struct Extra {
    pub note: String,
}

/// Struct with all kinds of embedded fields.
#[derive(Debug, Default, Clone, PartialEq, Decode, Encode)]
#[decode(crate = crate)]
pub(crate) struct Record {
    #[decode(embed)]
    #[tag(decode = ",squash")]
    pub base: Base,
    #[decode(embed)]
    pub extra: Option<Box<Extra>>,
    pub title: String,
    #[tag(decode = "-")]
    pub hidden: u32,
    #[tag(decode = ",remain")]
    pub rest: HashMap<String, Value>,
}

/// Self-decoding type parsing `TAG-ID` strings.
#[derive(Debug, Default, Clone, PartialEq, Decode)]
#[decode(crate = crate, unmarshal)]
pub(crate) struct TaggedId {
    pub tag: String,
    pub id: u64,
}

impl UnmarshalValue for TaggedId {
    fn unmarshal_value(&mut self, raw: &Value) -> anyhow::Result<()> {
        let raw = raw.as_str().with_context(|| {
            format!("expected a string for TaggedId, got {}", raw.type_name())
        })?;
        let (tag, id) = raw.split_once('-').context("invalid format for TaggedId")?;
        self.tag = tag.to_owned();
        self.id = id.parse().context("invalid ID")?;
        Ok(())
    }
}

/// Self-decoding type whose decode method has a value receiver, so its mutations are lost.
#[derive(Debug, Default, Clone, PartialEq, Decode)]
#[decode(crate = crate, unmarshal = "value")]
pub(crate) struct Unmodifiable {
    pub value: String,
}

impl UnmarshalValue for Unmodifiable {
    fn unmarshal_value(&mut self, raw: &Value) -> anyhow::Result<()> {
        self.value = raw.as_str().context("expected a string")?.to_owned();
        Ok(())
    }
}

/// Newtype decoding itself from a string with surrounding whitespace removed.
#[derive(Debug, Default, Clone, PartialEq, Decode)]
#[decode(crate = crate, unmarshal)]
pub(crate) struct Trimmed(pub String);

impl UnmarshalValue for Trimmed {
    fn unmarshal_value(&mut self, raw: &Value) -> anyhow::Result<()> {
        let s = raw.as_str().with_context(|| {
            format!("expected string input for Trimmed, got {}", raw.type_name())
        })?;
        self.0 = s.trim().to_owned();
        Ok(())
    }
}

/// Newtype without custom decoding.
#[derive(Debug, Default, Clone, Copy, PartialEq, Decode, Encode)]
#[decode(crate = crate)]
pub(crate) struct Port(pub u16);
