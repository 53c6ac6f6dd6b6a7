use std::{
    collections::{BTreeMap, HashMap},
    time::Duration,
};

use assert_matches::assert_matches;

use super::*;
use crate::{
    Decode, DecodeError, DecodeErrors, Encode, ErrorKind,
    testonly::{Address, Base, Extra, Person, Record, TaggedId, Trimmed, Unmodifiable},
    value,
    value::{Map, ValueKind},
};

fn decode_with_config<T: Decode + DescribeType>(
    input: Value,
    configure: impl FnOnce(&mut DecoderConfig<'_>),
) -> (Result<T, DecodeErrors>, Metadata) {
    let mut dest = T::zero();
    let mut metadata = Metadata::default();
    let mut config = DecoderConfig {
        metadata: Some(&mut metadata),
        ..DecoderConfig::new(&mut dest)
    };
    configure(&mut config);
    let result = Decoder::new(config).decode(input);
    (result.map(|()| dest), metadata)
}

fn error_paths(errors: &DecodeErrors) -> Vec<&str> {
    errors.iter().map(DecodeError::path).collect()
}

#[test]
fn decoding_struct_from_map() {
    let input = value!({
        "name": "Alice",
        "AGE": 30,
        "emails": ["alice@example.com"],
        "address": { "street": "Main St", "zip_code": 12345 },
        "scores": { "math": 5 },
        "bogus": 1,
    });
    let (person, metadata) = decode_metadata::<Person>(input).unwrap();
    assert_eq!(
        person,
        Person {
            name: "Alice".into(),
            age: 30,
            emails: vec!["alice@example.com".into()],
            address: Some(Address {
                street: "Main St".into(),
                zip: 12345,
            }),
            scores: BTreeMap::from([("math".into(), 5)]),
        }
    );

    assert_eq!(
        metadata.keys,
        [
            "name",
            "age",
            "emails[0]",
            "emails",
            "address.street",
            "address.zip_code",
            "address",
            "scores[math]",
            "scores",
        ]
    );
    assert_eq!(metadata.unused, ["bogus"]);
    assert!(metadata.unset.is_empty());
}

#[test]
fn exact_key_match_takes_precedence() {
    let (person, metadata) =
        decode_metadata::<Person>(value!({ "NAME": "other", "name": "exact" })).unwrap();
    assert_eq!(person.name, "exact");
    assert_eq!(metadata.unused, ["NAME"]);
    assert_eq!(metadata.unset, ["age", "emails", "address", "scores"]);
}

#[test]
fn custom_name_matching() {
    let input = value!({ "street": "Main St", "zip-code": 123 });
    let (address, metadata) = decode_with_config::<Address>(input.clone(), |config| {
        config.match_name = |source_key, field_name| source_key.replace('-', "_") == field_name;
    });
    assert_eq!(address.unwrap().zip, 123);
    assert!(metadata.unused.is_empty());

    // Default matching is case-insensitive, but doesn't normalize separators.
    let (address, metadata) = decode_with_config::<Address>(input, |_| {});
    assert_eq!(address.unwrap().zip, 0);
    assert_eq!(metadata.unused, ["zip-code"]);
}

#[test]
fn custom_tag_name() {
    let input = value!({ "street": "Main St", "zipCode": 123, "zip_code": 456 });
    let (address, metadata) = decode_with_config::<Address>(input, |config| {
        config.tag_name = "json";
    });
    assert_eq!(address.unwrap().zip, 123);
    assert_eq!(metadata.unused, ["zip_code"]);
}

#[test]
fn merging_into_existing_value() {
    let mut person = Person {
        name: "Bob".into(),
        age: 25,
        emails: vec!["a".into(), "b".into(), "c".into()],
        address: Some(Address {
            street: "Old St".into(),
            zip: 1,
        }),
        scores: BTreeMap::from([("math".into(), 1)]),
    };
    let input = value!({
        "age": 26,
        "emails": ["d"],
        "address": { "zip_code": 2 },
        "scores": { "art": 3 },
    });
    decode_into(input, &mut person).unwrap();

    assert_eq!(person.name, "Bob");
    assert_eq!(person.age, 26);
    assert_eq!(person.emails, ["d"]);
    assert_eq!(
        person.address,
        Some(Address {
            street: "Old St".into(),
            zip: 2,
        })
    );
    assert_eq!(
        person.scores,
        BTreeMap::from([("math".into(), 1), ("art".into(), 3)])
    );
}

fn test_person() -> Person {
    Person {
        name: "Bob".into(),
        age: 25,
        emails: vec!["bob@example.com".into()],
        address: Some(Address::default()),
        scores: BTreeMap::from([("math".into(), 1)]),
    }
}

#[test]
fn null_values_leave_destination_intact() {
    let mut person = test_person();
    decode_into(value!({ "name": null, "address": null, "emails": [null] }), &mut person).unwrap();
    assert_eq!(person, test_person());
}

#[test]
fn zeroing_fields() {
    let mut person = test_person();
    let mut metadata = Metadata::default();
    let config = DecoderConfig {
        zero_fields: true,
        metadata: Some(&mut metadata),
        ..DecoderConfig::new(&mut person)
    };
    Decoder::new(config)
        .decode(value!({ "name": null, "scores": { "art": 2 } }))
        .unwrap();

    assert_eq!(
        person,
        Person {
            scores: BTreeMap::from([("art".into(), 2)]),
            ..Person::default()
        }
    );
    // Nulls are recorded since they reset the destination.
    assert_eq!(metadata.keys, ["name", "scores[art]", "scores"]);
}

#[test]
fn errors_are_collected_with_paths() {
    let input = value!({
        "name": 5,
        "age": 300,
        "emails": ["ok", 1, []],
        "address": "Main St",
    });
    let errors = decode::<Person>(input).unwrap_err();
    assert_eq!(
        error_paths(&errors),
        ["name", "age", "emails[1]", "emails[2]", "address"]
    );

    let errors: Vec<_> = errors.into_iter().collect();
    assert_matches!(
        errors[0].kind(),
        ErrorKind::TypeMismatch { expected: "String", actual: "int" }
    );
    assert_matches!(
        errors[1].kind(),
        ErrorKind::Coercion(err) if err.to_string() == "value 300 overflows `u8`"
    );
    assert_matches!(
        errors[3].kind(),
        ErrorKind::TypeMismatch { expected: "String", actual: "array" }
    );
    assert_eq!(
        errors[4].to_string(),
        "'address' expected a map or struct, got 'string'"
    );
    assert!(!errors[4].is_fatal());
}

#[test]
fn failed_pointer_allocation_is_rolled_back() {
    let mut person = Person::default();
    decode_into(value!({ "address": { "zip_code": "??" } }), &mut person).unwrap_err();
    assert_eq!(person.address, None);
}

#[test]
fn non_struct_source_for_struct() {
    let errors = decode::<Person>(value!([1, 2])).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().path(), "");
    assert_eq!(
        errors.first().to_string(),
        "'' expected a map or struct, got 'array'"
    );
}

#[test]
fn weak_typing() {
    let input = value!({
        "name": 123,
        "age": "42",
        "emails": "single@example.com",
        "address": { "street": true, "zip_code": 1.5 },
        "scores": [{ "math": "1" }, { "art": 2 }],
    });
    let person: Person = weak_decode(input).unwrap();
    assert_eq!(
        person,
        Person {
            name: "123".into(),
            age: 42,
            emails: vec!["single@example.com".into()],
            address: Some(Address {
                street: "1".into(),
                zip: 1,
            }),
            scores: BTreeMap::from([("math".into(), 1), ("art".into(), 2)]),
        }
    );
}

#[test]
fn weak_typing_for_sequences() {
    let bytes: Vec<u8> = weak_decode("hi").unwrap();
    assert_eq!(bytes, b"hi");
    let strings: Vec<String> = weak_decode(value!({})).unwrap();
    assert!(strings.is_empty());

    let err = decode::<Vec<String>>("hi").unwrap_err();
    assert_eq!(err.first().to_string(), "'' expected an array or slice, got 'string'");
    let err = decode::<HashMap<String, u32>>(value!([{ "a": 1 }])).unwrap_err();
    assert_eq!(err.first().to_string(), "'' expected a map, got 'array'");
}

#[test]
fn decoding_arrays() {
    let array: [u8; 3] = decode(value!([1, 2, 3])).unwrap();
    assert_eq!(array, [1, 2, 3]);

    let err = decode::<[u8; 3]>(value!([1, 2])).unwrap_err();
    assert_eq!(
        err.first().to_string(),
        "'' expected source data to have length 3, got 2"
    );
    let err = weak_decode::<[u8; 3]>(value!([1, 2, 3, 4])).unwrap_err();
    assert_matches!(err.first().kind(), ErrorKind::Shape(msg) if msg.contains("length 3, got 4"));

    let mut array = [9_u8; 3];
    let config = DecoderConfig {
        weakly_typed_input: true,
        ..DecoderConfig::new(&mut array)
    };
    Decoder::new(config).decode(value!([1])).unwrap();
    assert_eq!(array, [1, 0, 0]);
}

#[test]
fn decoding_maps_with_parsed_keys() {
    let errors = decode::<HashMap<u16, String>>(value!({ "1": "one", "x": "two", "2": 3 })).unwrap_err();
    assert_eq!(error_paths(&errors), ["[2]", "[x]"]);
    assert_matches!(errors.first().kind(), ErrorKind::TypeMismatch { .. });

    let mut map = HashMap::from([(2_u16, "existing".to_owned())]);
    decode_into(value!({ "1": "one", "2": 3 }), &mut map).unwrap_err();
    // New entries are removed on failure, but existing ones are retained.
    assert_eq!(
        map,
        HashMap::from([(1, "one".to_owned()), (2, "existing".to_owned())])
    );
}

#[test]
fn decoding_into_dynamic_values() {
    let value: Value = decode(value!({ "a": [1, "2"] })).unwrap();
    assert_eq!(value, value!({ "a": [1, "2"] }));

    let mut value = value!({ "a": 1 });
    decode_into(value!({ "b": { "c": true } }), &mut value).unwrap();
    assert_eq!(value, value!({ "a": 1, "b": { "c": true } }));

    let mut value = Value::Int(1);
    let err = decode_into("2", &mut value).unwrap_err();
    assert_matches!(
        err.first().kind(),
        ErrorKind::TypeMismatch { expected: "i64", actual: "string" }
    );
    decode_into(5_u8, &mut value).unwrap();
    assert_eq!(value, Value::Int(5));
}

#[test]
fn embedded_and_squashed_fields() {
    let input = value!({
        "id": 7,
        "kind": "test",
        "Extra": { "note": "hello" },
        "title": "Title",
        "hidden": 5,
        "other": true,
    });
    let (record, metadata) = decode_metadata::<Record>(input).unwrap();
    assert_eq!(
        record,
        Record {
            base: Base {
                id: 7,
                ty: "test".into(),
            },
            extra: Some(Box::new(Extra {
                note: "hello".into(),
            })),
            title: "Title".into(),
            hidden: 0,
            rest: HashMap::from([
                ("hidden".into(), Value::Int(5)),
                ("other".into(), Value::Bool(true)),
            ]),
        }
    );
    assert!(metadata.unused.is_empty());
    assert!(metadata.keys.contains(&"kind".to_owned()), "{metadata:?}");
    assert!(metadata.keys.contains(&"Extra.note".to_owned()), "{metadata:?}");
}

#[test]
fn squashing_all_embedded_fields() {
    let input = value!({ "id": 1, "note": "flat", "Extra": { "note": "nested" } });
    let (record, metadata) = decode_with_config::<Record>(input, |config| {
        config.squash = true;
    });
    let record = record.unwrap();
    assert_eq!(record.base.id, 1);
    assert_eq!(record.extra.unwrap().note, "flat");
    // Unused keys are captured by the `remain` field.
    assert!(metadata.unused.is_empty());
    assert_eq!(record.rest.keys().collect::<Vec<_>>(), ["Extra"]);
}

#[derive(Debug, Default, Decode)]
#[decode(crate = crate)]
struct InvalidSquash {
    #[tag(decode = ",squash")]
    value: u32,
    other: String,
}

#[test]
fn squashing_non_struct_is_fatal() {
    let (result, metadata) = decode_with_config::<InvalidSquash>(value!({ "other": "?" }), |config| {
        config.error_unused = true;
        config.error_unset = true;
    });
    let errors = result.unwrap_err();
    assert_eq!(errors.len(), 1);
    let err = errors.first();
    assert!(err.is_fatal());
    assert_eq!(
        err.to_string(),
        "'' cannot squash field `value`: it is not a struct"
    );
    assert!(metadata.keys.is_empty());
}

#[test]
fn erroring_on_unused_keys() {
    let input = value!({ "name": "x", "extra": 1, "address": { "bogus": 1 } });
    let (result, metadata) = decode_with_config::<Person>(input, |config| {
        config.error_unused = true;
    });
    let errors = result.unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors.first().path(), "");
    assert_matches!(
        errors.first().kind(),
        ErrorKind::UnusedKeys(keys) if *keys == ["address.bogus", "extra"]
    );
    assert_eq!(metadata.unused, ["address.bogus", "extra"]);
}

#[test]
fn erroring_on_unset_fields() {
    let (result, _) = decode_with_config::<Address>(value!({ "street": "x" }), |config| {
        config.error_unset = true;
    });
    let errors = result.unwrap_err();
    assert_eq!(
        errors.first().to_string(),
        "'' has unset fields: zip_code"
    );

    let (result, _) = decode_with_config::<Address>(value!({ "street": "x", "zip_code": 1 }), |config| {
        config.error_unset = true;
        config.error_unused = true;
    });
    result.unwrap();
}

#[test]
fn applying_hooks() {
    let hook = DecodeHook::new(|from, to, value| {
        Ok(match value {
            Value::Int(n) if from == ValueKind::Int && to.is::<String>() => Value::String(format!("#{n}")),
            Value::String(s) if s == "fail" => anyhow::bail!("hook failure"),
            value => value,
        })
    });
    let input = value!({ "name": 5, "emails": [1, "a"], "scores": { "x": "fail" } });
    let (result, _) = decode_with_config::<Person>(input, |config| {
        config.decode_hook = Some(hook);
    });
    let errors = result.unwrap_err();
    assert_eq!(error_paths(&errors), ["scores[x]"]);
    assert_matches!(errors.first().kind(), ErrorKind::Coercion(err) if err.to_string() == "hook failure");

    let input = value!({ "name": 5, "emails": [1, "a"] });
    let hook = DecodeHook::new(|from, to, value| {
        Ok(match value {
            Value::Int(n) if from == ValueKind::Int && to.is::<String>() => Value::String(format!("#{n}")),
            value => value,
        })
    });
    let (person, _) = decode_with_config::<Person>(input, |config| {
        config.decode_hook = Some(hook);
    });
    let person = person.unwrap();
    assert_eq!(person.name, "#5");
    assert_eq!(person.emails, ["#1", "a"]);
}

#[test]
fn hook_producing_typed_values() {
    let input = value!({ "timeout": "1m", "retries": "3" });
    let (result, _) = decode_with_config::<HashMap<String, Duration>>(input.clone(), |config| {
        config.decode_hook = Some(hooks::string_to_duration());
    });
    let errors = result.unwrap_err();
    // Parsing errors are produced by the hook.
    assert_eq!(error_paths(&errors), ["[retries]"]);
    assert_matches!(errors.first().kind(), ErrorKind::Coercion(_));

    let (result, _) = decode_with_config::<HashMap<String, Value>>(input, |config| {
        config.decode_hook = Some(hooks::string_to_duration());
    });
    // The hook doesn't apply to dynamic values.
    assert_eq!(result.unwrap()["timeout"], Value::from("1m"));
}

#[derive(Debug, Default, Decode)]
#[decode(crate = crate)]
struct Ids {
    id: TaggedId,
    maybe_id: Option<TaggedId>,
    ids: Vec<TaggedId>,
    trimmed: Trimmed,
    unmodifiable: Unmodifiable,
    count: u32,
}

#[test]
fn self_decoding_types() {
    let input = value!({
        "id": "A-1",
        "maybe_id": "B-2",
        "ids": ["C-3", "D-4"],
        "trimmed": "  test ",
        "unmodifiable": "changed",
    });
    let ids: Ids = decode(input).unwrap();
    assert_eq!(ids.id, TaggedId { tag: "A".into(), id: 1 });
    assert_eq!(ids.maybe_id, Some(TaggedId { tag: "B".into(), id: 2 }));
    assert_eq!(ids.ids.len(), 2);
    assert_eq!(ids.ids[1], TaggedId { tag: "D".into(), id: 4 });
    assert_eq!(ids.trimmed, Trimmed("test".into()));
    // Mutations by the value receiver are discarded.
    assert_eq!(ids.unmodifiable, Unmodifiable::default());
}

#[test]
fn errors_from_self_decoding_types() {
    let errors = decode::<Ids>(value!({ "id": "invalid", "ids": ["A-1", 5], "trimmed": 1 })).unwrap_err();
    assert_eq!(error_paths(&errors), ["id", "ids[1]", "trimmed"]);
    assert_eq!(
        errors.first().to_string(),
        "error decoding 'id': invalid format for TaggedId"
    );
    let errors: Vec<_> = errors.into_iter().collect();
    assert_matches!(
        errors[2].kind(),
        ErrorKind::Unmarshal(err) if err.to_string() == "expected string input for Trimmed, got int"
    );
}

#[test]
fn disabling_custom_decoding() {
    let input = value!({ "id": { "tag": "A", "id": 1 }, "trimmed": " x " });
    let (ids, _) = decode_with_config::<Ids>(input, |config| {
        config.disable_unmarshaler = true;
    });
    let ids = ids.unwrap();
    assert_eq!(ids.id, TaggedId { tag: "A".into(), id: 1 });
    assert_eq!(ids.trimmed, Trimmed(" x ".into()));

    let (result, _) = decode_with_config::<Ids>(value!({ "id": "A-1" }), |config| {
        config.disable_unmarshaler = true;
    });
    let errors = result.unwrap_err();
    assert_eq!(
        errors.first().to_string(),
        "'id' expected a map or struct, got 'string'"
    );
}

#[test]
fn zeroing_fields_retains_self_decoding_values() {
    let mut ids = Ids {
        id: TaggedId { tag: "A".into(), id: 1 },
        count: 5,
        ..Ids::default()
    };
    let config = DecoderConfig {
        zero_fields: true,
        ..DecoderConfig::new(&mut ids)
    };
    Decoder::new(config).decode(value!({ "id": null })).unwrap();
    assert_eq!(ids.id, TaggedId { tag: "A".into(), id: 1 });
    assert_eq!(ids.count, 0);
}

#[derive(Debug, Default, PartialEq, Decode)]
#[decode(crate = crate)]
struct IdHolder {
    id: TaggedId,
    count: u32,
}

#[derive(Debug, Default, PartialEq, Decode)]
#[decode(crate = crate)]
struct NestedIds {
    inner: IdHolder,
    maybe_inner: Option<IdHolder>,
    address: Option<Address>,
}

fn nested_ids() -> NestedIds {
    let holder = IdHolder {
        id: TaggedId { tag: "PRE".into(), id: 7 },
        count: 5,
    };
    NestedIds {
        inner: IdHolder {
            id: holder.id.clone(),
            count: 5,
        },
        maybe_inner: Some(holder),
        address: Some(Address::default()),
    }
}

#[test]
fn zeroing_fields_retains_nested_self_decoding_values() {
    let expected_id = TaggedId { tag: "PRE".into(), id: 7 };
    let mut ids = nested_ids();
    let config = DecoderConfig {
        zero_fields: true,
        ..DecoderConfig::new(&mut ids)
    };
    Decoder::new(config)
        .decode(value!({ "inner": { "count": 1 } }))
        .unwrap();
    assert_eq!(
        ids.inner,
        IdHolder {
            id: expected_id.clone(),
            count: 1,
        }
    );
    // Pointers holding self-decoding values are retained; other pointers are reset.
    assert_eq!(
        ids.maybe_inner,
        Some(IdHolder {
            id: expected_id.clone(),
            count: 0,
        })
    );
    assert_eq!(ids.address, None);

    let mut ids = nested_ids();
    let config = DecoderConfig {
        zero_fields: true,
        ..DecoderConfig::new(&mut ids)
    };
    Decoder::new(config)
        .decode(value!({ "inner": null, "maybe_inner": null }))
        .unwrap();
    assert_eq!(
        ids.inner,
        IdHolder {
            id: expected_id.clone(),
            count: 0,
        }
    );
    assert_eq!(
        ids.maybe_inner,
        Some(IdHolder {
            id: expected_id,
            count: 0,
        })
    );
}

#[test]
fn zeroing_array_elements() {
    let mut holders = [IdHolder {
        id: TaggedId { tag: "A".into(), id: 1 },
        count: 2,
    }];
    let config = DecoderConfig {
        zero_fields: true,
        ..DecoderConfig::new(&mut holders)
    };
    Decoder::new(config).decode(value!([{}])).unwrap();
    assert_eq!(holders[0].id, TaggedId { tag: "A".into(), id: 1 });
    assert_eq!(holders[0].count, 0);
}

#[test]
fn decoding_typed_values() {
    let duration: Duration = decode(Value::Any(AnyValue::new(Duration::from_secs(3)))).unwrap();
    assert_eq!(duration, Duration::from_secs(3));

    let err = decode::<String>(Value::Any(AnyValue::new(3_u32))).unwrap_err();
    assert_matches!(
        err.first().kind(),
        ErrorKind::TypeMismatch { expected: "String", actual: "u32" }
    );

    // Typed values are not unwrapped from pointers.
    let address = AnyValue::new(Address {
        street: "Main St".into(),
        zip: 1,
    });
    let input = Map::from([("address".to_owned(), Value::Any(address))]);
    let person: Person = decode(Value::Object(input)).unwrap();
    assert_eq!(person.address.unwrap().zip, 1);
}

#[test]
fn decoding_struct_into_struct() {
    let person = Person {
        name: "Alice".into(),
        age: 30,
        emails: vec!["a@example.com".into()],
        address: Some(Address {
            street: "Main St".into(),
            zip: 12345,
        }),
        scores: BTreeMap::from([("math".into(), -1)]),
    };
    let decoded: Person = decode(person.encode()).unwrap();
    assert_eq!(decoded, person);

    let map: Map = decode(person.address.encode()).unwrap();
    assert_eq!(map.len(), 2);
    assert_eq!(map["street"], Value::from("Main St"));
    assert_eq!(map["zip_code"], Value::Uint(12345));
}

#[test]
fn decoder_appends_metadata() {
    let mut address = Address::default();
    let mut metadata = Metadata::default();
    let mut decoder = Decoder::new(DecoderConfig {
        metadata: Some(&mut metadata),
        ..DecoderConfig::new(&mut address)
    });
    decoder.decode(value!({ "street": "Main St" })).unwrap();
    decoder.decode(value!({ "zip_code": 1, "extra": true })).unwrap();
    drop(decoder);

    assert_eq!(address.street, "Main St");
    assert_eq!(address.zip, 1);
    assert_eq!(metadata.keys, ["street", "zip_code"]);
    assert_eq!(metadata.unused, ["extra"]);
    assert_eq!(metadata.unset, ["zip_code", "street"]);
}

#[test]
fn decoding_root_scalars_and_pointers() {
    assert_eq!(decode::<u32>(5).unwrap(), 5);
    assert_eq!(decode::<Option<u32>>(Value::Null).unwrap(), None);
    assert_eq!(decode::<Option<Option<u32>>>(5).unwrap(), Some(Some(5)));
    assert_eq!(*decode::<Box<String>>("test").unwrap(), "test");

    let (value, metadata) = decode_metadata::<u64>(5).unwrap();
    assert_eq!(value, 5);
    // The root is never recorded.
    assert!(metadata.keys.is_empty());
}
