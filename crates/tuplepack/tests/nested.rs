// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Nested schemas: User -> Address -> Country, all in one context.

use tuplepack::{Codec, ContextBuilder, ContextConverter, Error, Registry, Schema, Value};

#[derive(Schema, Debug, Clone, PartialEq)]
struct Country {
    code: String,
    name: String,
}

#[derive(Schema, Debug, Clone, PartialEq)]
struct Address {
    street: String,
    city: String,
    country: Option<Country>,
}

#[derive(Schema, Debug, Clone, PartialEq)]
struct User {
    name: String,
    address: Option<Address>,
    previous: Vec<Address>,
}

fn setup() -> (Registry, ContextConverter) {
    let registry = Registry::new();
    User::register(&registry).unwrap();
    Address::register(&registry).unwrap();
    Country::register(&registry).unwrap();
    let ctx = ContextBuilder::new("people")
        .schema::<User>(1)
        .schema::<Address>(2)
        .schema::<Country>(3)
        .build()
        .unwrap();
    (registry, ctx)
}

fn sample() -> User {
    User {
        name: "Ada".into(),
        address: Some(Address {
            street: "12 Analytical Row".into(),
            city: "London".into(),
            country: Some(Country {
                code: "GB".into(),
                name: "United Kingdom".into(),
            }),
        }),
        previous: vec![Address {
            street: "1 Engine Lane".into(),
            city: "Marylebone".into(),
            country: None,
        }],
    }
}

#[test]
fn test_three_levels_roundtrip() {
    let (registry, ctx) = setup();
    let codec = Codec::new(&registry);
    let user = sample();

    let bytes = codec.encode_typed(&user, &ctx).unwrap();
    assert_eq!(codec.decode_as::<User>(&bytes, &ctx).unwrap(), user);
}

#[test]
fn test_nil_at_middle_level() {
    let (registry, ctx) = setup();
    let codec = Codec::new(&registry);
    let mut user = sample();
    if let Some(address) = user.address.as_mut() {
        address.country = None;
    }

    let bytes = codec.encode_typed(&user, &ctx).unwrap();
    let back: User = codec.decode_as(&bytes, &ctx).unwrap();
    assert_eq!(back, user);
    assert!(back.address.as_ref().unwrap().country.is_none());
}

#[test]
fn test_deep_field_read_after_decode() {
    let (registry, ctx) = setup();
    let codec = Codec::new(&registry);
    let bytes = codec.encode_typed(&sample(), &ctx).unwrap();

    let record = Value::Record(codec.decode(&bytes, &ctx).unwrap());
    assert_eq!(
        record
            .path(&["address", "country", "code"])
            .and_then(Value::as_str),
        Some("GB")
    );
    assert_eq!(
        record.path(&["address", "city"]).and_then(Value::as_str),
        Some("London")
    );
    // Nested records come back typed with their own owning type.
    let address = record.get_field("address").and_then(Value::as_record).unwrap();
    assert_eq!(address.owning_type().as_str(), Address::owning_type());
}

#[test]
fn test_nested_wire_shape() {
    let (registry, ctx) = setup();
    let codec = Codec::new(&registry);
    let user = User {
        name: "x".into(),
        address: Some(Address {
            street: "s".into(),
            city: "c".into(),
            country: None,
        }),
        previous: Vec::new(),
    };

    let wire = codec.pack(&user.to_record(), &ctx).unwrap();
    let slots = wire.as_tuple().unwrap()[1].as_tuple().unwrap();
    assert_eq!(
        slots[1],
        Value::tuple([
            Value::Int(tuplepack::config::NEST_TAG),
            Value::Int(2),
            Value::tuple([Value::from("s"), Value::from("c")]),
        ])
    );
}

#[test]
fn test_nested_schema_outside_context_rejected() {
    let (registry, _) = setup();
    let codec = Codec::new(&registry);
    let partial = ContextBuilder::new("people-lite")
        .schema::<User>(1)
        .schema::<Address>(2)
        .build()
        .unwrap();

    let err = codec.encode_typed(&sample(), &partial).unwrap_err();
    assert!(
        matches!(err, Error::SchemaNotInContext { ref schema, .. } if schema == "Country"),
        "{}",
        err
    );
}

#[test]
fn test_unregistered_nested_record_kept_as_value() {
    let (registry, ctx) = setup();
    let codec = Codec::new(&registry);
    let loose = tuplepack::Record::new("elsewhere::Note").with("text", "hi");
    let record = tuplepack::Record::new(User::owning_type())
        .with("name", "n")
        .with("previous", Value::List(vec![Value::Record(loose)]));

    let back = codec.decode(&codec.encode(&record, &ctx).unwrap(), &ctx).unwrap();
    assert_eq!(back, record);
}
