// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Populating more fields never shrinks the encoding.

use tuplepack::{
    Codec, CodecConfig, CompressionAlgo, ContextConverter, Descriptor, Record, Registry,
    TaggedCodec, Value, ValueCodec,
};

const FIELDS: [(&str, i64); 5] = [("a", 1), ("b", 2), ("c", 3), ("d", 6), ("e", 8)];

fn value_for(field: &str) -> Value {
    match field {
        "a" => Value::Int(0),
        "b" => Value::from(""),
        "c" => Value::Bool(false),
        "d" => Value::Float(0.5),
        _ => Value::List(vec![]),
    }
}

fn with_mask(mask: u32) -> Record {
    let mut record = Record::new("mono::Row");
    for (bit, (field, _)) in FIELDS.iter().enumerate() {
        if mask & (1 << bit) != 0 {
            record.set(*field, value_for(field));
        }
    }
    record
}

fn sizes(trim: bool) -> Vec<usize> {
    let registry = Registry::new();
    registry
        .register(Descriptor::explicit("Row", &FIELDS).unwrap(), "mono::Row")
        .unwrap();
    let ctx = ContextConverter::build("mono", [(1, "Row")]).unwrap();
    let codec = Codec::with_config(
        &registry,
        CodecConfig::default()
            .with_compression(CompressionAlgo::None)
            .with_trim_trailing_absent(trim),
    );
    (0..1u32 << FIELDS.len())
        .map(|mask| codec.encode(&with_mask(mask), &ctx).unwrap().len())
        .collect()
}

fn check_monotonic(sizes: &[usize]) {
    for subset in 0..sizes.len() {
        for bit in 0..FIELDS.len() {
            let superset = subset | (1 << bit);
            assert!(
                sizes[superset] >= sizes[subset],
                "mask {:05b} -> {:05b}: {} < {}",
                subset,
                superset,
                sizes[superset],
                sizes[subset]
            );
        }
    }
}

#[test]
fn test_monotonic_with_trimming() {
    let sizes = sizes(true);
    check_monotonic(&sizes);
    // All-absent is just the header and an empty tuple.
    assert!(sizes[0] < sizes[sizes.len() - 1]);
}

#[test]
fn test_monotonic_without_trimming() {
    check_monotonic(&sizes(false));
}

#[test]
fn test_trimming_never_grows_payload() {
    let trimmed = sizes(true);
    let full = sizes(false);
    for (t, f) in trimmed.iter().zip(&full) {
        assert!(t <= f);
    }
}

#[test]
fn test_monotonic_before_compression_with_default_config() {
    let registry = Registry::new();
    registry
        .register(
            Descriptor::explicit("M", &[("a", 1), ("b", 2)]).unwrap(),
            "mono::M",
        )
        .unwrap();
    let ctx = ContextConverter::build("mono", [(1, "M")]).unwrap();
    let codec = Codec::new(&registry);
    let value_codec = TaggedCodec::new();

    // A long first field puts the fuller records past the deflate threshold.
    for len in [0usize, 40, 54, 60, 200] {
        let text = "a".repeat(len);
        let records = [
            Record::new("mono::M"),
            Record::new("mono::M").with("a", text.as_str()),
            Record::new("mono::M").with("b", 0i64),
            Record::new("mono::M")
                .with("a", text.as_str())
                .with("b", 0i64),
        ];
        let sizes: Vec<usize> = records
            .iter()
            .map(|r| value_codec.encode(&codec.pack(r, &ctx).unwrap()).len())
            .collect();
        assert!(sizes[1] >= sizes[0], "len {}: {:?}", len, sizes);
        assert!(sizes[2] >= sizes[0], "len {}: {:?}", len, sizes);
        assert!(sizes[3] >= sizes[1], "len {}: {:?}", len, sizes);
        assert!(sizes[3] >= sizes[2], "len {}: {:?}", len, sizes);

        for record in &records {
            let bytes = codec.encode(record, &ctx).unwrap();
            assert_eq!(&codec.decode(&bytes, &ctx).unwrap(), record);
        }
    }
}
