// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Concurrent registration and encode/decode.

use std::thread;
use tuplepack::{Codec, ContextConverter, Descriptor, Error, Record, Registry, RegistryError};

const THREADS: usize = 8;

#[test]
fn test_concurrent_identical_registration() {
    let registry = Registry::new();
    thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..200 {
                    let descriptor = Descriptor::sequential("Shared", &["a", "b"]).unwrap();
                    registry.register(descriptor, "conc::Shared").unwrap();
                }
            });
        }
    });
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.schema_names(), vec!["Shared".to_string()]);
}

#[test]
fn test_conflicting_registration_has_one_winner() {
    let registry = Registry::new();
    let outcomes: Vec<bool> = thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|i| {
                let registry = &registry;
                s.spawn(move || {
                    let field = format!("f{}", i);
                    let descriptor = Descriptor::sequential("Contested", &[field.as_str()]).unwrap();
                    match registry.register(descriptor, "conc::Contested") {
                        Ok(_) => true,
                        Err(RegistryError::SchemaConflict { .. }) => false,
                        Err(e) => panic!("unexpected error: {}", e),
                    }
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });
    assert_eq!(outcomes.iter().filter(|won| **won).count(), 1);
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_parallel_encode_decode() {
    let registry = Registry::new();
    registry
        .register(Descriptor::sequential("Event", &["seq", "who", "body"]).unwrap(), "conc::Event")
        .unwrap();
    let ctx = ContextConverter::build("events", [(1, "Event")]).unwrap();
    let codec = Codec::new(&registry);

    thread::scope(|s| {
        for t in 0..THREADS {
            let codec = &codec;
            let ctx = &ctx;
            s.spawn(move || {
                for seq in 0..500i64 {
                    let event = Record::new("conc::Event")
                        .with("seq", seq)
                        .with("who", format!("thread-{}", t))
                        .with("body", "x".repeat((seq % 97) as usize));
                    let bytes = codec.encode(&event, ctx).unwrap();
                    assert_eq!(codec.decode(&bytes, ctx).unwrap(), event);
                }
            });
        }
    });
}

#[test]
fn test_encode_while_registering() {
    let registry = Registry::new();
    registry
        .register(Descriptor::sequential("Base", &["v"]).unwrap(), "conc::Base")
        .unwrap();
    let ctx = ContextConverter::build("live", [(1, "Base")]).unwrap();
    let codec = Codec::new(&registry);

    thread::scope(|s| {
        s.spawn(|| {
            for i in 0..200 {
                let name = format!("Extra{}", i);
                let owner = format!("conc::Extra{}", i);
                registry
                    .register(Descriptor::sequential(&name, &["x"]).unwrap(), owner)
                    .unwrap();
            }
        });
        for _ in 0..4 {
            s.spawn(|| {
                for i in 0..500i64 {
                    let base = Record::new("conc::Base").with("v", i);
                    let bytes = codec.encode(&base, &ctx).unwrap();
                    assert_eq!(codec.decode(&bytes, &ctx).unwrap(), base);
                }
            });
        }
    });
    assert_eq!(registry.len(), 201);

    // Schemas registered later are not in the context.
    let err = codec
        .encode(&Record::new("conc::Extra0").with("x", 1i64), &ctx)
        .unwrap_err();
    assert!(matches!(err, Error::SchemaNotInContext { .. }));
}
