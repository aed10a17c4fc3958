// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use tuplepack::{Codec, ContextConverter, Descriptor, Registry};

struct Fixture {
    registry: Registry,
    ctx: ContextConverter,
}

fn fixture() -> &'static Fixture {
    static FIXTURE: OnceLock<Fixture> = OnceLock::new();
    FIXTURE.get_or_init(|| {
        let registry = Registry::new();
        for (name, fields) in [
            ("User", &["name", "email", "address"][..]),
            ("Address", &["street", "country"][..]),
            ("Country", &["code"][..]),
        ] {
            let descriptor = Descriptor::sequential(name, fields).expect("valid descriptor");
            registry
                .register(descriptor, format!("fuzz::{}", name))
                .expect("register");
        }
        let ctx = ContextConverter::build("fuzz", [(1, "User"), (2, "Address"), (3, "Country")])
            .expect("valid context");
        Fixture { registry, ctx }
    })
}

fuzz_target!(|data: &[u8]| {
    let fixture = fixture();
    let codec = Codec::new(&fixture.registry);

    // Full pipeline: frame, value codec, unpack
    if let Ok(record) = codec.decode(data, &fixture.ctx) {
        // Anything that decodes must encode again.
        let _ = codec.encode(&record, &fixture.ctx);
    }
});
