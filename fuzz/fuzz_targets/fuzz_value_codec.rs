// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use libfuzzer_sys::fuzz_target;
use tuplepack::{TaggedCodec, ValueCodec};

fuzz_target!(|data: &[u8]| {
    let codec = TaggedCodec::new();

    // The re-encoded form is canonical: decoding it and encoding again
    // yields the same bytes.
    if let Ok(value) = codec.decode(data) {
        let canonical = codec.encode(&value);
        let again = codec.decode(&canonical).expect("canonical bytes decode");
        assert_eq!(codec.encode(&again), canonical);
    }
});
