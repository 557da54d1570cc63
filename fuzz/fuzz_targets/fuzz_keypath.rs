//! Fuzz target for key path parsing
//!
//! This target ensures:
//! 1. Parsing never panics on arbitrary strings
//! 2. Rendered key paths parse back to the same keys

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use msproof_store::{KeyEncoding, KeyPath};

#[derive(Debug, Arbitrary)]
struct KeyPathInput {
    raw: String,
    keys: Vec<(Vec<u8>, bool)>,
}

fuzz_target!(|input: KeyPathInput| {
    let _ = KeyPath::parse(&input.raw);

    if input.keys.is_empty() {
        return;
    }
    let path = input.keys.iter().fold(KeyPath::new(), |path, (key, hex)| {
        let encoding = if *hex { KeyEncoding::Hex } else { KeyEncoding::Url };
        path.append_key(key.clone(), encoding)
    });
    let rendered = path.to_string();
    let parsed = KeyPath::parse(&rendered).expect("rendered key path must parse");

    let expected: Vec<Vec<u8>> = input.keys.into_iter().map(|(key, _)| key).collect();
    assert_eq!(parsed.into_keys(), expected);
});
