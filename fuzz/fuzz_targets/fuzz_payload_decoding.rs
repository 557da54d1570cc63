//! Fuzz target for proof payload decoding
//!
//! This target ensures:
//! 1. Payload decoding never panics on arbitrary input
//! 2. Invalid payloads are rejected gracefully
//! 3. Verification never panics even with garbage input

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use msproof_primitives::{Codec, Hasher};
use msproof_verifier::MultiStoreVerifier;

/// Arbitrary payload bytes and verification parameters
#[derive(Debug, Arbitrary)]
struct PayloadInput {
    /// Random bytes to try as a proof payload
    payload: Vec<u8>,
    store_name: String,
    key: Vec<u8>,
    value: Vec<u8>,
    app_hash: [u8; 32],
    tmhash: bool,
}

fuzz_target!(|input: PayloadInput| {
    let hasher = if input.tmhash { Hasher::tmhash() } else { Hasher::sha256() };
    // Small frame limit to avoid OOM
    let verifier = MultiStoreVerifier::new(hasher).with_codec(Codec::new(64 * 1024));

    let _ = verifier.verify(
        &input.payload,
        &input.store_name,
        &input.key,
        &input.value,
        &input.app_hash,
    );
});
