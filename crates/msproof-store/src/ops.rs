//! Proof operators and the runtime that chains them
//!
//! A proof is a list of [`ProofOp`]s, innermost first. Each operator is
//! decoded by a registered decoder, then run over the output of the
//! previous one: substore operators turn a value into a substore root, the
//! multi-store operator turns a substore root into the app hash. Keyed
//! operators consume the key path from its last segment backwards.

use crate::error::{ProofError, ProofResult};
use crate::range::{kv_leaf_hash, AbsenceProof, ExistenceProof};
use msproof_primitives::{
    compute_multistore_root, hex_serde, Codec, Hasher, SimpleProof, SubstoreCommit,
};
use percent_encoding::{percent_decode, percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const PROOF_OP_SIMPLE_VALUE: &str = "simple:v";
pub const PROOF_OP_RANGE_VALUE: &str = "iavl:v";
pub const PROOF_OP_RANGE_ABSENCE: &str = "iavl:a";
pub const PROOF_OP_MULTISTORE: &str = "multistore";

/// Wire form of one proof operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofOp {
    #[serde(rename = "type")]
    pub type_tag: String,

    #[serde(with = "hex_serde::bytes")]
    pub key: Vec<u8>,

    #[serde(with = "hex_serde::bytes")]
    pub data: Vec<u8>,
}

/// Decoded proof operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProofOperator {
    /// `value -> simple Merkle root` over key/value leaves
    SimpleValue { key: Vec<u8>, proof: SimpleProof },

    /// `value -> substore root` via an existence proof
    RangeValue { key: Vec<u8>, proof: ExistenceProof },

    /// `() -> substore root` via an absence proof
    RangeAbsence { key: Vec<u8>, proof: AbsenceProof },

    /// `substore root -> app hash` via the substore commitments
    MultiStore {
        key: Vec<u8>,
        commits: Vec<SubstoreCommit>,
    },
}

impl ProofOperator {
    /// Registry tag
    pub fn type_tag(&self) -> &'static str {
        match self {
            ProofOperator::SimpleValue { .. } => PROOF_OP_SIMPLE_VALUE,
            ProofOperator::RangeValue { .. } => PROOF_OP_RANGE_VALUE,
            ProofOperator::RangeAbsence { .. } => PROOF_OP_RANGE_ABSENCE,
            ProofOperator::MultiStore { .. } => PROOF_OP_MULTISTORE,
        }
    }

    /// Key path segment this operator consumes
    pub fn key(&self) -> &[u8] {
        match self {
            ProofOperator::SimpleValue { key, .. }
            | ProofOperator::RangeValue { key, .. }
            | ProofOperator::RangeAbsence { key, .. }
            | ProofOperator::MultiStore { key, .. } => key,
        }
    }

    /// Encode into wire form
    pub fn to_proof_op(&self, codec: &Codec) -> ProofResult<ProofOp> {
        let data = match self {
            ProofOperator::SimpleValue { proof, .. } => codec.encode_length_prefixed(proof)?,
            ProofOperator::RangeValue { proof, .. } => codec.encode_length_prefixed(proof)?,
            ProofOperator::RangeAbsence { proof, .. } => codec.encode_length_prefixed(proof)?,
            ProofOperator::MultiStore { commits, .. } => codec.encode_length_prefixed(commits)?,
        };
        Ok(ProofOp {
            type_tag: self.type_tag().to_string(),
            key: self.key().to_vec(),
            data,
        })
    }

    /// Apply the operator to the previous operator's output
    pub fn run(&self, hasher: &Hasher, args: &[Vec<u8>]) -> ProofResult<Vec<Vec<u8>>> {
        let op = self.type_tag();
        match self {
            ProofOperator::SimpleValue { key, proof } => {
                let value = single_arg(op, args)?;
                if kv_leaf_hash(hasher, key, value) != proof.leaf_hash {
                    return Err(ProofError::op_failed(op, "leaf hash mismatch"));
                }
                let root = proof
                    .compute_root(hasher)
                    .ok_or_else(|| ProofError::op_failed(op, "inconsistent proof path"))?;
                Ok(vec![root])
            }
            ProofOperator::RangeValue { key, proof } => {
                let value = single_arg(op, args)?;
                if proof.key != *key {
                    return Err(ProofError::key_mismatch(key, &proof.key));
                }
                if proof.value.as_slice() != value {
                    return Err(ProofError::ValueMismatch { key: hex::encode(key) });
                }
                Ok(vec![proof.compute_root(hasher)?])
            }
            ProofOperator::RangeAbsence { key, proof } => {
                if !args.is_empty() {
                    return Err(ProofError::op_failed(op, "expected no arguments"));
                }
                if proof.key != *key {
                    return Err(ProofError::key_mismatch(key, &proof.key));
                }
                proof.check_neighbours(key)?;
                Ok(vec![proof.compute_root(hasher)?])
            }
            ProofOperator::MultiStore { key, commits } => {
                let substore_root = single_arg(op, args)?;
                let mut names: Vec<&str> = commits.iter().map(|c| c.name.as_str()).collect();
                names.sort_unstable();
                if names.windows(2).any(|pair| pair[0] == pair[1]) {
                    return Err(ProofError::op_failed(op, "duplicate substore names"));
                }
                let entry = commits
                    .iter()
                    .find(|c| c.name.as_bytes() == key.as_slice())
                    .ok_or_else(|| {
                        ProofError::op_failed(
                            op,
                            format!("substore '{}' not found", String::from_utf8_lossy(key)),
                        )
                    })?;
                if entry.commit_hash_bytes() != substore_root {
                    return Err(ProofError::SubstoreRootMismatch {
                        store: String::from_utf8_lossy(key).into_owned(),
                    });
                }
                Ok(vec![compute_multistore_root(hasher, commits)])
            }
        }
    }
}

fn single_arg<'a>(op: &'static str, args: &'a [Vec<u8>]) -> ProofResult<&'a [u8]> {
    match args {
        [value] => Ok(value),
        _ => Err(ProofError::op_failed(
            op,
            format!("expected 1 argument, got {}", args.len()),
        )),
    }
}

/// Decoder from wire form into a [`ProofOperator`]
pub type OpDecoder = fn(&ProofOp, &Codec) -> ProofResult<ProofOperator>;

fn expect_tag(op: &ProofOp, want: &'static str) -> ProofResult<()> {
    if op.type_tag != want {
        return Err(ProofError::UnexpectedOpType {
            got: op.type_tag.clone(),
            want,
        });
    }
    Ok(())
}

pub fn decode_simple_value_op(op: &ProofOp, codec: &Codec) -> ProofResult<ProofOperator> {
    expect_tag(op, PROOF_OP_SIMPLE_VALUE)?;
    Ok(ProofOperator::SimpleValue {
        key: op.key.clone(),
        proof: codec.decode_length_prefixed(&op.data)?,
    })
}

pub fn decode_range_value_op(op: &ProofOp, codec: &Codec) -> ProofResult<ProofOperator> {
    expect_tag(op, PROOF_OP_RANGE_VALUE)?;
    Ok(ProofOperator::RangeValue {
        key: op.key.clone(),
        proof: codec.decode_length_prefixed(&op.data)?,
    })
}

pub fn decode_range_absence_op(op: &ProofOp, codec: &Codec) -> ProofResult<ProofOperator> {
    expect_tag(op, PROOF_OP_RANGE_ABSENCE)?;
    Ok(ProofOperator::RangeAbsence {
        key: op.key.clone(),
        proof: codec.decode_length_prefixed(&op.data)?,
    })
}

pub fn decode_multistore_op(op: &ProofOp, codec: &Codec) -> ProofResult<ProofOperator> {
    expect_tag(op, PROOF_OP_MULTISTORE)?;
    Ok(ProofOperator::MultiStore {
        key: op.key.clone(),
        commits: codec.decode_length_prefixed(&op.data)?,
    })
}

/// Registry of operator decoders plus the chain verifier
#[derive(Clone)]
pub struct ProofRuntime {
    hasher: Hasher,
    codec: Codec,
    decoders: HashMap<String, OpDecoder>,
}

impl fmt::Debug for ProofRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.decoders.keys().map(String::as_str).collect();
        tags.sort_unstable();
        f.debug_struct("ProofRuntime")
            .field("hasher", &self.hasher)
            .field("codec", &self.codec)
            .field("decoders", &tags)
            .finish()
    }
}

impl ProofRuntime {
    /// Runtime with no decoders registered
    pub fn new(hasher: Hasher, codec: Codec) -> Self {
        Self {
            hasher,
            codec,
            decoders: HashMap::new(),
        }
    }

    /// Runtime with the four built-in operators registered
    pub fn with_default_decoders(hasher: Hasher, codec: Codec) -> Self {
        let mut runtime = Self::new(hasher, codec);
        runtime.decoders.insert(PROOF_OP_SIMPLE_VALUE.into(), decode_simple_value_op);
        runtime.decoders.insert(PROOF_OP_RANGE_VALUE.into(), decode_range_value_op);
        runtime.decoders.insert(PROOF_OP_RANGE_ABSENCE.into(), decode_range_absence_op);
        runtime.decoders.insert(PROOF_OP_MULTISTORE.into(), decode_multistore_op);
        runtime
    }

    /// Register a decoder; each tag may be registered once
    pub fn register_op_decoder(
        &mut self,
        type_tag: impl Into<String>,
        decoder: OpDecoder,
    ) -> ProofResult<()> {
        let type_tag = type_tag.into();
        if self.decoders.contains_key(&type_tag) {
            return Err(ProofError::DuplicateOpType(type_tag));
        }
        self.decoders.insert(type_tag, decoder);
        Ok(())
    }

    pub fn is_registered(&self, type_tag: &str) -> bool {
        self.decoders.contains_key(type_tag)
    }

    pub fn decode(&self, op: &ProofOp) -> ProofResult<ProofOperator> {
        let decoder = self
            .decoders
            .get(&op.type_tag)
            .ok_or_else(|| ProofError::UnknownOpType(op.type_tag.clone()))?;
        decoder(op, &self.codec)
    }

    pub fn decode_proof(&self, ops: &[ProofOp]) -> ProofResult<Vec<ProofOperator>> {
        ops.iter().map(|op| self.decode(op)).collect()
    }

    /// Verify that `value` is stored at `keypath` under `root`
    pub fn verify_value(
        &self,
        ops: &[ProofOp],
        root: &[u8],
        keypath: &str,
        value: &[u8],
    ) -> ProofResult<()> {
        self.verify(ops, root, keypath, vec![value.to_vec()])
    }

    /// Verify that nothing is stored at `keypath` under `root`
    pub fn verify_absence(&self, ops: &[ProofOp], root: &[u8], keypath: &str) -> ProofResult<()> {
        self.verify(ops, root, keypath, Vec::new())
    }

    /// Run the operator chain over `args` and compare the result to `root`
    pub fn verify(
        &self,
        ops: &[ProofOp],
        root: &[u8],
        keypath: &str,
        mut args: Vec<Vec<u8>>,
    ) -> ProofResult<()> {
        let mut keys = KeyPath::parse(keypath)?.into_keys();
        for operator in self.decode_proof(ops)? {
            let key = operator.key();
            if !key.is_empty() {
                let expected = keys.pop().ok_or_else(|| {
                    ProofError::KeyPath(format!(
                        "key path exhausted before operator {}",
                        operator.type_tag()
                    ))
                })?;
                if expected != key {
                    return Err(ProofError::key_mismatch(&expected, key));
                }
            }
            args = operator.run(&self.hasher, &args)?;
        }

        match args.as_slice() {
            [computed] if computed.as_slice() == root => {}
            [computed] => return Err(ProofError::root_mismatch(root, computed)),
            _ => {
                return Err(ProofError::malformed(format!(
                    "operator chain produced {} outputs",
                    args.len()
                )))
            }
        }
        if !keys.is_empty() {
            return Err(ProofError::KeyPath(format!(
                "{} key path segment(s) left unconsumed",
                keys.len()
            )));
        }
        Ok(())
    }
}

/// How a key path segment is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyEncoding {
    /// Percent-escaped bytes
    Url,
    /// `x:` followed by uppercase hex
    Hex,
}

/// Slash-separated list of keys, outermost first, e.g. `/acc/x:0A0B`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyPath {
    keys: Vec<(Vec<u8>, KeyEncoding)>,
}

impl KeyPath {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a key segment
    pub fn append_key(mut self, key: impl Into<Vec<u8>>, encoding: KeyEncoding) -> Self {
        self.keys.push((key.into(), encoding));
        self
    }

    /// Parse `/seg/seg/...`; segments starting with `x:` are hex
    pub fn parse(path: &str) -> ProofResult<Self> {
        let rest = path
            .strip_prefix('/')
            .ok_or_else(|| ProofError::KeyPath(format!("key path must start with '/': {}", path)))?;

        let mut keys = Vec::new();
        for segment in rest.split('/') {
            if let Some(hex_part) = segment.strip_prefix("x:") {
                let key = hex::decode(hex_part)
                    .map_err(|e| ProofError::KeyPath(format!("bad hex segment '{}': {}", segment, e)))?;
                keys.push((key, KeyEncoding::Hex));
            } else {
                keys.push((percent_decode_segment(segment)?, KeyEncoding::Url));
            }
        }
        Ok(Self { keys })
    }

    /// Raw keys, outermost first
    pub fn into_keys(self) -> Vec<Vec<u8>> {
        self.keys.into_iter().map(|(key, _)| key).collect()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, encoding) in &self.keys {
            match encoding {
                KeyEncoding::Hex => write!(f, "/x:{}", hex::encode_upper(key))?,
                KeyEncoding::Url => write!(f, "/{}", percent_encode_segment(key))?,
            }
        }
        Ok(())
    }
}

/// Everything except RFC 3986 unreserved characters is escaped
const KEY_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');

fn percent_encode_segment(bytes: &[u8]) -> String {
    percent_encode(bytes, KEY_SEGMENT).to_string()
}

/// Decode a segment, rejecting `%` not followed by two hex digits
fn percent_decode_segment(segment: &str) -> ProofResult<Vec<u8>> {
    let bytes = segment.as_bytes();
    for (i, _) in bytes.iter().enumerate().filter(|(_, b)| **b == b'%') {
        let well_formed = bytes
            .get(i + 1..i + 3)
            .is_some_and(|h| h.iter().all(u8::is_ascii_hexdigit));
        if !well_formed {
            return Err(ProofError::KeyPath(format!("bad escape in '{}'", segment)));
        }
    }
    Ok(percent_decode(bytes).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::multistore::MemMultiStore;

    fn store() -> MemMultiStore {
        let mut store = MemMultiStore::new(Hasher::sha256(), 7);
        store.set("acc", vec![0x01, 0xff], "balance");
        store.set("acc", "alice", "100");
        store.set("gov", "proposal/1", "passed");
        store
    }

    fn runtime() -> ProofRuntime {
        ProofRuntime::with_default_decoders(Hasher::sha256(), Codec::default())
    }

    fn keypath(store: &str, key: &[u8]) -> String {
        KeyPath::new()
            .append_key(store, KeyEncoding::Url)
            .append_key(key, KeyEncoding::Hex)
            .to_string()
    }

    // =========================================================================
    // Key paths
    // =========================================================================

    #[test]
    fn test_keypath_display_and_parse() {
        let path = KeyPath::new()
            .append_key("my store", KeyEncoding::Url)
            .append_key(vec![0x0a, 0xbc], KeyEncoding::Hex);
        let text = path.to_string();
        assert_eq!(text, "/my%20store/x:0ABC");
        assert_eq!(KeyPath::parse(&text).unwrap(), path);
    }

    #[test]
    fn test_keypath_rejects_bad_input() {
        assert!(KeyPath::parse("acc/key").is_err());
        assert!(KeyPath::parse("/acc/x:zz").is_err());
        assert!(KeyPath::parse("/acc/%G1").is_err());
        assert!(KeyPath::parse("/acc/%4").is_err());
        assert!(KeyPath::parse("/acc/%+1").is_err());
        assert!(KeyPath::parse("/acc/%-F").is_err());
        assert!(KeyPath::parse("/acc/a%").is_err());
    }

    #[test]
    fn test_keypath_url_escapes() {
        let keys = KeyPath::parse("/acc/%01%ff~a.b").unwrap().into_keys();
        assert_eq!(keys[1], vec![0x01, 0xff, b'~', b'a', b'.', b'b']);

        let path = KeyPath::new().append_key(vec![0x00, b'/', b'z'], KeyEncoding::Url);
        assert_eq!(path.to_string(), "/%00%2Fz");
    }

    // =========================================================================
    // Operator chain
    // =========================================================================

    #[test]
    fn test_value_chain_verifies() {
        let store = store();
        let ops = store.prove_ops("acc", b"alice", &Codec::default()).unwrap();
        assert_eq!(ops[0].type_tag, PROOF_OP_RANGE_VALUE);
        assert_eq!(ops[1].type_tag, PROOF_OP_MULTISTORE);

        runtime()
            .verify_value(&ops, &store.app_hash(), &keypath("acc", b"alice"), b"100")
            .unwrap();
    }

    #[test]
    fn test_value_chain_rejects_wrong_value() {
        let store = store();
        let ops = store.prove_ops("acc", b"alice", &Codec::default()).unwrap();
        let result = runtime().verify_value(&ops, &store.app_hash(), &keypath("acc", b"alice"), b"101");
        assert!(matches!(result, Err(ProofError::ValueMismatch { .. })));
    }

    #[test]
    fn test_value_chain_rejects_wrong_root() {
        let store = store();
        let ops = store.prove_ops("acc", b"alice", &Codec::default()).unwrap();
        let mut root = store.app_hash();
        root[31] ^= 0x01;
        let result = runtime().verify_value(&ops, &root, &keypath("acc", b"alice"), b"100");
        assert!(matches!(result, Err(ProofError::RootMismatch { .. })));
    }

    #[test]
    fn test_absence_chain_verifies() {
        let store = store();
        let ops = store.prove_ops("gov", b"proposal/2", &Codec::default()).unwrap();
        assert_eq!(ops[0].type_tag, PROOF_OP_RANGE_ABSENCE);
        runtime()
            .verify_absence(&ops, &store.app_hash(), &keypath("gov", b"proposal/2"))
            .unwrap();
    }

    #[test]
    fn test_keypath_must_match_operator_keys() {
        let store = store();
        let ops = store.prove_ops("acc", b"alice", &Codec::default()).unwrap();
        let root = store.app_hash();

        let wrong_store = runtime().verify_value(&ops, &root, &keypath("gov", b"alice"), b"100");
        assert!(matches!(wrong_store, Err(ProofError::KeyMismatch { .. })));

        let extra = format!("/extra{}", keypath("acc", b"alice"));
        let unconsumed = runtime().verify_value(&ops, &root, &extra, b"100");
        assert!(matches!(unconsumed, Err(ProofError::KeyPath(_))));

        let short = runtime().verify_value(&ops, &root, "/x:616C696365", b"100");
        assert!(matches!(short, Err(ProofError::KeyPath(_))));
    }

    #[test]
    fn test_hex_key_segment() {
        let store = store();
        let key = [0x01, 0xff];
        let ops = store.prove_ops("acc", &key, &Codec::default()).unwrap();
        runtime()
            .verify_value(&ops, &store.app_hash(), "/acc/x:01FF", b"balance")
            .unwrap();
    }

    #[test]
    fn test_simple_value_operator() {
        let hasher = Hasher::sha256();
        let leaves = vec![
            kv_leaf_hash(&hasher, b"a", b"1"),
            kv_leaf_hash(&hasher, b"b", b"2"),
            kv_leaf_hash(&hasher, b"c", b"3"),
        ];
        let (root, proofs) = msproof_primitives::simple_proofs_from_hashes(&hasher, &leaves);
        let op = ProofOperator::SimpleValue {
            key: b"b".to_vec(),
            proof: proofs[1].clone(),
        }
        .to_proof_op(&Codec::default())
        .unwrap();

        runtime()
            .verify_value(&[op.clone()], &root.unwrap(), "/b", b"2")
            .unwrap();
        let wrong = runtime().verify_value(&[op], &leaves[0], "/b", b"2");
        assert!(matches!(wrong, Err(ProofError::RootMismatch { .. })));
    }

    // =========================================================================
    // Registry
    // =========================================================================

    #[test]
    fn test_unknown_operator_rejected() {
        let op = ProofOp {
            type_tag: "ics23:iavl".into(),
            key: b"k".to_vec(),
            data: vec![],
        };
        let err = runtime().decode(&op).unwrap_err();
        assert!(matches!(err, ProofError::UnknownOpType(_)));
        assert!(err.is_decoding());
    }

    #[test]
    fn test_register_twice_rejected() {
        let mut runtime = ProofRuntime::new(Hasher::sha256(), Codec::default());
        assert!(!runtime.is_registered(PROOF_OP_MULTISTORE));
        runtime.register_op_decoder(PROOF_OP_MULTISTORE, decode_multistore_op).unwrap();
        assert!(runtime.is_registered(PROOF_OP_MULTISTORE));
        assert!(matches!(
            runtime.register_op_decoder(PROOF_OP_MULTISTORE, decode_multistore_op),
            Err(ProofError::DuplicateOpType(_))
        ));
    }

    #[test]
    fn test_decoder_checks_tag() {
        let mut op = store().prove_ops("acc", b"alice", &Codec::default()).unwrap().remove(1);
        op.type_tag = PROOF_OP_RANGE_VALUE.into();
        assert!(matches!(
            decode_multistore_op(&op, &Codec::default()),
            Err(ProofError::UnexpectedOpType { .. })
        ));
        // Registered under the value tag, the multistore body fails to parse
        assert!(runtime().decode(&op).is_err());
    }

    #[test]
    fn test_corrupt_operator_data() {
        let mut ops = store().prove_ops("acc", b"alice", &Codec::default()).unwrap();
        ops[1].data.truncate(3);
        let err = runtime()
            .verify_value(&ops, &store().app_hash(), &keypath("acc", b"alice"), b"100")
            .unwrap_err();
        assert!(matches!(err, ProofError::Codec(_)));
    }

    #[test]
    fn test_proof_op_json() {
        let op = ProofOp {
            type_tag: PROOF_OP_MULTISTORE.into(),
            key: b"acc".to_vec(),
            data: vec![0x01],
        };
        let json = serde_json::to_string(&op).unwrap();
        assert_eq!(json, r#"{"type":"multistore","key":"616363","data":"01"}"#);
    }
}
