//! msproof CLI - Command-line tool for multi-store proof verification
//!
//! This tool provides commands for:
//! - Computing the multi-store root of a set of substore commitments
//! - Verifying proof bundles offline against a trusted app hash
//! - Querying a node and verifying the response
//! - Generating fixture bundles from an in-memory multi-store
//! - Inspecting proof payloads

use anyhow::{Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Registry};

use msproof_client::{
    app_hash_height, AbciQueryResponse, ClientConfig, ProofBundle, QueryClient, StaticAppHashes,
};
use msproof_primitives::{
    compute_multistore_root, hex_serde::decode_hex, Codec, HashAlgorithm, Hasher, SubstoreCommit,
};
use msproof_store::{MemMultiStore, MultiStoreProof, SubstoreProof};
use msproof_verifier::MultiStoreVerifier;

/// Hash algorithm for CLI
#[derive(Debug, Clone, Copy, ValueEnum)]
enum HashArg {
    /// SHA-256, 32-byte digests
    Sha256,
    /// SHA-256 truncated to 20 bytes
    Tmhash,
}

impl HashArg {
    fn algorithm(self) -> HashAlgorithm {
        match self {
            HashArg::Sha256 => HashAlgorithm::Sha256,
            HashArg::Tmhash => HashAlgorithm::Tmhash,
        }
    }

    fn hasher(self) -> Hasher {
        Hasher::new(self.algorithm())
    }
}

/// msproof - Multi-store proof verification
#[derive(Parser)]
#[command(name = "msproof")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Verify multi-store Merkle proofs against a trusted app hash", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the multi-store root of a JSON list of substore commits
    Root {
        /// Path to the commits JSON file
        #[arg(short, long)]
        commits: PathBuf,

        /// Hash algorithm
        #[arg(long, value_enum, default_value = "sha256")]
        hash: HashArg,
    },

    /// Verify a proof bundle
    Verify {
        /// Path to the proof bundle JSON file
        #[arg(short, long)]
        bundle: PathBuf,

        /// Require the substore version to equal this height
        #[arg(long)]
        expected_version: Option<i64>,
    },

    /// Query a node and verify the response
    Query {
        /// Node RPC URL(s), comma separated
        #[arg(short, long, default_value = "http://localhost:26657")]
        node: String,

        /// Substore name
        #[arg(short, long)]
        store: String,

        /// Key as hex (0x prefix optional)
        #[arg(short, long)]
        key: String,

        /// Height to query at (0 for latest)
        #[arg(long, default_value = "0")]
        height: i64,

        /// Trusted app hash (hex) committing to the response height
        #[arg(long)]
        app_hash: Option<String>,

        /// Skip verification
        #[arg(long)]
        trust_node: bool,

        /// Hash algorithm
        #[arg(long, value_enum, default_value = "sha256")]
        hash: HashArg,

        /// Write the response as a proof bundle
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Generate a proof bundle from a sample multi-store
    #[command(name = "gen-fixture")]
    GenerateFixture {
        /// Substore to prove from
        #[arg(short, long, default_value = "acc")]
        store: String,

        /// Key to prove (UTF-8); a missing key yields an absence proof
        #[arg(short, long, default_value = "alice")]
        key: String,

        /// Block version of the sample multi-store
        #[arg(long, default_value = "963")]
        version: i64,

        /// Hash algorithm
        #[arg(long, value_enum, default_value = "sha256")]
        hash: HashArg,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Inspect a proof bundle or a base64 proof payload
    Inspect {
        /// Path to the bundle JSON or base64 payload file
        #[arg(short = 'f', long)]
        proof: PathBuf,

        /// Hash algorithm for raw payloads
        #[arg(long, value_enum, default_value = "sha256")]
        hash: HashArg,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = Registry::default()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr));
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("tracing subscriber already installed");
    }
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Root { commits, hash } => root(commits, hash),

        Commands::Verify {
            bundle,
            expected_version,
        } => verify(bundle, expected_version),

        Commands::Query {
            node,
            store,
            key,
            height,
            app_hash,
            trust_node,
            hash,
            output,
        } => query(node, store, key, height, app_hash, trust_node, hash, output),

        Commands::GenerateFixture {
            store,
            key,
            version,
            hash,
            output,
        } => generate_fixture(store, key, version, hash, output),

        Commands::Inspect { proof, hash } => inspect(proof, hash),
    }
}

fn root(commits_path: PathBuf, hash: HashArg) -> Result<()> {
    let contents = fs::read_to_string(&commits_path)
        .with_context(|| format!("Failed to read commits file: {}", commits_path.display()))?;
    let commits: Vec<SubstoreCommit> =
        serde_json::from_str(&contents).with_context(|| "Failed to parse commits JSON")?;

    eprintln!("Computing multi-store root...");
    eprintln!("  Substores: {}", commits.len());
    eprintln!("  Hash: {}", hash.algorithm());

    let root = compute_multistore_root(&hash.hasher(), &commits);
    println!("{}", hex::encode(root));
    Ok(())
}

fn verify(bundle_path: PathBuf, expected_version: Option<i64>) -> Result<()> {
    let contents = fs::read_to_string(&bundle_path)
        .with_context(|| format!("Failed to read bundle file: {}", bundle_path.display()))?;
    let bundle =
        ProofBundle::from_json(&contents).with_context(|| "Failed to parse proof bundle JSON")?;
    debug!(path = %bundle_path.display(), algorithm = %bundle.hash_algorithm, "loaded proof bundle");

    eprintln!("Verifying proof...");
    eprintln!("  Store: {}", bundle.store_name);
    eprintln!("  Key: {}", hex::encode(&bundle.key));
    eprintln!("  Height: {}", bundle.height);
    eprintln!("  App hash: {}", hex::encode(&bundle.app_hash));

    let mut verifier = MultiStoreVerifier::new(Hasher::new(bundle.hash_algorithm));
    if let Some(version) = expected_version {
        verifier = verifier.with_expected_version(version);
    }

    let start = Instant::now();
    let result = bundle.verify_with(&verifier);
    let elapsed = start.elapsed();

    match result {
        Ok(verified) => {
            if verified.is_absence() {
                eprintln!("Absence proof VALID (verified in {:?})", elapsed);
            } else {
                eprintln!("Proof VALID (verified in {:?})", elapsed);
            }
            println!("VALID");
            Ok(())
        }
        Err(e) => {
            eprintln!("Proof INVALID: {}", e);
            println!("INVALID: {}", e);
            std::process::exit(1);
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn query(
    node: String,
    store: String,
    key_hex: String,
    height: i64,
    app_hash_hex: Option<String>,
    trust_node: bool,
    hash: HashArg,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let key = decode_hex(&key_hex).with_context(|| "Key must be hex")?;
    let app_hash = app_hash_hex
        .as_deref()
        .map(decode_hex)
        .transpose()
        .with_context(|| "App hash must be hex")?;
    if !trust_node && app_hash.is_none() {
        anyhow::bail!("--app-hash is required unless --trust-node is set");
    }

    let config = ClientConfig {
        node_uri: node,
        height,
        trust_node,
        hash_algorithm: hash.algorithm(),
        ..ClientConfig::default()
    };

    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    runtime.block_on(async move {
        let trusted = Arc::new(StaticAppHashes::new());
        let client = QueryClient::try_new(config)?.with_app_hash_source(trusted.clone());
        let path = msproof_client::path::store_query_path(&store, "key");

        eprintln!("Querying {}...", path);
        let response: AbciQueryResponse = client.abci_query(&path, &key).await?;
        eprintln!("  Height: {}", response.height);
        eprintln!("  Proof size: {} bytes", response.proof.len());

        // The supplied app hash is taken as header H+1 for the response height H
        if let Some(app_hash) = &app_hash {
            trusted.insert(app_hash_height(response.height)?, app_hash.clone());
        }
        let value = client
            .verify_response(&path, &key, response.clone())
            .await
            .with_context(|| "Query response failed verification")?;

        if let (Some(output_path), Some(app_hash)) = (output_path, app_hash) {
            let bundle =
                ProofBundle::from_response(&store, &response, app_hash, hash.algorithm());
            fs::write(&output_path, bundle.to_json_pretty()?)
                .with_context(|| format!("Failed to write bundle: {}", output_path.display()))?;
            eprintln!("Bundle written to {}", output_path.display());
        }

        if trust_node {
            eprintln!("Value returned UNVERIFIED (trusted node)");
        }
        println!("{}", hex::encode(value));
        Ok::<(), anyhow::Error>(())
    })
}

/// Sample multi-store with populated and empty substores
fn sample_multistore(hasher: Hasher, version: i64) -> MemMultiStore {
    let mut store = MemMultiStore::new(hasher, version);
    store.set("acc", "alice", "100");
    store.set("acc", "bob", "250");
    store.set("acc", "carol", "0");
    store.set("stake", "validator/1", "bonded");
    store.set("slashing", "validator/1/missed", "0");
    store.set("gov", "proposal/1", "passed");
    store.mount("ibc");
    store.mount("main");
    store
}

fn generate_fixture(
    store_name: String,
    key: String,
    version: i64,
    hash: HashArg,
    output_path: Option<PathBuf>,
) -> Result<()> {
    let hasher = hash.hasher();
    let store = sample_multistore(hasher, version);
    let substore = store
        .substore(&store_name)
        .with_context(|| format!("Unknown sample substore '{}'", store_name))?;
    let value = substore.get(key.as_bytes()).map(<[u8]>::to_vec).unwrap_or_default();

    let proof = store.prove(&store_name, key.as_bytes())?;
    let response = AbciQueryResponse {
        key: key.as_bytes().to_vec(),
        value,
        proof: proof.encode(&Codec::default())?,
        height: version,
        ..AbciQueryResponse::default()
    };
    let bundle =
        ProofBundle::from_response(&store_name, &response, store.app_hash(), hash.algorithm());
    let json = bundle.to_json_pretty()?;

    eprintln!("Generated fixture:");
    eprintln!("  Store: {}", store_name);
    eprintln!("  Key: {}", key);
    eprintln!("  Proof: {}", proof.range_proof.as_ref().map_or("none", SubstoreProof::kind));
    eprintln!("  App hash: {}", hex::encode(&bundle.app_hash));

    if let Some(path) = output_path {
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write fixture: {}", path.display()))?;
        eprintln!("Fixture written to {}", path.display());
    } else {
        println!("{}", json);
    }
    Ok(())
}

fn inspect(proof_path: PathBuf, hash: HashArg) -> Result<()> {
    let contents = fs::read_to_string(&proof_path)
        .with_context(|| format!("Failed to read proof file: {}", proof_path.display()))?;

    let (payload, hasher) = if contents.trim().starts_with('{') {
        let bundle = ProofBundle::from_json(&contents)
            .with_context(|| "Failed to parse proof bundle JSON")?;
        println!("Proof Inspection:");
        println!("  Format: proof bundle");
        println!("  Store: {}", bundle.store_name);
        println!("  Key: {}", hex::encode(&bundle.key));
        println!("  Value: {}", hex::encode(&bundle.value));
        println!("  Height: {}", bundle.height);
        println!("  App Hash: {}", hex::encode(&bundle.app_hash));
        (bundle.proof_bytes()?, Hasher::new(bundle.hash_algorithm))
    } else {
        println!("Proof Inspection:");
        println!("  Format: raw base64 payload");
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(contents.trim())
            .with_context(|| "Failed to decode base64 payload")?;
        (bytes, hash.hasher())
    };

    println!("  Payload Size: {} bytes", payload.len());
    let proof = MultiStoreProof::decode(&Codec::default(), &payload)
        .with_context(|| "Failed to decode proof payload")?;

    println!("  Target Store: {}", proof.store_name());
    println!("  Commit Version: {}", proof.commit_info.version);
    println!("  Substores:");
    for commit in &proof.commit_info.commits {
        let commit_hash = commit
            .commit_hash
            .as_ref()
            .map_or_else(|| "(empty)".to_string(), hex::encode);
        println!("    {} @ {}: {}", commit.name, commit.version, commit_hash);
    }
    for duplicate in proof.commit_info.duplicate_names() {
        println!("  WARNING: duplicate substore '{}'", duplicate);
    }
    println!("  Computed Root: {}", hex::encode(proof.compute_root_hash(&hasher)));

    match &proof.range_proof {
        Some(range_proof) => {
            println!("  Range Proof: {}", range_proof.kind());
            match range_proof.compute_root(&hasher) {
                Ok(root) => println!("  Substore Root: {}", hex::encode(root)),
                Err(e) => println!("  Substore Root: invalid ({})", e),
            }
        }
        None => println!("  Range Proof: none"),
    }

    Ok(())
}
