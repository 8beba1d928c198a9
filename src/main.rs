//! ocache - command line access to a file-backed object cache
//!
//! Reads configuration from the environment (see `CacheConfig::from_env`),
//! applies command line overrides and runs one cache operation over
//! JSON values.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ocache::{CacheConfig, ObjectCache};

#[derive(Debug, Parser)]
#[command(name = "ocache", version, about = "Inspect and edit a file-backed object cache")]
struct Cli {
    /// Cache root directory
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Namespace inside the cache root
    #[arg(long, global = true)]
    namespace: Option<String>,

    /// Key hashing algorithm
    #[arg(long = "hash-algo", global = true)]
    hash_algo: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the value stored under a key
    Get { key: String },
    /// Store a JSON value under a key
    Set {
        key: String,
        /// JSON document; `null` stores an absence
        value: String,
        /// Accepted and ignored
        #[arg(long)]
        ttl: Option<u64>,
    },
    /// Report whether a key is cached
    Has { key: String },
    /// Delete one or more keys
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Delete every entry of the namespace
    Clear,
    /// Load every entry and print statistics
    Preload,
    /// Print the entry file path of a key
    Path { key: String },
}

fn main() -> ExitCode {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ocache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let mut config = CacheConfig::from_env();
    if let Some(dir) = cli.dir {
        config.cache_dir = dir;
    }
    if let Some(namespace) = cli.namespace {
        config.namespace = namespace;
    }
    if let Some(hash_algo) = cli.hash_algo {
        config.hash_algo = hash_algo;
    }
    info!(
        "Using namespace \"{}\" under {} ({})",
        config.namespace,
        config.cache_dir.display(),
        config.hash_algo
    );

    let cache: ObjectCache<Value> =
        ObjectCache::open(config).context("unable to open cache namespace")?;

    match cli.command {
        Command::Get { key } => match cache.get(&key) {
            Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
            None => println!("null"),
        },
        Command::Set { key, value, ttl } => {
            let value: Value = serde_json::from_str(&value).context("value is not valid JSON")?;
            let value = (!value.is_null()).then_some(value);
            if !cache.set(&key, value, ttl)? {
                bail!("unable to persist key {key:?}");
            }
        }
        Command::Has { key } => {
            // Load first so entries written by earlier runs are seen
            let _ = cache.get(&key);
            let present = cache.has(&key);
            println!("{present}");
            if !present {
                return Ok(ExitCode::from(1));
            }
        }
        Command::Delete { keys } => {
            cache.delete_multiple(&keys);
        }
        Command::Clear => {
            cache.preload();
            cache.clear();
        }
        Command::Preload => {
            cache.preload();
            println!("{}", serde_json::to_string_pretty(&cache.stats())?);
        }
        Command::Path { key } => println!("{}", cache.path(&key).display()),
    }
    Ok(ExitCode::SUCCESS)
}
