//! mailvault CLI - Command line interface for the mail blob store
//!
//! Stores raw messages, reads them back by digest and inspects a store.
//! Output is JSON so the binary can be driven from other tooling.

use clap::{Parser, Subcommand};
use mailvault::{BlobKey, Digest, MailRecord, StoreConfig};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mailvault")]
#[command(about = "A content-addressed, collision-safe store for raw electronic mail")]
#[command(version)]
struct Cli {
    /// Path to the config file (default: ~/.config/mailvault/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base data directory, overrides the config file
    #[arg(short, long)]
    data_path: Option<PathBuf>,

    /// Namespace (tenant) inside the data directory, overrides the config file
    #[arg(short, long)]
    namespace: Option<String>,

    /// Output format (json or text)
    #[arg(short, long, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the effective configuration to the config file
    Init,

    /// Print the digest of a file without storing it
    Digest {
        /// File to hash ("-" for stdin)
        file: PathBuf,
    },

    /// Store a raw message
    Put {
        /// File to store ("-" for stdin)
        file: PathBuf,
    },

    /// Read a stored message
    Get {
        /// The digest (32 hex characters)
        digest: String,
        /// Collision index
        #[arg(short, long, default_value = "0")]
        collision: u32,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show where a blob lives on disk
    Locate {
        /// The digest (32 hex characters)
        digest: String,
        /// Collision index
        #[arg(short, long, default_value = "0")]
        collision: u32,
    },

    /// Parse a message, store it and print the resulting record
    Ingest {
        /// File to ingest ("-" for stdin)
        file: PathBuf,
        /// Mailbox the record belongs to
        #[arg(short, long, default_value = "INBOX")]
        mailbox: String,
    },

    /// Re-hash every stored blob
    Verify,

    /// Show store statistics
    Stats,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    match cli.command {
        Commands::Init => {
            let path = config_path(cli.config.as_deref())?;
            config.save(&path)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "config": path.display().to_string(),
                    "blob_root": config.blob_root().display().to_string()
                }),
            )?;
        }

        Commands::Digest { file } => {
            let store = config.open_store()?;
            let payload = read_input(&file)?;
            let digest = store.digest(&payload);
            output(
                &cli.format,
                &serde_json::json!({
                    "digest": digest.to_hex(),
                    "algorithm": store.hasher_name(),
                    "size": payload.len()
                }),
            )?;
        }

        Commands::Put { file } => {
            let store = config.open_store()?;
            let payload = read_input(&file)?;
            let outcome = store.put(&payload)?;
            output(
                &cli.format,
                &serde_json::json!({
                    "status": "ok",
                    "digest": outcome.key.digest.to_hex(),
                    "collision": outcome.key.collision,
                    "written": outcome.written,
                    "path": store.path_for(&outcome.key).display().to_string()
                }),
            )?;
        }

        Commands::Get {
            digest,
            collision,
            output: target,
        } => {
            let store = config.open_store()?;
            let digest: Digest = digest.parse()?;
            match store.get(&digest, collision) {
                Some(bytes) => match target {
                    Some(path) => {
                        std::fs::write(&path, &bytes)?;
                        output(
                            &cli.format,
                            &serde_json::json!({
                                "status": "ok",
                                "output": path.display().to_string(),
                                "size": bytes.len()
                            }),
                        )?;
                    }
                    None => {
                        let mut stdout = std::io::stdout().lock();
                        stdout.write_all(&bytes)?;
                        stdout.flush()?;
                    }
                },
                None => {
                    output(
                        &cli.format,
                        &serde_json::json!({
                            "status": "error",
                            "message": format!("Blob not found: {}", BlobKey::new(digest, collision))
                        }),
                    )?;
                    std::process::exit(1);
                }
            }
        }

        Commands::Locate { digest, collision } => {
            let store = config.open_store()?;
            let key = BlobKey::new(digest.parse()?, collision);
            output(
                &cli.format,
                &serde_json::json!({
                    "key": key.to_string(),
                    "path": store.path_for(&key).display().to_string(),
                    "exists": store.contains(&key)
                }),
            )?;
        }

        Commands::Ingest { file, mailbox } => {
            let store = config.open_store()?;
            let raw = read_input(&file)?;
            let record = MailRecord::from_message(&store, mailbox, &raw)?;
            output(&cli.format, &serde_json::to_value(&record)?)?;
        }

        Commands::Verify => {
            let store = config.open_store()?;
            let keys = store.keys()?;
            let failures: Vec<_> = keys
                .iter()
                .filter_map(|key| store.verify(key).err().map(|e| (key, e)))
                .map(|(key, e)| {
                    serde_json::json!({
                        "key": key.to_string(),
                        "error": e.to_string()
                    })
                })
                .collect();
            let ok = failures.is_empty();
            output(
                &cli.format,
                &serde_json::json!({
                    "status": if ok { "ok" } else { "error" },
                    "checked": keys.len(),
                    "failures": failures
                }),
            )?;
            if !ok {
                std::process::exit(1);
            }
        }

        Commands::Stats => {
            let store = config.open_store()?;
            let stats = store.stats()?;
            output(
                &cli.format,
                &serde_json::json!({
                    "root": store.root().display().to_string(),
                    "blobs": stats.blobs,
                    "collisions": stats.collisions,
                    "bytes": stats.bytes,
                    "staging": stats.staging
                }),
            )?;
        }
    }

    Ok(())
}

fn config_path(explicit: Option<&Path>) -> anyhow::Result<PathBuf> {
    match explicit {
        Some(path) => Ok(path.to_path_buf()),
        None => Ok(StoreConfig::default_path()?),
    }
}

/// Config file (or defaults) with command line overrides applied
fn resolve_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::load_or_default(path)?,
        None => match StoreConfig::default_path() {
            Ok(path) => StoreConfig::load_or_default(path)?,
            Err(_) => StoreConfig::default(),
        },
    };
    if let Some(data_path) = &cli.data_path {
        config.data_path = data_path.clone();
    }
    if let Some(namespace) = &cli.namespace {
        config.namespace = namespace.clone();
    }
    config.validate()?;
    Ok(config)
}

fn read_input(path: &Path) -> anyhow::Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin().lock().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        Ok(std::fs::read(path)?)
    }
}

fn output(format: &OutputFormat, value: &serde_json::Value) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string(value)?),
        OutputFormat::Text => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}
