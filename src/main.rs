//! Etschash command-line tool
//!
//! Operator frontend for the ETSC proof-of-work engine: inspect per-epoch
//! parameters, hash a header/nonce pair with a light client, and generate
//! the memory-mapped DAG file a full node or miner would use.

use clap::{Parser, Subcommand};
use log::{error, info};
use std::path::PathBuf;
use std::process;

use etschash_consensus::{
    check_difficulty, default_dag_dir, epoch, get_cache_size, get_data_size, get_seedhash, Full,
    Light, H256,
};

/// Command line arguments for the etschash tool
#[derive(Parser)]
#[clap(name = "etschash")]
#[clap(about = "ETSC proof-of-work utility: seedhashes, epoch sizes, hashing and DAG generation")]
struct Cli {
    /// Verbosity level (0-5)
    #[clap(short, long, default_value = "2")]
    verbosity: u8,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the seedhash for a block number
    Seedhash {
        #[clap(value_name = "BLOCK")]
        block: u64,
    },
    /// Print epoch, cache size and dataset size for a block number
    Sizes {
        #[clap(value_name = "BLOCK")]
        block: u64,
    },
    /// Hash a header/nonce pair with a light client
    Hash {
        /// Block number selecting the epoch
        #[clap(long)]
        block: u64,
        /// 32-byte header hash, hex encoded
        #[clap(long)]
        header: String,
        /// Nonce to mix in
        #[clap(long)]
        nonce: u64,
        /// Optional 32-byte boundary to check the result against
        #[clap(long)]
        boundary: Option<String>,
    },
    /// Generate (or reopen) the DAG file for a block number
    Dag {
        /// Block number selecting the epoch
        #[clap(long)]
        block: u64,
        /// Directory for DAG files
        #[clap(long, value_name = "DIR")]
        dir: Option<PathBuf>,
    },
}

/// Initialize logging based on verbosity level
fn init_logging(verbosity: u8) {
    let log_level = match verbosity {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp_millis()
        .init();
}

/// Parse a 32-byte hex digest, with or without an 0x prefix
fn parse_h256(s: &str) -> Result<H256, String> {
    let bytes = hex::decode(s.trim_start_matches("0x"))
        .map_err(|e| format!("invalid hex: {}", e))?;
    if bytes.len() != 32 {
        return Err(format!("expected 32 bytes, got {}", bytes.len()));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbosity);

    match cli.command {
        Commands::Seedhash { block } => {
            println!("0x{}", hex::encode(get_seedhash(block)));
        }
        Commands::Sizes { block } => {
            let cache = get_cache_size(block).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            });
            let dataset = get_data_size(block).unwrap_or_else(|e| {
                error!("{}", e);
                process::exit(1);
            });
            println!(
                "{}",
                serde_json::json!({
                    "block": block,
                    "epoch": epoch(block),
                    "seedhash": format!("0x{}", hex::encode(get_seedhash(block))),
                    "cacheSize": cache,
                    "datasetSize": dataset,
                })
            );
        }
        Commands::Hash {
            block,
            header,
            nonce,
            boundary,
        } => {
            let header = parse_h256(&header).unwrap_or_else(|e| {
                error!("bad --header: {}", e);
                process::exit(1);
            });
            let boundary = boundary.map(|b| {
                parse_h256(&b).unwrap_or_else(|e| {
                    error!("bad --boundary: {}", e);
                    process::exit(1);
                })
            });

            let light = Light::new(block).unwrap_or_else(|e| {
                error!("failed to build light client: {}", e);
                process::exit(1);
            });
            let out = light.compute(&header, nonce).unwrap_or_else(|e| {
                error!("hash failed: {}", e);
                process::exit(1);
            });

            let mut report = serde_json::json!({
                "result": format!("0x{}", hex::encode(out.result)),
                "mixHash": format!("0x{}", hex::encode(out.mix_hash)),
            });
            if let Some(boundary) = boundary {
                report["withinBoundary"] =
                    serde_json::json!(check_difficulty(&out.result, &boundary));
            }
            println!("{}", report);
        }
        Commands::Dag { block, dir } => {
            let dir = dir.unwrap_or_else(default_dag_dir);
            let light = Light::new(block).unwrap_or_else(|e| {
                error!("failed to build light client: {}", e);
                process::exit(1);
            });

            let mut last_reported = u32::MAX;
            let mut progress = |pct: u32| {
                if pct % 10 == 0 && pct != last_reported {
                    info!("DAG generation: {}%", pct);
                    last_reported = pct;
                }
                true
            };
            let full = Full::new(&light, &dir, Some(&mut progress)).unwrap_or_else(|e| {
                error!("DAG generation failed: {}", e);
                process::exit(1);
            });
            info!(
                "DAG for epoch {} ready under {} ({} bytes)",
                epoch(block),
                dir.display(),
                full.dag_size()
            );
        }
    }
}
