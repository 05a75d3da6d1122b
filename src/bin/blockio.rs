//! blockio CLI
//!
//! Inspect and restructure a block file from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use blockio::config::{DEFAULT_BLOCK_SIZE, DEFAULT_BUFFER_CAPACITY, DEFAULT_WINDOW_SIZE};
use blockio::{BlockListener, ByteStore, StoreConfig};

/// blockio CLI
#[derive(Parser, Debug)]
#[command(name = "blockio")]
#[command(about = "Inspect and edit fixed-block files")]
#[command(version)]
struct Args {
    /// Block file (created if absent)
    path: PathBuf,

    /// Block size in bytes
    #[arg(short, long, default_value_t = DEFAULT_BLOCK_SIZE)]
    block_size: usize,

    /// Read-ahead window in bytes
    #[arg(short, long, default_value_t = DEFAULT_WINDOW_SIZE)]
    window: usize,

    /// Write-coalescing buffer in bytes
    #[arg(long, default_value_t = DEFAULT_BUFFER_CAPACITY)]
    buffer: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print length, block size and block count
    Info,

    /// Print a CRC32 for every block
    Dump,

    /// Hex-dump one block
    Read {
        /// Block index
        block: u64,
    },

    /// Write text into a block
    Write {
        /// Block index
        block: u64,

        /// Text to write
        text: String,

        /// Byte offset within the block
        #[arg(short, long, default_value = "0")]
        offset: usize,
    },

    /// Insert zeroed blocks before an index
    Insert {
        /// Index the new blocks start at
        index: u64,

        /// Number of blocks
        #[arg(default_value = "1")]
        count: u64,
    },

    /// Delete blocks starting at an index
    Delete {
        /// First block to delete
        index: u64,

        /// Number of blocks
        #[arg(default_value = "1")]
        count: u64,
    },
}

/// Reports structural changes to the log
struct LoggingListener;

impl BlockListener for LoggingListener {
    fn blocks_inserted(&self, index: u64, count: u64) -> blockio::Result<()> {
        tracing::info!(index, count, "blocks inserted");
        Ok(())
    }

    fn blocks_deleted(&self, index: u64, count: u64) -> blockio::Result<()> {
        tracing::info!(index, count, "blocks deleted");
        Ok(())
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,blockio=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> blockio::Result<()> {
    let config = StoreConfig::builder()
        .block_size(args.block_size)
        .window_size(args.window)
        .buffer_capacity(args.buffer)
        .build();

    let mut store = blockio::stack::open_file(&args.path, &config)?;
    store.add_listener(Arc::new(LoggingListener));

    match args.command {
        Commands::Info => {
            println!("path:        {}", args.path.display());
            println!("length:      {}", store.len()?);
            println!("block size:  {}", store.block_size());
            println!("block count: {}", store.block_count()?);
        }
        Commands::Dump => {
            let mut block = vec![0u8; store.block_size()];
            for index in 0..store.block_count()? {
                store.read_block(index, 0, &mut block)?;
                println!("{:>8}  {:08x}", index, crc32fast::hash(&block));
            }
        }
        Commands::Read { block } => {
            let mut buf = vec![0u8; store.block_size()];
            store.read_block(block, 0, &mut buf)?;
            print_hex(&buf);
        }
        Commands::Write { block, text, offset } => {
            store.write_block(block, offset, text.as_bytes())?;
        }
        Commands::Insert { index, count } => {
            store.insert_blocks(index, count)?;
            zero_blocks(&mut store, index, count)?;
        }
        Commands::Delete { index, count } => {
            store.delete_blocks(index, count)?;
        }
    }

    store.close()
}

/// Inserted blocks hold stale bytes; the CLI hands out zeroed ones
fn zero_blocks<S: ByteStore>(
    store: &mut blockio::BlockStore<S>,
    index: u64,
    count: u64,
) -> blockio::Result<()> {
    let zeros = vec![0u8; store.block_size()];
    for block in index..index + count {
        store.write_block(block, 0, &zeros)?;
    }
    Ok(())
}

fn print_hex(bytes: &[u8]) {
    for (row, line) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = line.iter().map(|b| format!("{:02x}", b)).collect();
        let text: String = line
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        println!("{:08x}  {:<47}  {}", row * 16, hex.join(" "), text);
    }
}
