//! GridFS CLI
//!
//! Command-line tools for inspecting and exercising grid files.
//!
//! # Commands
//!
//! - `layout` - Show how a file of a given length splits into chunks
//! - `roundtrip` - Stream a local file through an in-memory grid and verify it

mod commands;

use clap::{Parser, Subcommand};
use gridfs_core::DEFAULT_CHUNK_SIZE;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// GridFS command-line tools.
#[derive(Parser)]
#[command(name = "gridfs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show how a file of a given length splits into chunks
    Layout {
        /// File length in bytes
        #[arg(short, long)]
        length: u64,

        /// Chunk size in bytes
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Path used to derive chunk keys
        #[arg(short, long, default_value = "/file")]
        path: String,

        /// Also show the chunks a read of `--read-len` bytes from here touches
        #[arg(long)]
        read_offset: Option<u64>,

        /// Length of the read given by `--read-offset`
        #[arg(long, default_value_t = 0)]
        read_len: u64,
    },

    /// Stream a local file through an in-memory grid and verify it
    Roundtrip {
        /// Local file to stream
        input: PathBuf,

        /// Chunk size in bytes
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Bytes handed to each write call
        #[arg(short, long, default_value_t = 4096)]
        write_size: usize,

        /// Write the bytes read back from the grid to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Layout {
            length,
            chunk_size,
            path,
            read_offset,
            read_len,
        } => {
            let read = read_offset.map(|offset| (offset, read_len));
            commands::layout::run(&path, length, chunk_size, read)?;
        }
        Commands::Roundtrip {
            input,
            chunk_size,
            write_size,
            output,
        } => {
            commands::roundtrip::run(&input, chunk_size, write_size, output.as_deref())?;
        }
        Commands::Version => {
            println!("GridFS CLI v{}", env!("CARGO_PKG_VERSION"));
            println!("GridFS Core v{}", gridfs_core::VERSION);
        }
    }

    Ok(())
}
