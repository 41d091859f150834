//! HuffKV CLI
//!
//! Command-line interface over a single table file. Each invocation opens
//! the table, runs one command, and closes it (dumping any change).

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use huffkv::{KvError, Options, Table};
use tracing_subscriber::{fmt, EnvFilter};

/// HuffKV CLI
#[derive(Parser, Debug)]
#[command(name = "huffkv-cli")]
#[command(about = "CLI for the HuffKV single-file key-value store")]
#[command(version)]
struct Args {
    /// Data file path
    #[arg(short, long, default_value = "./huffkv.tbl")]
    file: String,

    /// Create the data file if it does not exist
    #[arg(short, long)]
    create: bool,

    /// Per-entry size cap in bytes
    #[arg(long, default_value_t = 4096)]
    max_entry_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Set a key-value pair
    Put {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List every entry in key order
    Scan,

    /// Print the codebook of the last dump
    Codebook,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,huffkv=info"));

    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(KvError::NotFound) => {
            eprintln!("(not found)");
            ExitCode::from(1)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(2)
        }
    }
}

fn run(args: Args) -> huffkv::Result<()> {
    // Read-only commands skip the dump on close
    let mutating = matches!(args.command, Commands::Put { .. } | Commands::Del { .. });

    let options = Options::builder()
        .create_if_missing(args.create)
        .dump_when_close(mutating)
        .max_file_size(args.max_entry_size)
        .build();

    let table = Table::new(options, &args.file);
    table.open()?;

    let result = execute(&table, args.command);
    // Always close so a mutation is persisted even if printing failed
    table.close()?;
    result
}

fn execute(table: &Table, command: Commands) -> huffkv::Result<()> {
    match command {
        Commands::Get { key } => {
            let value = table.get(key.as_bytes())?;
            println!("{}", String::from_utf8_lossy(&value));
        }
        Commands::Put { key, value } => {
            table.put(key.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { key } => {
            table.del(key.as_bytes())?;
            println!("OK");
        }
        Commands::Scan => {
            for (key, value) in table.entries()? {
                println!(
                    "{}\t{}",
                    String::from_utf8_lossy(&key),
                    String::from_utf8_lossy(&value)
                );
            }
        }
        Commands::Codebook => {
            let codebook = table.codebook()?;
            for byte in 0..=u8::MAX {
                if let Some(code) = codebook.code(byte) {
                    println!(
                        "0x{:02x}\t{:>2} bits\t{:0width$b}",
                        byte,
                        code.len(),
                        code.bits(),
                        width = code.len() as usize
                    );
                }
            }
        }
    }
    Ok(())
}
