use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "storefront")]
#[command(author, version, about = "Product catalog backend with multi-size image processing")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP API server
    Start {
        /// Host to bind to (overrides server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (overrides server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Run the image pipeline on a local file and print the stored locations
    ProcessImage {
        /// Image file (jpg, jpeg, png, gif or webp)
        #[arg(required = true)]
        file: PathBuf,
    },

    /// Write every product to a JSON backup file
    Export {
        /// Destination file
        #[arg(required = true)]
        output: PathBuf,
    },

    /// Load products from a JSON backup file
    Import {
        /// Backup file to read
        #[arg(required = true)]
        input: PathBuf,
    },

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Generate a random admin token for the product write endpoints
    GenerateToken,

    /// Display version information
    Version,
}
