//! CLI definition for the slicegraph command-line interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Output format of `compile`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// GraphQL schema definition language
    Sdl,
    /// Declarations and type paths as JSON
    Json,
}

/// slicegraph - typed graphs from headless CMS custom types
#[derive(Parser, Debug)]
#[command(name = "slicegraph")]
#[command(version)]
#[command(about = "Compile CMS custom types into type declarations and materialize documents")]
pub struct Cli {
    /// Enable debug output to stderr
    #[arg(short, long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a custom type schema into type declarations
    Compile {
        /// Path to the custom type JSON
        schema: PathBuf,
        /// Custom type id (e.g. blog_post)
        #[arg(long)]
        id: String,
        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Sdl)]
        format: OutputFormat,
        /// Also write the type path registry as JSON to this file
        #[arg(long)]
        out_paths: Option<PathBuf>,
        /// Override the configured type name prefix
        #[arg(long)]
        type_prefix: Option<String>,
    },
    /// Materialize a raw document against a compiled type path registry
    Materialize {
        /// Path to the raw document JSON
        document: PathBuf,
        /// Path to the type path registry written by `compile --out-paths`
        #[arg(long)]
        paths: PathBuf,
        /// Download images even when configuration disables it
        #[arg(long)]
        normalize_images: bool,
    },
}
