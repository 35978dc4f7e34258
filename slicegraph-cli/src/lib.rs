//! slicegraph command-line interface.
//!
//! - `slicegraph compile <schema.json> --id <custom_type>`: compile a custom
//!   type and print its declarations as SDL or JSON
//! - `slicegraph materialize <document.json> --paths <paths.json>`: materialize
//!   a raw document and print the proxied form as JSON

pub mod cli;
pub mod compile;
pub mod materialize;

pub use cli::{Cli, Commands, OutputFormat};
