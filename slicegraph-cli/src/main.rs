//! slicegraph CLI
//!
//! Commands:
//! - `slicegraph compile <schema.json> --id <custom_type>`: print compiled declarations
//! - `slicegraph materialize <document.json> --paths <paths.json>`: print a proxied document
//!
//! Exit codes:
//! - 0: Success
//! - 1: Error

use clap::Parser;
use tracing_subscriber::EnvFilter;

use slicegraph::compile::{run_compile, CompileArgs};
use slicegraph::materialize::run_materialize;
use slicegraph::{Cli, Commands};
use slicegraph_config::load_config;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("slicegraph=debug,slicegraph_schema=debug,slicegraph_proxy=debug,slicegraph_config=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = dispatch_command(cli).await;
    std::process::exit(exit_code);
}

/// Dispatch a parsed CLI to the matching command and print its output.
async fn dispatch_command(cli: Cli) -> i32 {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return 1;
        }
    };

    let output = match cli.command {
        Commands::Compile {
            schema,
            id,
            format,
            out_paths,
            type_prefix,
        } => run_compile(&CompileArgs {
            schema: &schema,
            custom_type_id: &id,
            format,
            out_paths: out_paths.as_deref(),
            type_prefix: type_prefix.as_deref().unwrap_or(&config.type_prefix),
        }),
        Commands::Materialize {
            document,
            paths,
            normalize_images,
        } => run_materialize(&document, &paths, normalize_images, &config).await,
    };

    result_to_exit(output.map(|text| println!("{text}")))
}

/// Convert a `Result<(), E: Display>` to an exit code.
fn result_to_exit<E: std::fmt::Display>(result: Result<(), E>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slicegraph::OutputFormat;
    use std::path::PathBuf;

    #[test]
    fn test_cli_parsing_compile_defaults() {
        let cli = Cli::parse_from(["slicegraph", "compile", "page.json", "--id", "page"]);
        assert!(!cli.debug);
        match cli.command {
            Commands::Compile {
                schema,
                id,
                format,
                out_paths,
                type_prefix,
            } => {
                assert_eq!(schema, PathBuf::from("page.json"));
                assert_eq!(id, "page");
                assert_eq!(format, OutputFormat::Sdl);
                assert!(out_paths.is_none());
                assert!(type_prefix.is_none());
            }
            _ => panic!("Expected Compile command"),
        }
    }

    #[test]
    fn test_cli_parsing_compile_json_with_paths() {
        let cli = Cli::parse_from([
            "slicegraph",
            "--debug",
            "compile",
            "page.json",
            "--id",
            "page",
            "--format",
            "json",
            "--out-paths",
            "paths.json",
            "--type-prefix",
            "Cms",
        ]);
        assert!(cli.debug);
        match cli.command {
            Commands::Compile {
                format,
                out_paths,
                type_prefix,
                ..
            } => {
                assert_eq!(format, OutputFormat::Json);
                assert_eq!(out_paths, Some(PathBuf::from("paths.json")));
                assert_eq!(type_prefix.as_deref(), Some("Cms"));
            }
            _ => panic!("Expected Compile command"),
        }
    }

    #[test]
    fn test_cli_parsing_compile_requires_id() {
        assert!(Cli::try_parse_from(["slicegraph", "compile", "page.json"]).is_err());
    }

    #[test]
    fn test_cli_parsing_materialize() {
        let cli = Cli::parse_from([
            "slicegraph",
            "materialize",
            "doc.json",
            "--paths",
            "paths.json",
            "--normalize-images",
            "-d",
        ]);
        assert!(cli.debug);
        match cli.command {
            Commands::Materialize {
                document,
                paths,
                normalize_images,
            } => {
                assert_eq!(document, PathBuf::from("doc.json"));
                assert_eq!(paths, PathBuf::from("paths.json"));
                assert!(normalize_images);
            }
            _ => panic!("Expected Materialize command"),
        }
    }

    #[test]
    fn test_result_to_exit() {
        assert_eq!(result_to_exit(Ok::<(), String>(())), 0);
        assert_eq!(result_to_exit(Err::<(), String>("boom".to_string())), 1);
    }
}
