//! docapi - command-line tool for generating OpenAPI documents from annotated Rust sources.
//!
//! Scans a project for `// docapi` annotations, cross-references them with the Rust type
//! declarations in the same tree and writes one OpenAPI 3.0 document per API.
//!
//! # Usage
//!
//! ```bash
//! docapi [OPTIONS] <PROJECT_PATH>
//! ```
//!
//! # Examples
//!
//! Write `openapi.yaml` (or one file per API alias) into `docs/`:
//! ```bash
//! docapi ./my-service -o docs
//! ```
//!
//! Print JSON to stdout:
//! ```bash
//! docapi ./my-service -f json --stdout
//! ```
//!
//! Enable verbose logging:
//! ```bash
//! docapi ./my-service -v
//! ```

use anyhow::Result;
use clap::Parser;
use docapi::cli;
use log::info;

fn main() -> Result<()> {
    // Parse first so the verbose flag can pick the log level
    let args = cli::CliArgs::parse();

    let log_level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("docapi starting...");

    let args = cli::parse_args_from_parsed(args)?;
    cli::run(args)?;

    info!("OpenAPI document generation completed successfully");

    Ok(())
}
