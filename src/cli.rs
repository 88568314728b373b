use crate::generator::{Generator, GeneratorOptions};
use crate::lexer::DEFAULT_PREFIX;
use crate::schema_resolver::DEFAULT_MAX_ITERATIONS;
use crate::serializer::{render, write_documents};
use anyhow::Result;
use clap::Parser;
use log::{debug, info};
use std::path::PathBuf;

pub use crate::serializer::OutputFormat;

/// docapi - Generate OpenAPI documents from annotated Rust source comments
#[derive(Parser, Debug)]
#[command(name = "docapi")]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the Rust project directory
    #[arg(value_name = "PROJECT_PATH")]
    pub project_path: PathBuf,

    /// Output format (yaml or json)
    #[arg(short = 'f', long = "format", value_enum, default_value = "yaml")]
    pub output_format: OutputFormat,

    /// Directory that receives one document per API
    #[arg(short = 'o', long = "output-dir", value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Print documents to stdout instead of writing files
    #[arg(long = "stdout")]
    pub stdout: bool,

    /// Comment prefix that marks an annotation
    #[arg(short = 'p', long = "prefix", default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Maximum number of schema resolution passes
    #[arg(long = "max-iterations", default_value_t = DEFAULT_MAX_ITERATIONS)]
    pub max_iterations: usize,

    /// Skip source files that fail to parse instead of aborting
    #[arg(long = "lenient")]
    pub lenient: bool,

    /// Enable verbose output
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

impl CliArgs {
    pub fn generator_options(&self) -> GeneratorOptions {
        GeneratorOptions {
            prefix: self.prefix.clone(),
            max_iterations: self.max_iterations,
            lenient: self.lenient,
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Result<CliArgs> {
    let args = CliArgs::parse();
    parse_args_from_parsed(args)
}

/// Validate and log already-parsed arguments
pub fn parse_args_from_parsed(args: CliArgs) -> Result<CliArgs> {
    debug!("Parsed arguments: {:?}", args);

    if !args.project_path.exists() {
        anyhow::bail!(
            "Project path does not exist: {}",
            args.project_path.display()
        );
    }

    if !args.project_path.is_dir() {
        anyhow::bail!(
            "Project path is not a directory: {}",
            args.project_path.display()
        );
    }

    if args.prefix.trim().is_empty() {
        anyhow::bail!("Annotation prefix must not be empty");
    }

    if args.max_iterations == 0 {
        anyhow::bail!("--max-iterations must be at least 1");
    }

    info!("Project path: {}", args.project_path.display());
    info!("Output format: {:?}", args.output_format);
    if args.stdout {
        info!("Output: stdout");
    } else {
        info!("Output directory: {}", args.output_dir.display());
    }
    info!("Annotation prefix: {}", args.prefix);

    Ok(args)
}

/// Run the main workflow
pub fn run(args: CliArgs) -> Result<()> {
    info!("Starting OpenAPI document generation...");

    let generator = Generator::new(args.generator_options());
    let generation = generator.generate(&args.project_path)?;

    if generation.documents.iter().all(|d| d.document.paths.is_empty()) {
        log::warn!("No routes documented in the project");
    }

    if args.stdout {
        for model in &generation.documents {
            println!("{}", render(&model.document, args.output_format)?);
        }
    } else {
        let written = write_documents(&generation.documents, &args.output_dir, args.output_format)?;
        info!("Wrote {} document(s)", written.len());
    }

    info!("Generation complete!");
    info!("Summary:");
    info!("  - Files scanned: {}", generation.files_scanned);
    info!("  - Annotations: {}", generation.annotations);
    info!("  - Type declarations: {}", generation.symbols);
    for model in &generation.documents {
        let alias = if model.alias.is_empty() {
            "(default)"
        } else {
            model.alias.as_str()
        };
        info!(
            "  - API {}: {} path(s), {} schema(s)",
            alias,
            model.document.paths.len(),
            model.document.components.schemas.len()
        );
    }

    Ok(())
}
