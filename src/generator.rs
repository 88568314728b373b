//! End-to-end pipeline.
//!
//! ```text
//! scanner --> lexer  --> interpreter --+
//!        \                              +--> schema resolver --> documents
//!         `-> parser --> type extractor +
//! ```
//!
//! Annotations and declarations come from the same snapshot of the source tree. Files are visited
//! in sorted path order and lines in source order, which fixes the command order the interpreter
//! sees and the tie-breaking order of the symbol table.

use crate::document::DocumentModel;
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::lexer::{Lexer, DEFAULT_PREFIX};
use crate::parser::AstParser;
use crate::scanner::{FileScanner, SourceFile};
use crate::schema_resolver::{SchemaResolver, DEFAULT_MAX_ITERATIONS};
use crate::type_extractor::TypeExtractor;
use log::{debug, info, warn};
use std::path::Path;

/// Library-side configuration of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    /// Annotation sentinel prefix
    pub prefix: String,
    /// Resolver pass cap
    pub max_iterations: usize,
    /// Skip unparsable source files instead of failing
    pub lenient: bool,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            lenient: false,
        }
    }
}

/// Output of a successful run
#[derive(Debug, Clone, Default)]
pub struct Generation {
    /// One fully resolved document per API alias
    pub documents: Vec<DocumentModel>,
    pub files_scanned: usize,
    pub annotations: usize,
    pub symbols: usize,
}

/// Runs the whole pipeline over a source tree.
pub struct Generator {
    options: GeneratorOptions,
}

impl Generator {
    pub fn new(options: GeneratorOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Scans `root` and builds every documented API.
    ///
    /// # Errors
    ///
    /// Fails on unreadable files, on unparsable files unless running leniently, on structural
    /// annotation errors and on resolver overflow. Nothing is returned for any API in that case.
    pub fn generate(&self, root: &Path) -> Result<Generation> {
        info!("Scanning {}", root.display());
        let scan = FileScanner::new(root.to_path_buf()).scan()?;
        info!("Found {} Rust files", scan.rust_files.len());

        let sources = FileScanner::load(&scan.rust_files)?;
        self.generate_from_sources(&sources)
    }

    /// Builds every documented API from already loaded sources, in the given order.
    pub fn generate_from_sources(&self, sources: &[SourceFile]) -> Result<Generation> {
        let lexer = Lexer::new(self.options.prefix.as_str());
        let commands = lexer.lex_sources(sources);
        info!("Lexed {} annotations", commands.len());

        let mut documents = Interpreter::run(&commands)?;

        let parsed = AstParser::parse_sources(sources, self.options.lenient)?;
        let symbols = TypeExtractor::extract(&parsed);
        info!("Extracted {} type declarations", symbols.len());

        let resolver = SchemaResolver::new(&symbols).with_max_iterations(self.options.max_iterations);
        for document in documents.iter_mut() {
            let summary = resolver.resolve(document)?;
            debug!(
                "API '{}': {} schema(s), {} pass(es)",
                document.alias, summary.resolved, summary.passes
            );
            if !summary.unresolved.is_empty() {
                warn!(
                    "API '{}': {} type(s) documented as plain strings: {}",
                    document.alias,
                    summary.unresolved.len(),
                    summary.unresolved.join(", ")
                );
            }
        }

        Ok(Generation {
            documents,
            files_scanned: sources.len(),
            annotations: commands.len(),
            symbols: symbols.len(),
        })
    }
}
