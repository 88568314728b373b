use crate::error::{Error, Result};
use crate::scanner::SourceFile;
use log::{debug, warn};
use std::path::PathBuf;

/// AST (Abstract Syntax Tree) parser for Rust source files.
///
/// The `AstParser` uses the `syn` crate to parse Rust source code into an abstract syntax tree,
/// which the type extractor then walks for struct, alias and enum declarations.
///
/// # Example
///
/// ```no_run
/// use docapi::parser::AstParser;
/// use docapi::scanner::SourceFile;
/// use std::path::Path;
///
/// let source = SourceFile::read(Path::new("src/main.rs")).unwrap();
/// let parsed = AstParser::parse_source(&source).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Parses an already loaded source file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceParse`] if the file contains invalid Rust syntax.
    pub fn parse_source(source: &SourceFile) -> Result<ParsedFile> {
        debug!("Parsing file: {}", source.path.display());

        let syntax_tree = syn::parse_file(&source.content).map_err(|e| Error::SourceParse {
            path: source.path.clone(),
            message: e.to_string(),
        })?;

        Ok(ParsedFile {
            path: source.path.clone(),
            syntax_tree,
        })
    }

    /// Parses multiple source files.
    ///
    /// In strict mode the first file that fails to parse aborts the batch, since a partial
    /// symbol table silently produces wrong documentation. With `lenient` set, such files are
    /// logged as warnings and skipped.
    pub fn parse_sources(sources: &[SourceFile], lenient: bool) -> Result<Vec<ParsedFile>> {
        debug!("Parsing {} files (lenient: {})", sources.len(), lenient);

        let mut parsed = Vec::with_capacity(sources.len());
        for source in sources {
            match Self::parse_source(source) {
                Ok(file) => parsed.push(file),
                Err(e) if lenient => {
                    warn!("Skipping unparsable file: {}", e);
                }
                Err(e) => return Err(e),
            }
        }

        debug!(
            "Parsing complete: {} succeeded, {} skipped",
            parsed.len(),
            sources.len() - parsed.len()
        );

        Ok(parsed)
    }
}
