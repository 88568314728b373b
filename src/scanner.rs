use crate::error::{Error, Result};
use log::{debug, warn};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks through a project directory to find all Rust source files.
/// It automatically skips common directories that should be ignored, such as `target` and hidden
/// directories (those starting with `.`).
///
/// Files are returned in sorted path order so that annotations spread across several files are
/// always seen by the interpreter in the same sequence.
///
/// # Example
///
/// ```no_run
/// use docapi::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Paths to all discovered `.rs` files, sorted
    pub rust_files: Vec<PathBuf>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

/// A position inside a scanned source file (1-based line).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl Location {
    pub fn new(file: PathBuf, line: usize) -> Self {
        Self { file, line }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file.display(), self.line)
    }
}

/// The full text of one source file, read once and shared by the lexer and the parser.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub content: String,
}

/// One raw line of a source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine<'a> {
    pub location: Location,
    pub text: &'a str,
}

impl SourceFile {
    pub fn new(path: PathBuf, content: impl Into<String>) -> Self {
        Self {
            path,
            content: content.into(),
        }
    }

    /// Reads a file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SourceRead`] if the file cannot be read as UTF-8 text.
    pub fn read(path: &Path) -> Result<Self> {
        debug!("Reading source file: {}", path.display());
        let content = fs::read_to_string(path).map_err(|source| Error::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path.to_path_buf(), content))
    }

    /// Iterates over the lines of the file with their 1-based locations.
    pub fn lines(&self) -> impl Iterator<Item = SourceLine<'_>> {
        self.content
            .lines()
            .enumerate()
            .map(move |(index, text)| SourceLine {
                location: Location::new(self.path.clone(), index + 1),
                text,
            })
    }
}

impl FileScanner {
    /// Creates a new `FileScanner` for the specified root directory.
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all `.rs` files.
    ///
    /// This method recursively traverses the directory tree starting from the root path,
    /// collecting all files with the `.rs` extension. It automatically skips:
    /// - The `target` directory (build artifacts)
    /// - Hidden directories (starting with `.`)
    ///
    /// If any directories or files cannot be accessed, warnings are logged and added to
    /// the result, but scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.root_path.exists() {
            return Err(Error::SourceRead {
                path: self.root_path.clone(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "root directory does not exist",
                ),
            });
        }

        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                // Don't filter the root directory itself
                if e.path() == self.root_path {
                    return true;
                }

                let file_name = e.file_name().to_string_lossy();
                let is_hidden = file_name.starts_with('.');
                let is_target = file_name == "target";

                !is_hidden && !is_target
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        rust_files.sort();

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }

    /// Reads every file in `paths`, failing on the first unreadable one.
    pub fn load(paths: &[PathBuf]) -> Result<Vec<SourceFile>> {
        paths.iter().map(|path| SourceFile::read(path)).collect()
    }
}
