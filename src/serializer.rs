//! Serialization module for rendering finished OpenAPI documents as YAML or JSON.
//!
//! Rendering is a pure function of the document. Writing artifacts renders every document first
//! and only then touches the file system, so a rendering failure leaves no partial output behind.

use crate::document::{DocumentModel, OpenApiDocument};
use crate::error::Result;
use anyhow::Context;
use clap::ValueEnum;
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// YAML format
    Yaml,
    /// JSON format
    Json,
}

impl OutputFormat {
    /// File extension of artifacts in this format.
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Yaml => "yaml",
            OutputFormat::Json => "json",
        }
    }
}

/// Serializes an OpenAPI document to YAML format.
///
/// # Errors
///
/// Returns [`Error::Serialization`](crate::error::Error::Serialization) if serialization fails.
pub fn serialize_yaml(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to YAML");
    Ok(serde_yaml::to_string(doc)?)
}

/// Serializes an OpenAPI document to JSON format with pretty printing.
///
/// # Errors
///
/// Returns [`Error::Serialization`](crate::error::Error::Serialization) if serialization fails.
pub fn serialize_json(doc: &OpenApiDocument) -> Result<String> {
    debug!("Serializing OpenAPI document to JSON");
    Ok(serde_json::to_string_pretty(doc)?)
}

/// Renders a document in the requested format.
pub fn render(doc: &OpenApiDocument, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Yaml => serialize_yaml(doc),
        OutputFormat::Json => serialize_json(doc),
    }
}

/// Writes string content to a file, creating parent directories as needed.
///
/// # Errors
///
/// Returns an error if the directory or the file cannot be created or written to.
pub fn write_to_file(content: &str, path: &Path) -> anyhow::Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Renders every document and writes one artifact per API into `output_dir`.
///
/// Artifact names come from [`DocumentModel::artifact_name`].
///
/// # Returns
///
/// The paths written, in the order of `models`.
pub fn write_documents(
    models: &[DocumentModel],
    output_dir: &Path,
    format: OutputFormat,
) -> anyhow::Result<Vec<PathBuf>> {
    let rendered = models
        .iter()
        .map(|model| {
            let content = render(&model.document, format)
                .with_context(|| format!("Failed to render API '{}'", model.alias))?;
            Ok((output_dir.join(model.artifact_name(format.extension())), content))
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let mut written = Vec::with_capacity(rendered.len());
    for (path, content) in rendered {
        write_to_file(&content, &path)?;
        info!("Wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}
