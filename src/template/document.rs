//! Template documents: a fenced metadata block followed by the body
//!
//! ```text
//! ---
//! name: Socratic Tutor
//! category: educational
//! ---
//! You are a patient tutor...
//! ```
//!
//! `---` fences YAML metadata and `+++` fences TOML metadata.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{DocumentError, MetadataFormat};
use crate::template::model::Template;

/// Parse a document into a [`Template`]
///
/// `source_id` is recorded on the template, typically the file path.
pub fn parse_document(document: &str, source_id: Option<&str>) -> Result<Template, DocumentError> {
    let (format, metadata, body) = split_document(document)?;

    let mut template: Template = match format {
        MetadataFormat::Yaml => {
            // An empty YAML document is `null`, not an empty mapping
            let source = if metadata.trim().is_empty() { "{}" } else { metadata };
            serde_yaml::from_str(source).map_err(|e| DocumentError::MetadataDecode {
                format,
                source: Box::new(e),
            })?
        }
        MetadataFormat::Toml => toml::from_str(metadata).map_err(|e| DocumentError::MetadataDecode {
            format,
            source: Box::new(e),
        })?,
    };

    template.body = body.trim().to_string();
    template.content_hash = content_hash(document);
    template.source = source_id.map(str::to_string);

    debug!(
        name = %template.name,
        version = %template.version,
        variables = template.variables.len(),
        source = source_id.unwrap_or("<inline>"),
        "parsed template document"
    );
    Ok(template)
}

/// Read and parse a document from disk
pub fn load_document(path: &Path) -> Result<Template, DocumentError> {
    let content = std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_document(&content, Some(&path.display().to_string()))
}

/// Lowercase hex SHA-256 of the raw document
pub fn content_hash(document: &str) -> String {
    format!("{:x}", Sha256::digest(document.as_bytes()))
}

/// Split a document into its metadata format, metadata text and body text
fn split_document(document: &str) -> Result<(MetadataFormat, &str, &str), DocumentError> {
    let text = document.strip_prefix('\u{feff}').unwrap_or(document);

    let mut offset = 0;
    let mut opening = None;
    for line in text.split_inclusive('\n') {
        let start = offset;
        offset += line.len();
        match line.trim() {
            "" => continue,
            "---" => opening = Some((MetadataFormat::Yaml, "---", offset)),
            "+++" => opening = Some((MetadataFormat::Toml, "+++", offset)),
            _ => {
                return Err(DocumentError::InvalidFormat(format!(
                    "expected a '---' or '+++' metadata marker at byte {}",
                    start
                )))
            }
        }
        break;
    }
    let Some((format, marker, meta_start)) = opening else {
        return Err(DocumentError::InvalidFormat(
            "document has no metadata block".to_string(),
        ));
    };

    let mut offset = meta_start;
    for line in text[meta_start..].split_inclusive('\n') {
        if line.trim_end() == marker {
            let metadata = &text[meta_start..offset];
            let body = &text[offset + line.len()..];
            return Ok((format, metadata, body));
        }
        offset += line.len();
    }

    Err(DocumentError::InvalidFormat(format!(
        "missing closing '{}' marker",
        marker
    )))
}
