//! Error types for epubforge operations.

use thiserror::Error;

/// Errors that can occur while building a publication.
///
/// Conditions that only degrade the output (missing or prohibited fonts,
/// dangling cross-references, unsplittable oversized content) are not errors;
/// they are reported through [`crate::font::FontReport`] and
/// [`crate::Publication::dangling_refs`] instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid font data: {0}")]
    FontParse(String),

    #[error("Font subsetting failed: {0}")]
    Subset(String),

    #[error("Unknown resource: {0}")]
    UnknownResource(String),

    #[error("Duplicate resource name: {0}")]
    DuplicateResource(String),

    #[error("Unknown document handle: {0}")]
    UnknownDocument(u32),

    #[error("Invalid node handle {node} in {document}")]
    InvalidNode { document: String, node: u32 },

    #[error("Node {0} is not an element")]
    NotAnElement(u32),

    #[error("Unknown cross-reference: {0}")]
    UnknownXRef(u32),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<ttf_parser::FaceParsingError> for Error {
    fn from(err: ttf_parser::FaceParsingError) -> Self {
        Error::FontParse(err.to_string())
    }
}
