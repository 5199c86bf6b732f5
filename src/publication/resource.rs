//! Non-document resources and name handles.

use std::fmt;

use crate::css::Stylesheet;
use crate::dom::DocumentId;

/// Weak handle to a resource, resolved by name through the publication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceRef(String);

impl ResourceRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What a resource name resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceHandle {
    Document(DocumentId),
    Stylesheet(usize),
    Image(usize),
    Font(usize),
}

/// A CSS resource.
#[derive(Debug, Clone)]
pub struct StyleResource {
    pub name: String,
    pub stylesheet: Stylesheet,
}

impl StyleResource {
    pub fn to_css(&self) -> String {
        self.stylesheet.to_css()
    }
}

/// Opaque bytes with a media type (images, fonts).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryResource {
    pub name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}
