//! Content tree of a single output document.
//!
//! Nodes live in a per-document arena and refer to each other by [`NodeId`].
//! Moving content between documents goes through
//! [`Document::transfer_to_document`] or [`Document::peel_off_back`], which
//! re-key identifiers and cross-references as they go.

mod document;
mod node;
mod peel;
mod policy;

pub use document::{DfsIter, Document, DocumentId};
pub use node::{Element, ElementKind, Hyperlink, Image, Node, NodeId, TableCell};

pub(crate) use peel::size_limit;
