//! # epubforge
//!
//! The generation core of an EPUB builder: a content tree with size
//! estimation, splitting of oversized documents, cross-references with
//! lazily assigned ids and play order, style deduplication into shared
//! classes, and font subsetting.
//!
//! Reading source formats and writing the ZIP container are left to the
//! caller; this crate turns a content tree into well-sized, styled,
//! cross-linked documents plus their stylesheet, fonts and NCX.
//!
//! ## Quick Start
//!
//! ```
//! use epubforge::{Element, FontCollection, Publication, Stylesheet};
//!
//! let mut publication = Publication::new("urn:uuid:0b5e5b3a");
//! let css = publication.create_style_resource(
//!     "OPS/source.css",
//!     Stylesheet::parse(".note { font-weight: bold }"),
//! )?;
//!
//! let chapter = publication.create_document("OPS/chapter.xhtml")?;
//! let doc = publication.document_mut(chapter).unwrap();
//! doc.add_stylesheet(css);
//! let body = doc.body();
//! let h1 = doc.add_element(body, Element::heading(1))?;
//! doc.add_text(h1, "Chapter One")?;
//! let p = doc.add_element(body, Element::paragraph().with_class("note"))?;
//! doc.add_text(p, "Hello")?;
//!
//! let report = publication.generate(&FontCollection::new())?;
//! assert_eq!(report.styled_elements, 1);
//!
//! let ncx = publication.ncx("My Book")?;
//! assert!(ncx.contains("<text>Chapter One</text>"));
//! # Ok::<(), epubforge::Error>(())
//! ```
//!
//! ## Pieces
//!
//! - [`dom`]: per-document arena of elements and text, size estimation and
//!   the splitter ([`Document::peel_off_back`])
//! - [`publication`]: resource registry, spine, [`XRefTable`], TOC and NCX
//! - [`css`]: property sets, simple-selector stylesheets and
//!   [`Stylesheet::make_class`]
//! - [`font`]: font locators, TrueType faces and the [`FontSubsetter`]

pub mod config;
pub mod css;
pub mod dom;
pub mod error;
pub mod font;
pub mod publication;
pub(crate) mod util;

pub use config::{GeneratorConfig, SplitPolicy};
pub use css::{FontStyle, FontWeight, PropertySet, Selector, Stylesheet};
pub use dom::{Document, DocumentId, Element, ElementKind, Node, NodeId};
pub use error::{Error, Result};
pub use font::{
    ChainedLocator, FontCollection, FontFile, FontHandle, FontKey, FontLocator, FontReport,
    FontSubsetter, SubstitutingLocator, TrueTypeFont,
};
pub use publication::{
    GenerationReport, Publication, ResourceRef, TocEntry, Usage, XRef, XRefId, XRefTable,
};
