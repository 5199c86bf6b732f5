//! The publication: resource registry, spine, cross-references and TOC.
//!
//! A [`Publication`] owns every document and resource of one book, plus the
//! [`XRefTable`] linking them. Resources are registered under unique,
//! path-like names and referred to through [`ResourceRef`] handles.

mod generate;
mod navigation;
mod ncx;
mod resource;
mod split;
mod styling;
mod toc;
mod xref;

use std::collections::HashMap;

pub use generate::GenerationReport;
pub use ncx::{NavPoint, generate_ncx};
pub use resource::{BinaryResource, ResourceHandle, ResourceRef, StyleResource};
pub use toc::TocEntry;
pub use xref::{Anchor, PlayOrder, Usage, XRef, XRefId, XRefTable};

use crate::config::GeneratorConfig;
use crate::css::Stylesheet;
use crate::dom::{Document, DocumentId, NodeId};
use crate::error::{Error, Result};
use crate::util::{media_type, relative_href, with_fragment};

/// A book under construction.
#[derive(Debug, Clone)]
pub struct Publication {
    identifier: String,
    config: GeneratorConfig,
    documents: Vec<Document>,
    spine: Vec<DocumentId>,
    styles: Vec<StyleResource>,
    images: Vec<BinaryResource>,
    fonts: Vec<BinaryResource>,
    names: HashMap<String, ResourceHandle>,
    xrefs: XRefTable,
    toc: TocEntry,
}

impl Publication {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self::with_config(identifier, GeneratorConfig::default())
    }

    pub fn with_config(identifier: impl Into<String>, config: GeneratorConfig) -> Self {
        Self {
            identifier: identifier.into(),
            config,
            documents: Vec::new(),
            spine: Vec::new(),
            styles: Vec::new(),
            images: Vec::new(),
            fonts: Vec::new(),
            names: HashMap::new(),
            xrefs: XRefTable::new(),
            toc: TocEntry::default(),
        }
    }

    /// Primary identifier (e.g. a `urn:uuid:`).
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    fn claim_name(&mut self, name: &str, handle: ResourceHandle) -> Result<()> {
        if self.names.contains_key(name) {
            return Err(Error::DuplicateResource(name.to_string()));
        }
        self.names.insert(name.to_string(), handle);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Documents and spine
    // ------------------------------------------------------------------

    /// Create an empty document at the end of the spine.
    pub fn create_document(&mut self, name: impl Into<String>) -> Result<DocumentId> {
        let name = name.into();
        let id = DocumentId(self.documents.len() as u32);
        self.claim_name(&name, ResourceHandle::Document(id))?;
        self.documents.push(Document::new(id, name));
        self.spine.push(id);
        Ok(id)
    }

    /// Register a document built outside the publication right after `after`
    /// in the spine.
    pub(crate) fn insert_document_after(
        &mut self,
        after: DocumentId,
        document: Document,
    ) -> Result<DocumentId> {
        let id = document.id();
        self.claim_name(document.name(), ResourceHandle::Document(id))?;
        self.documents.push(document);
        let position = self
            .spine
            .iter()
            .position(|&doc| doc == after)
            .map_or(self.spine.len(), |pos| pos + 1);
        self.spine.insert(position, id);
        Ok(id)
    }

    pub(crate) fn next_document_id(&self) -> DocumentId {
        DocumentId(self.documents.len() as u32)
    }

    pub fn document(&self, id: DocumentId) -> Option<&Document> {
        self.documents.get(id.0 as usize)
    }

    pub fn document_mut(&mut self, id: DocumentId) -> Option<&mut Document> {
        self.documents.get_mut(id.0 as usize)
    }

    fn doc(&self, id: DocumentId) -> Result<&Document> {
        self.document(id).ok_or(Error::UnknownDocument(id.0))
    }

    fn doc_mut(&mut self, id: DocumentId) -> Result<&mut Document> {
        self.documents
            .get_mut(id.0 as usize)
            .ok_or(Error::UnknownDocument(id.0))
    }

    /// Documents in reading order.
    pub fn spine(&self) -> &[DocumentId] {
        &self.spine
    }

    /// Documents in reading order.
    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.spine.iter().filter_map(|&id| self.document(id))
    }

    // ------------------------------------------------------------------
    // Other resources
    // ------------------------------------------------------------------

    pub fn create_style_resource(
        &mut self,
        name: impl Into<String>,
        stylesheet: Stylesheet,
    ) -> Result<ResourceRef> {
        let name = name.into();
        self.claim_name(&name, ResourceHandle::Stylesheet(self.styles.len()))?;
        self.styles.push(StyleResource {
            name: name.clone(),
            stylesheet,
        });
        Ok(ResourceRef::new(name))
    }

    pub fn create_image_resource(
        &mut self,
        name: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<ResourceRef> {
        let name = name.into();
        self.claim_name(&name, ResourceHandle::Image(self.images.len()))?;
        self.images.push(BinaryResource {
            media_type: media_type(&name).to_string(),
            name: name.clone(),
            data,
        });
        Ok(ResourceRef::new(name))
    }

    pub fn create_font_resource(
        &mut self,
        name: impl Into<String>,
        data: Vec<u8>,
    ) -> Result<ResourceRef> {
        let name = name.into();
        self.claim_name(&name, ResourceHandle::Font(self.fonts.len()))?;
        self.fonts.push(BinaryResource {
            media_type: media_type(&name).to_string(),
            name: name.clone(),
            data,
        });
        Ok(ResourceRef::new(name))
    }

    /// Handle for a registered resource name.
    pub fn resource_ref(&self, name: &str) -> Option<ResourceRef> {
        self.names.contains_key(name).then(|| ResourceRef::new(name))
    }

    pub fn has_resource(&self, name: &str) -> bool {
        self.names.contains_key(name)
    }

    pub fn resolve(&self, resource: &ResourceRef) -> Option<ResourceHandle> {
        self.names.get(resource.name()).copied()
    }

    pub fn stylesheet(&self, resource: &ResourceRef) -> Option<&Stylesheet> {
        match self.resolve(resource)? {
            ResourceHandle::Stylesheet(idx) => self.styles.get(idx).map(|s| &s.stylesheet),
            _ => None,
        }
    }

    pub fn stylesheet_mut(&mut self, resource: &ResourceRef) -> Option<&mut Stylesheet> {
        match self.resolve(resource)? {
            ResourceHandle::Stylesheet(idx) => self.styles.get_mut(idx).map(|s| &mut s.stylesheet),
            _ => None,
        }
    }

    pub fn style_resources(&self) -> &[StyleResource] {
        &self.styles
    }

    pub fn images(&self) -> &[BinaryResource] {
        &self.images
    }

    pub fn fonts(&self) -> &[BinaryResource] {
        &self.fonts
    }

    // ------------------------------------------------------------------
    // Cross-references
    // ------------------------------------------------------------------

    pub fn xrefs(&self) -> &XRefTable {
        &self.xrefs
    }

    pub fn xref(&self, id: XRefId) -> Option<&XRef> {
        self.xrefs.get(id)
    }

    /// Reference to the top of a document, shared by every caller.
    pub fn document_xref(&mut self, doc: DocumentId, usage: Usage) -> Result<XRefId> {
        if let Some(existing) = self.doc(doc)?.root_ref() {
            self.xrefs.add_usage(existing, usage);
            return Ok(existing);
        }
        let xref = self.xrefs.create(doc, Anchor::Top, usage);
        self.doc_mut(doc)?.root_ref = Some(xref);
        Ok(xref)
    }

    /// The element's own reference, created on first use.
    ///
    /// `usage` is added to whatever the reference already carries. No `id`
    /// is assigned here; that waits until an href is actually generated.
    pub fn element_xref(
        &mut self,
        doc: DocumentId,
        node: NodeId,
        usage: Usage,
    ) -> Result<XRefId> {
        let document = self.doc(doc)?;
        let element = document.element(node).ok_or(Error::NotAnElement(node.0))?;
        if let Some(existing) = element.self_ref() {
            self.xrefs.add_usage(existing, usage);
            return Ok(existing);
        }
        let xref = self.xrefs.create(doc, Anchor::Element(node), usage);
        if let Some(element) = self.doc_mut(doc)?.element_mut(node) {
            element.self_ref = Some(xref);
        }
        Ok(xref)
    }

    /// Reference to a fragment identifier by name.
    ///
    /// The fragment need not exist yet; unresolved ones are listed by
    /// [`Publication::dangling_refs`].
    pub fn fragment_xref(
        &mut self,
        doc: DocumentId,
        fragment: impl Into<String>,
        usage: Usage,
    ) -> Result<XRefId> {
        self.doc(doc)?;
        let fragment = fragment.into();
        let existing = self.xrefs.iter().find_map(|(id, xref)| {
            (xref.document() == doc
                && matches!(xref.anchor(), Anchor::Fragment(name) if *name == fragment))
            .then_some(id)
        });
        if let Some(existing) = existing {
            self.xrefs.add_usage(existing, usage);
            return Ok(existing);
        }
        Ok(self.xrefs.create(doc, Anchor::Fragment(fragment), usage))
    }

    /// Fragment identifier a reference resolves to, assigning an element id
    /// on first use. `None` for references to the top of a document.
    pub fn target_id(&mut self, xref: XRefId) -> Result<Option<String>> {
        let target = self.xrefs.get(xref).ok_or(Error::UnknownXRef(xref.0))?;
        let doc = target.document();
        match target.anchor().clone() {
            Anchor::Top => Ok(None),
            Anchor::Element(node) => self.doc_mut(doc)?.assign_id(node).map(Some),
            Anchor::Fragment(fragment) => Ok(Some(fragment)),
        }
    }

    /// Relative href from document `from` to `xref`.
    pub fn href_for(&mut self, from: DocumentId, xref: XRefId) -> Result<String> {
        let base = self.doc(from)?.name().to_string();
        self.href_from(&base, xref)
    }

    /// Relative href from the resource named `base` to `xref`.
    pub fn href_from(&mut self, base: &str, xref: XRefId) -> Result<String> {
        let target = self.xrefs.get(xref).ok_or(Error::UnknownXRef(xref.0))?;
        let target_name = self.doc(target.document())?.name().to_string();
        let fragment = self.target_id(xref)?;

        let href = relative_href(base, &target_name);
        match fragment {
            Some(fragment) => Ok(with_fragment(&href, &fragment)),
            // a document referencing its own top still needs its file name
            None if href.is_empty() => {
                let dir = match base.rsplit_once('/') {
                    Some((dir, _)) => format!("{dir}/"),
                    None => String::new(),
                };
                Ok(relative_href(&dir, &target_name))
            }
            None => Ok(href),
        }
    }

    /// References whose target no longer exists or never existed.
    pub fn dangling_refs(&self) -> Vec<XRefId> {
        self.xrefs
            .iter()
            .filter(|(_, xref)| {
                let Some(doc) = self.document(xref.document()) else {
                    return true;
                };
                match xref.anchor() {
                    Anchor::Top => false,
                    Anchor::Element(node) => doc.element(*node).is_none(),
                    Anchor::Fragment(fragment) => doc.lookup_id(fragment).is_none(),
                }
            })
            .map(|(id, _)| id)
            .collect()
    }

    // ------------------------------------------------------------------
    // Table of contents
    // ------------------------------------------------------------------

    /// Root of the TOC tree (its own title and target are unused).
    pub fn toc(&self) -> &TocEntry {
        &self.toc
    }

    pub fn toc_mut(&mut self) -> &mut TocEntry {
        &mut self.toc
    }

    pub fn request_toc_play_order(&mut self) {
        self.toc.request_play_order(&mut self.xrefs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    fn book() -> (Publication, DocumentId, DocumentId) {
        let mut publication = Publication::new("urn:test");
        let a = publication.create_document("OPS/text/a.xhtml").unwrap();
        let b = publication.create_document("OPS/text/b.xhtml").unwrap();
        (publication, a, b)
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let (mut publication, _, _) = book();
        assert!(matches!(
            publication.create_document("OPS/text/a.xhtml"),
            Err(Error::DuplicateResource(_))
        ));
        assert!(publication
            .create_image_resource("OPS/text/b.xhtml", Vec::new())
            .is_err());
        let image = publication.create_image_resource("OPS/cover.png", vec![1]).unwrap();
        assert_eq!(publication.resolve(&image), Some(ResourceHandle::Image(0)));
        assert_eq!(publication.images()[0].media_type, "image/png");
        assert_eq!(publication.resource_ref("OPS/cover.png"), Some(image));
        assert!(publication.resource_ref("OPS/none.png").is_none());
    }

    #[test]
    fn test_element_xref_is_shared_and_lazy() {
        let (mut publication, a, b) = book();
        let doc = publication.document_mut(b).unwrap();
        let p = doc.add_element(doc.body(), Element::paragraph()).unwrap();

        let first = publication.element_xref(b, p, Usage::REFERENCE).unwrap();
        let second = publication.element_xref(b, p, Usage::TOC).unwrap();
        assert_eq!(first, second);
        assert!(publication.xrefs().usage(first).contains(Usage::TOC | Usage::REFERENCE));
        // no id until an href is needed
        assert!(publication.document(b).unwrap().element(p).unwrap().id().is_none());

        assert_eq!(publication.href_for(a, first).unwrap(), "b.xhtml#id1");
        assert_eq!(publication.href_for(b, first).unwrap(), "#id1");
        assert_eq!(publication.document(b).unwrap().lookup_id("id1"), Some(p));
    }

    #[test]
    fn test_document_href() {
        let (mut publication, a, b) = book();
        let top = publication.document_xref(b, Usage::TOC).unwrap();
        assert_eq!(publication.document_xref(b, Usage::NONE).unwrap(), top);
        assert_eq!(publication.href_for(a, top).unwrap(), "b.xhtml");
        assert_eq!(publication.href_for(b, top).unwrap(), "b.xhtml");
        assert_eq!(publication.href_from("OPS/toc.ncx", top).unwrap(), "text/b.xhtml");
    }

    #[test]
    fn test_dangling_refs() {
        let (mut publication, a, _) = book();
        let doc = publication.document_mut(a).unwrap();
        let p = doc.add_element(doc.body(), Element::paragraph()).unwrap();
        doc.set_id(p, "real").unwrap();

        let good = publication.fragment_xref(a, "real", Usage::REFERENCE).unwrap();
        let bad = publication.fragment_xref(a, "missing", Usage::REFERENCE).unwrap();
        assert_eq!(publication.fragment_xref(a, "missing", Usage::NONE).unwrap(), bad);

        let dangling = publication.dangling_refs();
        assert_eq!(dangling, vec![bad]);
        assert!(!dangling.contains(&good));
    }

    #[test]
    fn test_unknown_handles() {
        let (mut publication, _, _) = book();
        assert!(matches!(
            publication.document_xref(DocumentId(9), Usage::TOC),
            Err(Error::UnknownDocument(9))
        ));
        assert!(matches!(
            publication.target_id(XRefId(42)),
            Err(Error::UnknownXRef(42))
        ));
    }
}
