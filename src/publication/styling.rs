//! Style passes over whole documents: cascade, class canonicalization and
//! font subsetting.

use super::resource::{ResourceHandle, ResourceRef};
use super::Publication;
use crate::css::{PropertySet, Stylesheet, compute_cascade};
use crate::dom::{DocumentId, NodeId};
use crate::error::{Error, Result};
use crate::font::{FontLocator, FontReport, FontSubsetter};

impl Publication {
    fn style_index(&self, resource: &ResourceRef) -> Result<usize> {
        match self.resolve(resource) {
            Some(ResourceHandle::Stylesheet(idx)) => Ok(idx),
            _ => Err(Error::UnknownResource(resource.name().to_string())),
        }
    }

    /// Resolve each element's cascade from the stylesheets linked to `doc`.
    ///
    /// Later stylesheets take precedence over earlier ones at equal
    /// specificity. Elements no rule applies to get no cascade.
    pub fn cascade_styles(&mut self, doc: DocumentId) -> Result<()> {
        let links = self.doc(doc)?.stylesheets().to_vec();
        let indices = links
            .iter()
            .map(|link| self.style_index(link))
            .collect::<Result<Vec<_>>>()?;

        let Self {
            documents, styles, ..
        } = self;
        let sheets: Vec<&Stylesheet> = indices.iter().map(|&i| &styles[i].stylesheet).collect();
        let document = documents
            .get_mut(doc.0 as usize)
            .ok_or(Error::UnknownDocument(doc.0))?;

        let nodes: Vec<NodeId> = document.iter_dfs(document.body()).collect();
        for node in nodes {
            if let Some(element) = document.element_mut(node) {
                let cascade = compute_cascade(
                    element.tag_name(),
                    element.class_name.as_deref(),
                    sheets.iter().copied(),
                );
                element.cascade = (!cascade.is_empty()).then_some(cascade);
            }
        }
        Ok(())
    }

    /// Replace every element's cascade and inline style with one shared
    /// class in the `output` stylesheet, then link `doc` to `output` only.
    ///
    /// Elements whose effective style is empty lose their class attribute.
    /// Returns the number of elements that received a class.
    pub fn canonicalize_styles(&mut self, doc: DocumentId, output: &ResourceRef) -> Result<usize> {
        let idx = self.style_index(output)?;
        let Self {
            documents, styles, ..
        } = self;
        let stylesheet = &mut styles[idx].stylesheet;
        let document = documents
            .get_mut(doc.0 as usize)
            .ok_or(Error::UnknownDocument(doc.0))?;

        let mut styled = 0;
        let nodes: Vec<NodeId> = document.iter_dfs(document.body()).collect();
        for node in nodes {
            let Some(element) = document.element_mut(node) else {
                continue;
            };
            let mut effective = element.cascade.take().unwrap_or_else(PropertySet::new);
            if let Some(inline) = element.style.take() {
                effective.merge(&inline);
            }
            if effective.is_empty() {
                element.class_name = None;
                continue;
            }
            let hint = element.classes().next().map(str::to_string);
            element.class_name = Some(stylesheet.make_class(hint.as_deref(), &effective));
            element.cascade = Some(effective);
            styled += 1;
        }

        document.clear_stylesheets();
        document.add_stylesheet(output.clone());
        Ok(styled)
    }

    /// Cascade and canonicalize every spine document into `output`.
    pub fn apply_styles(&mut self, output: &ResourceRef) -> Result<usize> {
        let spine = self.spine.clone();
        let mut styled = 0;
        for doc in spine {
            self.cascade_styles(doc)?;
            styled += self.canonicalize_styles(doc, output)?;
        }
        log::debug!(
            "{styled} styled elements share {} classes",
            self.stylesheet(output).map_or(0, Stylesheet::class_count)
        );
        Ok(styled)
    }

    /// Run the font subsetter over every spine document and embed the
    /// fonts actually used, declaring them in `style`.
    pub fn subset_fonts(
        &mut self,
        locator: &dyn FontLocator,
        style: &ResourceRef,
    ) -> Result<FontReport> {
        let mut subsetter = FontSubsetter::new(locator);
        for document in self.documents() {
            subsetter.scan_document(document);
        }
        subsetter.add_fonts(self, style)?;
        Ok(subsetter.report())
    }
}
