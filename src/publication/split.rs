//! Publication-level splitting of oversized documents.

use super::Publication;
use crate::dom::{Document, DocumentId, size_limit};
use crate::error::{Error, Result};

impl Publication {
    /// Name for a continuation of `name`: `stem-N.ext` with the first free `N`.
    fn continuation_name(&self, name: &str) -> String {
        let (stem, ext) = match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() && !ext.contains('/') => (stem, Some(ext)),
            _ => (name, None),
        };
        (1..)
            .map(|n| match ext {
                Some(ext) => format!("{stem}-{n}.{ext}"),
                None => format!("{stem}-{n}"),
            })
            .find(|candidate| !self.has_resource(candidate))
            .unwrap_or_else(|| format!("{stem}-split"))
    }

    /// Peel one suffix off `doc` into a new document placed right after it in
    /// the spine. Returns the new document, or `None` if `doc` fits in
    /// `target_size` or has no usable break point.
    pub fn split_document(
        &mut self,
        doc: DocumentId,
        target_size: usize,
    ) -> Result<Option<DocumentId>> {
        let source = self.document(doc).ok_or(Error::UnknownDocument(doc.0))?;
        // continuations of a continuation are numbered from the original name
        let root = source
            .split_from
            .clone()
            .unwrap_or_else(|| source.name().to_string());
        let mut next = Document::new(self.next_document_id(), self.continuation_name(&root));
        next.split_from = Some(root);

        let Self {
            documents,
            xrefs,
            config,
            ..
        } = self;
        let source = documents
            .get_mut(doc.0 as usize)
            .ok_or(Error::UnknownDocument(doc.0))?;
        if !source.peel_off_back(&mut next, xrefs, &config.split, target_size) {
            return Ok(None);
        }

        self.insert_document_after(doc, next).map(Some)
    }

    /// Split every spine document until each fits `target_size` or cannot be
    /// split further. Returns the number of documents created.
    ///
    /// Documents left above the target hold content with no break point
    /// (for instance one large table); they are kept whole and logged.
    pub fn split_oversized(&mut self, target_size: usize) -> Result<usize> {
        let mut created = 0;
        let mut index = 0;
        // the spine grows while we walk it; each new part is visited in turn
        while index < self.spine.len() {
            let doc = self.spine[index];
            if let Some(next) = self.split_document(doc, target_size)? {
                log::debug!("{} continues in {}", self.document_name(doc), self.document_name(next));
                created += 1;
            } else if let Some(document) = self.document(doc) {
                let size = document.estimated_document_size(&self.config.split);
                if size > size_limit(target_size) {
                    log::warn!(
                        "{} stays at ~{size} bytes (target {target_size}): no break point",
                        document.name()
                    );
                }
            }
            index += 1;
        }
        Ok(created)
    }

    fn document_name(&self, doc: DocumentId) -> &str {
        self.document(doc).map(Document::name).unwrap_or_default()
    }
}
