//! Play-order numbering, heading-based TOC and NCX output.

use std::collections::HashMap;

use super::ncx::{NavPoint, generate_ncx};
use super::toc::{HeadingMark, TocEntry, nest_headings};
use super::xref::{Anchor, PlayOrder, Usage, XRefId};
use super::Publication;
use crate::dom::{DocumentId, NodeId};
use crate::error::Result;

/// Requested references of one document, bucketed by anchor.
#[derive(Default)]
struct Pending {
    top: Vec<XRefId>,
    elements: HashMap<NodeId, Vec<XRefId>>,
    fragments: HashMap<String, Vec<XRefId>>,
}

impl Publication {
    /// Number every reference that requested a play order.
    ///
    /// Walks the spine in order. Within a document the document's own
    /// references come first, then element and fragment references in
    /// depth-first order. Fragments that match no element are numbered last
    /// in their document. Already numbered references keep their number.
    /// Returns how many references were numbered.
    pub fn assign_play_order(&mut self) -> usize {
        let mut pending: HashMap<DocumentId, Pending> = HashMap::new();
        for (id, xref) in self.xrefs.iter() {
            if xref.play_order() != PlayOrder::Requested {
                continue;
            }
            let bucket = pending.entry(xref.document()).or_default();
            match xref.anchor() {
                Anchor::Top => bucket.top.push(id),
                Anchor::Element(node) => bucket.elements.entry(*node).or_default().push(id),
                Anchor::Fragment(name) => bucket.fragments.entry(name.clone()).or_default().push(id),
            }
        }

        let mut order: Vec<XRefId> = Vec::new();
        for &doc_id in &self.spine {
            let (Some(mut bucket), Some(doc)) = (pending.remove(&doc_id), self.document(doc_id))
            else {
                continue;
            };
            order.append(&mut bucket.top);
            for node in doc.iter_dfs(doc.body()) {
                if let Some(refs) = bucket.elements.remove(&node) {
                    order.extend(refs);
                }
                if let Some(id) = doc.element(node).and_then(|el| el.id())
                    && let Some(refs) = bucket.fragments.remove(id)
                {
                    order.extend(refs);
                }
            }

            let mut leftover: Vec<(String, Vec<XRefId>)> = bucket.fragments.into_iter().collect();
            leftover.sort();
            for (fragment, refs) in leftover {
                log::warn!("{}: fragment #{fragment} does not match any element", doc.name());
                order.extend(refs);
            }
            let mut detached: Vec<XRefId> = bucket.elements.into_values().flatten().collect();
            detached.sort();
            order.extend(detached);
        }

        let numbered = order
            .into_iter()
            .filter(|&id| self.xrefs.number(id).is_some())
            .count();
        log::debug!("assigned play order to {numbered} references");
        numbered
    }

    /// Append TOC entries for the `h1`..`h<levels>` headings of every spine
    /// document, nested by level.
    pub fn build_toc_from_headings(&mut self, levels: u8) -> Result<()> {
        let levels = levels.clamp(1, 6);
        let mut found: Vec<(DocumentId, NodeId, u8, String)> = Vec::new();
        for doc in self.documents() {
            for node in doc.iter_dfs(doc.body()) {
                let Some(level) = doc.element(node).and_then(|el| el.kind.heading_level()) else {
                    continue;
                };
                if level > levels {
                    continue;
                }
                let title = doc.text_content(node).split_whitespace().collect::<Vec<_>>().join(" ");
                if !title.is_empty() {
                    found.push((doc.id(), node, level, title));
                }
            }
        }

        let mut marks = Vec::with_capacity(found.len());
        for (doc, node, level, title) in found {
            let target = self.element_xref(doc, node, Usage::TOC)?;
            marks.push(HeadingMark { level, title, target });
        }

        let (entries, _) = nest_headings(&marks, 0, 1);
        self.toc.children.extend(entries);
        Ok(())
    }

    /// Resolve the TOC into navigation points relative to the NCX file,
    /// numbering play order first.
    pub fn nav_points(&mut self) -> Result<Vec<NavPoint>> {
        self.request_toc_play_order();
        self.assign_play_order();
        let toc = self.toc.clone();
        let base = self.config.ncx_name.clone();
        self.resolve_entries(&toc.children, &base)
    }

    fn resolve_entries(&mut self, entries: &[TocEntry], base: &str) -> Result<Vec<NavPoint>> {
        let mut points = Vec::new();
        for entry in entries {
            let children = self.resolve_entries(&entry.children, base)?;
            match entry.target {
                Some(target) => {
                    let src = self.href_from(base, target)?;
                    let play_order = self
                        .xrefs
                        .get(target)
                        .and_then(|xref| xref.play_order().number())
                        .unwrap_or_default();
                    points.push(NavPoint {
                        label: entry.title.clone(),
                        src,
                        play_order,
                        children,
                    });
                }
                // nothing to point at: lift the children one level
                None => points.extend(children),
            }
        }
        Ok(points)
    }

    /// Render `toc.ncx` for this publication.
    pub fn ncx(&mut self, title: &str) -> Result<String> {
        let points = self.nav_points()?;
        Ok(generate_ncx(&self.identifier, title, &points))
    }
}
