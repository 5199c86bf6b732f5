//! Splitting oversized documents ("peeling").
//!
//! A split runs in two passes. The scan walks the tree once with a shrinking
//! byte budget and records the path to the first element that elects to start
//! a new document. The move pass then walks that path bottom-up: the chosen
//! element and every later sibling at each level move to the new document,
//! wrapped in shallow clones of their ancestors. The original keeps the
//! prefix, so concatenating both documents yields the original sequence.

use super::document::{Document, Slot};
use super::node::{Node, NodeId};
use crate::config::SplitPolicy;
use crate::publication::{Usage, XRefTable};

enum Visit {
    /// Nothing triggered inside this subtree.
    Continue,
    /// This element starts the new document.
    PeelSelf,
    /// A descendant starts the new document; the path has been recorded.
    Found,
}

struct PeelScan<'a> {
    doc: &'a Document,
    xrefs: &'a XRefTable,
    policy: &'a SplitPolicy,
    budget: i64,
}

impl PeelScan<'_> {
    /// `path` collects `(container, child index)` pairs, innermost first.
    fn visit(&mut self, node: NodeId, first: bool, path: &mut Vec<(NodeId, usize)>) -> Visit {
        let doc = self.doc;
        let policy = self.policy;
        let Some(element) = doc.element(node) else {
            return Visit::Continue;
        };

        self.budget -= doc.element_size(node, policy);

        if !first {
            if element.force_peel() {
                return Visit::PeelSelf;
            }
            let usage = element_usage(doc, node, self.xrefs);
            let bonus = element.peeling_bonus(usage, policy);
            if bonus >= 0 && bonus > self.budget {
                return Visit::PeelSelf;
            }
        }

        let children = doc.children(node);
        if element.kind.can_peel_child() {
            for (index, &child) in children.iter().enumerate() {
                match doc.node(child) {
                    Some(Node::Element(_)) => match self.visit(child, first && index == 0, path) {
                        Visit::Continue => {}
                        // Breaking before the first child is breaking before
                        // this element; no empty shell is left behind.
                        Visit::PeelSelf if index == 0 => return Visit::PeelSelf,
                        Visit::PeelSelf | Visit::Found => {
                            path.push((node, index));
                            return Visit::Found;
                        }
                    },
                    Some(Node::Text(text)) => self.budget -= text.len() as i64,
                    None => {}
                }
                self.budget -= policy.separator;
            }
        } else {
            for &child in children {
                self.budget -= doc.estimated_size(child, policy) + policy.separator;
            }
        }

        Visit::Continue
    }
}

/// `target_size` as a signed byte count; targets beyond `i64::MAX` clamp.
pub(crate) fn size_limit(target_size: usize) -> i64 {
    i64::try_from(target_size).unwrap_or(i64::MAX)
}

impl Document {
    /// Find where a new document should start, as a top-down path of
    /// `(container, index of the first child to move)`.
    fn find_split(
        &self,
        xrefs: &XRefTable,
        policy: &SplitPolicy,
        target_size: usize,
    ) -> Option<Vec<(NodeId, usize)>> {
        let mut scan = PeelScan {
            doc: self,
            xrefs,
            policy,
            budget: size_limit(target_size).saturating_add(policy.slack),
        };
        let mut path = Vec::new();
        match scan.visit(self.body(), true, &mut path) {
            Visit::Found => {
                path.reverse();
                Some(path)
            }
            Visit::Continue | Visit::PeelSelf => None,
        }
    }

    /// Move the content after the split point into `new_doc`.
    ///
    /// Returns the root of the moved content in `new_doc` (a shallow clone of
    /// this document's body), or `None` when no split point triggers.
    pub fn peel(
        &mut self,
        new_doc: &mut Document,
        xrefs: &mut XRefTable,
        policy: &SplitPolicy,
        target_size: usize,
    ) -> Option<NodeId> {
        let path = self.find_split(xrefs, policy, target_size)?;

        let mut carried: Option<NodeId> = None;
        for &(container, index) in path.iter().rev() {
            let clone = match self.element(container) {
                Some(element) => element.shallow_clone(),
                None => continue,
            };
            let clone_id = new_doc.alloc(Node::Element(clone));

            // The innermost level moves the chosen child itself; outer levels
            // keep their (now truncated) child and move only what follows it.
            let start = match carried {
                Some(inner) => {
                    new_doc.attach(clone_id, inner);
                    index + 1
                }
                None => index,
            };

            let moved = self.children(container).get(start..).unwrap_or(&[]).to_vec();
            for child in moved {
                if let Some(new_child) = self.transfer_subtree(child, new_doc, xrefs) {
                    new_doc.attach(clone_id, new_child);
                }
            }
            self.truncate_children(container, start);
            carried = Some(clone_id);
        }

        carried
    }

    /// Split this document if it exceeds `target_size`.
    ///
    /// `new_doc` receives this document's stylesheet references and, on
    /// success, the peeled-off suffix as its body. Returns whether a split
    /// happened; a document that already fits is left untouched.
    pub fn peel_off_back(
        &mut self,
        new_doc: &mut Document,
        xrefs: &mut XRefTable,
        policy: &SplitPolicy,
        target_size: usize,
    ) -> bool {
        for stylesheet in self.stylesheets() {
            new_doc.add_stylesheet(stylesheet.clone());
        }
        new_doc.lang = self.lang.clone();
        new_doc.title = self.title.clone();

        let size = self.estimated_document_size(policy);
        if size <= size_limit(target_size) {
            return false;
        }

        match self.peel(new_doc, xrefs, policy, target_size) {
            Some(body) => {
                new_doc.replace_body(body);
                log::debug!(
                    "split {} ({size} bytes) into {} + {} bytes ({})",
                    self.name(),
                    self.estimated_document_size(policy),
                    new_doc.estimated_document_size(policy),
                    new_doc.name()
                );
                true
            }
            None => false,
        }
    }

    /// Move a node and its subtree to `new_doc`, detaching it from its parent.
    ///
    /// Identifiers are re-keyed in the new document's identifier map and every
    /// cross-reference targeting a moved element (its own reference, or a
    /// fragment naming its id) is re-pointed at the new document.
    pub fn transfer_to_document(
        &mut self,
        node: NodeId,
        new_doc: &mut Document,
        xrefs: &mut XRefTable,
    ) -> Option<NodeId> {
        if let Some(parent) = self.parent(node) {
            let keep: Vec<NodeId> = self
                .children(parent)
                .iter()
                .copied()
                .filter(|&child| child != node)
                .collect();
            self.truncate_children(parent, 0);
            for child in keep {
                self.attach(parent, child);
            }
        }
        self.transfer_subtree(node, new_doc, xrefs)
    }

    fn transfer_subtree(
        &mut self,
        node: NodeId,
        new_doc: &mut Document,
        xrefs: &mut XRefTable,
    ) -> Option<NodeId> {
        let Slot {
            node: data,
            children,
            ..
        } = self.take_slot(node)?;

        let (id, self_ref) = match &data {
            Node::Element(element) => (element.id.clone(), element.self_ref),
            Node::Text(_) => (None, None),
        };
        let new_id = new_doc.alloc(data);

        if let Some(id) = id {
            self.unregister_id(&id);
            xrefs.retarget_fragments(self.id(), &id, new_doc.id());
            new_doc.register_id(id, new_id);
        }
        if let Some(xref) = self_ref {
            xrefs.retarget_element(xref, new_doc.id(), new_id);
        }

        for child in children {
            if let Some(new_child) = self.transfer_subtree(child, new_doc, xrefs) {
                new_doc.attach(new_id, new_child);
            }
        }
        Some(new_id)
    }
}

/// Usage recorded on an element's own reference.
fn element_usage(doc: &Document, node: NodeId, xrefs: &XRefTable) -> Usage {
    doc.element(node)
        .and_then(|element| element.self_ref())
        .map(|xref| xrefs.usage(xref))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DocumentId, Element, ElementKind};
    use crate::publication::Anchor;

    fn policy() -> SplitPolicy {
        SplitPolicy::default()
    }

    /// Body with `h1("Chapter One")` and six ~800 byte paragraphs.
    fn chapter() -> Document {
        let mut doc = Document::new(DocumentId(0), "OPS/ch1.xhtml");
        let body = doc.body();
        let h1 = doc.add_element(body, Element::heading(1)).unwrap();
        doc.add_text(h1, "Chapter One").unwrap();
        for i in 0..6 {
            let p = doc.add_element(body, Element::paragraph()).unwrap();
            doc.add_text(p, format!("{i}").repeat(800)).unwrap();
        }
        doc
    }

    fn texts(doc: &Document) -> Vec<String> {
        doc.children(doc.body())
            .iter()
            .map(|&child| doc.text_content(child))
            .collect()
    }

    #[test]
    fn test_chapter_split() {
        let mut doc = chapter();
        let mut xrefs = XRefTable::new();
        let mut next = Document::new(DocumentId(1), "OPS/ch1-1.xhtml");

        assert!(doc.peel_off_back(&mut next, &mut xrefs, &policy(), 2000));

        let first = texts(&doc);
        assert_eq!(first[0], "Chapter One");
        assert_eq!(first.len(), 3);
        assert!(doc.estimated_document_size(&policy()) <= 2000);

        let second = texts(&next);
        assert_eq!(second.len(), 4);
        assert_eq!(second[0], "2".repeat(800));
        for &child in next.children(next.body()) {
            assert_eq!(next.element(child).unwrap().kind, ElementKind::Paragraph);
        }

        // keep splitting the remainder
        let mut third = Document::new(DocumentId(2), "OPS/ch1-2.xhtml");
        assert!(next.peel_off_back(&mut third, &mut xrefs, &policy(), 2000));
        assert!(next.estimated_document_size(&policy()) <= 2000);
        let mut fourth = Document::new(DocumentId(3), "OPS/ch1-3.xhtml");
        assert!(!third.peel_off_back(&mut fourth, &mut xrefs, &policy(), 2000));
        assert!(third.estimated_document_size(&policy()) <= 2000);
    }

    #[test]
    fn test_no_split_when_fits() {
        let mut doc = chapter();
        let before = texts(&doc);
        let size = doc.estimated_document_size(&policy()) as usize;
        let mut next = Document::new(DocumentId(1), "OPS/next.xhtml");

        assert!(!doc.peel_off_back(&mut next, &mut XRefTable::new(), &policy(), size));
        assert_eq!(texts(&doc), before);
        assert!(next.children(next.body()).is_empty());
    }

    #[test]
    fn test_table_is_never_split() {
        let mut doc = Document::new(DocumentId(0), "OPS/t.xhtml");
        let body = doc.body();
        let p = doc.add_element(body, Element::paragraph()).unwrap();
        doc.add_text(p, "intro").unwrap();
        let table = doc.add_element(body, Element::new(ElementKind::Table)).unwrap();
        for _ in 0..20 {
            let tr = doc.add_element(table, Element::new(ElementKind::TableRow)).unwrap();
            let td = doc
                .add_element(tr, Element::new(ElementKind::TableCell(Default::default())))
                .unwrap();
            doc.add_text(td, "x".repeat(200)).unwrap();
        }
        let tail = doc.add_element(body, Element::paragraph()).unwrap();
        doc.add_text(tail, "tail").unwrap();

        let mut next = Document::new(DocumentId(1), "OPS/t-1.xhtml");
        let split = doc.peel_off_back(&mut next, &mut XRefTable::new(), &policy(), 1000);

        assert!(split);
        // the table stays whole with the intro; only the tail moved
        assert_eq!(doc.children(body).len(), 2);
        assert_eq!(doc.children(table).len(), 20);
        assert_eq!(texts(&next), vec!["tail".to_string()]);
    }

    #[test]
    fn test_unbounded_target_never_splits() {
        let mut doc = Document::new(DocumentId(0), "OPS/u.xhtml");
        let body = doc.body();
        for _ in 0..2 {
            let h2 = doc.add_element(body, Element::heading(2)).unwrap();
            doc.add_text(h2, "x").unwrap();
        }

        let mut next = Document::new(DocumentId(1), "OPS/u-1.xhtml");
        assert!(!doc.peel_off_back(&mut next, &mut XRefTable::new(), &policy(), usize::MAX));
        assert_eq!(doc.children(body).len(), 2);
        assert!(next.children(next.body()).is_empty());
        assert_eq!(size_limit(usize::MAX), i64::MAX);
    }

    #[test]
    fn test_force_peel() {
        let mut doc = Document::new(DocumentId(0), "OPS/a.xhtml");
        let body = doc.body();
        let first = doc.add_element(body, Element::paragraph()).unwrap();
        doc.add_text(first, "a").unwrap();
        let forced = doc
            .add_element(body, Element::new(ElementKind::Division).with_force_peel())
            .unwrap();
        doc.add_text(forced, "b").unwrap();

        let mut next = Document::new(DocumentId(1), "OPS/b.xhtml");
        // tiny target, but a forced break wins regardless of the budget
        assert!(doc.peel_off_back(&mut next, &mut XRefTable::new(), &policy(), 1));
        assert_eq!(texts(&doc), vec!["a".to_string()]);
        assert_eq!(texts(&next), vec!["b".to_string()]);
    }

    #[test]
    fn test_nested_split_clones_container() {
        let mut doc = Document::new(DocumentId(0), "OPS/n.xhtml");
        let body = doc.body();
        let div = doc
            .add_element(body, Element::new(ElementKind::Division).with_class("chapter"))
            .unwrap();
        for i in 0..4 {
            let p = doc.add_element(div, Element::paragraph()).unwrap();
            doc.add_text(p, format!("{i}").repeat(600)).unwrap();
        }

        let mut next = Document::new(DocumentId(1), "OPS/n-1.xhtml");
        let policy = policy().with_slack(0);
        assert!(doc.peel_off_back(&mut next, &mut XRefTable::new(), &policy, 1500));

        let new_body = next.body();
        let clone = next.children(new_body)[0];
        let clone_el = next.element(clone).unwrap();
        assert_eq!(clone_el.kind, ElementKind::Division);
        assert_eq!(clone_el.class_name.as_deref(), Some("chapter"));

        let kept = doc.children(div).len();
        let moved = next.children(clone).len();
        assert!(kept >= 1 && moved >= 1);
        assert_eq!(kept + moved, 4);
    }

    #[test]
    fn test_transfer_retargets_references() {
        let mut doc = chapter();
        let mut xrefs = XRefTable::new();
        let last = *doc.children(doc.body()).last().unwrap();
        doc.set_id(last, "end").unwrap();
        let own = xrefs.create(doc.id(), Anchor::Element(last), Usage::REFERENCE);
        doc.element_mut(last).unwrap().self_ref = Some(own);
        let fragment = xrefs.create(doc.id(), Anchor::Fragment("end".into()), Usage::REFERENCE);

        let mut next = Document::new(DocumentId(7), "OPS/ch1-1.xhtml");
        assert!(doc.peel_off_back(&mut next, &mut xrefs, &policy(), 2000));

        assert!(doc.lookup_id("end").is_none());
        let moved = next.lookup_id("end").unwrap();
        let own = xrefs.get(own).unwrap();
        assert_eq!(own.document(), DocumentId(7));
        assert_eq!(own.anchor(), &Anchor::Element(moved));
        assert_eq!(xrefs.get(fragment).unwrap().document(), DocumentId(7));
    }

    #[test]
    fn test_transfer_to_document_detaches() {
        let mut doc = chapter();
        let body = doc.body();
        let second = doc.children(body)[1];
        let mut other = Document::new(DocumentId(1), "OPS/other.xhtml");

        let moved = doc
            .transfer_to_document(second, &mut other, &mut XRefTable::new())
            .unwrap();
        assert_eq!(doc.children(body).len(), 6);
        assert!(doc.node(second).is_none());
        assert_eq!(other.text_content(moved), "0".repeat(800));
    }

    #[test]
    fn test_page_anchor_pulls_break() {
        let mut doc = Document::new(DocumentId(0), "OPS/p.xhtml");
        let mut xrefs = XRefTable::new();
        let body = doc.body();
        let mut ids = Vec::new();
        for i in 0..3 {
            let p = doc.add_element(body, Element::paragraph()).unwrap();
            doc.add_text(p, format!("{i}").repeat(300)).unwrap();
            ids.push(p);
        }
        let anchor = xrefs.create(doc.id(), Anchor::Element(ids[1]), Usage::PAGE);
        doc.element_mut(ids[1]).unwrap().self_ref = Some(anchor);
        assert!(element_usage(&doc, ids[1], &xrefs).contains(Usage::PAGE));

        // paragraphs alone never pull a break at this budget
        let policy = policy().with_paragraph_bonus(0);
        let mut next = Document::new(DocumentId(1), "OPS/p-1.xhtml");
        assert!(doc.peel_off_back(&mut next, &mut xrefs, &policy, 800));
        assert_eq!(doc.children(body).len(), 1);
        assert_eq!(next.text_content(next.body()), "1".repeat(300) + &"2".repeat(300));
    }
}
