//! Table of contents tree.

use super::xref::{XRefId, XRefTable};

/// A TOC entry: a title, an optional target and nested entries.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TocEntry {
    pub title: String,
    pub target: Option<XRefId>,
    pub children: Vec<TocEntry>,
}

impl TocEntry {
    pub fn new(title: impl Into<String>, target: Option<XRefId>) -> Self {
        Self {
            title: title.into(),
            target,
            children: Vec::new(),
        }
    }

    /// Append a child entry and return it for further nesting.
    pub fn add(&mut self, entry: TocEntry) -> &mut TocEntry {
        self.children.push(entry);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Request play order for this entry's target and every descendant's.
    pub fn request_play_order(&self, xrefs: &mut XRefTable) {
        if let Some(target) = self.target {
            xrefs.request_play_order(target);
        }
        for child in &self.children {
            child.request_play_order(xrefs);
        }
    }

    /// Number of entries below this one.
    pub fn len(&self) -> usize {
        self.children.iter().map(|child| 1 + child.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Depth of the deepest descendant (0 for a leaf).
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| 1 + child.depth())
            .max()
            .unwrap_or(0)
    }

    /// Entries below this one in pre-order, with their depth (1 = child).
    pub fn iter(&self) -> impl Iterator<Item = (usize, &TocEntry)> {
        let mut stack: Vec<(usize, &TocEntry)> =
            self.children.iter().rev().map(|child| (1, child)).collect();
        std::iter::from_fn(move || {
            let (depth, entry) = stack.pop()?;
            stack.extend(entry.children.iter().rev().map(|child| (depth + 1, child)));
            Some((depth, entry))
        })
    }
}

/// A heading found while scanning documents.
#[derive(Debug, Clone)]
pub(crate) struct HeadingMark {
    pub(crate) level: u8,
    pub(crate) title: String,
    pub(crate) target: XRefId,
}

/// Nest a flat run of headings: each heading collects the following deeper
/// headings as children, stopping at the first heading above `min_level`.
pub(crate) fn nest_headings(marks: &[HeadingMark], mut i: usize, min_level: u8) -> (Vec<TocEntry>, usize) {
    let mut entries = Vec::new();

    while i < marks.len() {
        let mark = &marks[i];
        if mark.level < min_level {
            break;
        }
        i += 1;
        let (children, next_i) = nest_headings(marks, i, mark.level + 1);
        i = next_i;
        entries.push(TocEntry {
            title: mark.title.clone(),
            target: Some(mark.target),
            children,
        });
    }

    (entries, i)
}
