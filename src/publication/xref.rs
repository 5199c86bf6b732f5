//! Cross-references between documents.
//!
//! An [`XRef`] names a location in the publication: the top of a document, an
//! element inside it, or a raw fragment identifier. References are stored in
//! an [`XRefTable`] owned by the publication and addressed by [`XRefId`], so
//! nodes and TOC entries can hold them without borrowing anything.

use std::fmt;
use std::ops::BitOr;

use crate::dom::{DocumentId, NodeId};

/// Handle of a cross-reference in its publication's [`XRefTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct XRefId(pub u32);

/// How a cross-reference is used. Combine with `|`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Usage(u8);

impl Usage {
    pub const NONE: Usage = Usage(0);
    /// Target of a table-of-contents entry.
    pub const TOC: Usage = Usage(1);
    /// Designated page anchor: a document break is strongly preferred here.
    pub const PAGE: Usage = Usage(2);
    /// Target of an ordinary hyperlink.
    pub const REFERENCE: Usage = Usage(4);

    pub fn contains(self, other: Usage) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Usage) {
        self.0 |= other.0;
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Usage {
    type Output = Usage;

    fn bitor(self, rhs: Usage) -> Usage {
        Usage(self.0 | rhs.0)
    }
}

/// Where a cross-reference points within its document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Start of the document.
    Top,
    /// A specific element; its `id` is assigned lazily.
    Element(NodeId),
    /// A raw fragment identifier, resolved by name.
    Fragment(String),
}

/// Navigation order state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayOrder {
    #[default]
    Unassigned,
    /// Needs a number at the next play-order pass.
    Requested,
    Assigned(u32),
}

impl PlayOrder {
    pub fn number(self) -> Option<u32> {
        match self {
            PlayOrder::Assigned(n) => Some(n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XRef {
    document: DocumentId,
    anchor: Anchor,
    usage: Usage,
    play_order: PlayOrder,
}

impl XRef {
    pub fn document(&self) -> DocumentId {
        self.document
    }

    pub fn anchor(&self) -> &Anchor {
        &self.anchor
    }

    pub fn usage(&self) -> Usage {
        self.usage
    }

    pub fn play_order(&self) -> PlayOrder {
        self.play_order
    }
}

impl fmt::Display for XRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.anchor {
            Anchor::Top => write!(f, "document {}", self.document.0),
            Anchor::Element(node) => write!(f, "document {} node {}", self.document.0, node.0),
            Anchor::Fragment(fragment) => write!(f, "document {} #{fragment}", self.document.0),
        }
    }
}

/// All cross-references of a publication.
#[derive(Debug, Clone)]
pub struct XRefTable {
    refs: Vec<XRef>,
    next_play_order: u32,
}

impl Default for XRefTable {
    fn default() -> Self {
        Self::new()
    }
}

impl XRefTable {
    pub fn new() -> Self {
        Self {
            refs: Vec::new(),
            next_play_order: 1,
        }
    }

    pub fn create(&mut self, document: DocumentId, anchor: Anchor, usage: Usage) -> XRefId {
        let id = XRefId(self.refs.len() as u32);
        self.refs.push(XRef {
            document,
            anchor,
            usage,
            play_order: PlayOrder::Unassigned,
        });
        id
    }

    pub fn get(&self, id: XRefId) -> Option<&XRef> {
        self.refs.get(id.0 as usize)
    }

    pub fn usage(&self, id: XRefId) -> Usage {
        self.get(id).map(XRef::usage).unwrap_or_default()
    }

    pub fn add_usage(&mut self, id: XRefId, usage: Usage) {
        if let Some(xref) = self.refs.get_mut(id.0 as usize) {
            xref.usage.insert(usage);
        }
    }

    /// Mark a reference as needing a play order. Numbered references are
    /// left alone.
    pub fn request_play_order(&mut self, id: XRefId) {
        if let Some(xref) = self.refs.get_mut(id.0 as usize)
            && xref.play_order == PlayOrder::Unassigned
        {
            xref.play_order = PlayOrder::Requested;
        }
    }

    /// Give a requested reference the next play-order number.
    ///
    /// Returns the number when one was assigned by this call.
    pub(crate) fn number(&mut self, id: XRefId) -> Option<u32> {
        let xref = self.refs.get_mut(id.0 as usize)?;
        if xref.play_order != PlayOrder::Requested {
            return None;
        }
        let n = self.next_play_order;
        self.next_play_order += 1;
        xref.play_order = PlayOrder::Assigned(n);
        Some(n)
    }

    /// Point an element reference at the element's new home.
    pub(crate) fn retarget_element(&mut self, id: XRefId, document: DocumentId, node: NodeId) {
        if let Some(xref) = self.refs.get_mut(id.0 as usize) {
            xref.document = document;
            xref.anchor = Anchor::Element(node);
        }
    }

    /// Move every fragment reference naming `fragment` in `from` to `to`.
    pub(crate) fn retarget_fragments(&mut self, from: DocumentId, fragment: &str, to: DocumentId) {
        for xref in &mut self.refs {
            if xref.document == from
                && matches!(&xref.anchor, Anchor::Fragment(name) if name == fragment)
            {
                xref.document = to;
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (XRefId, &XRef)> {
        self.refs
            .iter()
            .enumerate()
            .map(|(i, xref)| (XRefId(i as u32), xref))
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}
