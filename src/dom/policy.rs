//! Per-kind splitting policy.
//!
//! Each element kind answers the same questions the splitter asks: can its
//! children be distributed over two documents, and how strongly does it want
//! a document to start right before it.

use super::node::{Element, ElementKind};
use crate::config::SplitPolicy;
use crate::publication::Usage;

impl ElementKind {
    /// Structural containers whose children form a sequence of blocks.
    pub fn is_section(&self) -> bool {
        matches!(
            self,
            ElementKind::Body | ElementKind::Division | ElementKind::Section
        )
    }

    /// Whether the splitter may cut between this element's children.
    ///
    /// Tables, lists and every non-section element are measured as a whole.
    pub fn can_peel_child(&self) -> bool {
        self.is_section()
    }

    /// Bonus of the bare kind; `-1` means "never break here".
    pub fn base_peeling_bonus(&self, policy: &SplitPolicy) -> i64 {
        match self {
            ElementKind::Heading(level) => {
                let idx = usize::from((*level).clamp(1, 6)) - 1;
                policy.heading_bonus[idx]
            }
            ElementKind::Division | ElementKind::Section => policy.division_bonus,
            ElementKind::Paragraph => policy.paragraph_bonus,
            ElementKind::DefinitionList
            | ElementKind::UnorderedList
            | ElementKind::OrderedList
            | ElementKind::BlockQuote
            | ElementKind::Preformatted => 0,
            _ => -1,
        }
    }
}

impl Element {
    /// Whether this element was flagged to always start a new document.
    pub fn force_peel(&self) -> bool {
        self.force_peel
    }

    /// Effective bonus, given the usage of the element's own cross-reference.
    ///
    /// TOC targets get at least the TOC floor; page anchors get a large flat
    /// addition so a break lands exactly on them.
    pub fn peeling_bonus(&self, usage: Usage, policy: &SplitPolicy) -> i64 {
        let mut bonus = self.kind.base_peeling_bonus(policy);
        if usage.contains(Usage::TOC) {
            bonus = bonus.max(policy.toc_target_floor);
        }
        if usage.contains(Usage::PAGE) {
            bonus += policy.page_anchor_bonus;
        }
        bonus
    }
}
