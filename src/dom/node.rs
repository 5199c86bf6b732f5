//! Content nodes: elements and text runs.

use std::borrow::Cow;

use crate::css::PropertySet;
use crate::publication::{ResourceRef, XRefId};

/// Handle of a node within one [`crate::dom::Document`].
///
/// Handles are only meaningful inside the document that issued them; a node
/// moved to another document gets a new handle there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// A hyperlink: either an external URL or an internal cross-reference.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Hyperlink {
    pub href: Option<String>,
    pub target: Option<XRefId>,
}

/// An image referencing a publication resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub resource: ResourceRef,
    pub alt: Option<String>,
}

/// Table cell attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableCell {
    pub header: bool,
    pub colspan: u32,
    pub rowspan: u32,
    pub align: Option<String>,
}

impl Default for TableCell {
    fn default() -> Self {
        Self {
            header: false,
            colspan: 1,
            rowspan: 1,
            align: None,
        }
    }
}

/// Element kind. Determines the tag name and the splitting policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementKind {
    Body,
    Division,
    Section,
    /// `h1`-`h6`; levels outside 1..=6 are clamped when rendered.
    Heading(u8),
    Paragraph,
    Span,
    Strong,
    Bold,
    Emphasis,
    Italic,
    Hyperlink(Hyperlink),
    Image(Image),
    Table,
    TableRow,
    TableCell(TableCell),
    UnorderedList,
    OrderedList,
    ListItem,
    DefinitionList,
    DefinitionTerm,
    DefinitionDescription,
    BlockQuote,
    Preformatted,
    LineBreak,
    HorizontalRule,
    /// Any other element, by tag name.
    Other(String),
}

impl ElementKind {
    pub fn tag_name(&self) -> &str {
        match self {
            ElementKind::Body => "body",
            ElementKind::Division => "div",
            ElementKind::Section => "section",
            ElementKind::Heading(level) => match level {
                0 | 1 => "h1",
                2 => "h2",
                3 => "h3",
                4 => "h4",
                5 => "h5",
                _ => "h6",
            },
            ElementKind::Paragraph => "p",
            ElementKind::Span => "span",
            ElementKind::Strong => "strong",
            ElementKind::Bold => "b",
            ElementKind::Emphasis => "em",
            ElementKind::Italic => "i",
            ElementKind::Hyperlink(_) => "a",
            ElementKind::Image(_) => "img",
            ElementKind::Table => "table",
            ElementKind::TableRow => "tr",
            ElementKind::TableCell(cell) if cell.header => "th",
            ElementKind::TableCell(_) => "td",
            ElementKind::UnorderedList => "ul",
            ElementKind::OrderedList => "ol",
            ElementKind::ListItem => "li",
            ElementKind::DefinitionList => "dl",
            ElementKind::DefinitionTerm => "dt",
            ElementKind::DefinitionDescription => "dd",
            ElementKind::BlockQuote => "blockquote",
            ElementKind::Preformatted => "pre",
            ElementKind::LineBreak => "br",
            ElementKind::HorizontalRule => "hr",
            ElementKind::Other(name) => name,
        }
    }

    /// Heading level (1-6) for heading elements.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            ElementKind::Heading(level) => Some((*level).clamp(1, 6)),
            _ => None,
        }
    }
}

/// An element of the content tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub kind: ElementKind,
    pub class_name: Option<String>,
    /// Inline style.
    pub style: Option<PropertySet>,
    /// Resolved cascade result.
    pub cascade: Option<PropertySet>,
    /// `id` attribute; registered in the owning document's identifier map.
    pub(crate) id: Option<String>,
    /// Cross-reference targeting this element, owned by it.
    pub(crate) self_ref: Option<XRefId>,
    pub lang: Option<String>,
    pub dir: Option<String>,
    pub title: Option<String>,
    /// Always start a new document at this element when splitting.
    pub force_peel: bool,
}

impl Element {
    pub fn new(kind: ElementKind) -> Self {
        Self {
            kind,
            class_name: None,
            style: None,
            cascade: None,
            id: None,
            self_ref: None,
            lang: None,
            dir: None,
            title: None,
            force_peel: false,
        }
    }

    pub fn heading(level: u8) -> Self {
        Self::new(ElementKind::Heading(level))
    }

    pub fn paragraph() -> Self {
        Self::new(ElementKind::Paragraph)
    }

    pub fn link(href: impl Into<String>) -> Self {
        Self::new(ElementKind::Hyperlink(Hyperlink {
            href: Some(href.into()),
            target: None,
        }))
    }

    pub fn internal_link(target: XRefId) -> Self {
        Self::new(ElementKind::Hyperlink(Hyperlink {
            href: None,
            target: Some(target),
        }))
    }

    pub fn image(resource: ResourceRef) -> Self {
        Self::new(ElementKind::Image(Image {
            resource,
            alt: None,
        }))
    }

    pub fn with_class(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = Some(class_name.into());
        self
    }

    /// Set the inline style from a declaration block.
    pub fn with_style(mut self, declarations: &str) -> Self {
        let style = PropertySet::parse(declarations);
        self.style = (!style.is_empty()).then_some(style);
        self
    }

    pub fn with_lang(mut self, lang: impl Into<String>) -> Self {
        self.lang = Some(lang.into());
        self
    }

    pub fn with_force_peel(mut self) -> Self {
        self.force_peel = true;
        self
    }

    pub fn tag_name(&self) -> &str {
        self.kind.tag_name()
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn self_ref(&self) -> Option<XRefId> {
        self.self_ref
    }

    /// Individual class tokens of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.class_name
            .as_deref()
            .into_iter()
            .flat_map(str::split_whitespace)
    }

    /// Copy of this element without identity: no id, no self reference and
    /// no forced break. Used for the continuation of a split container.
    pub fn shallow_clone(&self) -> Self {
        Self {
            kind: self.kind.clone(),
            class_name: self.class_name.clone(),
            style: self.style.clone(),
            cascade: self.cascade.clone(),
            id: None,
            self_ref: None,
            lang: self.lang.clone(),
            dir: self.dir.clone(),
            title: self.title.clone(),
            force_peel: false,
        }
    }

    /// Attributes as they would be serialized, excluding internal link hrefs
    /// (those need the publication to resolve).
    pub fn attributes(&self) -> Vec<(&'static str, Cow<'_, str>)> {
        let mut attrs = Vec::new();
        if let Some(id) = &self.id {
            attrs.push(("id", Cow::Borrowed(id.as_str())));
        }
        if let Some(class) = &self.class_name {
            attrs.push(("class", Cow::Borrowed(class.as_str())));
        }
        if let Some(style) = &self.style {
            attrs.push(("style", Cow::Owned(style.to_inline())));
        }
        for (name, value) in [("lang", &self.lang), ("dir", &self.dir), ("title", &self.title)] {
            if let Some(value) = value {
                attrs.push((name, Cow::Borrowed(value.as_str())));
            }
        }
        match &self.kind {
            ElementKind::Hyperlink(link) => {
                if let Some(href) = &link.href {
                    attrs.push(("href", Cow::Borrowed(href.as_str())));
                }
            }
            ElementKind::Image(image) => {
                attrs.push(("src", Cow::Borrowed(image.resource.name())));
                if let Some(alt) = &image.alt {
                    attrs.push(("alt", Cow::Borrowed(alt.as_str())));
                }
            }
            ElementKind::TableCell(cell) => {
                if cell.colspan > 1 {
                    attrs.push(("colspan", Cow::Owned(cell.colspan.to_string())));
                }
                if cell.rowspan > 1 {
                    attrs.push(("rowspan", Cow::Owned(cell.rowspan.to_string())));
                }
                if let Some(align) = &cell.align {
                    attrs.push(("align", Cow::Borrowed(align.as_str())));
                }
            }
            _ => {}
        }
        attrs
    }
}

/// A node of the content tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Node::Text(text) => Some(text),
            Node::Element(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_names() {
        assert_eq!(ElementKind::Heading(2).tag_name(), "h2");
        assert_eq!(ElementKind::Heading(9).tag_name(), "h6");
        assert_eq!(
            ElementKind::TableCell(TableCell {
                header: true,
                ..Default::default()
            })
            .tag_name(),
            "th"
        );
        assert_eq!(ElementKind::Other("aside".into()).tag_name(), "aside");
    }

    #[test]
    fn test_shallow_clone_drops_identity() {
        let mut el = Element::paragraph()
            .with_class("note")
            .with_style("color: red")
            .with_force_peel();
        el.id = Some("p1".to_string());
        el.self_ref = Some(XRefId(3));

        let clone = el.shallow_clone();
        assert_eq!(clone.class_name.as_deref(), Some("note"));
        assert_eq!(clone.style, el.style);
        assert!(clone.id.is_none());
        assert!(clone.self_ref.is_none());
        assert!(!clone.force_peel);
    }

    #[test]
    fn test_attributes() {
        let mut el = Element::link("http://example.com").with_class("ext");
        el.id = Some("l1".to_string());
        let attrs = el.attributes();
        let names: Vec<_> = attrs.iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["id", "class", "href"]);
        assert_eq!(attrs[2].1, "http://example.com");
    }

    #[test]
    fn test_classes() {
        let el = Element::paragraph().with_class(" a  b ");
        assert_eq!(el.classes().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(Element::paragraph().classes().count(), 0);
    }
}
