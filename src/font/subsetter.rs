//! Per-character font usage tracking and embedding.

use std::collections::{BTreeSet, HashMap};

use super::{FontHandle, FontKey, FontLocator, FontReport};
use crate::css::{FontFaceRule, FontStyle, FontWeight, PropertySet, parse_font_family};
use crate::dom::{Document, Element, ElementKind, NodeId};
use crate::error::{Error, Result};
use crate::publication::{Publication, ResourceRef};
use crate::util::{relative_href, sanitize_name};

/// Families left to the reading system.
const GENERIC_FAMILIES: &[&str] = &["serif", "sans-serif", "monospace"];

#[derive(Debug)]
struct SubsetEntry {
    key: FontKey,
    font: FontHandle,
    chars: BTreeSet<char>,
    /// Resource name once embedded by [`FontSubsetter::add_fonts`].
    embedded: Option<String>,
}

/// Font state of one element scope.
#[derive(Debug, Clone, Default)]
struct Context {
    families: Vec<String>,
    weight: FontWeight,
    style: FontStyle,
    /// Indices into `FontSubsetter::entries`, in family-list order.
    entries: Vec<usize>,
}

type ListKey = (Vec<String>, FontWeight, FontStyle);

/// Walks styled content and records which font draws each character.
///
/// Drive it like a tree walk: [`push`](Self::push) on entering an element,
/// [`play`](Self::play) for its text, [`pop`](Self::pop) on leaving. Then
/// [`add_fonts`](Self::add_fonts) embeds only the faces that drew something,
/// each reduced to the characters it drew.
pub struct FontSubsetter<'a> {
    locator: &'a dyn FontLocator,
    entries: Vec<SubsetEntry>,
    by_key: HashMap<FontKey, usize>,
    lists: HashMap<ListKey, Vec<usize>>,
    stack: Vec<Context>,
    missing: BTreeSet<FontKey>,
    prohibited: BTreeSet<FontKey>,
}

impl<'a> FontSubsetter<'a> {
    pub fn new(locator: &'a dyn FontLocator) -> Self {
        Self {
            locator,
            entries: Vec::new(),
            by_key: HashMap::new(),
            lists: HashMap::new(),
            stack: Vec::new(),
            missing: BTreeSet::new(),
            prohibited: BTreeSet::new(),
        }
    }

    /// Enter `element`: inherit the enclosing font context, then apply tag
    /// defaults, the cascade and the inline style, in that order.
    pub fn push(&mut self, element: &Element) {
        let mut context = self.stack.last().cloned().unwrap_or_default();

        match element.kind {
            ElementKind::Heading(_) | ElementKind::Strong | ElementKind::Bold => {
                context.weight = FontWeight::BOLD;
            }
            ElementKind::Emphasis | ElementKind::Italic => context.style = FontStyle::Italic,
            _ => {}
        }
        for properties in [&element.cascade, &element.style].into_iter().flatten() {
            apply_font_properties(&mut context, properties);
        }

        context.entries = self.resolve(&context.families, context.weight, context.style);
        self.stack.push(context);
    }

    /// Record the characters of `text` against the current context.
    ///
    /// Control characters are tried like any other; they are recorded only
    /// when a face has a glyph for them.
    pub fn play(&mut self, text: &str) {
        let Some(context) = self.stack.last() else {
            return;
        };
        if context.entries.is_empty() {
            return;
        }
        for c in text.chars() {
            // first face with the glyph wins
            if let Some(&idx) = context
                .entries
                .iter()
                .find(|&&idx| self.entries[idx].font.has_glyph(c))
            {
                self.entries[idx].chars.insert(c);
            }
        }
    }

    /// Leave the current element.
    pub fn pop(&mut self) {
        self.stack.pop();
    }

    /// Walk a whole document body.
    pub fn scan_document(&mut self, document: &Document) {
        self.scan_node(document, document.body());
    }

    fn scan_node(&mut self, document: &Document, node: NodeId) {
        let Some(node_ref) = document.node(node) else {
            return;
        };
        if let Some(text) = node_ref.as_text() {
            self.play(text);
            return;
        }
        if let Some(element) = node_ref.as_element() {
            self.push(element);
            for &child in document.children(node) {
                self.scan_node(document, child);
            }
            self.pop();
        }
    }

    /// Subsetting entries for a context, memoized per (families, weight, style).
    fn resolve(&mut self, families: &[String], weight: FontWeight, style: FontStyle) -> Vec<usize> {
        let list_key = (families.to_vec(), weight, style);
        if let Some(list) = self.lists.get(&list_key) {
            return list.clone();
        }

        let mut list = Vec::new();
        for family in families {
            if GENERIC_FAMILIES
                .iter()
                .any(|generic| family.eq_ignore_ascii_case(generic))
            {
                continue;
            }
            let key = FontKey::new(family.as_str(), weight, style);
            if let Some(idx) = self.entry_for(key)
                && !list.contains(&idx)
            {
                list.push(idx);
            }
        }

        self.lists.insert(list_key, list.clone());
        list
    }

    fn entry_for(&mut self, key: FontKey) -> Option<usize> {
        if let Some(&idx) = self.by_key.get(&key) {
            return Some(idx);
        }
        if self.missing.contains(&key) || self.prohibited.contains(&key) {
            return None;
        }

        let Some(font) = self.locator.locate_font(&key.family, key.weight, key.style) else {
            log::warn!("font {key} not found");
            self.missing.insert(key);
            return None;
        };
        if !font.can_embed() || !font.can_subset() {
            log::warn!("font {key} does not allow embedding");
            self.prohibited.insert(key);
            return None;
        }

        let idx = self.entries.len();
        self.by_key.insert(key.clone(), idx);
        self.entries.push(SubsetEntry {
            key,
            font,
            chars: BTreeSet::new(),
            embedded: None,
        });
        Some(idx)
    }

    /// Embed every used face into `publication` and declare it in the
    /// stylesheet `style`. Returns the font resources created.
    ///
    /// Resources are named `<font folder>/<family>-<weight>[-style]-<suffix>`
    /// where the suffix derives from the publication identifier; a name
    /// already taken gets `-2`, `-3`, ... appended. Faces embedded by an
    /// earlier call are not embedded again.
    pub fn add_fonts(
        &mut self,
        publication: &mut Publication,
        style: &ResourceRef,
    ) -> Result<Vec<ResourceRef>> {
        if publication.stylesheet(style).is_none() {
            return Err(Error::UnknownResource(style.name().to_string()));
        }
        let digest = sha1_smol::Sha1::from(publication.identifier()).hexdigest();
        let suffix = &digest[..8];
        let folder = publication.config().font_folder.trim_end_matches('/').to_string();

        let mut added = Vec::new();
        for entry in self.entries.iter_mut().filter(|entry| !entry.chars.is_empty()) {
            if let Some(name) = &entry.embedded {
                log::debug!("{name} already embedded");
                continue;
            }
            let key = &entry.key;
            let style_part = match key.style {
                FontStyle::Normal => String::new(),
                other => format!("-{other}"),
            };
            let stem = format!(
                "{folder}/{}-{}{style_part}-{suffix}",
                sanitize_name(&key.family),
                key.weight.0
            );
            let extension = entry.font.extension();
            // distinct families may sanitize to the same stem
            let name = std::iter::once(format!("{stem}.{extension}"))
                .chain((2..).map(|n| format!("{stem}-{n}.{extension}")))
                .find(|candidate| !publication.has_resource(candidate))
                .unwrap_or_default();

            let data = entry.font.subset(&entry.chars)?;
            log::debug!(
                "embedding {key} as {name}: {} characters, {} bytes",
                entry.chars.len(),
                data.len()
            );
            let resource = publication.create_font_resource(name.as_str(), data)?;
            let src = relative_href(style.name(), &name);
            entry.embedded = Some(name);
            if let Some(sheet) = publication.stylesheet_mut(style) {
                sheet.add_font_face(FontFaceRule {
                    family: key.family.clone(),
                    weight: key.weight,
                    style: key.style,
                    src,
                });
            }
            added.push(resource);
        }
        Ok(added)
    }

    /// Faces that drew at least one character.
    pub fn used_fonts(&self) -> impl Iterator<Item = &FontKey> {
        self.entries
            .iter()
            .filter(|entry| !entry.chars.is_empty())
            .map(|entry| &entry.key)
    }

    pub fn missing_fonts(&self) -> impl Iterator<Item = &FontKey> {
        self.missing.iter()
    }

    pub fn prohibited_fonts(&self) -> impl Iterator<Item = &FontKey> {
        self.prohibited.iter()
    }

    /// Characters recorded against a face, if it was resolved.
    pub fn characters(&self, key: &FontKey) -> Option<&BTreeSet<char>> {
        self.by_key.get(key).map(|&idx| &self.entries[idx].chars)
    }

    pub fn report(&self) -> FontReport {
        FontReport {
            used: self.used_fonts().cloned().collect(),
            missing: self.missing_fonts().cloned().collect(),
            prohibited: self.prohibited_fonts().cloned().collect(),
        }
    }
}

fn apply_font_properties(context: &mut Context, properties: &PropertySet) {
    if let Some(value) = properties.get("font-family") {
        let families = parse_font_family(value);
        if !families.is_empty() {
            context.families = families;
        }
    }
    if let Some(weight) = properties
        .get("font-weight")
        .and_then(|value| FontWeight::parse(value, context.weight))
    {
        context.weight = weight;
    }
    if let Some(style) = properties.get("font-style").and_then(FontStyle::parse) {
        context.style = style;
    }
}
