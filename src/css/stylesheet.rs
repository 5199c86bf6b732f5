//! Stylesheets: selector rules, `@font-face` rules and class deduplication.

use std::collections::HashMap;
use std::fmt::{self, Write};

use cssparser::{Parser, ParserInput};

use super::parsing::{parse_simple_selector, parse_stylesheet};
use super::properties::PropertySet;
use super::values::{FontStyle, FontWeight};

/// Class name used by [`Stylesheet::make_class`] when no hint is given.
pub const DEFAULT_CLASS_HINT: &str = "z";

/// A simple selector: `tag`, `.class` or `tag.class`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Selector {
    pub element: Option<String>,
    pub class: Option<String>,
}

impl Selector {
    pub fn element(tag: impl Into<String>) -> Self {
        Self {
            element: Some(tag.into()),
            class: None,
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self {
            element: None,
            class: Some(name.into()),
        }
    }

    pub fn element_class(tag: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            element: Some(tag.into()),
            class: Some(class.into()),
        }
    }

    /// Parse a simple selector. Anything beyond `tag`, `.class`, `tag.class`
    /// (combinators, attributes, pseudo-classes) yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let mut input = ParserInput::new(text);
        let mut parser = Parser::new(&mut input);
        parser.parse_entirely(parse_simple_selector).ok()
    }

    /// (class count, element count), compared lexicographically.
    pub fn specificity(&self) -> (u8, u8) {
        (self.class.is_some() as u8, self.element.is_some() as u8)
    }

    /// Whether this selector applies to an element with `tag` and `classes`.
    pub fn matches<'a>(&self, tag: &str, mut classes: impl Iterator<Item = &'a str>) -> bool {
        if let Some(element) = &self.element
            && !element.eq_ignore_ascii_case(tag)
        {
            return false;
        }
        match &self.class {
            Some(class) => classes.any(|c| c == class),
            None => true,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(element) = &self.element {
            f.write_str(element)?;
        }
        if let Some(class) = &self.class {
            write!(f, ".{class}")?;
        }
        Ok(())
    }
}

/// A selector with its declarations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub selector: Selector,
    pub properties: PropertySet,
}

/// An `@font-face` rule pointing at an embedded font resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontFaceRule {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
    /// `src` URL relative to the stylesheet.
    pub src: String,
}

/// A stylesheet resource.
///
/// Rules are kept in insertion order and a selector never owns more than one
/// rule. The class map remembers which class was minted for each resolved
/// property set, so identical effective styles share one rule.
#[derive(Debug, Clone, Default)]
pub struct Stylesheet {
    rules: Vec<Rule>,
    index: HashMap<Selector, usize>,
    font_faces: Vec<FontFaceRule>,
    classes: HashMap<PropertySet, String>,
}

impl Stylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rules with simple selectors; unsupported selectors are skipped.
    pub fn parse(css: &str) -> Self {
        let mut sheet = Stylesheet::new();
        parse_stylesheet(css, &mut sheet);
        sheet
    }

    /// Declarations of the rule for `selector`, created empty if absent.
    pub fn rule_mut(&mut self, selector: Selector) -> &mut PropertySet {
        let idx = match self.index.get(&selector) {
            Some(&idx) => idx,
            None => {
                let idx = self.rules.len();
                self.index.insert(selector.clone(), idx);
                self.rules.push(Rule {
                    selector,
                    properties: PropertySet::new(),
                });
                idx
            }
        };
        &mut self.rules[idx].properties
    }

    pub fn rule(&self, selector: &Selector) -> Option<&PropertySet> {
        self.index.get(selector).map(|&idx| &self.rules[idx].properties)
    }

    pub fn has_selector(&self, selector: &Selector) -> bool {
        self.index.contains_key(selector)
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn add_font_face(&mut self, rule: FontFaceRule) {
        self.font_faces.push(rule);
    }

    pub fn font_faces(&self) -> &[FontFaceRule] {
        &self.font_faces
    }

    /// Return the class carrying exactly `properties`, minting one if needed.
    ///
    /// An already-registered property set returns its existing class. New
    /// classes start from `hint` (default `"z"`) and get a numeric suffix
    /// while a rule for that class selector already exists.
    pub fn make_class(&mut self, hint: Option<&str>, properties: &PropertySet) -> String {
        if let Some(name) = self.classes.get(properties) {
            return name.clone();
        }

        let base = hint
            .filter(|h| !h.is_empty())
            .unwrap_or(DEFAULT_CLASS_HINT);
        let mut name = base.to_string();
        let mut suffix = 1u32;
        while self.has_selector(&Selector::class(name.as_str())) {
            name = format!("{base}{suffix}");
            suffix += 1;
        }

        self.classes.insert(properties.clone(), name.clone());
        self.rule_mut(Selector::class(name.as_str()))
            .merge(properties);
        log::debug!("new class .{name} with {} properties", properties.len());
        name
    }

    /// Number of classes minted by [`Stylesheet::make_class`].
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    /// Serialize: `@font-face` rules first, then non-empty selector rules.
    pub fn to_css(&self) -> String {
        let mut css = String::new();

        for face in &self.font_faces {
            let _ = write!(
                css,
                "@font-face {{\n  font-family: \"{}\";\n  font-weight: {};\n  font-style: {};\n  src: url({});\n}}\n",
                face.family.replace('"', "\\\""),
                face.weight.css_value(),
                face.style,
                face.src
            );
        }

        for rule in &self.rules {
            if rule.properties.is_empty() {
                continue;
            }
            let _ = writeln!(css, "{} {{", rule.selector);
            for (name, value) in rule.properties.iter() {
                let _ = writeln!(css, "  {name}: {value};");
            }
            css.push_str("}\n");
        }

        css
    }
}
