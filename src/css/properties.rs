//! Resolved property sets.

use std::collections::BTreeMap;
use std::fmt::Write;

use super::parsing::parse_declarations;

/// A set of CSS declarations keyed by property name.
///
/// Used both for inline styles and for cascade results. Equality and hashing
/// are structural and independent of the order properties were set in, so two
/// elements that end up with the same effective declarations compare equal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PropertySet {
    properties: BTreeMap<String, String>,
}

impl PropertySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a declaration block such as `font-weight: bold; color: gray`.
    pub fn parse(text: &str) -> Self {
        parse_declarations(text)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.properties.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Iterate over set property names.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Copy every property of `other` into this set; `other` wins on conflict.
    pub fn merge(&mut self, other: &PropertySet) {
        for (name, value) in other.iter() {
            self.set(name, value);
        }
    }

    /// Write the declarations as `name: value;` pairs separated by spaces.
    pub fn to_css(&self, out: &mut String) {
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                out.push(' ');
            }
            let _ = write!(out, "{name}: {value};");
        }
    }

    /// Inline-style form, as used in a `style` attribute.
    pub fn to_inline(&self) -> String {
        let mut out = String::new();
        self.to_css(&mut out);
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for PropertySet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = PropertySet::new();
        for (name, value) in iter {
            set.set(name, value);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_ignores_insertion_order() {
        let a = PropertySet::new()
            .with("font-weight", "bold")
            .with("color", "gray");
        let b = PropertySet::new()
            .with("color", "gray")
            .with("font-weight", "bold");
        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_overrides() {
        let mut base = PropertySet::new()
            .with("color", "red")
            .with("font-style", "italic");
        base.merge(&PropertySet::new().with("color", "blue"));
        assert_eq!(base.get("color"), Some("blue"));
        assert_eq!(base.get("font-style"), Some("italic"));
        assert_eq!(base.len(), 2);
    }

    #[test]
    fn test_to_inline() {
        let set: PropertySet = [("font-weight", "bold"), ("color", "gray")]
            .into_iter()
            .collect();
        assert_eq!(set.to_inline(), "color: gray; font-weight: bold;");
        assert_eq!(PropertySet::new().to_inline(), "");
    }
}
