//! Finding fonts by family, weight and style.

use std::path::Path;
use std::sync::Arc;

use super::{FontHandle, FontKey, TrueTypeFont};
use crate::css::{FontStyle, FontWeight};
use crate::error::Result;

/// Something that can produce font faces on request.
///
/// Locators match exactly: a request for `Georgia 700 italic` only returns a
/// face registered as such. Fallbacks live in [`SubstitutingLocator`].
pub trait FontLocator {
    fn locate_font(&self, family: &str, weight: FontWeight, style: FontStyle)
    -> Option<FontHandle>;

    fn has_font(&self, family: &str, weight: FontWeight, style: FontStyle) -> bool {
        self.locate_font(family, weight, style).is_some()
    }
}

impl<L: FontLocator + ?Sized> FontLocator for &L {
    fn locate_font(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<FontHandle> {
        (**self).locate_font(family, weight, style)
    }
}

impl<L: FontLocator + ?Sized> FontLocator for Box<L> {
    fn locate_font(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<FontHandle> {
        (**self).locate_font(family, weight, style)
    }
}

/// In-memory set of faces. Family names match case-insensitively.
#[derive(Debug, Default, Clone)]
pub struct FontCollection {
    faces: Vec<(FontKey, FontHandle)>,
}

impl FontCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `font` under the given key, replacing an earlier face with
    /// the same key.
    pub fn add(
        &mut self,
        family: impl Into<String>,
        weight: FontWeight,
        style: FontStyle,
        font: FontHandle,
    ) {
        let key = FontKey::new(family, weight, style);
        self.faces.retain(|(existing, _)| !same_face(existing, &key));
        self.faces.push((key, font));
    }

    /// Parse a TrueType/OpenType face and register it under the family,
    /// weight and style it declares.
    pub fn add_truetype(&mut self, data: Vec<u8>) -> Result<FontKey> {
        let font = TrueTypeFont::from_data(data, 0)?;
        let key = FontKey::new(font.family(), font.weight(), font.style());
        log::debug!("registered font {key}");
        self.add(key.family.clone(), key.weight, key.style, Arc::new(font));
        Ok(key)
    }

    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<FontKey> {
        let data = std::fs::read(path.as_ref())?;
        self.add_truetype(data)
    }

    pub fn keys(&self) -> impl Iterator<Item = &FontKey> {
        self.faces.iter().map(|(key, _)| key)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }
}

fn same_face(a: &FontKey, b: &FontKey) -> bool {
    a.weight == b.weight && a.style == b.style && a.family.eq_ignore_ascii_case(&b.family)
}

impl FontLocator for FontCollection {
    fn locate_font(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<FontHandle> {
        let wanted = FontKey::new(family, weight, style);
        self.faces
            .iter()
            .find(|(key, _)| same_face(key, &wanted))
            .map(|(_, font)| Arc::clone(font))
    }
}

/// Asks each locator in turn; the first one with the face wins.
#[derive(Default)]
pub struct ChainedLocator {
    locators: Vec<Box<dyn FontLocator>>,
}

impl ChainedLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, locator: impl FontLocator + 'static) -> Self {
        self.push(locator);
        self
    }

    pub fn push(&mut self, locator: impl FontLocator + 'static) {
        self.locators.push(Box::new(locator));
    }
}

impl FontLocator for ChainedLocator {
    fn locate_font(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<FontHandle> {
        self.locators
            .iter()
            .find_map(|locator| locator.locate_font(family, weight, style))
    }
}

#[derive(Debug, Clone)]
struct Substitution {
    family: String,
    replacement: String,
    /// Only substitute for this style; any style when `None`.
    style: Option<FontStyle>,
}

/// Adds fallbacks on top of an exact locator.
///
/// A request is tried as is, then with neighbouring weights (100 steps,
/// toward normal first), then under each substitute family registered for
/// it. By default Tahoma, which ships without italics, is substituted by
/// Verdana for italic and oblique text.
pub struct SubstitutingLocator<L> {
    inner: L,
    substitutions: Vec<Substitution>,
}

impl<L: FontLocator> SubstitutingLocator<L> {
    pub fn new(inner: L) -> Self {
        Self::without_defaults(inner)
            .with_substitution("Tahoma", "Verdana", Some(FontStyle::Italic))
            .with_substitution("Tahoma", "Verdana", Some(FontStyle::Oblique))
    }

    pub fn without_defaults(inner: L) -> Self {
        Self {
            inner,
            substitutions: Vec::new(),
        }
    }

    pub fn with_substitution(
        mut self,
        family: impl Into<String>,
        replacement: impl Into<String>,
        style: Option<FontStyle>,
    ) -> Self {
        self.substitutions.push(Substitution {
            family: family.into(),
            replacement: replacement.into(),
            style,
        });
        self
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    fn with_weight_fallback(
        &self,
        family: &str,
        weight: FontWeight,
        style: FontStyle,
    ) -> Option<FontHandle> {
        fallback_weights(weight)
            .into_iter()
            .find_map(|candidate| self.inner.locate_font(family, candidate, style))
    }
}

/// The requested weight, then its neighbours 100 away, the one closer to
/// normal (400) first.
fn fallback_weights(weight: FontWeight) -> Vec<FontWeight> {
    let w = weight.0;
    let (first, second) = if w > FontWeight::NORMAL.0 {
        (w.checked_sub(100), w.checked_add(100))
    } else {
        (w.checked_add(100), w.checked_sub(100))
    };
    std::iter::once(Some(w))
        .chain([first, second])
        .flatten()
        .filter(|w| (100..=900).contains(w) || *w == weight.0)
        .map(FontWeight)
        .collect()
}

impl<L: FontLocator> FontLocator for SubstitutingLocator<L> {
    fn locate_font(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<FontHandle> {
        if let Some(font) = self.with_weight_fallback(family, weight, style) {
            return Some(font);
        }
        self.substitutions
            .iter()
            .filter(|sub| sub.family.eq_ignore_ascii_case(family))
            .filter(|sub| sub.style.is_none_or(|s| s == style))
            .find_map(|sub| {
                let font = self.with_weight_fallback(&sub.replacement, weight, style)?;
                log::debug!("substituting {} for {family} {style}", sub.replacement);
                Some(font)
            })
    }
}

/// Faces installed on the system, found through `fontdb`.
#[cfg(feature = "system-fonts")]
pub struct SystemFontLocator {
    db: fontdb::Database,
}

#[cfg(feature = "system-fonts")]
impl SystemFontLocator {
    /// Scan the system font directories.
    pub fn new() -> Self {
        let mut db = fontdb::Database::new();
        db.load_system_fonts();
        log::debug!("loaded {} system font faces", db.len());
        Self { db }
    }

    pub fn from_database(db: fontdb::Database) -> Self {
        Self { db }
    }
}

#[cfg(feature = "system-fonts")]
impl Default for SystemFontLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "system-fonts")]
impl FontLocator for SystemFontLocator {
    fn locate_font(&self, family: &str, weight: FontWeight, style: FontStyle) -> Option<FontHandle> {
        let wanted = match style {
            FontStyle::Normal => fontdb::Style::Normal,
            FontStyle::Italic => fontdb::Style::Italic,
            FontStyle::Oblique => fontdb::Style::Oblique,
        };
        let query = fontdb::Query {
            families: &[fontdb::Family::Name(family)],
            weight: fontdb::Weight(weight.0),
            stretch: fontdb::Stretch::Normal,
            style: wanted,
        };
        let id = self.db.query(&query)?;

        // fontdb returns the nearest match; only an exact one will do here
        let info = self.db.face(id)?;
        let family_matches = info
            .families
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case(family));
        if !family_matches || info.weight.0 != weight.0 || info.style != wanted {
            return None;
        }

        let parsed = self
            .db
            .with_face_data(id, |data, index| TrueTypeFont::from_data(data.to_vec(), index))?;
        match parsed {
            Ok(font) => Some(Arc::new(font)),
            Err(e) => {
                log::warn!("cannot load system font {family}: {e}");
                None
            }
        }
    }
}
