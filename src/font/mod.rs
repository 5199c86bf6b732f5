//! Font resolution and subsetting.
//!
//! Fonts are looked up through a [`FontLocator`] by (family, weight, style)
//! and handed out as [`FontHandle`]s. The [`FontSubsetter`] walks finished
//! documents, records which characters each font actually draws, and embeds
//! only those fonts, reduced to the glyphs used.

mod locator;
mod subsetter;
mod truetype;

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

pub use locator::{ChainedLocator, FontCollection, FontLocator, SubstitutingLocator};
#[cfg(feature = "system-fonts")]
pub use locator::SystemFontLocator;
pub use subsetter::FontSubsetter;
pub use truetype::TrueTypeFont;

use crate::css::{FontStyle, FontWeight};
use crate::error::Result;

/// A loaded font face.
pub trait FontFile: fmt::Debug {
    /// Whether the font can draw `c`.
    fn has_glyph(&self, c: char) -> bool;

    /// Whether the font's license allows embedding it in a document.
    fn can_embed(&self) -> bool;

    /// Whether the font's license allows embedding a subset.
    fn can_subset(&self) -> bool;

    /// Font data reduced to what is needed to draw `chars`.
    fn subset(&self, chars: &BTreeSet<char>) -> Result<Vec<u8>>;

    /// File extension of the produced data, without the dot.
    fn extension(&self) -> &str {
        "ttf"
    }

    /// Stable identity of the face (used to share subsetting state).
    fn identity(&self) -> String;
}

/// Shared handle to a font face.
pub type FontHandle = Arc<dyn FontFile + Send + Sync>;

/// A concrete font request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FontKey {
    pub family: String,
    pub weight: FontWeight,
    pub style: FontStyle,
}

impl FontKey {
    pub fn new(family: impl Into<String>, weight: FontWeight, style: FontStyle) -> Self {
        Self {
            family: family.into(),
            weight,
            style,
        }
    }
}

impl fmt::Display for FontKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.family, self.weight.css_value())?;
        if self.style != FontStyle::Normal {
            write!(f, " {}", self.style)?;
        }
        Ok(())
    }
}

/// What the subsetter found, for the caller's report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FontReport {
    /// Fonts that drew at least one character and were embedded.
    pub used: Vec<FontKey>,
    /// Requested fonts no locator could provide.
    pub missing: Vec<FontKey>,
    /// Fonts found but not licensed for embedding or subsetting.
    pub prohibited: Vec<FontKey>,
}

impl FontReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.prohibited.is_empty()
    }
}
