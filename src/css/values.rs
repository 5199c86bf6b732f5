//! Interpreted font property values.

use std::fmt;

/// Font weight (100-900).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FontWeight(pub u16);

impl FontWeight {
    pub const NORMAL: FontWeight = FontWeight(400);
    pub const BOLD: FontWeight = FontWeight(700);

    /// Interpret a `font-weight` value relative to the inherited weight.
    pub fn parse(value: &str, inherited: FontWeight) -> Option<FontWeight> {
        let value = value.trim();
        match value.to_ascii_lowercase().as_str() {
            "normal" => Some(Self::NORMAL),
            "bold" => Some(Self::BOLD),
            "bolder" => Some(inherited.bolder()),
            "lighter" => Some(inherited.lighter()),
            "inherit" => Some(inherited),
            other => other
                .parse::<u16>()
                .ok()
                .filter(|w| (1..=1000).contains(w))
                .map(FontWeight),
        }
    }

    /// Relative weight per CSS Fonts level 4.
    pub fn bolder(self) -> FontWeight {
        match self.0 {
            0..350 => Self::NORMAL,
            350..550 => Self::BOLD,
            550..900 => FontWeight(900),
            _ => self,
        }
    }

    pub fn lighter(self) -> FontWeight {
        match self.0 {
            0..100 => self,
            100..550 => FontWeight(100),
            550..750 => Self::NORMAL,
            _ => Self::BOLD,
        }
    }

    /// The value to emit in a `font-weight` declaration.
    pub fn css_value(self) -> String {
        match self {
            Self::NORMAL => "normal".to_string(),
            Self::BOLD => "bold".to_string(),
            FontWeight(w) => w.to_string(),
        }
    }
}

impl Default for FontWeight {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Font style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FontStyle {
    #[default]
    Normal,
    Italic,
    Oblique,
}

impl FontStyle {
    pub fn parse(value: &str) -> Option<FontStyle> {
        let value = value.trim().to_ascii_lowercase();
        // `oblique 10deg` keeps the keyword only
        match value.split_whitespace().next()? {
            "normal" => Some(FontStyle::Normal),
            "italic" => Some(FontStyle::Italic),
            "oblique" => Some(FontStyle::Oblique),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FontStyle::Normal => "normal",
            FontStyle::Italic => "italic",
            FontStyle::Oblique => "oblique",
        }
    }
}

impl fmt::Display for FontStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_font_weight() {
        let normal = FontWeight::NORMAL;
        assert_eq!(FontWeight::parse("bold", normal), Some(FontWeight::BOLD));
        assert_eq!(FontWeight::parse(" 600 ", normal), Some(FontWeight(600)));
        assert_eq!(FontWeight::parse("bolder", normal), Some(FontWeight::BOLD));
        assert_eq!(FontWeight::parse("lighter", FontWeight::BOLD), Some(FontWeight::NORMAL));
        assert_eq!(FontWeight::parse("heavy", normal), None);
        assert_eq!(FontWeight::parse("0", normal), None);
    }

    #[test]
    fn test_weight_css_value() {
        assert_eq!(FontWeight::NORMAL.css_value(), "normal");
        assert_eq!(FontWeight::BOLD.css_value(), "bold");
        assert_eq!(FontWeight(300).css_value(), "300");
    }

    #[test]
    fn test_parse_font_style() {
        assert_eq!(FontStyle::parse("Italic"), Some(FontStyle::Italic));
        assert_eq!(FontStyle::parse("oblique 12deg"), Some(FontStyle::Oblique));
        assert_eq!(FontStyle::parse("slanted"), None);
        assert_eq!(FontStyle::parse(""), None);
    }
}
