//! Style value model and class deduplication.
//!
//! Property values are treated as opaque strings: this module stores them,
//! compares them structurally, and interprets only the font properties the
//! subsetter needs. Selectors are limited to `tag`, `.class` and `tag.class`.

mod cascade;
mod parsing;
mod properties;
mod stylesheet;
mod values;

pub use cascade::compute_cascade;
pub use parsing::{parse_declarations, parse_font_family};
pub use properties::PropertySet;
pub use stylesheet::{DEFAULT_CLASS_HINT, FontFaceRule, Rule, Selector, Stylesheet};
pub use values::{FontStyle, FontWeight};
