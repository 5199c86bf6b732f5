//! Tunable generation parameters.
//!
//! The splitting constants are empirical: they bias where documents get cut,
//! they do not affect correctness. Every value can be overridden.

/// Size estimation and break-point preferences used when splitting documents.
///
/// A break is taken before an element once the remaining byte budget drops
/// below that element's peeling bonus. Larger bonuses break earlier.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SplitPolicy {
    /// Bytes for `<`, `>`, `</` and `>` around an element.
    pub element_overhead: i64,
    /// Bytes added per attribute on top of its name and value (`=""` and a space).
    pub attribute_overhead: i64,
    /// Bytes counted between consecutive children.
    pub separator: i64,
    /// Estimated length of a resolved internal `href`.
    pub internal_link_bytes: i64,
    /// Extra budget absorbing the document wrapper markup.
    pub slack: i64,
    /// Bonuses for `h1` through `h6`.
    pub heading_bonus: [i64; 6],
    pub division_bonus: i64,
    pub paragraph_bonus: i64,
    /// Minimum bonus of an element targeted by the table of contents.
    pub toc_target_floor: i64,
    /// Added to the bonus of a designated page anchor.
    pub page_anchor_bonus: i64,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            element_overhead: 5,
            attribute_overhead: 4,
            separator: 1,
            internal_link_bytes: 24,
            slack: 300,
            heading_bonus: [12_000, 10_000, 8_000, 6_000, 4_000, 3_000],
            division_bonus: 2_000,
            paragraph_bonus: 1_000,
            toc_target_floor: 5_000,
            page_anchor_bonus: 50_000,
        }
    }
}

impl SplitPolicy {
    pub fn with_slack(mut self, slack: i64) -> Self {
        self.slack = slack;
        self
    }

    pub fn with_heading_bonus(mut self, bonus: [i64; 6]) -> Self {
        self.heading_bonus = bonus;
        self
    }

    pub fn with_paragraph_bonus(mut self, bonus: i64) -> Self {
        self.paragraph_bonus = bonus;
        self
    }

    pub fn with_division_bonus(mut self, bonus: i64) -> Self {
        self.division_bonus = bonus;
        self
    }

    pub fn with_toc_target_floor(mut self, floor: i64) -> Self {
        self.toc_target_floor = floor;
        self
    }

    pub fn with_page_anchor_bonus(mut self, bonus: i64) -> Self {
        self.page_anchor_bonus = bonus;
        self
    }
}

/// Publication-wide generation settings.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GeneratorConfig {
    /// Byte budget for a single content document.
    pub target_size: usize,
    pub split: SplitPolicy,
    /// Folder (resource name prefix) receiving embedded font subsets.
    pub font_folder: String,
    /// Resource name of the generated stylesheet.
    pub stylesheet_name: String,
    /// Resource name of the NCX navigation file.
    pub ncx_name: String,
    /// Deepest heading level picked up when building the TOC from headings.
    pub toc_levels: u8,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            target_size: 64 * 1024,
            split: SplitPolicy::default(),
            font_folder: "OPS/fonts".to_string(),
            stylesheet_name: "OPS/style.css".to_string(),
            ncx_name: "OPS/toc.ncx".to_string(),
            toc_levels: 3,
        }
    }
}

impl GeneratorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_size(mut self, target_size: usize) -> Self {
        self.target_size = target_size;
        self
    }

    pub fn with_split_policy(mut self, policy: SplitPolicy) -> Self {
        self.split = policy;
        self
    }

    pub fn with_font_folder(mut self, folder: impl Into<String>) -> Self {
        self.font_folder = folder.into();
        self
    }

    pub fn with_stylesheet_name(mut self, name: impl Into<String>) -> Self {
        self.stylesheet_name = name.into();
        self
    }

    pub fn with_ncx_name(mut self, name: impl Into<String>) -> Self {
        self.ncx_name = name.into();
        self
    }

    pub fn with_toc_levels(mut self, levels: u8) -> Self {
        self.toc_levels = levels.clamp(1, 6);
        self
    }
}
