//! The whole generation pass, in order.

use super::Publication;
use crate::css::Stylesheet;
use crate::error::Result;
use crate::font::{FontLocator, FontReport};

/// What one [`Publication::generate`] pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GenerationReport {
    /// Elements that ended up with a shared style class.
    pub styled_elements: usize,
    /// Continuation documents created by splitting.
    pub documents_created: usize,
    /// References numbered in this pass.
    pub play_orders_assigned: usize,
    /// Fragment or element references that resolve to nothing.
    pub dangling_refs: usize,
    pub fonts: FontReport,
}

impl Publication {
    /// Run the generation passes over the finished content tree.
    ///
    /// 1. cascade and canonicalize styles into the generated stylesheet
    ///    (created if needed)
    /// 2. split documents larger than the configured target
    /// 3. build the TOC from headings, unless one was supplied
    /// 4. number play order
    /// 5. subset and embed fonts
    pub fn generate(&mut self, locator: &dyn FontLocator) -> Result<GenerationReport> {
        let name = self.config.stylesheet_name.clone();
        let output = match self.resource_ref(&name) {
            Some(existing) => existing,
            None => self.create_style_resource(name, Stylesheet::new())?,
        };

        let styled_elements = self.apply_styles(&output)?;
        let documents_created = self.split_oversized(self.config.target_size)?;
        if self.toc.is_empty() {
            self.build_toc_from_headings(self.config.toc_levels)?;
        }
        self.request_toc_play_order();
        let play_orders_assigned = self.assign_play_order();

        let dangling = self.dangling_refs();
        for id in &dangling {
            if let Some(xref) = self.xref(*id) {
                log::warn!("dangling reference {xref}");
            }
        }

        let fonts = self.subset_fonts(locator, &output)?;
        log::debug!(
            "generated {} documents, {} fonts embedded",
            self.spine.len(),
            fonts.used.len()
        );

        Ok(GenerationReport {
            styled_elements,
            documents_created,
            play_orders_assigned,
            dangling_refs: dangling.len(),
            fonts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GeneratorConfig;
    use crate::css::{FontStyle, FontWeight};
    use crate::dom::Element;
    use crate::font::FontCollection;
    use crate::font::testing::FakeFont;
    use crate::publication::Usage;

    #[test]
    fn test_generate_runs_every_pass() {
        let config = GeneratorConfig::new().with_target_size(2000);
        let mut publication = Publication::with_config("urn:test", config);
        let source = publication
            .create_style_resource("OPS/source.css", Stylesheet::parse("p { font-family: Georgia }"))
            .unwrap();
        let doc = publication.create_document("OPS/a.xhtml").unwrap();
        let document = publication.document_mut(doc).unwrap();
        document.add_stylesheet(source);
        let body = document.body();
        let h1 = document.add_element(body, Element::heading(1)).unwrap();
        document.add_text(h1, "Chapter").unwrap();
        for _ in 0..6 {
            let p = document.add_element(body, Element::paragraph()).unwrap();
            document.add_text(p, "ab".repeat(400)).unwrap();
        }
        publication.fragment_xref(doc, "gone", Usage::REFERENCE).unwrap();

        let mut fonts = FontCollection::new();
        fonts.add("Georgia", FontWeight::NORMAL, FontStyle::Normal, FakeFont::handle("georgia", "ab"));

        let report = publication.generate(&fonts).unwrap();
        assert_eq!(report.styled_elements, 6);
        assert!(report.documents_created >= 1);
        assert_eq!(report.play_orders_assigned, 1);
        assert_eq!(report.dangling_refs, 1);
        assert_eq!(report.fonts.used.len(), 1);
        assert_eq!(publication.toc().len(), 1);
        assert_eq!(publication.fonts().len(), 1);

        let output = publication.resource_ref("OPS/style.css").unwrap();
        let css = publication.stylesheet(&output).unwrap().to_css();
        assert!(css.contains("@font-face"));
        assert!(css.contains(".z {"));
    }
}
