//! End-to-end generation through the public API.

use std::collections::BTreeSet;
use std::sync::Arc;

use epubforge::{
    Element, ElementKind, Error, FontCollection, FontFile, FontStyle, FontWeight, GeneratorConfig,
    Publication, Result, Stylesheet, SubstitutingLocator, Usage,
};

/// A face covering a fixed set of characters; "subsets" to the characters.
#[derive(Debug)]
struct CoverageFont(&'static str);

impl FontFile for CoverageFont {
    fn has_glyph(&self, c: char) -> bool {
        self.0.contains(c)
    }

    fn can_embed(&self) -> bool {
        true
    }

    fn can_subset(&self) -> bool {
        true
    }

    fn subset(&self, chars: &BTreeSet<char>) -> Result<Vec<u8>> {
        Ok(chars.iter().collect::<String>().into_bytes())
    }

    fn identity(&self) -> String {
        self.0.to_string()
    }
}

fn chapter(publication: &mut Publication, name: &str, title: &str, paragraphs: usize) {
    let id = publication.create_document(name).unwrap();
    let doc = publication.document_mut(id).unwrap();
    let body = doc.body();
    let h1 = doc.add_element(body, Element::heading(1)).unwrap();
    doc.add_text(h1, title).unwrap();
    for i in 0..paragraphs {
        let p = doc.add_element(body, Element::paragraph()).unwrap();
        doc.add_text(p, format!("paragraph {i} ").repeat(50)).unwrap();
    }
}

#[test]
fn test_bold_gray_shares_one_class() {
    let mut publication = Publication::new("urn:test:styles");
    let source = publication
        .create_style_resource(
            "OPS/source.css",
            Stylesheet::parse(".warn { font-weight: bold; color: gray }"),
        )
        .unwrap();
    let doc = publication.create_document("OPS/a.xhtml").unwrap();
    let document = publication.document_mut(doc).unwrap();
    document.add_stylesheet(source);
    let body = document.body();
    let by_class = document
        .add_element(body, Element::paragraph().with_class("warn"))
        .unwrap();
    let by_inline = document
        .add_element(
            body,
            Element::paragraph().with_style("font-weight: bold; color: gray"),
        )
        .unwrap();

    publication.generate(&FontCollection::new()).unwrap();

    let document = publication.document(doc).unwrap();
    let a = document.element(by_class).unwrap().class_name.clone();
    let b = document.element(by_inline).unwrap().class_name.clone();
    assert!(a.is_some());
    assert_eq!(a, b);

    let output = publication.resource_ref("OPS/style.css").unwrap();
    let css = publication.stylesheet(&output).unwrap().to_css();
    assert_eq!(css.matches("color: gray").count(), 1);
}

#[test]
fn test_long_book_is_split_and_navigable() {
    let config = GeneratorConfig::new().with_target_size(4000);
    let mut publication = Publication::with_config("urn:test:book", config);
    chapter(&mut publication, "OPS/one.xhtml", "One", 20);
    chapter(&mut publication, "OPS/two.xhtml", "Two", 2);

    let report = publication.generate(&FontCollection::new()).unwrap();
    assert!(report.documents_created >= 2);
    assert_eq!(report.dangling_refs, 0);

    let names: Vec<&str> = publication.documents().map(|d| d.name()).collect();
    assert_eq!(names[0], "OPS/one.xhtml");
    assert_eq!(names[1], "OPS/one-1.xhtml");
    assert_eq!(*names.last().unwrap(), "OPS/two.xhtml");

    let policy = publication.config().split.clone();
    for doc in publication.documents() {
        // every part but the last of chapter one is close to the target
        if doc.name().starts_with("OPS/one") {
            assert!(doc.estimated_document_size(&policy) <= 4000 + policy.slack);
        }
    }

    let ncx = publication.ncx("Book").unwrap();
    assert!(ncx.contains(r#"<content src="one.xhtml#id1"/>"#));
    assert!(ncx.contains(r#"<content src="two.xhtml#id1"/>"#));
    assert!(ncx.contains(r#"playOrder="1""#));
    assert!(ncx.contains(r#"playOrder="2""#));
}

#[test]
fn test_link_follows_moved_target() {
    let config = GeneratorConfig::new().with_target_size(3000);
    let mut publication = Publication::with_config("urn:test:links", config);
    chapter(&mut publication, "OPS/one.xhtml", "One", 12);

    let doc = publication.spine()[0];
    let document = publication.document(doc).unwrap();
    let last = *document.children(document.body()).last().unwrap();
    let target = publication.element_xref(doc, last, Usage::REFERENCE).unwrap();
    let document = publication.document_mut(doc).unwrap();
    let body = document.body();
    let first = document.children(body)[1];
    document
        .add_element(first, Element::internal_link(target))
        .unwrap();

    publication.generate(&FontCollection::new()).unwrap();

    let owner = publication.xref(target).unwrap().document();
    assert_ne!(owner, doc);
    let href = publication.href_for(doc, target).unwrap();
    let owner_name = publication.document(owner).unwrap().name();
    assert_eq!(href, format!("{}#id1", owner_name.trim_start_matches("OPS/")));
}

#[test]
fn test_tahoma_italic_embeds_verdana() {
    let mut fonts = FontCollection::new();
    fonts.add(
        "Tahoma",
        FontWeight::NORMAL,
        FontStyle::Normal,
        Arc::new(CoverageFont("abcdefghijklmnopqrstuvwxyz ")),
    );
    fonts.add(
        "Verdana",
        FontWeight::NORMAL,
        FontStyle::Italic,
        Arc::new(CoverageFont("abcdefghijklmnopqrstuvwxyz ")),
    );
    let locator = SubstitutingLocator::new(fonts);

    let mut publication = Publication::new("urn:test:fonts");
    let doc = publication.create_document("OPS/a.xhtml").unwrap();
    let document = publication.document_mut(doc).unwrap();
    let body = document.body();
    let p = document
        .add_element(body, Element::paragraph().with_style("font-family: Tahoma"))
        .unwrap();
    document.add_text(p, "plain ").unwrap();
    let em = document
        .add_element(p, Element::new(ElementKind::Emphasis))
        .unwrap();
    document.add_text(em, "slanted").unwrap();

    let report = publication.generate(&locator).unwrap();
    assert!(report.fonts.is_clean());
    let used: Vec<String> = report.fonts.used.iter().map(ToString::to_string).collect();
    assert_eq!(used, vec!["Tahoma normal", "Tahoma normal italic"]);

    assert_eq!(publication.fonts().len(), 2);
    let italic = publication
        .fonts()
        .iter()
        .find(|font| font.name.contains("-italic-"))
        .unwrap();
    assert_eq!(italic.data, b"adelnst");
    assert_eq!(italic.media_type, "font/ttf");
}

#[test]
fn test_missing_font_is_reported_not_fatal() {
    let mut publication = Publication::new("urn:test:missing");
    let doc = publication.create_document("OPS/a.xhtml").unwrap();
    let document = publication.document_mut(doc).unwrap();
    let body = document.body();
    let p = document
        .add_element(body, Element::paragraph().with_style("font-family: \"Fancy Serif\", serif"))
        .unwrap();
    document.add_text(p, "text").unwrap();

    let report = publication.generate(&FontCollection::new()).unwrap();
    assert_eq!(report.fonts.missing.len(), 1);
    assert_eq!(report.fonts.missing[0].family, "Fancy Serif");
    assert!(publication.fonts().is_empty());
}

#[test]
fn test_duplicate_names_rejected() {
    let mut publication = Publication::new("urn:test:dup");
    publication.create_document("OPS/a.xhtml").unwrap();
    assert!(matches!(
        publication.create_style_resource("OPS/a.xhtml", Stylesheet::new()),
        Err(Error::DuplicateResource(_))
    ));
}
