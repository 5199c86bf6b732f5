//! Benchmarks for splitting and styling a large publication.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use epubforge::{Element, ElementKind, GeneratorConfig, Publication, Stylesheet};

/// One long chapter: headings, styled paragraphs, nested sections and tables.
fn large_publication() -> Publication {
    let config = GeneratorConfig::new().with_target_size(16 * 1024);
    let mut publication = Publication::with_config("urn:bench", config);
    let css = publication
        .create_style_resource(
            "OPS/source.css",
            Stylesheet::parse("p { margin: 0 } .note { font-style: italic } h2 { color: gray }"),
        )
        .unwrap();
    let id = publication.create_document("OPS/text/long.xhtml").unwrap();
    let doc = publication.document_mut(id).unwrap();
    doc.add_stylesheet(css);
    let body = doc.body();

    for section in 0..40 {
        let div = doc
            .add_element(body, Element::new(ElementKind::Section))
            .unwrap();
        let h2 = doc.add_element(div, Element::heading(2)).unwrap();
        doc.add_text(h2, format!("Section {section}")).unwrap();
        for i in 0..50 {
            let p = if i % 7 == 0 {
                Element::paragraph().with_class("note")
            } else {
                Element::paragraph()
            };
            let p = doc.add_element(div, p).unwrap();
            doc.add_text(p, "Lorem ipsum dolor sit amet, consectetur adipiscing elit. ".repeat(4))
                .unwrap();
        }
        let table = doc.add_element(div, Element::new(ElementKind::Table)).unwrap();
        for _ in 0..10 {
            let row = doc
                .add_element(table, Element::new(ElementKind::TableRow))
                .unwrap();
            let cell = doc
                .add_element(row, Element::new(ElementKind::TableCell(Default::default())))
                .unwrap();
            doc.add_text(cell, "cell").unwrap();
        }
    }
    publication
}

fn bench_split(c: &mut Criterion) {
    let publication = large_publication();
    let target = publication.config().target_size;

    c.bench_function("split_oversized", |b| {
        b.iter_batched(
            || publication.clone(),
            |mut publication| publication.split_oversized(target).unwrap(),
            criterion::BatchSize::LargeInput,
        )
    });
}

fn bench_styles(c: &mut Criterion) {
    let mut publication = large_publication();
    let output = publication
        .create_style_resource("OPS/style.css", Stylesheet::new())
        .unwrap();

    c.bench_function("apply_styles", |b| {
        b.iter_batched(
            || publication.clone(),
            |mut publication| publication.apply_styles(&output).unwrap(),
            criterion::BatchSize::LargeInput,
        )
    });
}

criterion_group!(benches, bench_split, bench_styles);
criterion_main!(benches);
