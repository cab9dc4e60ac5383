use criterion::{black_box, criterion_group, criterion_main, Criterion};
use marginalia_attribution::{add_author_to_node, group_by_author, seek_authors};
use marginalia_dom::{Region, RenderedDocument};

fn build_document(sections: usize, paragraphs: usize) -> RenderedDocument {
    let mut doc = RenderedDocument::new("article");
    let mut y = 0.0;

    for s in 0..sections {
        let section = doc.append_element(doc.root(), "section");
        doc.set_region(section, Region::new(y, paragraphs as f64 * 20.0));

        for p in 0..paragraphs {
            let para = doc.append_element(section, "p");
            doc.set_region(para, Region::new(y, 20.0));
            add_author_to_node(&mut doc, para, &format!("user-{}", (s + p) % 7));
            if p % 3 == 0 {
                add_author_to_node(&mut doc, para, "user-shared");
            }
            y += 20.0;
        }
    }

    doc
}

fn walk_small_document(c: &mut Criterion) {
    let doc = build_document(5, 10);

    c.bench_function("walk_small_document", |b| {
        b.iter(|| seek_authors(black_box(&doc), doc.root()))
    });
}

fn walk_and_group_large_document(c: &mut Criterion) {
    let doc = build_document(50, 40);

    c.bench_function("walk_and_group_large_document", |b| {
        b.iter(|| {
            let records = seek_authors(black_box(&doc), doc.root());
            group_by_author(&records)
        })
    });
}

criterion_group!(benches, walk_small_document, walk_and_group_large_document);
criterion_main!(benches);
