use criterion::{black_box, criterion_group, criterion_main, Criterion};
use quire_model::builders::{bold, doc, li, p, txt, ul};
use quire_model::{Node, Slice};

fn large_document() -> Node {
    let mut blocks = Vec::new();
    for i in 0..500 {
        if i % 10 == 0 {
            blocks.push(ul(vec![
                li(vec![p(vec![txt("first item")])]),
                li(vec![p(vec![txt("second item")])]),
            ]));
        } else {
            blocks.push(p(vec![
                txt("Paragraph with some plain text and "),
                bold("a bold run"),
                txt(" at the end."),
            ]));
        }
    }
    doc(blocks)
}

fn resolve_positions(c: &mut Criterion) {
    let d = large_document();
    let size = d.content().size();

    c.bench_function("resolve_every_100th_position", |b| {
        b.iter(|| {
            for pos in (0..size).step_by(100) {
                black_box(d.resolve(pos).ok());
            }
        })
    });
}

fn replace_in_middle(c: &mut Criterion) {
    let d = large_document();
    let mid = d.content().size() / 2;
    let pos = d.resolve(mid).map(|r| r.start(r.depth())).unwrap_or(1);
    let slice = Slice::closed(quire_model::Fragment::from_node(txt("inserted")));

    c.bench_function("replace_text_in_middle", |b| {
        b.iter(|| black_box(d.replace(pos, pos, &slice).ok()))
    });
}

fn serialize_document(c: &mut Criterion) {
    let d = large_document();

    c.bench_function("to_json_large_document", |b| {
        b.iter(|| black_box(d.to_value()))
    });
}

criterion_group!(benches, resolve_positions, replace_in_middle, serialize_document);
criterion_main!(benches);
